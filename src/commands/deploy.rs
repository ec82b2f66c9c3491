use crate::build::{ResourceFilter, copy_tree};
use crate::constants::ConstantsTable;
use crate::context::BuildContext;
use crate::error::{IoResultExt, PackagerError, Result};
use std::path::PathBuf;
use tracing::info;

/// Copy the compiled configuration to `<servers_dir>/<server_id>/configuration`,
/// replacing whatever was there.
pub fn deploy_to_server(ctx: &BuildContext, server_id: &str) -> Result<PathBuf> {
    let servers_dir = ctx.servers_dir()?;
    if !servers_dir.is_dir() {
        return Err(PackagerError::config(format!(
            "servers directory {} does not exist",
            servers_dir.display()
        )));
    }
    let server_dir = servers_dir.join(server_id);
    if !server_dir.is_dir() {
        return Err(PackagerError::config(format!(
            "no server named {server_id} in {}",
            servers_dir.display()
        )));
    }
    let compiled = ctx.layout().configuration_dir();
    if !compiled.is_dir() {
        return Err(PackagerError::config(format!(
            "nothing compiled at {}; run compile first",
            compiled.display()
        )));
    }

    let target = server_dir.join("configuration");
    if target.exists() {
        std::fs::remove_dir_all(&target).at_path(&target)?;
    }
    std::fs::create_dir_all(&target).at_path(&target)?;

    // Already substituted; copy through an empty table.
    let no_constants = ConstantsTable::new();
    let filter = ResourceFilter::new(&no_constants, &[]);
    let copied = copy_tree(&compiled, &target, &filter, |_| false)?;
    info!(
        "Deployed {} files to server {} at {}",
        copied,
        server_id,
        target.display()
    );
    Ok(target)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PackagerConfig;
    use std::fs;
    use tempfile::TempDir;

    fn context(temp: &TempDir) -> BuildContext {
        let mut config = PackagerConfig::default();
        config.deploy.servers_dir = Some(temp.path().join("servers"));
        BuildContext::new(temp.path().join("project"), config)
    }

    #[test]
    fn test_deploy_replaces_server_configuration() {
        let temp = TempDir::new().unwrap();
        let ctx = context(&temp);
        let compiled = ctx.layout().configuration_dir();
        fs::create_dir_all(compiled.join("domain")).unwrap();
        fs::write(compiled.join("domain/a.xml"), "literal ${kept}").unwrap();
        let old = temp.path().join("servers/dev/configuration/old.xml");
        fs::create_dir_all(old.parent().unwrap()).unwrap();
        fs::write(&old, "old").unwrap();

        let target = deploy_to_server(&ctx, "dev").unwrap();

        assert_eq!(target, temp.path().join("servers/dev/configuration"));
        assert!(!old.exists());
        assert_eq!(
            fs::read_to_string(target.join("domain/a.xml")).unwrap(),
            "literal ${kept}"
        );
    }

    #[test]
    fn test_deploy_to_unknown_server() {
        let temp = TempDir::new().unwrap();
        let ctx = context(&temp);
        fs::create_dir_all(temp.path().join("servers")).unwrap();
        let err = deploy_to_server(&ctx, "missing").unwrap_err();
        assert!(matches!(err, PackagerError::Config(_)));
    }

    #[test]
    fn test_deploy_without_servers_dir() {
        let temp = TempDir::new().unwrap();
        let ctx = context(&temp);
        assert!(matches!(
            deploy_to_server(&ctx, "dev"),
            Err(PackagerError::Config(_))
        ));
    }

    #[test]
    fn test_deploy_before_compile() {
        let temp = TempDir::new().unwrap();
        let ctx = context(&temp);
        fs::create_dir_all(temp.path().join("servers/dev")).unwrap();
        assert!(matches!(
            deploy_to_server(&ctx, "dev"),
            Err(PackagerError::Config(_))
        ));
    }
}
