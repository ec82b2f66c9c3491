//! Packaging outputs derived from the compiled constants.

use crate::build::{ResourceFilter, copy_tree};
use crate::constants::ConstantsTable;
use crate::context::BuildContext;
use crate::error::{IoResultExt, Result};
use heck::ToShoutySnakeCase;
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

pub const CONTENT_PROPERTIES_FILE: &str = "content.properties";

const DEFAULT_PACKAGE_VERSION: &str = "0.1.0";

/// Render the content package descriptor.
pub fn render_content_properties(name: &str, version: &str, constants: &ConstantsTable) -> String {
    let mut out = format!("# Content Package\nname={name}\nversion={version}\n");
    if !constants.is_empty() {
        let vars: ConstantsTable = constants
            .iter()
            .map(|(key, value)| (format!("var.{key}"), value))
            .collect();
        out.push_str("\n# Constants\n");
        out.push_str(&vars.to_properties_string());
    }
    out
}

/// Write `content.properties` and the packaged configuration tree.
///
/// Returns the package directory.
pub fn content_package(ctx: &BuildContext) -> Result<PathBuf> {
    let package = &ctx.config.package;
    let target = ctx.build_dir().join(&package.target_subdir);
    let constants = ConstantsTable::load(&ctx.layout().constants_file())?;
    let version = package.version.as_deref().unwrap_or(DEFAULT_PACKAGE_VERSION);

    std::fs::create_dir_all(&target).at_path(&target)?;
    let descriptor = target.join(CONTENT_PROPERTIES_FILE);
    let content = render_content_properties(&ctx.package_name(), version, &constants);
    std::fs::write(&descriptor, content).at_path(&descriptor)?;
    info!(
        "Wrote {} with {} constants",
        descriptor.display(),
        constants.len()
    );

    let source = ctx.source_dir();
    if source.is_dir() {
        let packaged = target.join("configuration");
        let frontend = Path::new(&package.frontend_subdir);
        let no_constants = ConstantsTable::new();
        let unfiltered = ResourceFilter::new(&no_constants, &[]);

        copy_tree(
            &source,
            &packaged.join("backend_configuration"),
            &unfiltered,
            |relative| relative.starts_with(frontend),
        )?;
        let frontend_source = source.join(frontend);
        if frontend_source.is_dir() {
            copy_tree(
                &frontend_source,
                &packaged.join("frontend_configuration"),
                &unfiltered,
                |_| false,
            )?;
        }
    }
    Ok(target)
}

/// Render a Rust module with one `pub const` per constant.
///
/// Keys that map onto an identifier already taken are dropped, keeping the
/// first in key order.
pub fn render_constants_module(constants: &ConstantsTable) -> String {
    let mut out = String::from("//! Generated by config-packager. Do not edit.\n\n");
    let mut seen = BTreeSet::new();
    for (key, value) in constants.iter() {
        let mut ident = key.to_shouty_snake_case();
        if ident.is_empty() {
            warn!("Skipping constant {:?}: no usable identifier", key);
            continue;
        }
        if ident.starts_with(|c: char| c.is_ascii_digit()) {
            ident.insert(0, '_');
        }
        if !seen.insert(ident.clone()) {
            warn!("Skipping constant {:?}: {} is already defined", key, ident);
            continue;
        }
        out.push_str(&format!("pub const {ident}: &str = {value:?};\n"));
    }
    out
}

/// Write the constants module under the build directory.
pub fn generate_constants_module(ctx: &BuildContext) -> Result<PathBuf> {
    let generate = &ctx.config.generate;
    let constants = ConstantsTable::load(&ctx.layout().constants_file())?;
    let destination = ctx
        .build_dir()
        .join(&generate.output_subdir)
        .join(format!("{}.rs", generate.module_name));

    if let Some(parent) = destination.parent() {
        std::fs::create_dir_all(parent).at_path(parent)?;
    }
    std::fs::write(&destination, render_constants_module(&constants)).at_path(&destination)?;
    info!(
        "Generated {} with {} constants",
        destination.display(),
        constants.len()
    );
    Ok(destination)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PackagerConfig;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_content_properties_layout() {
        let constants: ConstantsTable = [("b", "2"), ("a.x", "1")].into_iter().collect();
        assert_eq!(
            render_content_properties("site", "1.2.0", &constants),
            "# Content Package\nname=site\nversion=1.2.0\n\n# Constants\nvar.a.x=1\nvar.b=2\n"
        );
        assert_eq!(
            render_content_properties("site", "1.2.0", &ConstantsTable::new()),
            "# Content Package\nname=site\nversion=1.2.0\n"
        );
    }

    #[test]
    fn test_constants_module() {
        let constants: ConstantsTable = [
            ("site.name", "Main \"Clinic\""),
            ("site-name", "dup"),
            ("list[0]", "a\\b"),
            ("9lives", "cat"),
        ]
        .into_iter()
        .collect();

        let module = render_constants_module(&constants);
        assert!(module.contains("pub const _9LIVES: &str = \"cat\";\n"));
        assert!(module.contains("pub const LIST_0: &str = \"a\\\\b\";\n"));
        assert!(module.contains("pub const SITE_NAME: &str = \"dup\";\n"));
        assert!(!module.contains("Clinic"));
    }

    #[test]
    fn test_content_package_writes_descriptor_and_tree() {
        let temp = TempDir::new().unwrap();
        let project = temp.path().join("mysite");
        let mut config = PackagerConfig::default();
        config.package.version = Some("2.0.0".into());
        let ctx = BuildContext::new(&project, config);

        let source = ctx.source_dir();
        fs::create_dir_all(source.join("frontend/apps")).unwrap();
        fs::create_dir_all(source.join("concepts")).unwrap();
        fs::write(source.join("frontend/apps/app.json"), "{}").unwrap();
        fs::write(source.join("concepts/c.csv"), "${raw}").unwrap();
        ConstantsTable::from_iter([("k", "v")])
            .save(&ctx.layout().constants_file())
            .unwrap();

        let target = content_package(&ctx).unwrap();

        let descriptor = fs::read_to_string(target.join(CONTENT_PROPERTIES_FILE)).unwrap();
        assert!(descriptor.starts_with("# Content Package\nname=mysite\nversion=2.0.0\n"));
        assert!(descriptor.ends_with("# Constants\nvar.k=v\n"));
        assert_eq!(
            fs::read_to_string(target.join("configuration/backend_configuration/concepts/c.csv"))
                .unwrap(),
            "${raw}"
        );
        assert!(!target.join("configuration/backend_configuration/frontend").exists());
        assert!(target
            .join("configuration/frontend_configuration/apps/app.json")
            .exists());
    }

    #[test]
    fn test_generate_constants_module_file() {
        let temp = TempDir::new().unwrap();
        let ctx = BuildContext::new(temp.path(), PackagerConfig::default());
        ConstantsTable::from_iter([("a.b", "c")])
            .save(&ctx.layout().constants_file())
            .unwrap();

        let path = generate_constants_module(&ctx).unwrap();
        assert_eq!(path, temp.path().join("target/generated-sources/constants.rs"));
        assert!(fs::read_to_string(path).unwrap().contains("pub const A_B: &str = \"c\";"));
    }
}
