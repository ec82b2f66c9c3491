//! The compile pipeline and the smaller steps built from the same parts.

use super::export::export;
use super::merger::{ConfigMerger, ConfigTree};
use crate::constants::{ConstantsTable, load_constants_source};
use crate::context::BuildContext;
use crate::deps::{ArtifactFetcher, DependencyResolver, load_dependency_list};
use crate::error::{IoResultExt, Result};
use std::path::PathBuf;
use tracing::{info, warn};

/// Outcome of one [`compile`] run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompileReport {
    pub dependencies: usize,
    pub constants: ConstantsTable,
    pub configuration_dir: PathBuf,
    /// Export file, when one was written.
    pub exported: Option<PathBuf>,
    /// The export step failed; the configuration tree is still usable.
    pub degraded: bool,
}

/// Resolve dependencies, merge every tree, substitute and export.
///
/// The configuration output is only cleared once every dependency has
/// resolved and every constants source has parsed, so a failure leaves the
/// previous output in place.
pub fn compile(ctx: &BuildContext, fetcher: &dyn ArtifactFetcher) -> Result<CompileReport> {
    let layout = ctx.layout();
    let descriptors = load_dependency_list(&ctx.dependencies_file())?;

    let resolver = DependencyResolver::new(fetcher, layout.dependencies_dir());
    let resolved = resolver.resolve(&descriptors)?;
    let trees: Vec<ConfigTree> = resolved
        .iter()
        .map(|dependency| ConfigTree::discover(&dependency.root))
        .collect();
    let local = ConfigTree::local(ctx.source_dir(), ctx.constants_file());

    let merger = ConfigMerger::new(ctx.config.filter.non_filtered_extensions.clone());
    let constants = merger.merge_constants(&trees, &local)?;

    let configuration_dir = layout.configuration_dir();
    if ctx.config.paths.clean_output && configuration_dir.exists() {
        info!("Clearing {}", configuration_dir.display());
        std::fs::remove_dir_all(&configuration_dir).at_path(&configuration_dir)?;
    }
    merger.write_merged(&trees, &local, &constants, &configuration_dir)?;

    let mut exported = None;
    let mut degraded = false;
    if ctx.config.export.enabled {
        let destination = layout.export_file();
        match export(&constants, &destination) {
            Ok(true) => exported = Some(destination),
            Ok(false) => {}
            Err(e) => {
                warn!("Constants export failed, output is degraded: {}", e);
                degraded = true;
            }
        }
    }

    info!(
        "Compiled {} dependencies and {} constants into {}",
        resolved.len(),
        constants.len(),
        configuration_dir.display()
    );
    Ok(CompileReport {
        dependencies: resolved.len(),
        constants,
        configuration_dir,
        exported,
        degraded,
    })
}

/// Flatten the local constants source into the compiled
/// `constants.properties`, without touching anything else.
pub fn generate_filters(ctx: &BuildContext) -> Result<ConstantsTable> {
    let source = ctx.constants_file();
    let constants = match load_constants_source(&source)? {
        Some(table) => table,
        None => {
            info!("No constants file found at {}", source.display());
            ConstantsTable::new()
        }
    };

    let destination = ctx.layout().constants_file();
    constants.save(&destination)?;
    info!(
        "Wrote {} constants from {} to {}",
        constants.len(),
        source.display(),
        destination.display()
    );
    Ok(constants)
}

/// Export the compiled `constants.properties` as JSON.
///
/// Returns the export path when a file was written.
pub fn export_constants(ctx: &BuildContext) -> Result<Option<PathBuf>> {
    let layout = ctx.layout();
    let constants = ConstantsTable::load(&layout.constants_file())?;
    let destination = layout.export_file();
    Ok(export(&constants, &destination)?.then_some(destination))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PackagerConfig;
    use crate::deps::DependencyDescriptor;
    use crate::error::PackagerError;
    use std::fs;
    use std::path::Path;
    use tempfile::TempDir;

    /// Copies a prepared directory per artifact name.
    struct DirFetcher {
        root: PathBuf,
    }

    impl ArtifactFetcher for DirFetcher {
        fn fetch(&self, descriptor: &DependencyDescriptor, dest: &Path) -> Result<()> {
            let source = self.root.join(descriptor.artifact());
            if !source.is_dir() {
                return Err(PackagerError::fetch(descriptor, "not found"));
            }
            for entry in walkdir::WalkDir::new(&source) {
                let entry = entry.unwrap();
                let relative = entry.path().strip_prefix(&source).unwrap();
                let target = dest.join(relative);
                if entry.file_type().is_dir() {
                    fs::create_dir_all(&target).unwrap();
                } else {
                    fs::copy(entry.path(), &target).unwrap();
                }
            }
            Ok(())
        }
    }

    fn write(path: &Path, content: &str) {
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
    }

    fn project(temp: &TempDir) -> (BuildContext, DirFetcher) {
        let project = temp.path().join("project");
        fs::create_dir_all(&project).unwrap();
        let ctx = BuildContext::new(&project, PackagerConfig::default());
        let fetcher = DirFetcher {
            root: temp.path().join("artifacts"),
        };
        (ctx, fetcher)
    }

    #[test]
    fn test_compile_local_only() {
        let temp = TempDir::new().unwrap();
        let (ctx, fetcher) = project(&temp);
        write(&ctx.constants_file(), "site:\n  name: Clinic\n");
        write(&ctx.source_dir().join("addresshierarchy/config.xml"), "<n>${site.name}</n>");

        let report = compile(&ctx, &fetcher).unwrap();

        assert_eq!(report.dependencies, 0);
        assert_eq!(report.constants.get("site.name"), Some("Clinic"));
        assert_eq!(
            fs::read_to_string(report.configuration_dir.join("addresshierarchy/config.xml"))
                .unwrap(),
            "<n>Clinic</n>"
        );
        assert_eq!(report.exported, Some(ctx.layout().export_file()));
        assert!(!report.degraded);
    }

    #[test]
    fn test_compile_clears_stale_output() {
        let temp = TempDir::new().unwrap();
        let (ctx, fetcher) = project(&temp);
        write(&ctx.source_dir().join("a.txt"), "a");
        let stale = ctx.layout().configuration_dir().join("stale.txt");
        write(&stale, "old");

        compile(&ctx, &fetcher).unwrap();
        assert!(!stale.exists());
    }

    #[test]
    fn test_failed_resolution_keeps_previous_output() {
        let temp = TempDir::new().unwrap();
        let (ctx, fetcher) = project(&temp);
        write(
            &ctx.dependencies_file(),
            "- groupId: org.example\n  artifactId: missing\n  version: '1.0'\n",
        );
        let previous = ctx.layout().configuration_dir().join("previous.txt");
        write(&previous, "keep");

        let err = compile(&ctx, &fetcher).unwrap_err();
        assert!(matches!(err, PackagerError::Fetch { .. }));
        assert_eq!(fs::read_to_string(previous).unwrap(), "keep");
    }

    #[test]
    fn test_empty_constants_skip_export() {
        let temp = TempDir::new().unwrap();
        let (ctx, fetcher) = project(&temp);
        write(&ctx.source_dir().join("a.txt"), "${nothing}");

        let report = compile(&ctx, &fetcher).unwrap();
        assert_eq!(report.exported, None);
        assert!(!ctx.layout().export_file().exists());
        assert_eq!(
            fs::read_to_string(report.configuration_dir.join("a.txt")).unwrap(),
            "${nothing}"
        );
    }

    #[test]
    fn test_generate_filters_then_export() {
        let temp = TempDir::new().unwrap();
        let (ctx, _) = project(&temp);
        write(&ctx.constants_file(), "a:\n  b: 1\n  c: [x, y]\n");

        let table = generate_filters(&ctx).unwrap();
        assert_eq!(table.get("a.b"), Some("1"));
        assert_eq!(table.get("a.c[1]"), Some("y"));

        let exported = export_constants(&ctx).unwrap().unwrap();
        let json: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(exported).unwrap()).unwrap();
        assert_eq!(json["a.c[0]"], "x");
    }

    #[test]
    fn test_export_constants_without_compiled_file() {
        let temp = TempDir::new().unwrap();
        let (ctx, _) = project(&temp);
        assert_eq!(export_constants(&ctx).unwrap(), None);
    }
}
