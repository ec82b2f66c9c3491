//! Resolving declared dependencies into staging directories.

use super::{ArtifactFetcher, DependencyDescriptor};
use crate::error::{IoResultExt, PackagerError, Result};
use std::path::{Component, Path, PathBuf};
use tracing::info;

/// One dependency unpacked into its staging directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedDependency {
    pub descriptor: DependencyDescriptor,
    /// Root of the unpacked configuration tree.
    pub root: PathBuf,
}

/// Fetches declared dependencies, strictly in declared order.
pub struct DependencyResolver<'a> {
    fetcher: &'a dyn ArtifactFetcher,
    staging_root: PathBuf,
}

impl<'a> DependencyResolver<'a> {
    /// `staging_root` receives one `<group>_<artifact>_<version>` directory
    /// per dependency.
    pub fn new(fetcher: &'a dyn ArtifactFetcher, staging_root: impl Into<PathBuf>) -> Self {
        Self {
            fetcher,
            staging_root: staging_root.into(),
        }
    }

    pub fn staging_root(&self) -> &Path {
        &self.staging_root
    }

    /// Fetch every descriptor. The first failure aborts the whole resolution.
    pub fn resolve(&self, descriptors: &[DependencyDescriptor]) -> Result<Vec<ResolvedDependency>> {
        let mut resolved = Vec::with_capacity(descriptors.len());
        for descriptor in descriptors {
            info!("Retrieving and unpacking dependency: {}", descriptor);
            let root = self.staging_dir(descriptor)?;
            self.prepare_staging_dir(&root)?;

            self.fetcher
                .fetch(descriptor, &root)
                .map_err(|e| match e {
                    PackagerError::Fetch { .. } => e,
                    other => PackagerError::fetch(descriptor, other),
                })?;

            resolved.push(ResolvedDependency {
                descriptor: descriptor.clone(),
                root,
            });
        }
        Ok(resolved)
    }

    /// The staging directory for `descriptor`, always a direct child of the
    /// staging root.
    fn staging_dir(&self, descriptor: &DependencyDescriptor) -> Result<PathBuf> {
        let name = descriptor.staging_name();
        let mut components = Path::new(&name).components();
        match (components.next(), components.next()) {
            (Some(Component::Normal(_)), None) => Ok(self.staging_root.join(name)),
            _ => Err(PackagerError::fetch(
                descriptor,
                "coordinates do not name a staging directory",
            )),
        }
    }

    /// Staging directories are replaced wholesale on every resolve.
    fn prepare_staging_dir(&self, dir: &Path) -> Result<()> {
        if dir.exists() {
            std::fs::remove_dir_all(dir).at_path(dir)?;
        }
        std::fs::create_dir_all(dir).at_path(dir)
    }
}
