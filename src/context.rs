//! Per-invocation build context.
//!
//! Every command receives a [`BuildContext`]; nothing reads ambient state
//! such as the working directory after startup.

use crate::config::PackagerConfig;
use crate::deps::LocalRepository;
use crate::error::{PackagerError, Result};
use std::path::{Path, PathBuf};

/// Project location plus resolved settings.
#[derive(Debug, Clone)]
pub struct BuildContext {
    project_dir: PathBuf,
    pub config: PackagerConfig,
}

impl BuildContext {
    pub fn new(project_dir: impl Into<PathBuf>, config: PackagerConfig) -> Self {
        Self {
            project_dir: project_dir.into(),
            config,
        }
    }

    pub fn project_dir(&self) -> &Path {
        &self.project_dir
    }

    fn resolve(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.project_dir.join(path)
        }
    }

    /// Local configuration tree.
    pub fn source_dir(&self) -> PathBuf {
        self.resolve(&self.config.paths.source_dir)
    }

    /// Local constants source document.
    pub fn constants_file(&self) -> PathBuf {
        self.resolve(&self.config.paths.constants_file)
    }

    /// Dependency declaration document.
    pub fn dependencies_file(&self) -> PathBuf {
        self.resolve(&self.config.paths.dependencies_file)
    }

    pub fn build_dir(&self) -> PathBuf {
        self.resolve(&self.config.paths.build_dir)
    }

    /// Where compiled output lands.
    pub fn layout(&self) -> OutputLayout {
        OutputLayout::new(
            self.build_dir().join(&self.config.paths.output_subdir),
            &self.config.export.subdir,
            &self.config.export.file_name,
        )
    }

    /// Configured local repository, or `~/.m2/repository`.
    pub fn local_repository(&self) -> Result<LocalRepository> {
        let root = match &self.config.paths.local_repository {
            Some(path) => self.resolve(path),
            None => dirs::home_dir()
                .map(|home| home.join(".m2").join("repository"))
                .ok_or_else(|| {
                    PackagerError::config("no home directory; set paths.local_repository")
                })?,
        };
        Ok(LocalRepository::new(root))
    }

    /// Configured servers directory, or `~/openmrs`.
    pub fn servers_dir(&self) -> Result<PathBuf> {
        match &self.config.deploy.servers_dir {
            Some(path) => Ok(self.resolve(path)),
            None => dirs::home_dir()
                .map(|home| home.join("openmrs"))
                .ok_or_else(|| PackagerError::config("no home directory; set deploy.servers_dir")),
        }
    }

    /// Package name, defaulting to the project directory's name.
    pub fn package_name(&self) -> String {
        if let Some(name) = &self.config.package.name {
            return name.clone();
        }
        self.project_dir
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| "configuration".to_string())
    }
}

/// Fixed locations under the packager output root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputLayout {
    root: PathBuf,
    export_subdir: String,
    export_file_name: String,
}

impl OutputLayout {
    pub fn new(root: impl Into<PathBuf>, export_subdir: &str, export_file_name: &str) -> Self {
        Self {
            root: root.into(),
            export_subdir: export_subdir.to_string(),
            export_file_name: export_file_name.to_string(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Staging area for unpacked dependencies.
    pub fn dependencies_dir(&self) -> PathBuf {
        self.root.join("dependencies")
    }

    /// Compiled configuration tree.
    pub fn configuration_dir(&self) -> PathBuf {
        self.root.join("configuration")
    }

    pub fn constants_file(&self) -> PathBuf {
        self.configuration_dir()
            .join(crate::constants::CONSTANTS_FILE_NAME)
    }

    pub fn export_file(&self) -> PathBuf {
        self.configuration_dir()
            .join(&self.export_subdir)
            .join(&self.export_file_name)
    }
}
