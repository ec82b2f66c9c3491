//! Layered merge of dependency trees and the local project tree.
//!
//! Precedence is purely positional: dependencies in declared order, then the
//! local project. Files overwrite whole; constants merge key by key, with the
//! local project's constants folded in last.

use super::copy::{ResourceFilter, copy_tree};
use crate::constants::{CONSTANTS_FILE_NAME, ConstantsTable, load_constants_source};
use crate::error::{IoResultExt, Result};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Constants source names looked up, in order, at a dependency tree's root.
pub const DEPENDENCY_CONSTANTS_CANDIDATES: &[&str] = &[
    CONSTANTS_FILE_NAME,
    "constants.yml",
    "constants.yaml",
    "constants.json",
];

/// A configuration tree: a directory of files plus its constants source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigTree {
    pub root: PathBuf,
    pub constants_source: Option<PathBuf>,
}

impl ConfigTree {
    /// The local project: files under `source_dir`, constants from
    /// `constants_file` (which may live outside the tree).
    pub fn local(source_dir: impl Into<PathBuf>, constants_file: impl Into<PathBuf>) -> Self {
        Self {
            root: source_dir.into(),
            constants_source: Some(constants_file.into()),
        }
    }

    /// An unpacked dependency, with its constants source discovered at the
    /// root.
    pub fn discover(root: impl Into<PathBuf>) -> Self {
        let root = root.into();
        let constants_source = DEPENDENCY_CONSTANTS_CANDIDATES
            .iter()
            .map(|name| root.join(name))
            .find(|candidate| candidate.is_file());
        Self {
            root,
            constants_source,
        }
    }

    fn is_constants_source(&self, relative: &Path) -> bool {
        self.constants_source
            .as_deref()
            .is_some_and(|source| source == self.root.join(relative).as_path())
    }

    fn load_constants(&self) -> Result<ConstantsTable> {
        match &self.constants_source {
            Some(source) => Ok(load_constants_source(source)?.unwrap_or_default()),
            None => Ok(ConstantsTable::new()),
        }
    }
}

/// Merges configuration trees into one output directory.
#[derive(Debug, Clone)]
pub struct ConfigMerger {
    non_filtered_extensions: Vec<String>,
}

impl ConfigMerger {
    pub fn new(non_filtered_extensions: Vec<String>) -> Self {
        Self {
            non_filtered_extensions,
        }
    }

    /// Compute the merged constants without touching any files.
    ///
    /// Every constants source is parsed here, so a malformed document fails
    /// the merge before the output directory is written.
    pub fn merge_constants(
        &self,
        dependencies: &[ConfigTree],
        local: &ConfigTree,
    ) -> Result<ConstantsTable> {
        let mut constants = ConstantsTable::new();
        for dependency in dependencies {
            let dependency_constants = dependency.load_constants()?;
            debug!(
                "Added {} constants from dependency {}",
                dependency_constants.len(),
                dependency.root.display()
            );
            constants.put_all(&dependency_constants);
        }

        let local_constants = local.load_constants()?;
        debug!("Added {} constants from this project", local_constants.len());
        constants.put_all(&local_constants);

        Ok(constants)
    }

    /// Merge `dependencies` (in order) and then `local` into `output_dir`.
    ///
    /// Returns the final constants, which are also persisted as
    /// `constants.properties` in `output_dir`.
    pub fn merge(
        &self,
        dependencies: &[ConfigTree],
        local: &ConfigTree,
        output_dir: &Path,
    ) -> Result<ConstantsTable> {
        let constants = self.merge_constants(dependencies, local)?;
        self.write_merged(dependencies, local, &constants, output_dir)?;
        Ok(constants)
    }

    /// Overlay every tree onto `output_dir`, filtering with the already
    /// merged `constants`, and persist them.
    pub fn write_merged(
        &self,
        dependencies: &[ConfigTree],
        local: &ConfigTree,
        constants: &ConstantsTable,
        output_dir: &Path,
    ) -> Result<()> {
        std::fs::create_dir_all(output_dir).at_path(output_dir)?;
        let filter = ResourceFilter::new(constants, &self.non_filtered_extensions);

        for dependency in dependencies {
            self.overlay(dependency, output_dir, &filter)?;
        }
        if local.root.is_dir() {
            self.overlay(local, output_dir, &filter)?;
        } else {
            info!("No local configuration directory at {}", local.root.display());
        }

        let constants_file = output_dir.join(CONSTANTS_FILE_NAME);
        constants.save(&constants_file)?;
        info!(
            "Wrote compiled constants file with {} entries to {}",
            constants.len(),
            constants_file.display()
        );
        Ok(())
    }

    fn overlay(&self, tree: &ConfigTree, output_dir: &Path, filter: &ResourceFilter<'_>) -> Result<()> {
        info!(
            "Adding and filtering resources from {} to {}",
            tree.root.display(),
            output_dir.display()
        );
        copy_tree(&tree.root, output_dir, filter, |relative| {
            tree.is_constants_source(relative)
        })?;
        Ok(())
    }
}
