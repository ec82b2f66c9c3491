//! Which directories are watched.

use crate::error::Result;
use std::collections::{HashSet, VecDeque};
use std::path::{Component, Path, PathBuf};
use tracing::debug;

/// Paths that never trigger a rebuild and are never registered.
///
/// Hidden entries are judged relative to the watch root they live under,
/// so a root inside a hidden directory (such as `~/.m2`) still works.
#[derive(Debug, Clone, Default)]
pub struct ExclusionRules {
    roots: Vec<PathBuf>,
    excluded_dirs: Vec<PathBuf>,
}

impl ExclusionRules {
    pub fn new(roots: impl IntoIterator<Item = PathBuf>) -> Self {
        Self {
            roots: roots.into_iter().collect(),
            excluded_dirs: Vec::new(),
        }
    }

    /// Exclude `dir` and everything below it, e.g. the build directory.
    pub fn exclude_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.excluded_dirs.push(dir.into());
        self
    }

    pub fn roots(&self) -> &[PathBuf] {
        &self.roots
    }

    pub fn is_excluded(&self, path: &Path) -> bool {
        if self.excluded_dirs.iter().any(|dir| path.starts_with(dir)) {
            return true;
        }
        let relative = self
            .roots
            .iter()
            .filter_map(|root| path.strip_prefix(root).ok())
            .min_by_key(|rel| rel.components().count())
            .unwrap_or_else(|| path.file_name().map(Path::new).unwrap_or(path));

        relative.components().any(|component| match component {
            Component::Normal(name) => name.to_string_lossy().starts_with('.'),
            _ => false,
        })
    }
}

/// The set of directories registered with the OS watcher.
///
/// The initial walk goes through [`WatchRegistry::register_tree`].
/// Directories created later go through [`WatchRegistry::refresh_tree`],
/// which also covers a directory deleted and created again at a known path.
#[derive(Debug, Default)]
pub struct WatchRegistry {
    rules: ExclusionRules,
    registered: HashSet<PathBuf>,
}

impl WatchRegistry {
    pub fn new(rules: ExclusionRules) -> Self {
        Self {
            rules,
            registered: HashSet::new(),
        }
    }

    pub fn rules(&self) -> &ExclusionRules {
        &self.rules
    }

    pub fn is_registered(&self, dir: &Path) -> bool {
        self.registered.contains(dir)
    }

    pub fn len(&self) -> usize {
        self.registered.len()
    }

    pub fn is_empty(&self) -> bool {
        self.registered.is_empty()
    }

    /// Register `root` and every non-excluded directory below it, calling
    /// `watch_dir` once per newly registered directory.
    ///
    /// Returns how many directories were added.
    pub fn register_tree(
        &mut self,
        root: &Path,
        mut watch_dir: impl FnMut(&Path) -> Result<()>,
    ) -> Result<usize> {
        if !root.is_dir() || self.rules.is_excluded(root) {
            return Ok(0);
        }

        let mut added = 0;
        let mut worklist = VecDeque::from([root.to_path_buf()]);
        while let Some(dir) = worklist.pop_front() {
            if self.registered.contains(&dir) {
                continue;
            }
            watch_dir(&dir)?;
            debug!("Watching {}", dir.display());
            self.registered.insert(dir.clone());
            added += 1;

            let entries = match std::fs::read_dir(&dir) {
                Ok(entries) => entries,
                Err(e) => {
                    debug!("Unable to list {}: {}", dir.display(), e);
                    continue;
                }
            };
            for entry in entries.flatten() {
                let is_dir = entry.file_type().map(|t| t.is_dir()).unwrap_or(false);
                let path = entry.path();
                if is_dir && !self.rules.is_excluded(&path) {
                    worklist.push_back(path);
                }
            }
        }
        Ok(added)
    }

    /// Drop `root` and everything registered below it. Returns how many
    /// directories were dropped.
    pub fn forget_tree(&mut self, root: &Path) -> usize {
        let before = self.registered.len();
        self.registered.retain(|dir| !dir.starts_with(root));
        before - self.registered.len()
    }

    /// Register a directory that just appeared.
    ///
    /// A create for a path already in the set means the old directory went
    /// away and its OS watch with it, so the subtree is registered afresh.
    pub fn refresh_tree(
        &mut self,
        root: &Path,
        watch_dir: impl FnMut(&Path) -> Result<()>,
    ) -> Result<usize> {
        let forgotten = self.forget_tree(root);
        if forgotten > 0 {
            debug!("Re-registering {} ({} stale)", root.display(), forgotten);
        }
        self.register_tree(root, watch_dir)
    }
}
