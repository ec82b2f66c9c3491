//! Filtered copying of configuration trees.

use super::substitute::substitute;
use crate::constants::ConstantsTable;
use crate::error::{IoResultExt, PackagerError, Result};
use std::path::Path;
use tracing::debug;
use walkdir::WalkDir;

/// Version-control and OS clutter never copied into an output tree.
const DEFAULT_EXCLUDES: &[&str] = &[".git", ".svn", ".hg", ".DS_Store"];

/// Decides which files get placeholder substitution while copying.
#[derive(Debug, Clone)]
pub struct ResourceFilter<'a> {
    table: &'a ConstantsTable,
    non_filtered_extensions: &'a [String],
}

impl<'a> ResourceFilter<'a> {
    pub fn new(table: &'a ConstantsTable, non_filtered_extensions: &'a [String]) -> Self {
        Self {
            table,
            non_filtered_extensions,
        }
    }

    /// Binary extensions are copied untouched.
    pub fn is_filtered(&self, path: &Path) -> bool {
        match path.extension().and_then(|e| e.to_str()) {
            Some(ext) => !self
                .non_filtered_extensions
                .iter()
                .any(|skip| skip.eq_ignore_ascii_case(ext)),
            None => true,
        }
    }

    /// Copy one file, substituting placeholders when it is filterable text.
    ///
    /// Content that is not valid UTF-8 is copied byte-for-byte.
    pub fn copy_file(&self, from: &Path, to: &Path) -> Result<()> {
        if let Some(parent) = to.parent() {
            std::fs::create_dir_all(parent).at_path(parent)?;
        }
        if !self.is_filtered(from) {
            std::fs::copy(from, to).at_path(from)?;
            return Ok(());
        }

        let bytes = std::fs::read(from).at_path(from)?;
        match String::from_utf8(bytes) {
            Ok(text) => std::fs::write(to, substitute(&text, self.table)).at_path(to),
            Err(not_text) => {
                debug!("Copying non-UTF-8 file unfiltered: {}", from.display());
                std::fs::write(to, not_text.into_bytes()).at_path(to)
            }
        }
    }
}

/// Overlay every file under `from` onto `to`, overwriting same-path files.
///
/// `skip` receives paths relative to `from`. Returns the number of files
/// copied.
pub fn copy_tree(
    from: &Path,
    to: &Path,
    filter: &ResourceFilter<'_>,
    skip: impl Fn(&Path) -> bool,
) -> Result<usize> {
    let mut copied = 0;
    let walker = WalkDir::new(from)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|e| {
            !DEFAULT_EXCLUDES
                .iter()
                .any(|name| e.file_name() == std::ffi::OsStr::new(name))
        });

    for entry in walker {
        let entry = entry.map_err(|e| {
            let path = e.path().unwrap_or(from).to_path_buf();
            PackagerError::io(path, e.into())
        })?;
        let relative = match entry.path().strip_prefix(from) {
            Ok(relative) if !relative.as_os_str().is_empty() => relative,
            _ => continue,
        };
        if skip(relative) {
            continue;
        }

        let target = to.join(relative);
        if entry.file_type().is_dir() {
            std::fs::create_dir_all(&target).at_path(&target)?;
        } else {
            filter.copy_file(entry.path(), &target)?;
            copied += 1;
        }
    }

    debug!("Copied {} files from {} to {}", copied, from.display(), to.display());
    Ok(copied)
}
