//! Flattened configuration constants.
//!
//! A [`ConstantsTable`] is the key -> string map every stage of the pipeline
//! shares: flattened from a constants source document, folded across
//! dependencies, persisted as `constants.properties`, exported as JSON and
//! finally used to fill `${key}` placeholders.

mod flatten;
mod properties;
mod source;

pub use flatten::flatten;
pub use source::{ConstantsFormat, load_constants_source};

use crate::error::{IoResultExt, PackagerError, Result};
use std::collections::BTreeMap;
use std::path::Path;

/// File name of the canonical flat constants file.
pub const CONSTANTS_FILE_NAME: &str = "constants.properties";

/// Ordered key -> string constants.
///
/// Iteration is always in lexicographic key order so anything written from a
/// table is reproducible regardless of insertion order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConstantsTable {
    entries: BTreeMap<String, String>,
}

impl ConstantsTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a constant, returning the value it replaced.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) -> Option<String> {
        self.entries.insert(key.into(), value.into())
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries.get(key).map(String::as_str)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries in sorted key order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    /// Fold `other` into this table. Keys in `other` win.
    pub fn put_all(&mut self, other: &ConstantsTable) {
        for (key, value) in &other.entries {
            self.entries.insert(key.clone(), value.clone());
        }
    }

    /// Borrow the underlying sorted map.
    pub fn as_map(&self) -> &BTreeMap<String, String> {
        &self.entries
    }

    /// Parse a flat properties document.
    pub fn from_properties_str(content: &str) -> Self {
        properties::parse(content).into_iter().collect()
    }

    /// Render as a flat properties document, one sorted entry per line.
    pub fn to_properties_string(&self) -> String {
        properties::render(self.iter())
    }

    /// Load a previously persisted properties file.
    ///
    /// A missing file yields an empty table.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::new());
        }
        let content = std::fs::read_to_string(path).at_path(path)?;
        Ok(Self::from_properties_str(&content))
    }

    /// Persist as a flat properties file, creating parent directories.
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).at_path(parent)?;
        }
        std::fs::write(path, self.to_properties_string()).map_err(|e| PackagerError::io(path, e))
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for ConstantsTable {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            entries: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

impl<'a> IntoIterator for &'a ConstantsTable {
    type Item = (&'a String, &'a String);
    type IntoIter = std::collections::btree_map::Iter<'a, String, String>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_iteration_is_sorted() {
        let mut table = ConstantsTable::new();
        table.insert("zeta", "1");
        table.insert("alpha", "2");
        table.insert("mid.key", "3");

        let keys: Vec<&str> = table.keys().collect();
        assert_eq!(keys, vec!["alpha", "mid.key", "zeta"]);
    }

    #[test]
    fn test_put_all_is_right_biased() {
        let mut base: ConstantsTable = [("a", "base"), ("b", "base")].into_iter().collect();
        let overlay: ConstantsTable = [("b", "overlay"), ("c", "overlay")].into_iter().collect();

        base.put_all(&overlay);

        assert_eq!(base.get("a"), Some("base"));
        assert_eq!(base.get("b"), Some("overlay"));
        assert_eq!(base.get("c"), Some("overlay"));
        assert_eq!(base.len(), 3);
    }

    #[test]
    fn test_insert_replaces() {
        let mut table = ConstantsTable::new();
        assert_eq!(table.insert("k", "v1"), None);
        assert_eq!(table.insert("k", "v2"), Some("v1".to_string()));
        assert_eq!(table.get("k"), Some("v2"));
    }

    #[test]
    fn test_save_and_load() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("nested/constants.properties");

        let table: ConstantsTable = [
            ("textConstant", "textValue"),
            ("path", "C:\\data\\dir"),
            ("multi", "line one\nline two"),
            ("key with space", " leading"),
        ]
        .into_iter()
        .collect();

        table.save(&path).unwrap();
        let loaded = ConstantsTable::load(&path).unwrap();
        assert_eq!(loaded, table);
    }

    #[test]
    fn test_load_missing_file_is_empty() {
        let temp = TempDir::new().unwrap();
        let loaded = ConstantsTable::load(&temp.path().join("absent.properties")).unwrap();
        assert!(loaded.is_empty());
    }

    #[test]
    fn test_properties_output_is_insertion_order_independent() {
        let a: ConstantsTable = [("b", "2"), ("a", "1")].into_iter().collect();
        let b: ConstantsTable = [("a", "1"), ("b", "2")].into_iter().collect();
        assert_eq!(a.to_properties_string(), b.to_properties_string());
        assert_eq!(a.to_properties_string(), "a=1\nb=2\n");
    }
}
