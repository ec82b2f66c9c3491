//! Loading raw constants source documents.

use super::{ConstantsTable, flatten};
use crate::error::{IoResultExt, PackagerError, Result};
use serde_json::Value;
use std::path::Path;
use tracing::info;

/// Encoding of a constants source document, chosen by file extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConstantsFormat {
    /// Flat `key=value` lines.
    Properties,
    /// Hierarchical JSON.
    Json,
    /// Hierarchical YAML (the default for unknown extensions).
    Yaml,
}

impl ConstantsFormat {
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some("properties") => ConstantsFormat::Properties,
            Some("json") => ConstantsFormat::Json,
            _ => ConstantsFormat::Yaml,
        }
    }

    /// Parse `content` into a flat table.
    ///
    /// Flat documents are taken as-is; hierarchical ones are flattened.
    /// Unquoted YAML numbers come back in canonical form (see
    /// [`flatten`](super::flatten)).
    pub fn parse(self, path: &Path, content: &str) -> Result<ConstantsTable> {
        let document: Value = match self {
            ConstantsFormat::Properties => return Ok(ConstantsTable::from_properties_str(content)),
            ConstantsFormat::Json => {
                serde_json::from_str(content).map_err(|e| PackagerError::parse(path, e))?
            }
            ConstantsFormat::Yaml => {
                serde_yaml::from_str(content).map_err(|e| PackagerError::parse(path, e))?
            }
        };
        Ok(flatten(&document))
    }
}

/// Load and flatten a constants source file.
///
/// Returns `Ok(None)` when the file does not exist, so callers can tell
/// "no constants declared" apart from "declared but empty".
pub fn load_constants_source(path: &Path) -> Result<Option<ConstantsTable>> {
    if !path.is_file() {
        return Ok(None);
    }
    let content = std::fs::read_to_string(path).at_path(path)?;
    let table = ConstantsFormat::from_path(path).parse(path, &content)?;
    info!("Loaded {} constants from {}", table.len(), path.display());
    Ok(Some(table))
}
