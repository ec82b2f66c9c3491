//! Structured (JSON) export of merged constants.

use crate::constants::ConstantsTable;
use crate::error::{IoResultExt, PackagerError, Result};
use std::path::Path;
use tracing::{debug, info};

/// Render the table as a pretty-printed JSON object with sorted keys.
pub fn render_json(table: &ConstantsTable) -> Result<String> {
    let mut json = serde_json::to_string_pretty(table.as_map())
        .map_err(|e| PackagerError::config(format!("unable to serialize constants: {e}")))?;
    json.push('\n');
    Ok(json)
}

/// Write `table` to `destination` as JSON.
///
/// Returns `false` without touching the filesystem when the table is empty.
pub fn export(table: &ConstantsTable, destination: &Path) -> Result<bool> {
    if table.is_empty() {
        debug!(
            "Not generating {} as no constants exist",
            destination.display()
        );
        return Ok(false);
    }

    let json = render_json(table)?;
    if let Some(parent) = destination.parent() {
        std::fs::create_dir_all(parent).at_path(parent)?;
    }
    std::fs::write(destination, json).at_path(destination)?;
    info!(
        "Generated {} with {} entries",
        destination.display(),
        table.len()
    );
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_export_is_sorted_and_pretty() {
        let table: ConstantsTable = [("zeta", "z"), ("alpha", "a")].into_iter().collect();
        let json = render_json(&table).unwrap();
        assert_eq!(json, "{\n  \"alpha\": \"a\",\n  \"zeta\": \"z\"\n}\n");
    }

    #[test]
    fn test_export_is_deterministic() {
        let a: ConstantsTable = [("b", "2"), ("a", "1"), ("c", "3")].into_iter().collect();
        let b: ConstantsTable = [("c", "3"), ("a", "1"), ("b", "2")].into_iter().collect();

        let temp = TempDir::new().unwrap();
        let first = temp.path().join("first/constants.json");
        let second = temp.path().join("second/constants.json");
        export(&a, &first).unwrap();
        export(&b, &second).unwrap();

        assert_eq!(std::fs::read(&first).unwrap(), std::fs::read(&second).unwrap());
    }

    #[test]
    fn test_empty_table_is_not_exported() {
        let temp = TempDir::new().unwrap();
        let destination = temp.path().join("jsonkeyvalues/constants.json");

        assert!(!export(&ConstantsTable::new(), &destination).unwrap());
        assert!(!destination.exists());
        assert!(!destination.parent().unwrap().exists());
    }

    #[test]
    fn test_export_round_trips_through_json() {
        let table: ConstantsTable = [("quote", "say \"hi\""), ("nested.key", "v")]
            .into_iter()
            .collect();
        let temp = TempDir::new().unwrap();
        let destination = temp.path().join("constants.json");
        export(&table, &destination).unwrap();

        let parsed: std::collections::BTreeMap<String, String> =
            serde_json::from_str(&std::fs::read_to_string(&destination).unwrap()).unwrap();
        assert_eq!(&parsed, table.as_map());
    }
}
