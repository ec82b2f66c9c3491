//! Hierarchical document -> flat constants.
//!
//! Converts a parsed YAML/JSON tree into dotted/indexed keys:
//! - object fields: `object1.nested.property`
//! - array elements: `object1.items[0].property`
//!
//! Numbers and booleans are stored in their canonical text, not the text
//! they were written with: YAML `version: 1.10` parses as the number `1.1`
//! and is stored as `"1.1"`. Quote a scalar (`version: "1.10"`) to keep it
//! verbatim.

use super::ConstantsTable;
use serde_json::Value;
use tracing::{debug, warn};

/// Flatten a document into a [`ConstantsTable`], one entry per non-null leaf.
///
/// Null leaves are skipped with a warning. A scalar root has no path to be
/// stored under and is skipped the same way.
pub fn flatten(document: &Value) -> ConstantsTable {
    let mut table = ConstantsTable::new();
    flatten_into(String::new(), document, &mut table);
    table
}

fn flatten_into(path: String, node: &Value, table: &mut ConstantsTable) {
    match node {
        Value::Object(fields) => {
            for (name, child) in fields {
                let child_path = if path.is_empty() {
                    name.clone()
                } else {
                    format!("{path}.{name}")
                };
                flatten_into(child_path, child, table);
            }
        }
        Value::Array(items) => {
            for (index, child) in items.iter().enumerate() {
                flatten_into(format!("{path}[{index}]"), child, table);
            }
        }
        Value::Null => {
            warn!(key = %path, "Skipping null constant");
        }
        scalar if path.is_empty() => {
            warn!(value = %scalar, "Skipping scalar constants document with no key");
        }
        Value::String(text) => {
            debug!(key = %path, "Adding constant");
            table.insert(path, text.clone());
        }
        Value::Bool(_) | Value::Number(_) => {
            debug!(key = %path, "Adding constant");
            table.insert(path, node.to_string());
        }
    }
}
