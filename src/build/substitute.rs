//! `${key}` placeholder substitution.

use crate::constants::ConstantsTable;
use regex_lite::{Captures, Regex};
use std::sync::LazyLock;
use tracing::debug;

static PLACEHOLDER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\$\{([^}]+)\}").expect("placeholder pattern is valid"));

/// Replace every `${key}` whose key is in `table` with its value.
///
/// Unknown keys are left in place verbatim. The scan is a single pass, so a
/// value that itself contains `${...}` is not expanded again.
pub fn substitute(content: &str, table: &ConstantsTable) -> String {
    PLACEHOLDER
        .replace_all(content, |caps: &Captures<'_>| match table.get(&caps[1]) {
            Some(value) => value.to_string(),
            None => {
                debug!(placeholder = &caps[0], "No constant for placeholder, leaving as-is");
                caps[0].to_string()
            }
        })
        .into_owned()
}
