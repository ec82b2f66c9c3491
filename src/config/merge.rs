//! Field-by-field merging of configuration tiers.
//!
//! Tiers are held as `serde_json::Value` trees. Objects merge recursively;
//! arrays and scalars from a higher tier replace the lower tier's value.

use serde_json::Value;

/// Overlay `overlay` onto `base` in place.
///
/// A null in `overlay` means "not specified" and leaves `base` untouched.
pub fn overlay_in_place(base: &mut Value, overlay: Value) {
    match (base, overlay) {
        (_, Value::Null) => {}
        (Value::Object(base_map), Value::Object(overlay_map)) => {
            for (key, value) in overlay_map {
                match base_map.get_mut(&key) {
                    Some(existing) => overlay_in_place(existing, value),
                    None if value.is_null() => {}
                    None => {
                        base_map.insert(key, value);
                    }
                }
            }
        }
        (slot, value) => *slot = value,
    }
}

/// Merge tiers from lowest to highest precedence.
pub fn merge_tiers(tiers: impl IntoIterator<Item = Value>) -> Value {
    let mut merged = Value::Null;
    for tier in tiers {
        if merged.is_null() {
            merged = tier;
        } else {
            overlay_in_place(&mut merged, tier);
        }
    }
    merged
}
