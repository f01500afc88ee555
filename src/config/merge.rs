//! Field-by-field merging of configuration tiers.
//!
//! Later tiers override earlier ones key by key; arrays and scalars are
//! replaced whole.

use serde_json::Value;

/// Merge `overlay` onto `base`.
///
/// Objects merge recursively. A null in `overlay` means "not specified" and
/// keeps the base value. Anything else replaces the base value.
///
/// # Example
/// ```
/// use serde_json::json;
/// use todo_client::config::deep_merge;
///
/// let defaults = json!({ "api": { "base_url": "http://localhost/api/", "timeout_secs": 30 } });
/// let user = json!({ "api": { "timeout_secs": 5 } });
/// let merged = deep_merge(defaults, user);
/// assert_eq!(merged["api"]["base_url"], "http://localhost/api/");
/// assert_eq!(merged["api"]["timeout_secs"], 5);
/// ```
pub fn deep_merge(base: Value, overlay: Value) -> Value {
    match (base, overlay) {
        (Value::Object(mut base_map), Value::Object(overlay_map)) => {
            for (key, overlay_value) in overlay_map {
                let merged = match base_map.remove(&key) {
                    Some(base_value) => deep_merge(base_value, overlay_value),
                    None => overlay_value,
                };
                base_map.insert(key, merged);
            }
            Value::Object(base_map)
        }
        (base, Value::Null) => base,
        (_, overlay) => overlay,
    }
}

/// Fold [`deep_merge`] over tiers ordered lowest to highest priority.
pub fn deep_merge_all(values: impl IntoIterator<Item = Value>) -> Value {
    values.into_iter().fold(Value::Null, deep_merge)
}
