//! Deep merge of configuration mappings.
//!
//! Later sources win key by key. Mappings merge recursively; every other
//! combination (lists, scalars, null, mapping vs. scalar) is replaced outright
//! by the later value.

use crate::source::Mapping;
use serde_json::Value;

/// Deep merge two values, with `overlay` taking precedence over `base`.
///
/// # Example
/// ```
/// use serde_json::json;
/// use konfig::merge::deep_merge;
///
/// let base = json!({
///     "server": { "port": 8080, "host": "localhost" },
///     "features": ["a", "b"]
/// });
/// let overlay = json!({
///     "server": { "port": 9000 },
///     "features": ["c"]
/// });
/// let result = deep_merge(base, overlay);
/// assert_eq!(result, json!({
///     "server": { "port": 9000, "host": "localhost" },
///     "features": ["c"]
/// }));
/// ```
pub fn deep_merge(base: Value, overlay: Value) -> Value {
    match (base, overlay) {
        (Value::Object(base_map), Value::Object(overlay_map)) => {
            Value::Object(merge_mappings(base_map, overlay_map))
        }
        (_, overlay) => overlay,
    }
}

/// Merge `overlay` into `base` key by key.
pub fn merge_mappings(mut base: Mapping, overlay: Mapping) -> Mapping {
    for (key, overlay_value) in overlay {
        let merged_value = match base.remove(&key) {
            Some(base_value) => deep_merge(base_value, overlay_value),
            None => overlay_value,
        };
        base.insert(key, merged_value);
    }
    base
}

/// Fold mappings left to right; the last one wins on conflicts.
///
/// Order is taken exactly as given. An empty input yields an empty mapping.
pub fn merge_all(mappings: impl IntoIterator<Item = Mapping>) -> Mapping {
    mappings.into_iter().fold(Mapping::new(), merge_mappings)
}
