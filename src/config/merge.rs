//! Deep merge and unflatten functions for JSON configuration values.
//!
//! Objects are merged field by field, with later values taking precedence.
//! Arrays and scalars are replaced entirely, never concatenated.

use serde_json::{Map, Value};

/// Separator between segments of a dotted key path.
pub const PATH_SEPARATOR: char = '.';

/// Deep merge two JSON values, with `overlay` taking precedence over `base`.
///
/// - Objects are merged recursively: keys in overlay override keys in base
/// - Arrays, strings, numbers, booleans and nulls are replaced entirely
/// - A null in the overlay replaces the base value like any other scalar
///
/// # Example
/// ```
/// use serde_json::json;
/// use strata_config::config::deep_merge;
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
/// assert_eq!(
///     result,
///     json!({ "server": { "port": 9000, "host": "localhost" }, "features": ["c"] })
/// );
/// ```
pub fn deep_merge(base: Value, overlay: Value) -> Value {
    match (base, overlay) {
        (Value::Object(mut base_map), Value::Object(overlay_map)) => {
            // Merge in place so overridden keys keep their original position.
            for (key, overlay_value) in overlay_map {
                match base_map.get_mut(&key) {
                    Some(slot) => {
                        let base_value = slot.take();
                        *slot = deep_merge(base_value, overlay_value);
                    }
                    None => {
                        base_map.insert(key, overlay_value);
                    }
                }
            }
            Value::Object(base_map)
        }
        (_, overlay) => overlay,
    }
}

/// Merge multiple values in order, with later values taking precedence.
///
/// The fold starts from a fresh empty object, so the result is always a new
/// value even when only one layer is given.
pub fn deep_merge_all(values: impl IntoIterator<Item = Value>) -> Value {
    values
        .into_iter()
        .fold(Value::Object(Map::new()), deep_merge)
}

/// Expand dotted top-level keys into nested objects.
///
/// `{"a.b": 1, "a.c": 2, "top": 3}` becomes `{"a": {"b": 1, "c": 2}, "top": 3}`.
/// Keys without a separator pass through unchanged, so an already nested
/// object comes back as-is. When a plain key and a dotted key address the
/// same path, the one appearing later wins.
///
/// Non-object values are returned unchanged.
pub fn unflatten(value: Value) -> Value {
    let Value::Object(flat) = value else {
        return value;
    };

    let mut nested = Value::Object(Map::new());
    for (key, value) in flat {
        let fragment = if key.contains(PATH_SEPARATOR) {
            nest_path(&key, value)
        } else {
            let mut single = Map::new();
            single.insert(key, value);
            Value::Object(single)
        };
        nested = deep_merge(nested, fragment);
    }
    nested
}

/// Build `{seg0: {seg1: {...: value}}}` for a dotted key.
fn nest_path(key: &str, value: Value) -> Value {
    key.rsplit(PATH_SEPARATOR).fold(value, |inner, segment| {
        let mut map = Map::new();
        map.insert(segment.to_string(), inner);
        Value::Object(map)
    })
}

/// Look up a dotted path in a nested object.
pub fn get_path<'a>(value: &'a Value, path: &str) -> Option<&'a Value> {
    path.split(PATH_SEPARATOR)
        .try_fold(value, |current, segment| current.as_object()?.get(segment))
}
