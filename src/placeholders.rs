//! Placeholder discovery and secret reconciliation.
//!
//! A config file marks a value that must come from the secret store with the
//! sentinel string [`PLACEHOLDER`]. Secret payloads are keyed by the dotted
//! path of each placeholder.

use crate::config::PATH_SEPARATOR;
use serde_json::{Map, Value};
use std::collections::HashSet;

/// Sentinel value marking a secret-backed key.
pub const PLACEHOLDER: &str = "<aws_secret_manager>";

/// Value written for each key of a generated secret template.
pub const TEMPLATE_VALUE: &str = "replace_with_secret";

/// Collect the dotted path of every leaf equal to [`PLACEHOLDER`].
///
/// The walk is depth-first in key order and does not descend into arrays.
pub fn find_placeholders(config: &Value) -> Vec<String> {
    let mut paths = Vec::new();
    if let Value::Object(map) = config {
        collect(map, "", &mut paths);
    }
    paths
}

fn collect(map: &Map<String, Value>, prefix: &str, paths: &mut Vec<String>) {
    for (key, value) in map {
        let path = if prefix.is_empty() {
            key.clone()
        } else {
            format!("{}{}{}", prefix, PATH_SEPARATOR, key)
        };
        match value {
            Value::String(s) if s == PLACEHOLDER => paths.push(path),
            Value::Object(nested) => collect(nested, &path, paths),
            _ => {}
        }
    }
}

/// Build a flat secret template mapping each path to [`TEMPLATE_VALUE`].
pub fn secret_template(paths: &[String]) -> Value {
    let template = paths
        .iter()
        .map(|path| (path.clone(), Value::String(TEMPLATE_VALUE.to_string())))
        .collect::<Map<_, _>>();
    Value::Object(template)
}

/// Placeholder paths that are not top-level keys of the secret payload.
///
/// Secret payloads are expected to be flat, keyed by dotted path.
pub fn missing_keys(paths: &[String], secret: &Value) -> Vec<String> {
    let present: HashSet<&str> = secret
        .as_object()
        .map(|map| map.keys().map(String::as_str).collect())
        .unwrap_or_default();

    paths
        .iter()
        .filter(|path| !present.contains(path.as_str()))
        .cloned()
        .collect()
}
