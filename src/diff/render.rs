//! Human-readable rendering of configuration diffs.

use super::ObjectDiff;
use comfy_table::Table;
use comfy_table::presets::UTF8_FULL;
use serde_json::Value;

/// Message printed when two configurations match.
pub const NO_DIFFERENCES: &str = "No differences found.";

/// Stringify a diff value for display.
///
/// Absent values render as an empty string, strings render unquoted,
/// integral floats drop their fraction (`1.0` renders as `1`), and objects
/// and arrays render as compact JSON.
pub fn format_value(value: Option<&Value>) -> String {
    match value {
        None => String::new(),
        Some(Value::Null) => "null".to_string(),
        Some(Value::String(s)) => s.clone(),
        Some(Value::Number(n)) => n
            .as_f64()
            .filter(|_| n.is_f64())
            .and_then(integral_float)
            .unwrap_or_else(|| n.to_string()),
        Some(v) => v.to_string(),
    }
}

/// Integer rendering of a whole float below 1e21, the point where JSON
/// number formatting switches to exponent notation.
fn integral_float(f: f64) -> Option<String> {
    (f.fract() == 0.0 && f.abs() < 1e21).then(|| format!("{}", f as i128))
}

/// Render a diff as a table with one row per changed path.
///
/// The value columns are headed by the labels of the compared sides.
pub fn render_table(diff: &ObjectDiff, previous_label: &str, current_label: &str) -> String {
    if !diff.has_differences() {
        return NO_DIFFERENCES.to_string();
    }

    let entries = diff.flatten();
    if entries.is_empty() {
        return NO_DIFFERENCES.to_string();
    }

    let mut table = Table::new();
    table.load_preset(UTF8_FULL);
    table.set_header(vec!["property", previous_label, current_label, "status"]);
    for entry in &entries {
        table.add_row(vec![
            entry.path.clone(),
            format_value(entry.previous_value.as_ref()),
            format_value(entry.current_value.as_ref()),
            entry.status.to_string(),
        ]);
    }
    table.to_string()
}
