//! Structural diff between two merged configuration objects.
//!
//! This module provides:
//! - A recursive diff tree keyed by property name at each nesting level
//! - Flattening of the tree into dotted-path entries
//! - Table and JSON rendering suitable for review (see [`render`])

pub mod render;

use crate::config::PATH_SEPARATOR;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Number, Value};
use std::fmt;

/// Status of a property (or of the whole object) in a diff.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DiffStatus {
    Added,
    Deleted,
    Updated,
    Equal,
}

impl DiffStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            DiffStatus::Added => "added",
            DiffStatus::Deleted => "deleted",
            DiffStatus::Updated => "updated",
            DiffStatus::Equal => "equal",
        }
    }
}

impl fmt::Display for DiffStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A changed property.
///
/// `updated` nodes whose values are both objects carry a nested `diff`
/// instead of leaf values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PropertyDiff {
    pub property: String,
    pub status: DiffStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub previous_value: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_value: Option<Value>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub diff: Vec<PropertyDiff>,
}

impl PropertyDiff {
    fn added(property: &str, current: &Value) -> Self {
        Self {
            property: property.to_string(),
            status: DiffStatus::Added,
            previous_value: None,
            current_value: Some(current.clone()),
            diff: Vec::new(),
        }
    }

    fn deleted(property: &str, previous: &Value) -> Self {
        Self {
            property: property.to_string(),
            status: DiffStatus::Deleted,
            previous_value: Some(previous.clone()),
            current_value: None,
            diff: Vec::new(),
        }
    }

    fn updated(property: &str, previous: &Value, current: &Value) -> Self {
        Self {
            property: property.to_string(),
            status: DiffStatus::Updated,
            previous_value: Some(previous.clone()),
            current_value: Some(current.clone()),
            diff: Vec::new(),
        }
    }

    fn nested(property: &str, diff: Vec<PropertyDiff>) -> Self {
        Self {
            property: property.to_string(),
            status: DiffStatus::Updated,
            previous_value: None,
            current_value: None,
            diff,
        }
    }
}

/// One row of a flattened diff.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DiffEntry {
    /// Dotted path addressing the value in the merged object
    pub path: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub previous_value: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_value: Option<Value>,
    pub status: DiffStatus,
}

/// Change counts for a diff.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct DiffSummary {
    pub added: usize,
    pub deleted: usize,
    pub updated: usize,
}

impl DiffSummary {
    pub fn total(&self) -> usize {
        self.added + self.deleted + self.updated
    }
}

/// Complete diff between two configuration objects.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ObjectDiff {
    /// `equal` when nothing differs anywhere, `updated` otherwise
    pub status: DiffStatus,
    pub diff: Vec<PropertyDiff>,
}

impl ObjectDiff {
    pub fn has_differences(&self) -> bool {
        self.status != DiffStatus::Equal
    }

    /// Flatten the tree depth-first into dotted-path entries.
    ///
    /// Intermediate containers produce no rows of their own.
    pub fn flatten(&self) -> Vec<DiffEntry> {
        let mut entries = Vec::new();
        for property in &self.diff {
            collect_entries(property, "", &mut entries);
        }
        entries
    }

    pub fn summary(&self) -> DiffSummary {
        self.flatten()
            .iter()
            .fold(DiffSummary::default(), |mut summary, entry| {
                match entry.status {
                    DiffStatus::Added => summary.added += 1,
                    DiffStatus::Deleted => summary.deleted += 1,
                    DiffStatus::Updated => summary.updated += 1,
                    DiffStatus::Equal => {}
                }
                summary
            })
    }
}

impl fmt::Display for ObjectDiff {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&render::render_table(self, "previous", "current"))
    }
}

fn collect_entries(property: &PropertyDiff, prefix: &str, entries: &mut Vec<DiffEntry>) {
    let path = if prefix.is_empty() {
        property.property.clone()
    } else {
        format!("{}{}{}", prefix, PATH_SEPARATOR, property.property)
    };

    if property.status == DiffStatus::Updated && !property.diff.is_empty() {
        for child in &property.diff {
            collect_entries(child, &path, entries);
        }
        return;
    }

    match property.status {
        DiffStatus::Added => entries.push(DiffEntry {
            path,
            previous_value: None,
            current_value: property.current_value.clone(),
            status: DiffStatus::Added,
        }),
        DiffStatus::Deleted => entries.push(DiffEntry {
            path,
            previous_value: property.previous_value.clone(),
            current_value: None,
            status: DiffStatus::Deleted,
        }),
        DiffStatus::Updated => entries.push(DiffEntry {
            path,
            previous_value: property.previous_value.clone(),
            current_value: property.current_value.clone(),
            status: DiffStatus::Updated,
        }),
        DiffStatus::Equal => {}
    }
}

/// Compare two configuration objects.
///
/// Keys are reported in `previous`'s order first, followed by keys that only
/// exist in `current`. Roots that are not both objects are compared whole;
/// a difference is reported as one `updated` entry with an empty path.
pub fn diff(previous: &Value, current: &Value) -> ObjectDiff {
    let diff = match (previous, current) {
        (Value::Object(a), Value::Object(b)) => diff_maps(a, b),
        (a, b) if json_equal(a, b) => Vec::new(),
        (a, b) => vec![PropertyDiff::updated("", a, b)],
    };

    let status = if diff.is_empty() {
        DiffStatus::Equal
    } else {
        DiffStatus::Updated
    };
    ObjectDiff { status, diff }
}

fn diff_maps(previous: &Map<String, Value>, current: &Map<String, Value>) -> Vec<PropertyDiff> {
    let mut changes = Vec::new();

    for (key, previous_value) in previous {
        match current.get(key) {
            None => changes.push(PropertyDiff::deleted(key, previous_value)),
            Some(current_value) if json_equal(previous_value, current_value) => {}
            Some(current_value) => match (previous_value, current_value) {
                (Value::Object(a), Value::Object(b)) => {
                    changes.push(PropertyDiff::nested(key, diff_maps(a, b)));
                }
                _ => changes.push(PropertyDiff::updated(key, previous_value, current_value)),
            },
        }
    }

    for (key, current_value) in current {
        if !previous.contains_key(key) {
            changes.push(PropertyDiff::added(key, current_value));
        }
    }

    changes
}

/// Exact structural equality.
///
/// Numbers compare by value with no tolerance, so `1` equals `1.0` but
/// `9007199254740993` does not equal `9007199254740992.0`.
fn json_equal(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Number(na), Value::Number(nb)) => numbers_equal(na, nb),
        (Value::Array(xs), Value::Array(ys)) => {
            xs.len() == ys.len() && xs.iter().zip(ys).all(|(x, y)| json_equal(x, y))
        }
        (Value::Object(xs), Value::Object(ys)) => {
            xs.len() == ys.len()
                && xs
                    .iter()
                    .all(|(key, x)| ys.get(key).is_some_and(|y| json_equal(x, y)))
        }
        _ => a == b,
    }
}

fn numbers_equal(a: &Number, b: &Number) -> bool {
    match (a.is_f64(), b.is_f64()) {
        (true, false) => a.as_f64().is_some_and(|f| float_equals_integer(f, b)),
        (false, true) => b.as_f64().is_some_and(|f| float_equals_integer(f, a)),
        _ => a == b,
    }
}

/// True when `f` is integral and exactly equal to the integer `n`.
fn float_equals_integer(f: f64, n: &Number) -> bool {
    // 2^63 and 2^64; `as` saturates at the bounds so they are excluded.
    const I64_END: f64 = 9_223_372_036_854_775_808.0;
    const U64_END: f64 = 18_446_744_073_709_551_616.0;

    if !f.is_finite() || f.fract() != 0.0 {
        return false;
    }
    if let Some(i) = n.as_i64() {
        (-I64_END..I64_END).contains(&f) && f as i64 == i
    } else if let Some(u) = n.as_u64() {
        (0.0..U64_END).contains(&f) && f as u64 == u
    } else {
        false
    }
}
