//! Report persistence and reproducibility audits.
//!
//! Reports are written as pretty JSON with sorted keys and floats rounded to
//! [`DEFAULT_DIGITS`] decimal digits, so two runs over the same inputs produce
//! byte-identical files despite floating-point noise.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, instrument};

use crate::error::Result;

/// Decimal digits kept in persisted reports.
pub const DEFAULT_DIGITS: i32 = 12;

// Past 2^52 every f64 is already an integer.
const EXACT_INTEGER_LIMIT: f64 = 4_503_599_627_370_496.0;

/// Rounds `x` to `digits` decimal digits, half away from zero.
///
/// Non-finite values and values too large to scale are returned unchanged.
pub fn round_to(x: f64, digits: i32) -> f64 {
    if !x.is_finite() {
        return x;
    }
    let factor = 10f64.powi(digits);
    let scaled = x * factor;
    if !scaled.is_finite() || scaled.abs() >= EXACT_INTEGER_LIMIT {
        return x;
    }
    let rounded = scaled.round() / factor;
    // Avoid serializing -0.0
    if rounded == 0.0 {
        0.0
    } else {
        rounded
    }
}

/// Rounds every floating-point number in a JSON tree. Integers are untouched.
pub fn quantize(value: Value, digits: i32) -> Value {
    match value {
        Value::Number(n) if n.is_f64() => n
            .as_f64()
            .and_then(|x| serde_json::Number::from_f64(round_to(x, digits)))
            .map_or(Value::Null, Value::Number),
        Value::Array(items) => Value::Array(items.into_iter().map(|v| quantize(v, digits)).collect()),
        Value::Object(map) => Value::Object(
            map.into_iter()
                .map(|(k, v)| (k, quantize(v, digits)))
                .collect(),
        ),
        other => other,
    }
}

/// Serializes `report` as pretty JSON with sorted keys and quantized floats,
/// terminated by a newline.
pub fn to_canonical_json<T: Serialize + ?Sized>(report: &T) -> Result<String> {
    let value = quantize(serde_json::to_value(report)?, DEFAULT_DIGITS);
    let mut text = serde_json::to_string_pretty(&value)?;
    text.push('\n');
    Ok(text)
}

/// Writes `report` to `path` in canonical form, creating parent directories.
#[instrument(skip(report), fields(path = %path.as_ref().display()))]
pub fn write_report<T: Serialize + ?Sized>(report: &T, path: impl AsRef<Path>) -> Result<()> {
    let path = path.as_ref();
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    let text = to_canonical_json(report)?;
    fs::write(path, &text)?;
    debug!(bytes = text.len(), "Wrote report");
    Ok(())
}

/// One numeric difference between two JSON documents.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NumericDiff {
    /// Dotted path with `[i]` array indices, e.g. `columns.x.ks_statistic`.
    pub path: String,
    pub left: Option<f64>,
    pub right: Option<f64>,
    /// `None` when the path exists on one side only.
    pub abs_diff: Option<f64>,
}

/// Collects every number of a JSON tree by path. Booleans are not numbers.
pub fn flatten_numbers(value: &Value) -> BTreeMap<String, f64> {
    let mut out = BTreeMap::new();
    collect_numbers(value, String::new(), &mut out);
    out
}

fn collect_numbers(value: &Value, prefix: String, out: &mut BTreeMap<String, f64>) {
    match value {
        Value::Number(n) => {
            if let Some(x) = n.as_f64() {
                out.insert(prefix, x);
            }
        }
        Value::Array(items) => {
            for (i, item) in items.iter().enumerate() {
                collect_numbers(item, format!("{prefix}[{i}]"), out);
            }
        }
        Value::Object(map) => {
            for (key, item) in map {
                let path = if prefix.is_empty() {
                    key.clone()
                } else {
                    format!("{prefix}.{key}")
                };
                collect_numbers(item, path, out);
            }
        }
        _ => {}
    }
}

/// Lists numeric paths that are missing on one side or differ by more than
/// `atol`, sorted by path.
pub fn numeric_diff(left: &Value, right: &Value, atol: f64) -> Vec<NumericDiff> {
    let a = flatten_numbers(left);
    let b = flatten_numbers(right);

    let mut paths: Vec<&String> = a.keys().chain(b.keys()).collect();
    paths.sort();
    paths.dedup();

    paths
        .into_iter()
        .filter_map(|path| {
            let (l, r) = (a.get(path).copied(), b.get(path).copied());
            let abs_diff = match (l, r) {
                (Some(x), Some(y)) => {
                    let d = (x - y).abs();
                    if d <= atol {
                        return None;
                    }
                    Some(d)
                }
                _ => None,
            };
            Some(NumericDiff {
                path: path.clone(),
                left: l,
                right: r,
                abs_diff,
            })
        })
        .collect()
}
