//! Row and cell types shared by every stage of the pipeline.
//!
//! Ingestion normalizes every physical format into a sequence of [`Row`]s.
//! A row maps column names to [`Cell`]s; rows share no fixed schema and the
//! set of columns in a table is the union of the keys of all its rows.
//!
//! # Numeric coercion
//!
//! | Cell | Numeric value |
//! |------|---------------|
//! | `Missing` | never |
//! | `Bool(_)` | never (`true`/`false` are not read as 1/0) |
//! | `Number(x)` | `x` when finite |
//! | `Text(s)` | `s.trim()` parsed as `f64` when the result is finite |
//!
//! A cell is *missing* when it is `Missing` or blank text.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

/// A single raw value in a row.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Cell {
    /// Null or absent value.
    #[default]
    Missing,
    /// Boolean value. Never coerced to a number.
    Bool(bool),
    /// Numeric value.
    Number(f64),
    /// Textual value, possibly numeric-looking.
    Text(String),
}

impl Cell {
    /// Returns true for `Missing` and for blank text.
    pub fn is_missing(&self) -> bool {
        match self {
            Cell::Missing => true,
            Cell::Text(s) => s.trim().is_empty(),
            _ => false,
        }
    }

    /// Converts the cell to a finite `f64`, following the coercion table of
    /// this module.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Cell::Number(x) if x.is_finite() => Some(*x),
            Cell::Text(s) => s.trim().parse::<f64>().ok().filter(|x| x.is_finite()),
            _ => None,
        }
    }
}

impl From<f64> for Cell {
    fn from(value: f64) -> Self {
        Cell::Number(value)
    }
}

impl From<i64> for Cell {
    fn from(value: i64) -> Self {
        Cell::Number(value as f64)
    }
}

impl From<bool> for Cell {
    fn from(value: bool) -> Self {
        Cell::Bool(value)
    }
}

impl From<&str> for Cell {
    fn from(value: &str) -> Self {
        Cell::Text(value.to_string())
    }
}

impl From<String> for Cell {
    fn from(value: String) -> Self {
        Cell::Text(value)
    }
}

impl<T: Into<Cell>> From<Option<T>> for Cell {
    fn from(value: Option<T>) -> Self {
        value.map_or(Cell::Missing, Into::into)
    }
}

impl From<serde_json::Value> for Cell {
    fn from(value: serde_json::Value) -> Self {
        use serde_json::Value;
        match value {
            Value::Null => Cell::Missing,
            Value::Bool(b) => Cell::Bool(b),
            Value::Number(n) => n.as_f64().map_or(Cell::Missing, Cell::Number),
            Value::String(s) => Cell::Text(s),
            nested @ (Value::Array(_) | Value::Object(_)) => Cell::Text(nested.to_string()),
        }
    }
}

/// One record of a table.
pub type Row = BTreeMap<String, Cell>;

/// Builds a row from `(column, value)` pairs.
///
/// ```rust
/// use fluxguard::table::{row, Cell};
///
/// let r = row([("age", Cell::from(42.0)), ("name", Cell::from("ada"))]);
/// assert_eq!(r["age"].as_f64(), Some(42.0));
/// ```
pub fn row<K, I>(cells: I) -> Row
where
    K: Into<String>,
    I: IntoIterator<Item = (K, Cell)>,
{
    cells.into_iter().map(|(k, v)| (k.into(), v)).collect()
}

/// Returns the union of all column names, in sorted order.
pub fn column_names(rows: &[Row]) -> BTreeSet<String> {
    rows.iter().flat_map(|r| r.keys().cloned()).collect()
}
