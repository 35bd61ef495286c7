//! Numeric column extraction.
//!
//! Converts raw rows into typed numeric columns. Entries that are missing,
//! boolean or unparsable are skipped per column; they are never coerced to
//! zero. Extraction never fails: a column with no numeric entries yields an
//! empty vector.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::table::{column_names, Row};

/// Numeric values per column name, in row order.
pub type NumericColumns = BTreeMap<String, Vec<f64>>;

/// Extracts every column seen in any row, keeping only values that coerce to
/// a finite number.
pub fn extract_numeric_columns(rows: &[Row]) -> NumericColumns {
    let mut columns: NumericColumns = column_names(rows)
        .into_iter()
        .map(|name| (name, Vec::new()))
        .collect();

    for row in rows {
        for (name, cell) in row {
            if let (Some(x), Some(values)) = (cell.as_f64(), columns.get_mut(name)) {
                values.push(x);
            }
        }
    }
    columns
}

/// Extracts numeric columns and keeps those with at least `min_values`
/// numeric entries.
pub fn numeric_columns_with_min(rows: &[Row], min_values: usize) -> NumericColumns {
    let mut columns = extract_numeric_columns(rows);
    columns.retain(|_, values| values.len() >= min_values);
    columns
}

/// Per-column counts gathered by the profiling extractor.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ColumnTally {
    /// Rows where the column is absent, null or blank.
    pub missing: u64,
    /// Rows where the column holds a non-blank value.
    pub nonempty: u64,
    /// Non-blank values that are not numeric.
    pub non_numeric: u64,
    /// Numeric values in row order.
    pub values: Vec<f64>,
}

/// Profiling extractor: tracks missing and non-numeric counts alongside the
/// numeric values. A row that lacks a column counts as missing for it.
pub fn tally_columns(rows: &[Row]) -> BTreeMap<String, ColumnTally> {
    let mut tallies: BTreeMap<String, ColumnTally> = column_names(rows)
        .into_iter()
        .map(|name| (name, ColumnTally::default()))
        .collect();

    for row in rows {
        for (name, tally) in tallies.iter_mut() {
            match row.get(name) {
                None => tally.missing += 1,
                Some(cell) if cell.is_missing() => tally.missing += 1,
                Some(cell) => {
                    tally.nonempty += 1;
                    match cell.as_f64() {
                        Some(x) => tally.values.push(x),
                        None => tally.non_numeric += 1,
                    }
                }
            }
        }
    }
    tallies
}
