//! Column profiling over ingested rows.
//!
//! For every column observed in any row the profiler partitions values into
//! missing (null or blank) and present, coerces present values to numbers and
//! counts the ones that do not coerce. Columns with at least one numeric value
//! additionally get a [`NumericSummary`]: min/max, mean, population standard
//! deviation, median, MAD, five percentiles and a robust outlier count.
//!
//! Outliers use the modified z-score `0.6745 * (x - median) / MAD` and are
//! only flagged when `MAD > 0`.
//!
//! # Example
//!
//! ```rust
//! use fluxguard::analyzers::profiler::ColumnProfiler;
//! use fluxguard::table::{row, Cell};
//!
//! let rows = vec![
//!     row([("latency", Cell::from(12.0))]),
//!     row([("latency", Cell::from("15"))]),
//!     row([("latency", Cell::from("n/a"))]),
//! ];
//!
//! let profile = ColumnProfiler::builder().max_rows(10_000).build().profile(&rows).unwrap();
//! let latency = &profile.columns["latency"];
//! assert_eq!(latency.count, 2);
//! assert_eq!(latency.non_numeric, 1);
//! ```

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument};

use crate::analyzers::extract::tally_columns;
use crate::analyzers::stats::{
    mad_sorted, mean, median_sorted, population_std, quantile_sorted, sorted_copy,
};
use crate::error::{FluxError, Result};
use crate::table::Row;

/// Default row cap shared by ingestion and profiling.
pub const DEFAULT_MAX_ROWS: usize = 200_000;

/// Modified z-score threshold from Iglewicz and Hoaglin.
pub const DEFAULT_OUTLIER_Z: f64 = 3.5;

const MODIFIED_Z_SCALE: f64 = 0.6745;

/// Configuration for the profiler.
#[derive(Debug, Clone, PartialEq)]
pub struct ProfilerConfig {
    /// Rows past this cap are ignored.
    pub max_rows: usize,
    /// Absolute modified z-score at or above which a value is an outlier.
    pub outlier_z_threshold: f64,
}

impl Default for ProfilerConfig {
    fn default() -> Self {
        Self {
            max_rows: DEFAULT_MAX_ROWS,
            outlier_z_threshold: DEFAULT_OUTLIER_Z,
        }
    }
}

/// Summary statistics of the numeric values of one column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NumericSummary {
    pub min: f64,
    pub max: f64,
    pub mean: f64,
    /// Population standard deviation (denominator `n`).
    pub std: f64,
    pub median: f64,
    pub mad: f64,
    pub p01: f64,
    pub p05: f64,
    pub p50: f64,
    pub p95: f64,
    pub p99: f64,
    pub outlier_count: u64,
}

/// Profile of a single column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnProfile {
    /// Number of numeric values.
    pub count: u64,
    /// Rows where the column is absent, null or blank.
    pub missing: u64,
    /// Rows with a non-blank value.
    pub nonempty: u64,
    /// Non-blank values that are not numeric.
    pub non_numeric: u64,
    /// Present when `count >= 1`.
    #[serde(flatten)]
    pub summary: Option<NumericSummary>,
}

/// Profile of a whole table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableProfile {
    /// Rows profiled, after the row cap.
    pub rows: u64,
    /// Whether the input was cut at the row cap.
    pub truncated: bool,
    pub columns: BTreeMap<String, ColumnProfile>,
}

/// Builder for [`ColumnProfiler`].
#[derive(Debug, Clone, Default)]
pub struct ColumnProfilerBuilder {
    config: ProfilerConfig,
}

impl ColumnProfilerBuilder {
    /// Set the row cap.
    pub fn max_rows(mut self, max_rows: usize) -> Self {
        self.config.max_rows = max_rows;
        self
    }

    /// Set the modified z-score outlier threshold.
    pub fn outlier_z_threshold(mut self, threshold: f64) -> Self {
        self.config.outlier_z_threshold = threshold;
        self
    }

    /// Build the profiler.
    pub fn build(self) -> ColumnProfiler {
        ColumnProfiler {
            config: self.config,
        }
    }
}

/// Computes [`TableProfile`]s from rows.
#[derive(Debug, Clone, Default)]
pub struct ColumnProfiler {
    config: ProfilerConfig,
}

impl ColumnProfiler {
    /// Create a new builder.
    pub fn builder() -> ColumnProfilerBuilder {
        ColumnProfilerBuilder::default()
    }

    /// Create a profiler with default configuration.
    pub fn new() -> Self {
        Self::builder().build()
    }

    /// Returns the active configuration.
    pub fn config(&self) -> &ProfilerConfig {
        &self.config
    }

    /// Profiles every column of `rows`.
    ///
    /// An empty table is a hard failure: an empty profile would be
    /// indistinguishable from a clean one.
    #[instrument(skip(self, rows), fields(rows = rows.len()))]
    pub fn profile(&self, rows: &[Row]) -> Result<TableProfile> {
        if self.config.max_rows == 0 {
            return Err(FluxError::config("max_rows must be at least 1"));
        }
        if !self.config.outlier_z_threshold.is_finite() || self.config.outlier_z_threshold < 0.0 {
            return Err(FluxError::config(format!(
                "outlier_z_threshold must be a non-negative number, got {}",
                self.config.outlier_z_threshold
            )));
        }
        if rows.is_empty() {
            return Err(FluxError::malformed("cannot profile an empty table"));
        }

        let truncated = rows.len() > self.config.max_rows;
        let rows = &rows[..rows.len().min(self.config.max_rows)];

        let columns: BTreeMap<String, ColumnProfile> = tally_columns(rows)
            .into_iter()
            .map(|(name, tally)| {
                let summary = self.summarize(&tally.values);
                debug!(
                    column = %name,
                    count = tally.values.len(),
                    missing = tally.missing,
                    non_numeric = tally.non_numeric,
                    "Profiled column"
                );
                let profile = ColumnProfile {
                    count: tally.values.len() as u64,
                    missing: tally.missing,
                    nonempty: tally.nonempty,
                    non_numeric: tally.non_numeric,
                    summary,
                };
                (name, profile)
            })
            .collect();

        info!(
            rows = rows.len(),
            columns = columns.len(),
            truncated,
            "Completed table profiling"
        );

        Ok(TableProfile {
            rows: rows.len() as u64,
            truncated,
            columns,
        })
    }

    /// Summarizes a column's numeric values, `None` when there are none.
    pub fn summarize(&self, values: &[f64]) -> Option<NumericSummary> {
        if values.is_empty() {
            return None;
        }
        let sorted = sorted_copy(values);
        let median = median_sorted(&sorted);
        let mad = mad_sorted(&sorted);

        let outlier_count = if mad > 0.0 {
            values
                .iter()
                .filter(|x| {
                    (MODIFIED_Z_SCALE * (*x - median) / mad).abs()
                        >= self.config.outlier_z_threshold
                })
                .count() as u64
        } else {
            0
        };

        Some(NumericSummary {
            min: sorted[0],
            max: sorted[sorted.len() - 1],
            mean: mean(values),
            std: population_std(values),
            median,
            mad,
            p01: quantile_sorted(&sorted, 0.01),
            p05: quantile_sorted(&sorted, 0.05),
            p50: quantile_sorted(&sorted, 0.50),
            p95: quantile_sorted(&sorted, 0.95),
            p99: quantile_sorted(&sorted, 0.99),
            outlier_count,
        })
    }
}
