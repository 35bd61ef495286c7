//! Two-sample drift tests between a baseline and a current table.
//!
//! Two strategies are available:
//!
//! - [`mean_shift`]: the largest standardized shift of column means. Cheap and
//!   always applicable.
//! - [`DriftEngine`]: a distributional test per shared column, reporting the
//!   Kolmogorov-Smirnov statistic and the Wasserstein-1 distance.
//!
//! The distributional test is pluggable through [`DriftTest`]. The default
//! [`QuantileGridTest`] approximates Wasserstein-1 on a fixed quantile grid;
//! [`ExactTest`] integrates the CDF gap exactly. Both produce the same
//! [`DriftReport`] shape, ordering and column selection.
//!
//! # Example
//!
//! ```rust
//! use fluxguard::analyzers::drift::{DriftEngine, DriftPrecision, DriftStatistic};
//! use fluxguard::analyzers::extract::NumericColumns;
//!
//! let baseline: NumericColumns = [("x".to_string(), vec![1.0, 2.0, 3.0])].into();
//! let current: NumericColumns = [("x".to_string(), vec![10.0, 11.0, 12.0])].into();
//!
//! let engine = DriftEngine::new(DriftPrecision::default()).unwrap();
//! let report = engine.compare(&baseline, &current);
//! assert_eq!(report.columns["x"].ks_statistic, 1.0);
//! assert_eq!(report.summary(DriftStatistic::MaxKs), 1.0);
//! ```

pub mod ks;
pub mod mean_shift;
pub mod wasserstein;

use std::collections::BTreeMap;
use std::fmt::Debug;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument};

use crate::analyzers::extract::{extract_numeric_columns, NumericColumns};
use crate::analyzers::stats::sorted_copy;
use crate::error::{FluxError, Result};
use crate::table::Row;

pub use ks::ks_statistic_sorted;
pub use mean_shift::{mean_shift, MeanShiftReport};
pub use wasserstein::{wasserstein_exact, wasserstein_quantile_grid, DEFAULT_QUANTILE_POINTS};

/// Minimum values required on each side for a column to be tested.
pub const MIN_DRIFT_VALUES: usize = 2;

/// A two-sample distributional test over ascending samples.
pub trait DriftTest: Debug + Send + Sync {
    /// Name recorded in [`DriftReport::method`].
    fn method(&self) -> &str;

    /// KS statistic in `[0, 1]`.
    fn ks_statistic(&self, prev_sorted: &[f64], curr_sorted: &[f64]) -> f64 {
        ks_statistic_sorted(prev_sorted, curr_sorted)
    }

    /// Wasserstein-1 distance, non-negative.
    fn wasserstein_distance(&self, prev_sorted: &[f64], curr_sorted: &[f64]) -> f64;
}

/// Wasserstein-1 approximated on an evenly spaced quantile grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QuantileGridTest {
    points: usize,
}

impl QuantileGridTest {
    pub fn new(points: usize) -> Result<Self> {
        if points < 2 {
            return Err(FluxError::config(format!(
                "quantile grid needs at least 2 points, got {points}"
            )));
        }
        Ok(Self { points })
    }

    pub fn points(&self) -> usize {
        self.points
    }
}

impl Default for QuantileGridTest {
    fn default() -> Self {
        Self {
            points: DEFAULT_QUANTILE_POINTS,
        }
    }
}

impl DriftTest for QuantileGridTest {
    fn method(&self) -> &str {
        "ks+wasserstein_quantile_grid"
    }

    fn wasserstein_distance(&self, prev_sorted: &[f64], curr_sorted: &[f64]) -> f64 {
        wasserstein_quantile_grid(prev_sorted, curr_sorted, self.points)
    }
}

/// Exact Wasserstein-1 over the merged support.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ExactTest;

impl DriftTest for ExactTest {
    fn method(&self) -> &str {
        "ks+wasserstein_exact"
    }

    fn wasserstein_distance(&self, prev_sorted: &[f64], curr_sorted: &[f64]) -> f64 {
        wasserstein_exact(prev_sorted, curr_sorted)
    }
}

/// Precision of the distributional test, chosen at configuration time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DriftPrecision {
    /// Quantile-grid approximation with `points` probabilities.
    Approximate { points: usize },
    /// Exact CDF integration.
    Exact,
}

impl Default for DriftPrecision {
    fn default() -> Self {
        Self::Approximate {
            points: DEFAULT_QUANTILE_POINTS,
        }
    }
}

impl DriftPrecision {
    /// Builds the matching [`DriftTest`].
    pub fn build(&self) -> Result<Box<dyn DriftTest>> {
        Ok(match *self {
            Self::Approximate { points } => Box::new(QuantileGridTest::new(points)?),
            Self::Exact => Box::new(ExactTest),
        })
    }
}

/// How a [`DriftReport`] is reduced to one drift signal.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DriftStatistic {
    /// Largest KS statistic across columns.
    #[default]
    MaxKs,
    /// Largest Wasserstein-1 distance across columns.
    MaxWasserstein,
}

/// Drift measured on one shared column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnDrift {
    pub prev_n: usize,
    pub curr_n: usize,
    pub ks_statistic: f64,
    pub wasserstein_distance: f64,
}

/// Result of a distributional drift test.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DriftReport {
    /// Name of the test that produced the report.
    pub method: String,
    /// Tested columns, keyed and ordered by name.
    pub columns: BTreeMap<String, ColumnDrift>,
    /// Shared columns with fewer than 2 values on either side.
    pub skipped: Vec<String>,
}

impl DriftReport {
    /// Reduces the report to a single value, `0.0` when no column was tested.
    pub fn summary(&self, statistic: DriftStatistic) -> f64 {
        self.columns
            .values()
            .map(|c| match statistic {
                DriftStatistic::MaxKs => c.ks_statistic,
                DriftStatistic::MaxWasserstein => c.wasserstein_distance,
            })
            .fold(0.0, f64::max)
    }
}

/// Runs a [`DriftTest`] over every column shared by two tables.
#[derive(Debug)]
pub struct DriftEngine {
    test: Box<dyn DriftTest>,
}

impl Default for DriftEngine {
    fn default() -> Self {
        Self::with_test(Box::new(QuantileGridTest::default()))
    }
}

impl DriftEngine {
    /// Creates an engine for the given precision.
    pub fn new(precision: DriftPrecision) -> Result<Self> {
        Ok(Self::with_test(precision.build()?))
    }

    /// Creates an engine around a custom test.
    pub fn with_test(test: Box<dyn DriftTest>) -> Self {
        Self { test }
    }

    pub fn method(&self) -> &str {
        self.test.method()
    }

    /// Compares numeric columns column by column.
    #[instrument(skip_all, fields(method = self.test.method()))]
    pub fn compare(&self, baseline: &NumericColumns, current: &NumericColumns) -> DriftReport {
        let mut columns = BTreeMap::new();
        let mut skipped = Vec::new();

        for (name, prev) in baseline {
            let Some(curr) = current.get(name) else {
                continue;
            };
            if prev.len() < MIN_DRIFT_VALUES || curr.len() < MIN_DRIFT_VALUES {
                debug!(column = %name, prev_n = prev.len(), curr_n = curr.len(), "Skipping column");
                skipped.push(name.clone());
                continue;
            }

            let prev_sorted = sorted_copy(prev);
            let curr_sorted = sorted_copy(curr);
            let ks = self.test.ks_statistic(&prev_sorted, &curr_sorted);
            let wasserstein = self.test.wasserstein_distance(&prev_sorted, &curr_sorted);
            columns.insert(
                name.clone(),
                ColumnDrift {
                    prev_n: prev.len(),
                    curr_n: curr.len(),
                    ks_statistic: ks.clamp(0.0, 1.0),
                    wasserstein_distance: wasserstein.max(0.0),
                },
            );
        }

        info!(
            tested = columns.len(),
            skipped = skipped.len(),
            "Completed drift test"
        );

        DriftReport {
            method: self.test.method().to_string(),
            columns,
            skipped,
        }
    }

    /// Extracts numeric columns from both tables and compares them.
    pub fn compare_rows(&self, baseline: &[Row], current: &[Row]) -> DriftReport {
        self.compare(
            &extract_numeric_columns(baseline),
            &extract_numeric_columns(current),
        )
    }
}
