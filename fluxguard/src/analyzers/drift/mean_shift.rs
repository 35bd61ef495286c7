//! Lightweight drift metric: the largest standardized shift of column means.

use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use crate::analyzers::extract::NumericColumns;
use crate::analyzers::stats::{mean, population_std};

/// Largest `|mean(current) - mean(baseline)| / std(baseline)` across the
/// comparable columns.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MeanShiftReport {
    /// `0.0` when no column was comparable.
    pub zmax: f64,
    /// Column that produced `zmax`.
    pub column_name: Option<String>,
    /// Number of columns that yielded a finite z.
    pub compared_columns: usize,
}

/// Computes the mean-shift drift between `baseline` and `current`.
///
/// A column is comparable when it has at least 2 values on both sides, a
/// non-zero baseline standard deviation and a finite z. Ties on `zmax` keep
/// the first column in name order.
#[instrument(skip_all, fields(baseline = baseline.len(), current = current.len()))]
pub fn mean_shift(baseline: &NumericColumns, current: &NumericColumns) -> MeanShiftReport {
    let mut report = MeanShiftReport::default();

    for (name, base) in baseline {
        let Some(curr) = current.get(name) else {
            continue;
        };
        if base.len() < 2 || curr.len() < 2 {
            continue;
        }
        let sd = population_std(base);
        if sd <= 0.0 {
            continue;
        }
        let z = (mean(curr) - mean(base)).abs() / sd;
        if !z.is_finite() {
            continue;
        }

        report.compared_columns += 1;
        if report.column_name.is_none() || z > report.zmax {
            report.zmax = z;
            report.column_name = Some(name.clone());
        }
    }

    debug!(
        zmax = report.zmax,
        column = report.column_name.as_deref().unwrap_or("-"),
        compared = report.compared_columns,
        "Computed mean shift"
    );
    report
}

#[cfg(test)]
mod tests {
    use super::*;

    fn columns(entries: &[(&str, &[f64])]) -> NumericColumns {
        entries
            .iter()
            .map(|(name, values)| (name.to_string(), values.to_vec()))
            .collect()
    }

    #[test]
    fn test_picks_largest_shift() {
        // baseline std of [1, 3] is 1
        let baseline = columns(&[("a", &[1.0, 3.0]), ("b", &[0.0, 10.0])]);
        let current = columns(&[("a", &[4.0, 6.0]), ("b", &[0.0, 10.0])]);
        let report = mean_shift(&baseline, &current);
        assert!((report.zmax - 3.0).abs() < 1e-12);
        assert_eq!(report.column_name.as_deref(), Some("a"));
        assert_eq!(report.compared_columns, 2);

        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["column_name"], "a");
        assert_eq!(json["compared_columns"], 2);
        assert!(json.get("column").is_none());
    }

    #[test]
    fn test_skips_constant_baseline_and_unshared_columns() {
        let baseline = columns(&[("flat", &[5.0, 5.0, 5.0]), ("only_base", &[1.0, 2.0])]);
        let current = columns(&[("flat", &[9.0, 9.0]), ("only_curr", &[1.0, 2.0])]);
        let report = mean_shift(&baseline, &current);
        assert_eq!(report, MeanShiftReport::default());
    }

    #[test]
    fn test_no_columns() {
        let report = mean_shift(&NumericColumns::new(), &NumericColumns::new());
        assert_eq!(report.zmax, 0.0);
        assert!(report.column_name.is_none());
    }
}
