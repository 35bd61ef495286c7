//! Pairwise Pearson correlation and the thresholded coherence graph.
//!
//! Pairing is positional: two columns are compared over the index-aligned
//! prefix of length `min(len(a), len(b))`. Callers that need semantic pairing
//! must align rows before extraction.

use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use crate::analyzers::extract::NumericColumns;
use crate::analyzers::stats::rescale_factor;
use crate::error::{FluxError, Result};
use crate::report::round_to;

/// Minimum numeric values for a column to take part in correlation.
pub const MIN_CORRELATION_VALUES: usize = 2;

/// Digits kept for correlation values stored on edges.
const EDGE_DIGITS: i32 = 12;

/// Pearson correlation over the aligned prefix of `x` and `y`.
///
/// Returns `0.0` when fewer than 2 pairs exist or either side has zero
/// variance over the prefix.
pub fn pearson(x: &[f64], y: &[f64]) -> f64 {
    pearson_aligned(x, y).unwrap_or(0.0)
}

/// Like [`pearson`] but `None` when the correlation is undefined.
fn pearson_aligned(x: &[f64], y: &[f64]) -> Option<f64> {
    let n = x.len().min(y.len());
    if n < 2 {
        return None;
    }
    let (x, y) = (&x[..n], &y[..n]);
    // Correlation is scale free; rescaling keeps squared deviations finite.
    let (sx, sy) = (rescale_factor(x), rescale_factor(y));
    let mx = x.iter().map(|a| a / sx).sum::<f64>() / n as f64;
    let my = y.iter().map(|b| b / sy).sum::<f64>() / n as f64;

    let mut vx = 0.0;
    let mut vy = 0.0;
    let mut cov = 0.0;
    for (a, b) in x.iter().zip(y) {
        let dx = a / sx - mx;
        let dy = b / sy - my;
        vx += dx * dx;
        vy += dy * dy;
        cov += dx * dy;
    }
    if vx <= 0.0 || vy <= 0.0 {
        return None;
    }
    let r = cov / (vx.sqrt() * vy.sqrt());
    r.is_finite().then(|| r.clamp(-1.0, 1.0))
}

/// An edge between two correlated columns.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CorrelationEdge {
    pub column_a: String,
    pub column_b: String,
    /// Pearson correlation rounded to 12 decimal digits.
    pub correlation: f64,
}

/// Columns as nodes, correlated pairs as edges.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CorrelationGraph {
    /// Every eligible column, sorted by name.
    pub nodes: Vec<String>,
    /// Pairs with `|correlation| >= threshold`, in sorted pair order.
    pub edges: Vec<CorrelationEdge>,
    pub threshold: f64,
}

impl CorrelationGraph {
    /// Returns the edge between `a` and `b` in either order.
    pub fn edge(&self, a: &str, b: &str) -> Option<&CorrelationEdge> {
        self.edges.iter().find(|e| {
            (e.column_a == a && e.column_b == b) || (e.column_a == b && e.column_b == a)
        })
    }
}

/// Builds the correlation graph of `columns` at `threshold`.
///
/// Columns with fewer than 2 values are not nodes. Pairs whose correlation is
/// undefined (zero variance) never produce an edge, whatever the threshold.
///
/// # Errors
///
/// - [`FluxError::Configuration`] when `threshold` is negative or not finite.
/// - [`FluxError::NoNumericColumns`] when no column qualifies.
#[instrument(skip(columns), fields(columns = columns.len()))]
pub fn build_correlation_graph(columns: &NumericColumns, threshold: f64) -> Result<CorrelationGraph> {
    if !threshold.is_finite() || threshold < 0.0 {
        return Err(FluxError::config(format!(
            "correlation threshold must be a non-negative number, got {threshold}"
        )));
    }

    let eligible: Vec<(&String, &Vec<f64>)> = columns
        .iter()
        .filter(|(_, values)| values.len() >= MIN_CORRELATION_VALUES)
        .collect();
    if eligible.is_empty() {
        return Err(FluxError::NoNumericColumns {
            min_values: MIN_CORRELATION_VALUES,
        });
    }

    let mut edges = Vec::new();
    for (i, (name_a, a)) in eligible.iter().enumerate() {
        for (name_b, b) in &eligible[i + 1..] {
            let Some(r) = pearson_aligned(a, b) else {
                continue;
            };
            if r.abs() >= threshold {
                edges.push(CorrelationEdge {
                    column_a: (*name_a).clone(),
                    column_b: (*name_b).clone(),
                    correlation: round_to(r, EDGE_DIGITS),
                });
            }
        }
    }

    debug!(
        nodes = eligible.len(),
        edges = edges.len(),
        threshold,
        "Built correlation graph"
    );

    Ok(CorrelationGraph {
        nodes: eligible.into_iter().map(|(name, _)| name.clone()).collect(),
        edges,
        threshold,
    })
}

/// Full symmetric correlation matrix over columns with at least 2 values.
/// The diagonal is `1.0`; undefined pairs are `0.0`.
pub fn correlation_matrix(columns: &NumericColumns) -> (Vec<String>, Vec<Vec<f64>>) {
    let eligible: Vec<(&String, &Vec<f64>)> = columns
        .iter()
        .filter(|(_, values)| values.len() >= MIN_CORRELATION_VALUES)
        .collect();

    let matrix = eligible
        .iter()
        .enumerate()
        .map(|(i, (_, a))| {
            eligible
                .iter()
                .enumerate()
                .map(|(j, (_, b))| if i == j { 1.0 } else { pearson(a, b) })
                .collect()
        })
        .collect();

    let labels = eligible.into_iter().map(|(name, _)| name.clone()).collect();
    (labels, matrix)
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
    fn test_pearson_perfect_positive() {
        assert!((pearson(&[1.0, 2.0, 3.0], &[2.0, 4.0, 6.0]) - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_pearson_perfect_negative() {
        assert!((pearson(&[1.0, 2.0, 3.0], &[3.0, 2.0, 1.0]) + 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_pearson_at_extreme_magnitudes() {
        let x = [1e160, 2e160, 3e160];
        let y = [2e160, 4e160, 6e160];
        assert!((pearson(&x, &y) - 1.0).abs() < 1e-12);
        assert!((pearson(&x, &[1.0, 2.0, 3.0]) - 1.0).abs() < 1e-12);
        assert!((pearson(&[-1e308, 0.0, 1e308], &[3.0, 2.0, 1.0]) + 1.0).abs() < 1e-12);

        let graph = build_correlation_graph(&columns(&[("x", &x), ("y", &y)]), 0.9).unwrap();
        assert_eq!(graph.edge("x", "y").map(|e| e.correlation), Some(1.0));
    }

    #[test]
    fn test_pearson_zero_variance() {
        assert_eq!(pearson(&[1.0, 2.0, 3.0], &[5.0, 5.0, 5.0]), 0.0);
    }

    #[test]
    fn test_pearson_too_few_pairs() {
        assert_eq!(pearson(&[1.0], &[2.0, 3.0]), 0.0);
        assert_eq!(pearson(&[], &[]), 0.0);
    }

    #[test]
    fn test_pearson_uses_aligned_prefix() {
        // Only the first three positions of y are paired with x.
        let r = pearson(&[1.0, 2.0, 3.0], &[1.0, 2.0, 3.0, -100.0]);
        assert!((r - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_graph_edges_and_nodes() {
        let data = columns(&[
            ("x", &[1.0, 2.0, 3.0, 4.0]),
            ("y", &[2.0, 4.0, 6.0, 8.0]),
            ("z", &[4.0, 1.0, 3.0, 2.0]),
            ("single", &[1.0]),
        ]);
        let graph = build_correlation_graph(&data, 0.9).unwrap();

        assert_eq!(graph.nodes, vec!["x", "y", "z"]);
        assert_eq!(graph.edges.len(), 1);
        let edge = graph.edge("y", "x").unwrap();
        assert_eq!(edge.column_a, "x");
        assert_eq!(edge.column_b, "y");
        assert_eq!(edge.correlation, 1.0);
        assert_eq!(graph.threshold, 0.9);
    }

    #[test]
    fn test_no_self_pairs() {
        let data = columns(&[("x", &[1.0, 2.0, 3.0])]);
        let graph = build_correlation_graph(&data, 0.0).unwrap();
        assert_eq!(graph.nodes, vec!["x"]);
        assert!(graph.edges.is_empty());
    }

    #[test]
    fn test_zero_variance_never_produces_edge() {
        let data = columns(&[("x", &[1.0, 2.0, 3.0]), ("c", &[5.0, 5.0, 5.0])]);
        let graph = build_correlation_graph(&data, 0.0).unwrap();
        assert_eq!(graph.nodes.len(), 2);
        assert!(graph.edges.is_empty());
    }

    #[test]
    fn test_no_numeric_columns_is_an_error() {
        let data = columns(&[("x", &[1.0]), ("y", &[])]);
        let err = build_correlation_graph(&data, 0.5).unwrap_err();
        assert!(matches!(err, FluxError::NoNumericColumns { min_values: 2 }));
    }

    #[test]
    fn test_invalid_threshold() {
        let data = columns(&[("x", &[1.0, 2.0])]);
        assert!(build_correlation_graph(&data, -0.1).unwrap_err().is_configuration());
        assert!(build_correlation_graph(&data, f64::NAN)
            .unwrap_err()
            .is_configuration());
    }

    #[test]
    fn test_correlation_matrix() {
        let data = columns(&[("a", &[1.0, 2.0, 3.0]), ("b", &[3.0, 2.0, 1.0])]);
        let (labels, matrix) = correlation_matrix(&data);
        assert_eq!(labels, vec!["a", "b"]);
        assert_eq!(matrix[0][0], 1.0);
        assert!((matrix[0][1] + 1.0).abs() < 1e-12);
        assert_eq!(matrix[0][1], matrix[1][0]);
    }
}
