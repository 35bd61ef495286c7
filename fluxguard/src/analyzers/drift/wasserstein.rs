//! Wasserstein-1 distance between two one-dimensional samples.
//!
//! [`wasserstein_quantile_grid`] averages the gap between the two quantile
//! functions over an evenly spaced probability grid. It is deterministic and
//! converges to the exact distance as the grid grows.
//! [`wasserstein_exact`] integrates `|F - G|` over the merged support.
//!
//! Both take ascending samples and return `0.0` if either is empty.

use crate::analyzers::stats::quantile_sorted;

/// Default number of grid probabilities for the approximation.
pub const DEFAULT_QUANTILE_POINTS: usize = 101;

/// Mean of `|Qx(q) - Qy(q)|` for `q = k / (points - 1)`, `k = 0..points`.
///
/// `points` below 2 is treated as 2.
pub fn wasserstein_quantile_grid(xs: &[f64], ys: &[f64], points: usize) -> f64 {
    if xs.is_empty() || ys.is_empty() {
        return 0.0;
    }
    let points = points.max(2);
    let last = (points - 1) as f64;
    let total: f64 = (0..points)
        .map(|k| {
            let q = k as f64 / last;
            (quantile_sorted(xs, q) - quantile_sorted(ys, q)).abs()
        })
        .sum();
    total / points as f64
}

/// Exact `∫ |F(t) - G(t)| dt` for the empirical CDFs of `xs` and `ys`.
pub fn wasserstein_exact(xs: &[f64], ys: &[f64]) -> f64 {
    let (n, m) = (xs.len(), ys.len());
    if n == 0 || m == 0 {
        return 0.0;
    }

    let mut support: Vec<f64> = xs.iter().chain(ys).copied().collect();
    support.sort_by(f64::total_cmp);

    let (mut i, mut j) = (0usize, 0usize);
    let mut total = 0.0;
    for step in support.windows(2) {
        let (a, b) = (step[0], step[1]);
        while i < n && xs[i] <= a {
            i += 1;
        }
        while j < m && ys[j] <= a {
            j += 1;
        }
        total += (i as f64 / n as f64 - j as f64 / m as f64).abs() * (b - a);
    }
    total
}
