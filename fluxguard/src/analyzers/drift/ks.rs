//! Two-sample Kolmogorov-Smirnov statistic.

/// Supremum of `|F(t) - G(t)|` over the empirical CDFs of two ascending
/// samples.
///
/// The sweep consumes every copy of the current smallest value on both sides
/// before measuring, so tied values step both CDFs together. Returns `0.0`
/// when either sample is empty.
pub fn ks_statistic_sorted(xs: &[f64], ys: &[f64]) -> f64 {
    let (n, m) = (xs.len(), ys.len());
    if n == 0 || m == 0 {
        return 0.0;
    }

    let (mut i, mut j) = (0usize, 0usize);
    let mut d: f64 = 0.0;
    while i < n && j < m {
        let v = xs[i].min(ys[j]);
        while i < n && xs[i] <= v {
            i += 1;
        }
        while j < m && ys[j] <= v {
            j += 1;
        }
        d = d.max((i as f64 / n as f64 - j as f64 / m as f64).abs());
    }
    d.clamp(0.0, 1.0)
}
