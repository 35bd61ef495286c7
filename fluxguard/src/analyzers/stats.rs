//! Descriptive statistics over numeric slices.
//!
//! Functions taking a `sorted` argument expect ascending order without NaN,
//! as produced by [`sorted_copy`]. Empty inputs yield `0.0` so callers never
//! observe NaN.

/// Returns an ascending copy of `values`.
pub fn sorted_copy(values: &[f64]) -> Vec<f64> {
    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);
    sorted
}

/// Magnitude above which values are rescaled before accumulation.
const RESCALE_ABOVE: f64 = 1e150;

/// Divisor that keeps sums and squared deviations of `values` finite.
pub(crate) fn rescale_factor(values: &[f64]) -> f64 {
    let peak = values.iter().fold(0.0f64, |acc, x| acc.max(x.abs()));
    if peak > RESCALE_ABOVE {
        peak
    } else {
        1.0
    }
}

/// Welford running mean and population variance of `values / scale`.
fn running_moments(values: &[f64], scale: f64) -> (f64, f64) {
    let mut m = 0.0;
    let mut m2 = 0.0;
    for (k, x) in values.iter().enumerate() {
        let x = x / scale;
        let delta = x - m;
        m += delta / (k + 1) as f64;
        m2 += delta * (x - m);
    }
    (m, (m2 / values.len() as f64).max(0.0))
}

/// Arithmetic mean, `0.0` for an empty slice.
pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let scale = rescale_factor(values);
    running_moments(values, scale).0 * scale
}

/// Population variance (denominator `n`), `0.0` for fewer than 2 values.
///
/// Saturates at `f64::MAX` when the spread itself is not representable;
/// [`population_std`] stays finite in that case.
pub fn population_variance(values: &[f64]) -> f64 {
    let std = population_std(values);
    (std * std).min(f64::MAX)
}

/// Population standard deviation, `0.0` for fewer than 2 values.
pub fn population_std(values: &[f64]) -> f64 {
    if values.len() < 2 {
        return 0.0;
    }
    let scale = rescale_factor(values);
    running_moments(values, scale).1.sqrt() * scale
}

/// Median of a sorted slice; the two middle values are averaged when the
/// length is even.
pub fn median_sorted(sorted: &[f64]) -> f64 {
    let n = sorted.len();
    if n == 0 {
        return 0.0;
    }
    let mid = n / 2;
    if n % 2 == 1 {
        sorted[mid]
    } else {
        sorted[mid - 1] / 2.0 + sorted[mid] / 2.0
    }
}

/// Median absolute deviation around the median.
pub fn mad_sorted(sorted: &[f64]) -> f64 {
    if sorted.is_empty() {
        return 0.0;
    }
    let med = median_sorted(sorted);
    let deviations: Vec<f64> = sorted.iter().map(|x| (x - med).abs()).collect();
    median_sorted(&sorted_copy(&deviations))
}

/// Quantile by linear interpolation between order statistics at
/// `position = (n - 1) * q`. `q` is clamped to `[0, 1]`.
pub fn quantile_sorted(sorted: &[f64], q: f64) -> f64 {
    let n = sorted.len();
    if n == 0 {
        return 0.0;
    }
    if q <= 0.0 || q.is_nan() {
        return sorted[0];
    }
    if q >= 1.0 {
        return sorted[n - 1];
    }
    let position = (n - 1) as f64 * q;
    let lo = position.floor() as usize;
    let hi = position.ceil() as usize;
    if lo == hi {
        return sorted[lo];
    }
    let w = position - lo as f64;
    sorted[lo] * (1.0 - w) + sorted[hi] * w
}
