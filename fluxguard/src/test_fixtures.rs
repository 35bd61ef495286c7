//! Seeded synthetic tables for tests and benchmarks.
//!
//! Every generator is deterministic for a given seed.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::table::{row, Cell, Row};

/// Standard normal draw (Box-Muller).
fn standard_normal(rng: &mut StdRng) -> f64 {
    let u1: f64 = rng.random_range(f64::EPSILON..1.0);
    let u2: f64 = rng.random();
    (-2.0 * u1.ln()).sqrt() * (2.0 * std::f64::consts::PI * u2).cos()
}

/// `n` draws from `N(mean, std²)`.
pub fn gaussian_values(n: usize, mean: f64, std: f64, seed: u64) -> Vec<f64> {
    let mut rng = StdRng::seed_from_u64(seed);
    (0..n).map(|_| mean + std * standard_normal(&mut rng)).collect()
}

/// Single-column table `value` drawn from `N(mean, std²)`.
pub fn gaussian_rows(n: usize, mean: f64, std: f64, seed: u64) -> Vec<Row> {
    gaussian_values(n, mean, std, seed)
        .into_iter()
        .map(|v| row([("value", Cell::from(v))]))
        .collect()
}

/// Mixed table with a strongly correlated pair.
///
/// - `x`: standard normal
/// - `y`: `2x + 1` plus small noise
/// - `z`: independent uniform on `[0, 100)`
/// - `label`: text, never numeric
/// - `sparse`: numeric in roughly one row out of ten, missing otherwise
pub fn correlated_rows(n: usize, seed: u64) -> Vec<Row> {
    let mut rng = StdRng::seed_from_u64(seed);
    (0..n)
        .map(|i| {
            let x = standard_normal(&mut rng);
            let noise = 0.05 * standard_normal(&mut rng);
            let z: f64 = rng.random_range(0.0..100.0);
            let sparse = if rng.random_range(0..10) == 0 {
                Cell::from(rng.random_range(0.0..1.0))
            } else {
                Cell::Missing
            };
            row([
                ("x", Cell::from(x)),
                ("y", Cell::from(2.0 * x + 1.0 + noise)),
                ("z", Cell::from(z)),
                ("label", Cell::from(format!("row-{i}"))),
                ("sparse", sparse),
            ])
        })
        .collect()
}

/// Column `value` near 10 with `outliers` extreme values appended.
pub fn rows_with_outliers(n: usize, outliers: usize, seed: u64) -> Vec<Row> {
    let mut values = gaussian_values(n, 10.0, 1.0, seed);
    values.extend((0..outliers).map(|i| 1_000.0 + i as f64));
    values
        .into_iter()
        .map(|v| row([("value", Cell::from(v))]))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analyzers::stats::{mean, population_std};

    #[test]
    fn test_deterministic() {
        assert_eq!(correlated_rows(20, 7), correlated_rows(20, 7));
        assert_ne!(gaussian_values(20, 0.0, 1.0, 1), gaussian_values(20, 0.0, 1.0, 2));
    }

    #[test]
    fn test_gaussian_moments() {
        let values = gaussian_values(5_000, 5.0, 2.0, 42);
        assert!((mean(&values) - 5.0).abs() < 0.2);
        assert!((population_std(&values) - 2.0).abs() < 0.2);
    }

    #[test]
    fn test_outliers_appended() {
        let rows = rows_with_outliers(50, 3, 1);
        assert_eq!(rows.len(), 53);
        assert_eq!(rows[52]["value"], Cell::Number(1_002.0));
    }
}
