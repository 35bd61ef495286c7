//! Property-based tests for the statistics, drift metrics and gate arithmetic.
//!
//! Each property is checked against inputs generated by proptest; failures
//! shrink to a minimal counterexample.

use fluxguard::analyzers::drift::{
    ks_statistic_sorted, wasserstein_exact, wasserstein_quantile_grid,
};
use fluxguard::analyzers::pearson;
use fluxguard::analyzers::stats::{
    mean, median_sorted, population_std, quantile_sorted, sorted_copy,
};
use fluxguard::gate::{compute_score, decide, safe_div, Decision, ViolationVector, Weights};
use fluxguard::report::round_to;
use proptest::prelude::*;

fn sample() -> impl Strategy<Value = Vec<f64>> {
    prop::collection::vec(-1_000.0f64..1_000.0, 1..60)
}

fn violation() -> impl Strategy<Value = f64> {
    0.0f64..10.0
}

fn weight() -> impl Strategy<Value = f64> {
    0.0f64..2.0
}

proptest! {
    #[test]
    fn mean_and_median_lie_within_range(values in sample()) {
        let sorted = sorted_copy(&values);
        let (lo, hi) = (sorted[0], sorted[sorted.len() - 1]);
        let m = mean(&values);
        prop_assert!(m >= lo - 1e-9 && m <= hi + 1e-9);
        let med = median_sorted(&sorted);
        prop_assert!(med >= lo && med <= hi);
        prop_assert!(population_std(&values) <= (hi - lo) + 1e-9);
    }

    #[test]
    fn std_is_shift_invariant(values in sample(), shift in -100.0f64..100.0) {
        let shifted: Vec<f64> = values.iter().map(|v| v + shift).collect();
        prop_assert!((population_std(&values) - population_std(&shifted)).abs() < 1e-6);
    }

    #[test]
    fn quantiles_are_monotone(values in sample(), a in 0.0f64..1.0, b in 0.0f64..1.0) {
        let sorted = sorted_copy(&values);
        let (qa, qb) = if a <= b { (a, b) } else { (b, a) };
        prop_assert!(quantile_sorted(&sorted, qa) <= quantile_sorted(&sorted, qb) + 1e-9);
        prop_assert_eq!(quantile_sorted(&sorted, 0.0), sorted[0]);
        prop_assert_eq!(quantile_sorted(&sorted, 1.0), sorted[sorted.len() - 1]);
    }

    #[test]
    fn ks_is_a_bounded_symmetric_distance(xs in sample(), ys in sample()) {
        let (xs, ys) = (sorted_copy(&xs), sorted_copy(&ys));
        let d = ks_statistic_sorted(&xs, &ys);
        prop_assert!((0.0..=1.0).contains(&d));
        prop_assert_eq!(d, ks_statistic_sorted(&ys, &xs));
        prop_assert_eq!(ks_statistic_sorted(&xs, &xs), 0.0);
    }

    #[test]
    fn wasserstein_is_a_symmetric_distance(xs in sample(), ys in sample()) {
        let (xs, ys) = (sorted_copy(&xs), sorted_copy(&ys));
        let exact = wasserstein_exact(&xs, &ys);
        prop_assert!(exact >= 0.0);
        prop_assert!((exact - wasserstein_exact(&ys, &xs)).abs() < 1e-9);
        prop_assert_eq!(wasserstein_exact(&xs, &xs), 0.0);

        let grid = wasserstein_quantile_grid(&xs, &ys, 101);
        prop_assert!(grid >= 0.0);
        prop_assert!((grid - wasserstein_quantile_grid(&ys, &xs, 101)).abs() < 1e-9);
    }

    #[test]
    fn exact_wasserstein_of_a_shift_is_the_shift(xs in sample(), shift in -100.0f64..100.0) {
        let xs = sorted_copy(&xs);
        let ys: Vec<f64> = xs.iter().map(|v| v + shift).collect();
        prop_assert!((wasserstein_exact(&xs, &ys) - shift.abs()).abs() < 1e-6);
    }

    #[test]
    fn pearson_is_bounded(xs in sample(), ys in sample()) {
        let r = pearson(&xs, &ys);
        prop_assert!((-1.0..=1.0).contains(&r));
    }

    #[test]
    fn safe_div_is_always_finite(num in any::<f64>(), den in any::<f64>()) {
        let q = safe_div(num, den);
        prop_assert!(q.is_finite() || num.is_nan());
        if den.abs() <= f64::EPSILON {
            prop_assert_eq!(q, 0.0);
        }
    }

    #[test]
    fn score_is_monotone_in_each_violation(
        w in (weight(), weight(), weight()),
        v in (violation(), violation(), violation()),
        bump in violation(),
    ) {
        let weights = Weights::new(w.0, w.1, w.2);
        let base = ViolationVector { v_null: v.0, v_drift: v.1, v_void: v.2 };
        let score = compute_score(&weights, &base);
        prop_assert!(score >= 0.0);

        for bumped in [
            ViolationVector { v_null: v.0 + bump, ..base },
            ViolationVector { v_drift: v.1 + bump, ..base },
            ViolationVector { v_void: v.2 + bump, ..base },
        ] {
            prop_assert!(compute_score(&weights, &bumped) >= score);
        }
    }

    #[test]
    fn decision_blocks_only_above_threshold(score in 0.0f64..5.0, threshold in 0.0f64..5.0) {
        let decision = decide(score, threshold);
        prop_assert_eq!(decision == Decision::Block, score > threshold);
        prop_assert_eq!(decide(threshold, threshold), Decision::Ok);
    }

    #[test]
    fn rounding_is_idempotent(x in -10.0f64..10.0) {
        let once = round_to(x, 12);
        prop_assert_eq!(round_to(once, 12), once);
        prop_assert!((once - x).abs() <= 6e-13);
    }
}
