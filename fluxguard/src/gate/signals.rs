//! Normalization of raw signals into non-negative violations.
//!
//! A violation measures how far a signal is past its target: `0.0` means
//! compliant and there is no upper bound. Every division goes through
//! [`safe_div`] so a degenerate target or limit yields `0.0` instead of an
//! infinite violation.

use serde::{Deserialize, Serialize};

use crate::sources::SoakSummary;

/// `num / den`, or `0.0` when `|den|` is within machine epsilon of zero or
/// the quotient is not finite.
pub fn safe_div(num: f64, den: f64) -> f64 {
    if !den.is_finite() || den.abs() <= f64::EPSILON {
        return 0.0;
    }
    let q = num / den;
    if q.is_finite() {
        q
    } else {
        0.0
    }
}

/// How the soak signal is turned into a violation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NullMode {
    /// Shortfall when a minimum score is available, failure ratio otherwise.
    #[default]
    Auto,
    /// `failed_runs / runs`.
    FailedRatio,
    /// `(target - min_score) / target`, floored at zero. Falls back to the
    /// failure ratio when the summary carries no score.
    MinScore,
}

/// The formula actually applied to a soak summary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AppliedNullMode {
    FailedRatio,
    MinScore,
}

/// Violation of a soak summary, with the formula that produced it.
pub fn null_violation(summary: &SoakSummary, mode: NullMode, target_min_score: f64) -> (f64, AppliedNullMode) {
    match (mode, summary.min_score) {
        (NullMode::Auto | NullMode::MinScore, Some(min_score)) => {
            let shortfall = safe_div(target_min_score - min_score, target_min_score);
            (shortfall.max(0.0), AppliedNullMode::MinScore)
        }
        _ => {
            let ratio = if summary.runs > 0 {
                safe_div(summary.failed_runs as f64, summary.runs as f64)
            } else {
                0.0
            };
            (ratio.max(0.0), AppliedNullMode::FailedRatio)
        }
    }
}

/// Relative overage of the entropy variance over its ceiling.
pub fn void_violation(var_entropy_bits: f64, limit: f64) -> f64 {
    safe_div(var_entropy_bits - limit, limit).max(0.0)
}

/// Drift signal floored at zero; non-finite signals count as zero.
pub fn drift_violation(signal: f64) -> f64 {
    if signal.is_finite() {
        signal.max(0.0)
    } else {
        0.0
    }
}
