//! The incoherence report: the gate's audit record.

use std::fmt;
use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::config::Weights;
use super::signals::AppliedNullMode;
use crate::analyzers::drift::{DriftReport, DriftStatistic, MeanShiftReport};

/// Gate outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Decision {
    #[serde(rename = "OK")]
    Ok,
    #[serde(rename = "BLOCK")]
    Block,
}

impl Decision {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Ok => "OK",
            Self::Block => "BLOCK",
        }
    }
}

impl fmt::Display for Decision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Normalized violations, each `>= 0`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ViolationVector {
    pub v_null: f64,
    pub v_drift: f64,
    pub v_void: f64,
}

/// Whether a component's source was available.
///
/// A `NotMeasured` component always has a zero violation, but it is not a
/// passing measurement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MeasurementStatus {
    Measured,
    NotMeasured,
}

impl MeasurementStatus {
    pub fn is_measured(&self) -> bool {
        matches!(self, Self::Measured)
    }
}

/// Where a summary was found.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceRef {
    pub label: String,
    pub path: PathBuf,
}

/// Soak ("nulltrace") component detail.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NullComponent {
    pub status: MeasurementStatus,
    pub source: Option<SourceRef>,
    pub null_mode: Option<AppliedNullMode>,
    pub runs: Option<u64>,
    pub failed_runs: Option<u64>,
    pub min_score: Option<f64>,
    pub target_min_score: f64,
    pub violation: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

/// Entropy ("voidmark") component detail.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VoidComponent {
    pub status: MeasurementStatus,
    pub source: Option<SourceRef>,
    pub var_entropy_bits: Option<f64>,
    pub limit_var_entropy_bits: f64,
    pub violation: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

/// Drift component detail.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DriftComponent {
    pub status: MeasurementStatus,
    /// `mean_shift` or `distributional`.
    pub strategy: String,
    pub baseline: Option<String>,
    pub current: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mean_shift: Option<MeanShiftReport>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub distributional: Option<DriftReport>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub statistic: Option<DriftStatistic>,
    /// Raw drift signal before clamping.
    pub signal: f64,
    pub violation: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

/// Per-component details.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Components {
    pub nulltrace: NullComponent,
    pub voidmark: VoidComponent,
    pub drift: DriftComponent,
}

/// The gate's immutable output.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IncoherenceReport {
    pub threshold: f64,
    pub weights: Weights,
    pub violations: ViolationVector,
    pub incoherence_score: f64,
    pub decision: Decision,
    pub components: Components,
    pub generated_at_utc: DateTime<Utc>,
}

impl IncoherenceReport {
    /// True when the score exceeded the threshold.
    pub fn is_block(&self) -> bool {
        self.decision == Decision::Block
    }

    /// Components whose source was not available.
    pub fn not_measured(&self) -> Vec<&'static str> {
        let mut out = Vec::new();
        if !self.components.nulltrace.status.is_measured() {
            out.push("nulltrace");
        }
        if !self.components.voidmark.status.is_measured() {
            out.push("voidmark");
        }
        if !self.components.drift.status.is_measured() {
            out.push("drift");
        }
        out
    }
}
