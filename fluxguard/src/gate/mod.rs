//! Violation aggregation and the BLOCK/OK decision.
//!
//! The gate combines three independently sourced signals into one score:
//!
//! ```text
//! score = w_null * v_null + w_drift * v_drift + w_void * v_void
//! ```
//!
//! and decides `BLOCK` iff `score > threshold` (equality is `OK`).
//!
//! Configuration is validated once, in [`IncoherenceGate::new`]. After that,
//! evaluation always produces a report: a missing source contributes zero to
//! its term and is marked [`MeasurementStatus::NotMeasured`] so that "passed"
//! and "not measured" stay distinguishable.
//!
//! # Example
//!
//! ```rust
//! use fluxguard::gate::{GateConfig, GateInputs, IncoherenceGate};
//! use fluxguard::sources::{ResolvedSummary, SoakSummary};
//!
//! let gate = IncoherenceGate::new(GateConfig::default()).unwrap();
//! let inputs = GateInputs::new().with_soak(ResolvedSummary {
//!     label: "nulltrace".into(),
//!     path: "nulltrace_summary.json".into(),
//!     summary: SoakSummary { runs: 10, failed_runs: 10, min_score: None },
//! });
//!
//! let report = gate.evaluate(&inputs);
//! // 0.3 * 1.0 = 0.3 > 0.25
//! assert!(report.is_block());
//! assert_eq!(report.not_measured(), vec!["voidmark", "drift"]);
//! ```

pub mod config;
pub mod report;
pub mod signals;

use std::path::Path;

use chrono::{DateTime, SubsecRound, Utc};
use tracing::{info, instrument, warn};

use crate::analyzers::drift::{mean_shift, DriftEngine};
use crate::analyzers::extract::extract_numeric_columns;
use crate::error::Result;
use crate::sources::{read_table, EntropySummary, ReadOptions, ResolvedSummary, SoakSummary};
use crate::sources::{resolve_summary, SummaryCandidate};
use crate::table::Row;

pub use config::{DriftStrategy, GateConfig, Weights};
pub use report::{
    Components, Decision, DriftComponent, IncoherenceReport, MeasurementStatus, NullComponent,
    SourceRef, ViolationVector, VoidComponent,
};
pub use signals::{
    drift_violation, null_violation, safe_div, void_violation, AppliedNullMode, NullMode,
};

/// `Σ w · v` over the three terms.
pub fn compute_score(weights: &Weights, violations: &ViolationVector) -> f64 {
    weights.w_null * violations.v_null
        + weights.w_drift * violations.v_drift
        + weights.w_void * violations.v_void
}

/// `BLOCK` iff `score > threshold`.
pub fn decide(score: f64, threshold: f64) -> Decision {
    if score > threshold {
        Decision::Block
    } else {
        Decision::Ok
    }
}

/// Baseline and current tables for the drift term.
#[derive(Debug, Clone, PartialEq)]
pub struct DriftInput {
    pub baseline_label: String,
    pub current_label: String,
    pub baseline: Vec<Row>,
    pub current: Vec<Row>,
}

/// The already-resolved signal sources of one evaluation.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GateInputs {
    pub soak: Option<ResolvedSummary<SoakSummary>>,
    pub entropy: Option<ResolvedSummary<EntropySummary>>,
    pub drift: Option<DriftInput>,
}

impl GateInputs {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_soak(mut self, soak: ResolvedSummary<SoakSummary>) -> Self {
        self.soak = Some(soak);
        self
    }

    pub fn with_entropy(mut self, entropy: ResolvedSummary<EntropySummary>) -> Self {
        self.entropy = Some(entropy);
        self
    }

    pub fn with_drift(mut self, drift: DriftInput) -> Self {
        self.drift = Some(drift);
        self
    }

    /// Resolves both summaries from explicit candidate lists.
    pub fn resolve(
        soak_candidates: &[SummaryCandidate],
        entropy_candidates: &[SummaryCandidate],
    ) -> Result<Self> {
        Ok(Self {
            soak: resolve_summary(soak_candidates)?,
            entropy: resolve_summary(entropy_candidates)?,
            drift: None,
        })
    }

    /// Loads the drift tables when both paths are given and exist. Otherwise
    /// the drift term stays unmeasured.
    pub fn with_drift_tables(
        mut self,
        baseline: Option<&Path>,
        current: Option<&Path>,
        options: &ReadOptions,
    ) -> Result<Self> {
        match (baseline, current) {
            (Some(b), Some(c)) if b.exists() && c.exists() => {
                self.drift = Some(DriftInput {
                    baseline_label: b.display().to_string(),
                    current_label: c.display().to_string(),
                    baseline: read_table(b, options)?,
                    current: read_table(c, options)?,
                });
            }
            _ => {
                warn!(
                    baseline = ?baseline,
                    current = ?current,
                    "Drift tables not provided or missing, drift not measured"
                );
            }
        }
        Ok(self)
    }
}

/// Stateless, single-shot aggregator.
#[derive(Debug)]
pub struct IncoherenceGate {
    config: GateConfig,
    engine: Option<DriftEngine>,
}

impl IncoherenceGate {
    /// Validates `config` and builds the gate.
    pub fn new(config: GateConfig) -> Result<Self> {
        config.validate()?;
        let engine = match config.drift {
            DriftStrategy::MeanShift => None,
            DriftStrategy::Distributional { precision, .. } => Some(DriftEngine::new(precision)?),
        };
        Ok(Self { config, engine })
    }

    pub fn config(&self) -> &GateConfig {
        &self.config
    }

    /// Evaluates `inputs`, stamping the report with the current time.
    pub fn evaluate(&self, inputs: &GateInputs) -> IncoherenceReport {
        self.evaluate_at(inputs, Utc::now())
    }

    /// Evaluates `inputs` with a caller-supplied timestamp.
    #[instrument(skip_all, fields(threshold = self.config.threshold))]
    pub fn evaluate_at(&self, inputs: &GateInputs, at: DateTime<Utc>) -> IncoherenceReport {
        let nulltrace = self.null_component(inputs.soak.as_ref());
        let voidmark = self.void_component(inputs.entropy.as_ref());
        let drift = self.drift_component(inputs.drift.as_ref());

        let violations = ViolationVector {
            v_null: nulltrace.violation,
            v_drift: drift.violation,
            v_void: voidmark.violation,
        };
        let score = compute_score(&self.config.weights, &violations);
        let decision = decide(score, self.config.threshold);

        info!(
            v_null = violations.v_null,
            v_drift = violations.v_drift,
            v_void = violations.v_void,
            score,
            decision = %decision,
            "Evaluated incoherence"
        );

        IncoherenceReport {
            threshold: self.config.threshold,
            weights: self.config.weights,
            violations,
            incoherence_score: score,
            decision,
            components: Components {
                nulltrace,
                voidmark,
                drift,
            },
            generated_at_utc: at.trunc_subsecs(0),
        }
    }

    fn null_component(&self, soak: Option<&ResolvedSummary<SoakSummary>>) -> NullComponent {
        let target = self.config.null_target_min_score;
        match soak {
            Some(found) => {
                let (violation, mode) = null_violation(&found.summary, self.config.null_mode, target);
                NullComponent {
                    status: MeasurementStatus::Measured,
                    source: Some(source_ref(found)),
                    null_mode: Some(mode),
                    runs: Some(found.summary.runs),
                    failed_runs: Some(found.summary.failed_runs),
                    min_score: found.summary.min_score,
                    target_min_score: target,
                    violation,
                    note: None,
                }
            }
            None => NullComponent {
                status: MeasurementStatus::NotMeasured,
                source: None,
                null_mode: None,
                runs: None,
                failed_runs: None,
                min_score: None,
                target_min_score: target,
                violation: 0.0,
                note: Some("nulltrace summary not found".to_string()),
            },
        }
    }

    fn void_component(&self, entropy: Option<&ResolvedSummary<EntropySummary>>) -> VoidComponent {
        let limit = self.config.void_var_limit;
        match entropy {
            Some(found) => VoidComponent {
                status: MeasurementStatus::Measured,
                source: Some(source_ref(found)),
                var_entropy_bits: Some(found.summary.var_entropy_bits),
                limit_var_entropy_bits: limit,
                violation: void_violation(found.summary.var_entropy_bits, limit),
                note: None,
            },
            None => VoidComponent {
                status: MeasurementStatus::NotMeasured,
                source: None,
                var_entropy_bits: None,
                limit_var_entropy_bits: limit,
                violation: 0.0,
                note: Some("voidmark summary not found".to_string()),
            },
        }
    }

    fn drift_component(&self, input: Option<&DriftInput>) -> DriftComponent {
        let strategy = self.config.drift.name().to_string();
        let Some(input) = input else {
            return DriftComponent {
                status: MeasurementStatus::NotMeasured,
                strategy,
                baseline: None,
                current: None,
                mean_shift: None,
                distributional: None,
                statistic: None,
                signal: 0.0,
                violation: 0.0,
                note: Some("no baseline/current table provided, drift set to 0".to_string()),
            };
        };

        let cap = self.config.max_rows;
        let baseline = extract_numeric_columns(&input.baseline[..input.baseline.len().min(cap)]);
        let current = extract_numeric_columns(&input.current[..input.current.len().min(cap)]);

        let mut component = DriftComponent {
            status: MeasurementStatus::Measured,
            strategy,
            baseline: Some(input.baseline_label.clone()),
            current: Some(input.current_label.clone()),
            mean_shift: None,
            distributional: None,
            statistic: None,
            signal: 0.0,
            violation: 0.0,
            note: None,
        };

        match (&self.engine, self.config.drift) {
            (Some(engine), DriftStrategy::Distributional { statistic, .. }) => {
                let report = engine.compare(&baseline, &current);
                component.signal = report.summary(statistic);
                component.statistic = Some(statistic);
                component.distributional = Some(report);
            }
            _ => {
                let report = mean_shift(&baseline, &current);
                component.signal = report.zmax;
                component.mean_shift = Some(report);
            }
        }
        component.violation = drift_violation(component.signal);
        component
    }
}

fn source_ref<T>(found: &ResolvedSummary<T>) -> SourceRef {
    SourceRef {
        label: found.label.clone(),
        path: found.path.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analyzers::drift::{DriftPrecision, DriftStatistic};
    use crate::table::{row, Cell};

    fn soak(runs: u64, failed_runs: u64, min_score: Option<f64>) -> ResolvedSummary<SoakSummary> {
        ResolvedSummary {
            label: "nulltrace".to_string(),
            path: "nulltrace_summary.json".into(),
            summary: SoakSummary {
                runs,
                failed_runs,
                min_score,
            },
        }
    }

    fn entropy(var: f64) -> ResolvedSummary<EntropySummary> {
        ResolvedSummary {
            label: "voidmark".to_string(),
            path: "voidmark_summary.json".into(),
            summary: EntropySummary {
                var_entropy_bits: var,
                mean_entropy_bits: None,
            },
        }
    }

    fn table(values: &[f64]) -> Vec<Row> {
        values.iter().map(|v| row([("x", Cell::from(*v))])).collect()
    }

    #[test]
    fn test_score_and_decision() {
        let weights = Weights::new(0.3, 0.4, 0.3);
        let v = ViolationVector {
            v_null: 0.4,
            v_drift: 0.5,
            v_void: 0.2,
        };
        let score = compute_score(&weights, &v);
        assert!((score - 0.38).abs() < 1e-12);
        assert_eq!(decide(score, 0.25), Decision::Block);
        assert_eq!(decide(0.25, 0.25), Decision::Ok);
    }

    #[test]
    fn test_invalid_config_fails_fast() {
        let err = IncoherenceGate::new(GateConfig::default().with_threshold(f64::NAN)).unwrap_err();
        assert!(err.is_configuration());
    }

    #[test]
    fn test_nothing_measured() {
        let gate = IncoherenceGate::new(GateConfig::default()).unwrap();
        let report = gate.evaluate(&GateInputs::new());
        assert_eq!(report.incoherence_score, 0.0);
        assert_eq!(report.decision, Decision::Ok);
        assert_eq!(report.not_measured(), vec!["nulltrace", "voidmark", "drift"]);
        assert!(report.components.nulltrace.note.is_some());
    }

    #[test]
    fn test_measured_zero_is_not_unmeasured() {
        let gate = IncoherenceGate::new(GateConfig::default()).unwrap();
        let report = gate.evaluate(&GateInputs::new().with_soak(soak(10, 0, None)));
        assert_eq!(report.violations.v_null, 0.0);
        assert_eq!(report.components.nulltrace.status, MeasurementStatus::Measured);
        assert_eq!(
            report.components.nulltrace.null_mode,
            Some(AppliedNullMode::FailedRatio)
        );
    }

    #[test]
    fn test_mean_shift_drift() {
        let gate = IncoherenceGate::new(GateConfig::default()).unwrap();
        let inputs = GateInputs::new().with_drift(DriftInput {
            baseline_label: "base".into(),
            current_label: "curr".into(),
            // mean 2, population std 1
            baseline: table(&[1.0, 3.0]),
            current: table(&[4.0, 4.0]),
        });
        let report = gate.evaluate(&inputs);
        let drift = &report.components.drift;
        assert_eq!(drift.status, MeasurementStatus::Measured);
        assert_eq!(drift.strategy, "mean_shift");
        assert!((drift.violation - 2.0).abs() < 1e-12);
        assert_eq!(drift.mean_shift.as_ref().unwrap().column_name.as_deref(), Some("x"));
        assert!((report.incoherence_score - 0.8).abs() < 1e-12);
    }

    #[test]
    fn test_distributional_drift() {
        let config = GateConfig::default().with_drift(DriftStrategy::Distributional {
            precision: DriftPrecision::Exact,
            statistic: DriftStatistic::MaxKs,
        });
        let gate = IncoherenceGate::new(config).unwrap();
        let inputs = GateInputs::new().with_drift(DriftInput {
            baseline_label: "base".into(),
            current_label: "curr".into(),
            baseline: table(&[1.0, 2.0, 3.0]),
            current: table(&[10.0, 11.0, 12.0]),
        });
        let report = gate.evaluate(&inputs);
        assert_eq!(report.violations.v_drift, 1.0);
        assert_eq!(report.components.drift.statistic, Some(DriftStatistic::MaxKs));
        assert!(report.components.drift.distributional.is_some());
    }

    #[test]
    fn test_all_components() {
        let gate = IncoherenceGate::new(GateConfig::default()).unwrap();
        let inputs = GateInputs::new()
            .with_soak(soak(10, 2, Some(0.05)))
            .with_entropy(entropy(0.02));
        let report = gate.evaluate(&inputs);
        // v_null = (0.10 - 0.05) / 0.10, v_void = (0.02 - 0.01) / 0.01
        assert!((report.violations.v_null - 0.5).abs() < 1e-12);
        assert!((report.violations.v_void - 1.0).abs() < 1e-12);
        assert!((report.incoherence_score - 0.45).abs() < 1e-12);
        assert!(report.is_block());
    }

    #[test]
    fn test_missing_drift_paths_leave_drift_unmeasured() {
        let inputs = GateInputs::new()
            .with_drift_tables(
                Some(Path::new("no/such/base.csv")),
                None,
                &ReadOptions::default(),
            )
            .unwrap();
        assert!(inputs.drift.is_none());
    }
}
