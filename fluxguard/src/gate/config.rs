//! Gate configuration.

use std::fmt;
use std::fs;
use std::path::Path;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::signals::NullMode;
use crate::analyzers::drift::{DriftPrecision, DriftStatistic};
use crate::analyzers::profiler::DEFAULT_MAX_ROWS;
use crate::error::{FluxError, Result};

/// Default decision threshold.
pub const DEFAULT_THRESHOLD: f64 = 0.25;
/// Default target for the soak minimum score.
pub const DEFAULT_NULL_TARGET_MIN_SCORE: f64 = 0.10;
/// Default ceiling for the entropy variance.
pub const DEFAULT_VOID_VAR_LIMIT: f64 = 0.01;

/// Weights of the three violation terms. They are not normalized.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Weights {
    pub w_null: f64,
    pub w_drift: f64,
    pub w_void: f64,
}

impl Default for Weights {
    fn default() -> Self {
        Self {
            w_null: 0.3,
            w_drift: 0.4,
            w_void: 0.3,
        }
    }
}

impl Weights {
    pub fn new(w_null: f64, w_drift: f64, w_void: f64) -> Self {
        Self {
            w_null,
            w_drift,
            w_void,
        }
    }

    /// Rejects negative or non-finite weights.
    pub fn validate(&self) -> Result<()> {
        for (name, w) in [
            ("w_null", self.w_null),
            ("w_drift", self.w_drift),
            ("w_void", self.w_void),
        ] {
            if !w.is_finite() || w < 0.0 {
                return Err(FluxError::config(format!(
                    "weight {name} must be a non-negative number, got {w}"
                )));
            }
        }
        Ok(())
    }
}

impl FromStr for Weights {
    type Err = FluxError;

    /// Parses `"w_null,w_drift,w_void"`.
    fn from_str(s: &str) -> Result<Self> {
        let parts: Vec<&str> = s.split(',').map(str::trim).collect();
        let [w_null, w_drift, w_void] = parts.as_slice() else {
            return Err(FluxError::config(format!(
                "weights must be 'w_null,w_drift,w_void', got {} value(s)",
                parts.len()
            )));
        };
        let parse = |name: &str, raw: &str| {
            raw.parse::<f64>()
                .map_err(|_| FluxError::config(format!("weight {name} is not a number: '{raw}'")))
        };
        let weights = Self::new(
            parse("w_null", *w_null)?,
            parse("w_drift", *w_drift)?,
            parse("w_void", *w_void)?,
        );
        weights.validate()?;
        Ok(weights)
    }
}

impl fmt::Display for Weights {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{},{}", self.w_null, self.w_drift, self.w_void)
    }
}

/// Which drift metric feeds the drift violation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "strategy", rename_all = "snake_case")]
pub enum DriftStrategy {
    /// Largest standardized mean shift.
    #[default]
    MeanShift,
    /// KS/Wasserstein per column, reduced by `statistic`.
    Distributional {
        #[serde(default)]
        precision: DriftPrecision,
        #[serde(default)]
        statistic: DriftStatistic,
    },
}

impl DriftStrategy {
    pub fn name(&self) -> &'static str {
        match self {
            Self::MeanShift => "mean_shift",
            Self::Distributional { .. } => "distributional",
        }
    }
}

/// Configuration of the [`IncoherenceGate`](super::IncoherenceGate).
///
/// Every field has a default, so a partial JSON document is enough:
///
/// ```rust
/// use fluxguard::gate::GateConfig;
///
/// let config: GateConfig = serde_json::from_str(r#"{
///     "threshold": 0.5,
///     "drift": {"strategy": "distributional", "statistic": "max_wasserstein"}
/// }"#).unwrap();
/// assert_eq!(config.threshold, 0.5);
/// assert_eq!(config.weights.w_drift, 0.4);
/// config.validate().unwrap();
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GateConfig {
    /// `BLOCK` iff the score is strictly greater.
    pub threshold: f64,
    pub weights: Weights,
    pub null_mode: NullMode,
    pub null_target_min_score: f64,
    pub void_var_limit: f64,
    pub drift: DriftStrategy,
    /// Row cap applied to drift tables.
    pub max_rows: usize,
}

impl Default for GateConfig {
    fn default() -> Self {
        Self {
            threshold: DEFAULT_THRESHOLD,
            weights: Weights::default(),
            null_mode: NullMode::default(),
            null_target_min_score: DEFAULT_NULL_TARGET_MIN_SCORE,
            void_var_limit: DEFAULT_VOID_VAR_LIMIT,
            drift: DriftStrategy::default(),
            max_rows: DEFAULT_MAX_ROWS,
        }
    }
}

impl GateConfig {
    /// Loads a configuration from a JSON file and validates it.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&text).map_err(|e| {
            FluxError::config(format!("{}: {e}", path.display()))
        })?;
        config.validate()?;
        Ok(config)
    }

    pub fn with_threshold(mut self, threshold: f64) -> Self {
        self.threshold = threshold;
        self
    }

    pub fn with_weights(mut self, weights: Weights) -> Self {
        self.weights = weights;
        self
    }

    pub fn with_null_mode(mut self, mode: NullMode) -> Self {
        self.null_mode = mode;
        self
    }

    pub fn with_null_target_min_score(mut self, target: f64) -> Self {
        self.null_target_min_score = target;
        self
    }

    pub fn with_void_var_limit(mut self, limit: f64) -> Self {
        self.void_var_limit = limit;
        self
    }

    pub fn with_drift(mut self, drift: DriftStrategy) -> Self {
        self.drift = drift;
        self
    }

    pub fn with_max_rows(mut self, max_rows: usize) -> Self {
        self.max_rows = max_rows;
        self
    }

    /// Checks every field. Called by the gate before any computation.
    pub fn validate(&self) -> Result<()> {
        self.weights.validate()?;
        for (name, value) in [
            ("threshold", self.threshold),
            ("null_target_min_score", self.null_target_min_score),
            ("void_var_limit", self.void_var_limit),
        ] {
            if !value.is_finite() || value < 0.0 {
                return Err(FluxError::config(format!(
                    "{name} must be a non-negative number, got {value}"
                )));
            }
        }
        if self.max_rows == 0 {
            return Err(FluxError::config("max_rows must be at least 1"));
        }
        if let DriftStrategy::Distributional {
            precision: DriftPrecision::Approximate { points },
            ..
        } = self.drift
        {
            if points < 2 {
                return Err(FluxError::config(format!(
                    "drift quantile points must be at least 2, got {points}"
                )));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_weights_from_str() {
        let w: Weights = " 0.3, 0.4 ,0.3".parse().unwrap();
        assert_eq!(w, Weights::default());
        assert_eq!(w.to_string(), "0.3,0.4,0.3");
    }

    #[test]
    fn test_weights_wrong_count() {
        for raw in ["0.3,0.4", "0.1,0.2,0.3,0.4", ""] {
            let err = raw.parse::<Weights>().unwrap_err();
            assert!(err.is_configuration(), "{raw}");
        }
    }

    #[test]
    fn test_weights_invalid_values() {
        assert!("a,0.4,0.3".parse::<Weights>().is_err());
        assert!("-0.1,0.4,0.3".parse::<Weights>().is_err());
        assert!("NaN,0.4,0.3".parse::<Weights>().is_err());
    }

    #[test]
    fn test_defaults_are_valid() {
        let config = GateConfig::default();
        config.validate().unwrap();
        assert_eq!(config.threshold, 0.25);
        assert_eq!(config.null_mode, NullMode::Auto);
        assert_eq!(config.drift, DriftStrategy::MeanShift);
    }

    #[test]
    fn test_validation_failures() {
        assert!(GateConfig::default().with_threshold(-1.0).validate().is_err());
        assert!(GateConfig::default()
            .with_void_var_limit(f64::INFINITY)
            .validate()
            .is_err());
        assert!(GateConfig::default().with_max_rows(0).validate().is_err());
        assert!(GateConfig::default()
            .with_weights(Weights::new(0.3, -0.4, 0.3))
            .validate()
            .is_err());
        assert!(GateConfig::default()
            .with_drift(DriftStrategy::Distributional {
                precision: DriftPrecision::Approximate { points: 1 },
                statistic: DriftStatistic::MaxKs,
            })
            .validate()
            .is_err());
    }

    #[test]
    fn test_zero_limits_are_allowed() {
        // Degenerate targets are absorbed by safe division.
        GateConfig::default()
            .with_void_var_limit(0.0)
            .with_null_target_min_score(0.0)
            .validate()
            .unwrap();
    }

    #[test]
    fn test_drift_strategy_serde() {
        let s: DriftStrategy = serde_json::from_str(r#"{"strategy": "mean_shift"}"#).unwrap();
        assert_eq!(s, DriftStrategy::MeanShift);

        let s: DriftStrategy = serde_json::from_str(
            r#"{"strategy": "distributional", "precision": "exact", "statistic": "max_ks"}"#,
        )
        .unwrap();
        assert_eq!(
            s,
            DriftStrategy::Distributional {
                precision: DriftPrecision::Exact,
                statistic: DriftStatistic::MaxKs
            }
        );
    }

    #[test]
    fn test_from_json_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("gate.json");
        fs::write(&path, r#"{"weights": {"w_null": 1, "w_drift": 0, "w_void": 0}}"#).unwrap();
        let config = GateConfig::from_json_file(&path).unwrap();
        assert_eq!(config.weights.w_null, 1.0);

        fs::write(&path, r#"{"threshold": -2}"#).unwrap();
        assert!(GateConfig::from_json_file(&path).unwrap_err().is_configuration());
    }
}
