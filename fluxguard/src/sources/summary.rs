//! Resolution of upstream summary artifacts.
//!
//! Callers pass an explicit, ordered list of [`SummaryCandidate`]s; the first
//! candidate whose file exists and whose selected JSON value has the expected
//! shape wins. Nothing here guesses paths.
//!
//! ```rust,no_run
//! use fluxguard::sources::{resolve_summary, SoakSummary, SummaryCandidate};
//!
//! # fn example() -> fluxguard::Result<()> {
//! let candidates = [
//!     SummaryCandidate::new("nulltrace", "_ci_out/nulltrace/nulltrace_summary.json")
//!         .with_pointer("/nulltrace"),
//!     SummaryCandidate::new("nulltrace", "_ci_out/nulltrace/nulltrace_summary.json"),
//! ];
//! match resolve_summary::<SoakSummary>(&candidates)? {
//!     Some(found) => println!("{} runs from {}", found.summary.runs, found.path.display()),
//!     None => println!("soak summary not found"),
//! }
//! # Ok(())
//! # }
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, instrument};

use crate::error::{FluxError, Result};

/// One place a summary may live.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SummaryCandidate {
    /// Name recorded in reports.
    pub label: String,
    pub path: PathBuf,
    /// JSON pointer (RFC 6901) selecting a nested value, e.g. `/voidmark/summary`.
    pub pointer: Option<String>,
}

impl SummaryCandidate {
    pub fn new(label: impl Into<String>, path: impl AsRef<Path>) -> Self {
        Self {
            label: label.into(),
            path: path.as_ref().to_path_buf(),
            pointer: None,
        }
    }

    pub fn with_pointer(mut self, pointer: impl Into<String>) -> Self {
        self.pointer = Some(pointer.into());
        self
    }
}

/// A summary type that can be recognized in an arbitrary JSON value.
pub trait SummaryShape: Sized {
    /// Returns `None` when `value` does not look like this summary.
    fn from_value(value: &Value) -> Option<Self>;
}

/// A summary found by [`resolve_summary`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResolvedSummary<T> {
    pub label: String,
    pub path: PathBuf,
    pub summary: T,
}

/// Soak-test results: how many runs failed and the worst score observed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SoakSummary {
    pub runs: u64,
    pub failed_runs: u64,
    pub min_score: Option<f64>,
}

impl SummaryShape for SoakSummary {
    fn from_value(value: &Value) -> Option<Self> {
        let map = value.as_object()?;
        if !["runs", "failed_runs", "min_score"]
            .iter()
            .any(|k| map.contains_key(*k))
        {
            return None;
        }
        Some(Self {
            runs: map.get("runs").and_then(lenient_u64).unwrap_or(0),
            failed_runs: map.get("failed_runs").and_then(lenient_u64).unwrap_or(0),
            min_score: map.get("min_score").and_then(lenient_f64),
        })
    }
}

/// Entropy audit results.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntropySummary {
    pub var_entropy_bits: f64,
    pub mean_entropy_bits: Option<f64>,
}

impl SummaryShape for EntropySummary {
    fn from_value(value: &Value) -> Option<Self> {
        let map = value.as_object()?;
        let var = map.get("var_entropy_bits")?;
        Some(Self {
            var_entropy_bits: lenient_f64(var).unwrap_or(0.0),
            mean_entropy_bits: map.get("mean_entropy_bits").and_then(lenient_f64),
        })
    }
}

/// Finite number from a JSON number or numeric string.
fn lenient_f64(value: &Value) -> Option<f64> {
    let x = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }?;
    x.is_finite().then_some(x)
}

/// Non-negative integer from a JSON number or numeric string. Fractions are
/// truncated.
fn lenient_u64(value: &Value) -> Option<u64> {
    match value {
        Value::Number(n) => n
            .as_u64()
            .or_else(|| n.as_f64().filter(|x| x.is_finite() && *x >= 0.0).map(|x| x as u64)),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// Returns the first candidate that exists and matches `T`.
///
/// A missing file or a value of the wrong shape moves on to the next
/// candidate. An existing file that cannot be read or parsed is a hard error.
#[instrument(skip_all, fields(candidates = candidates.len()))]
pub fn resolve_summary<T: SummaryShape>(
    candidates: &[SummaryCandidate],
) -> Result<Option<ResolvedSummary<T>>> {
    for candidate in candidates {
        if !candidate.path.is_file() {
            debug!(path = %candidate.path.display(), "Summary candidate not found");
            continue;
        }
        let text = fs::read_to_string(&candidate.path)?;
        let document: Value = serde_json::from_str(&text).map_err(|e| {
            FluxError::malformed(format!("{}: {e}", candidate.path.display()))
        })?;

        let selected = match &candidate.pointer {
            Some(pointer) => document.pointer(pointer),
            None => Some(&document),
        };
        if let Some(summary) = selected.and_then(T::from_value) {
            debug!(label = %candidate.label, path = %candidate.path.display(), "Resolved summary");
            return Ok(Some(ResolvedSummary {
                label: candidate.label.clone(),
                path: candidate.path.clone(),
                summary,
            }));
        }
        debug!(path = %candidate.path.display(), "Summary candidate has the wrong shape");
    }
    Ok(None)
}
