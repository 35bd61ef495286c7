//! Orchestration of a coherence run over one table.

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{info, instrument, warn};

use super::correlation::{build_correlation_graph, CorrelationGraph, MIN_CORRELATION_VALUES};
use super::drift::{DriftEngine, DriftReport};
use super::extract::numeric_columns_with_min;
use super::profiler::{ColumnProfiler, TableProfile};
use crate::error::{FluxError, Result};
use crate::table::Row;

/// Type alias for progress callback function.
pub type ProgressCallback = Arc<dyn Fn(f64) + Send + Sync>;

/// Options recorded alongside the results of a run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunOptions {
    pub profile: bool,
    pub stat_tests: bool,
}

/// Results of [`CoherenceRunner::run`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CoherenceRun {
    /// One graph per configured threshold, in configuration order.
    pub graphs: Vec<CorrelationGraph>,
    pub profile: Option<TableProfile>,
    /// Present when a drift engine is configured and a baseline was given.
    pub drift: Option<DriftReport>,
    pub options: RunOptions,
}

/// Builds correlation graphs at several thresholds and optionally profiles the
/// table and tests it for drift against a baseline.
///
/// # Example
///
/// ```rust
/// use fluxguard::analyzers::runner::CoherenceRunner;
/// use fluxguard::table::{row, Cell};
///
/// let rows: Vec<_> = (0..5)
///     .map(|i| row([("x", Cell::from(i as f64)), ("y", Cell::from(2.0 * i as f64))]))
///     .collect();
///
/// let run = CoherenceRunner::new()
///     .thresholds([0.5, 0.99])
///     .with_profile(true)
///     .run(&rows, None)
///     .unwrap();
///
/// assert_eq!(run.graphs.len(), 2);
/// assert_eq!(run.graphs[1].edges.len(), 1);
/// assert!(run.profile.is_some());
/// ```
pub struct CoherenceRunner {
    thresholds: Vec<f64>,
    profiler: Option<ColumnProfiler>,
    drift: Option<DriftEngine>,
    on_progress: Option<ProgressCallback>,
}

impl fmt::Debug for CoherenceRunner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CoherenceRunner")
            .field("thresholds", &self.thresholds)
            .field("profiler", &self.profiler)
            .field("drift", &self.drift)
            .field("on_progress", &self.on_progress.is_some())
            .finish()
    }
}

impl Default for CoherenceRunner {
    fn default() -> Self {
        Self::new()
    }
}

impl CoherenceRunner {
    /// Creates a runner with no thresholds, no profiling and no drift test.
    pub fn new() -> Self {
        Self {
            thresholds: Vec::new(),
            profiler: None,
            drift: None,
            on_progress: None,
        }
    }

    /// Adds one threshold.
    pub fn threshold(mut self, threshold: f64) -> Self {
        self.thresholds.push(threshold);
        self
    }

    /// Adds several thresholds.
    pub fn thresholds(mut self, thresholds: impl IntoIterator<Item = f64>) -> Self {
        self.thresholds.extend(thresholds);
        self
    }

    /// Enables profiling with the default profiler.
    pub fn with_profile(mut self, enabled: bool) -> Self {
        self.profiler = enabled.then(ColumnProfiler::new);
        self
    }

    /// Enables profiling with a custom profiler.
    pub fn profiler(mut self, profiler: ColumnProfiler) -> Self {
        self.profiler = Some(profiler);
        self
    }

    /// Enables drift testing against the baseline passed to [`run`](Self::run).
    pub fn with_drift(mut self, engine: DriftEngine) -> Self {
        self.drift = Some(engine);
        self
    }

    /// Sets a callback receiving progress in `[0, 1]`.
    pub fn on_progress<F>(mut self, callback: F) -> Self
    where
        F: Fn(f64) + Send + Sync + 'static,
    {
        self.on_progress = Some(Arc::new(callback));
        self
    }

    fn report_progress(&self, done: usize, total: usize) {
        if let Some(callback) = &self.on_progress {
            callback(done as f64 / total.max(1) as f64);
        }
    }

    /// Runs every configured step over `current`.
    ///
    /// # Errors
    ///
    /// Fails when no threshold is configured, when a threshold is invalid,
    /// when `current` is empty or when it has no column with at least 2
    /// numeric values.
    #[instrument(skip_all, fields(rows = current.len(), thresholds = self.thresholds.len()))]
    pub fn run(&self, current: &[Row], baseline: Option<&[Row]>) -> Result<CoherenceRun> {
        if self.thresholds.is_empty() {
            return Err(FluxError::config("at least one correlation threshold is required"));
        }
        if current.is_empty() {
            return Err(FluxError::malformed("cannot analyze an empty table"));
        }

        let total = self.thresholds.len()
            + usize::from(self.profiler.is_some())
            + usize::from(self.drift.is_some());
        let mut done = 0;

        let data = numeric_columns_with_min(current, MIN_CORRELATION_VALUES);
        let mut graphs = Vec::with_capacity(self.thresholds.len());
        for &threshold in &self.thresholds {
            graphs.push(build_correlation_graph(&data, threshold)?);
            done += 1;
            self.report_progress(done, total);
        }

        let profile = match &self.profiler {
            Some(profiler) => {
                let profile = profiler.profile(current)?;
                done += 1;
                self.report_progress(done, total);
                Some(profile)
            }
            None => None,
        };

        let drift = match (&self.drift, baseline) {
            (Some(engine), Some(baseline)) => {
                let report = engine.compare_rows(baseline, current);
                done += 1;
                self.report_progress(done, total);
                Some(report)
            }
            (Some(_), None) => {
                warn!("Drift test requested without a baseline table, skipping");
                None
            }
            _ => None,
        };

        info!(
            graphs = graphs.len(),
            profiled = profile.is_some(),
            drift = drift.is_some(),
            "Completed coherence run"
        );

        Ok(CoherenceRun {
            graphs,
            profile,
            drift,
            options: RunOptions {
                profile: self.profiler.is_some(),
                stat_tests: self.drift.is_some(),
            },
        })
    }
}
