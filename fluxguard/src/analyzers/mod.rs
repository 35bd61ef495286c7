//! Statistical core: extraction, profiling, correlation and drift.
//!
//! Every function in this module is a pure computation from borrowed input to
//! newly allocated output; nothing here performs I/O.
//!
//! ## Available Analyzers
//!
//! - **Extraction** (`extract`): raw rows to numeric columns, with per-column
//!   missing and non-numeric tallies
//! - **Column Profiler** (`profiler`): descriptive statistics, percentiles and
//!   robust outlier counts
//! - **Correlation** (`correlation`): pairwise Pearson correlation and the
//!   thresholded coherence graph
//! - **Drift** (`drift`): mean-shift z-scores and pluggable KS/Wasserstein
//!   two-sample tests
//! - **Runner** (`runner`): one coherence run over a table
//!
//! ## Example Usage
//!
//! ```rust
//! use fluxguard::analyzers::{build_correlation_graph, extract_numeric_columns};
//! use fluxguard::table::{row, Cell};
//!
//! let rows = vec![
//!     row([("a", Cell::from(1.0)), ("b", Cell::from(2.0))]),
//!     row([("a", Cell::from(2.0)), ("b", Cell::from(4.0))]),
//!     row([("a", Cell::from(3.0)), ("b", Cell::from(6.0))]),
//! ];
//!
//! let graph = build_correlation_graph(&extract_numeric_columns(&rows), 0.8).unwrap();
//! assert_eq!(graph.edges[0].correlation, 1.0);
//! ```

pub mod correlation;
pub mod drift;
pub mod extract;
pub mod profiler;
pub mod runner;
pub mod stats;

pub use correlation::{
    build_correlation_graph, correlation_matrix, pearson, CorrelationEdge, CorrelationGraph,
};
pub use drift::{
    mean_shift, ColumnDrift, DriftEngine, DriftPrecision, DriftReport, DriftStatistic, DriftTest,
    ExactTest, MeanShiftReport, QuantileGridTest,
};
pub use extract::{extract_numeric_columns, tally_columns, ColumnTally, NumericColumns};
pub use profiler::{
    ColumnProfile, ColumnProfiler, ColumnProfilerBuilder, NumericSummary, ProfilerConfig,
    TableProfile,
};
pub use runner::{CoherenceRun, CoherenceRunner, RunOptions};
