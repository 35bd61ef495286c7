//! # FluxGuard - Statistical integrity gate for data pipelines
//!
//! FluxGuard profiles tabular data, builds correlation graphs, measures
//! distributional drift against a baseline, and folds independently sourced
//! quality signals into one weighted incoherence score with a BLOCK/OK
//! decision for CI.
//!
//! ## Quick Start
//!
//! ```rust
//! use fluxguard::analyzers::CoherenceRunner;
//! use fluxguard::table::{row, Cell};
//!
//! # fn example() -> fluxguard::Result<()> {
//! let rows: Vec<_> = (0..10)
//!     .map(|i| {
//!         let x = f64::from(i);
//!         row([("x", Cell::from(x)), ("y", Cell::from(2.0 * x + 1.0))])
//!     })
//!     .collect();
//!
//! let run = CoherenceRunner::new()
//!     .threshold(0.5)
//!     .with_profile(true)
//!     .run(&rows, None)?;
//!
//! assert_eq!(run.graphs[0].edges.len(), 1);
//! assert_eq!(run.graphs[0].edges[0].correlation, 1.0);
//! # Ok(())
//! # }
//! # example().unwrap();
//! ```
//!
//! ## The gate
//!
//! ```rust
//! use fluxguard::gate::{GateConfig, GateInputs, IncoherenceGate, Weights};
//!
//! # fn example() -> fluxguard::Result<()> {
//! let config = GateConfig::default()
//!     .with_threshold(0.25)
//!     .with_weights("0.3,0.4,0.3".parse::<Weights>()?);
//! let gate = IncoherenceGate::new(config)?;
//!
//! let report = gate.evaluate(&GateInputs::new());
//! assert!(!report.is_block());
//! # Ok(())
//! # }
//! # example().unwrap();
//! ```
//!
//! ## Architecture
//!
//! - **`table`**: The row model every source produces
//! - **`sources`**: CSV, TSV, JSON, JSON Lines and (feature `parquet`) Parquet
//!   readers, plus resolution of upstream summary artifacts
//! - **`analyzers`**: Descriptive statistics, the column profiler,
//!   correlation graphs, drift tests and the analysis runner
//! - **`gate`**: Violation normalization, the weighted score and the decision
//! - **`report`**: Canonical JSON output and numeric report diffs
//! - **`formatters`**: JSON, human and Markdown renderings of a gate report
//! - **`alerting`**: Delivery of BLOCK alerts (feature `webhook` for HTTP)
//! - **`logging`**: `tracing-subscriber` setup
//!
//! ## Feature flags
//!
//! - `parquet`: Parquet ingestion
//! - `webhook`: HTTP webhook alert delivery with HMAC signing
//! - `test-utils`: Seeded synthetic tables for tests and benchmarks

pub mod alerting;
pub mod analyzers;
pub mod error;
pub mod formatters;
pub mod gate;
pub mod logging;
pub mod prelude;
pub mod report;
pub mod sources;
pub mod table;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_fixtures;

pub use error::{FluxError, Result};
