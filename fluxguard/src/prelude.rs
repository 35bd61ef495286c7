//! Prelude for commonly used types and traits in fluxguard.

pub use crate::alerting::{notify_on_block, AlertDispatcher, AlertPayload, DeliveryOutcome};
pub use crate::analyzers::{
    CoherenceRunner, ColumnProfiler, DriftEngine, DriftPrecision, DriftStatistic,
};
pub use crate::error::{FluxError, Result};
pub use crate::formatters::{FormatterConfig, ReportFormatter};
pub use crate::gate::{
    Decision, DriftStrategy, GateConfig, GateInputs, IncoherenceGate, IncoherenceReport,
    NullMode, Weights,
};
pub use crate::logging::setup::LoggingConfig;
pub use crate::sources::{read_table, ReadOptions, SummaryCandidate, TableSource};
pub use crate::table::{Cell, Row};
