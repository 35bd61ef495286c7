//! Error types for fluxguard.
//!
//! Only hard failures are represented here. Soft conditions such as a missing
//! summary file, a zero-variance column or a degenerate target are absorbed by
//! the computation and recorded in the detail fields of the returned reports.

use thiserror::Error;

/// Result type used throughout the crate.
pub type Result<T> = std::result::Result<T, FluxError>;

/// Errors that can occur while ingesting, analyzing or gating data.
#[derive(Error, Debug)]
pub enum FluxError {
    /// Invalid configuration (weights, thresholds, limits). Raised before any
    /// computation takes place.
    #[error("Invalid configuration: {0}")]
    Configuration(String),

    /// The input cannot be processed at all (empty table, no header, wrong
    /// JSON shape).
    #[error("Malformed input: {0}")]
    MalformedInput(String),

    /// No column has enough numeric values to take part in the analysis.
    #[error("No numeric column with at least {min_values} values")]
    NoNumericColumns { min_values: usize },

    /// The table format could not be determined from the source.
    #[error("Unsupported table format: {0}")]
    UnsupportedFormat(String),

    /// Filesystem error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Arrow decoding error.
    #[error("Arrow error: {0}")]
    Arrow(#[from] arrow::error::ArrowError),

    /// Parquet decoding error.
    #[cfg(feature = "parquet")]
    #[error("Parquet error: {0}")]
    Parquet(#[from] parquet::errors::ParquetError),

    /// JSON encoding or decoding error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Unexpected internal condition.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl FluxError {
    /// Creates a configuration error with the given message.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Configuration(msg.into())
    }

    /// Creates a malformed input error with the given message.
    pub fn malformed(msg: impl Into<String>) -> Self {
        Self::MalformedInput(msg.into())
    }

    /// Creates an internal error with the given message.
    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    /// Returns true for errors caused by caller-supplied configuration.
    pub fn is_configuration(&self) -> bool {
        matches!(self, Self::Configuration(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = FluxError::config("weights must be 'w_null,w_drift,w_void'");
        assert_eq!(
            err.to_string(),
            "Invalid configuration: weights must be 'w_null,w_drift,w_void'"
        );

        let err = FluxError::NoNumericColumns { min_values: 2 };
        assert!(err.to_string().contains("at least 2 values"));
    }

    #[test]
    fn test_is_configuration() {
        assert!(FluxError::config("bad").is_configuration());
        assert!(!FluxError::malformed("empty").is_configuration());
    }

    #[test]
    fn test_from_serde_json_error() {
        let err: FluxError = serde_json::from_str::<serde_json::Value>("{")
            .unwrap_err()
            .into();
        assert!(matches!(err, FluxError::Json(_)));
    }
}
