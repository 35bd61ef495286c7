//! Table ingestion and summary resolution.
//!
//! Every physical format is normalized into a `Vec<Row>`. The statistical core
//! never opens files itself; it only consumes rows produced here.
//!
//! | Extension | Source |
//! |-----------|--------|
//! | `.csv`, `.tsv` | [`CsvSource`] |
//! | `.json` | [`JsonSource`] (array of objects or `{"rows": [...]}`) |
//! | `.jsonl`, `.ndjson` | [`JsonSource`] in lines mode |
//! | `.parquet` | `ParquetSource` (feature `parquet`) |
//!
//! Ingestion stops at [`ReadOptions::max_rows`]; results past the cap are
//! defined as "the first N rows only", not as an error.

use std::fmt::Debug;
use std::fs::File;
use std::io;
use std::path::Path;

use sha2::{Digest, Sha256};
use tracing::{info, instrument};

use crate::analyzers::profiler::DEFAULT_MAX_ROWS;
use crate::error::{FluxError, Result};
use crate::table::Row;

mod batch;
mod csv;
mod json;
#[cfg(feature = "parquet")]
mod parquet;
pub mod summary;

pub use batch::rows_from_record_batch;
pub use csv::{CsvOptions, CsvSource};
pub use json::JsonSource;
#[cfg(feature = "parquet")]
pub use parquet::ParquetSource;
pub use summary::{
    resolve_summary, EntropySummary, ResolvedSummary, SoakSummary, SummaryCandidate,
    SummaryShape,
};

/// Options shared by every table source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReadOptions {
    /// Rows past this cap are not read.
    pub max_rows: usize,
    /// Field delimiter override for delimited text.
    pub delimiter: Option<u8>,
}

impl Default for ReadOptions {
    fn default() -> Self {
        Self {
            max_rows: DEFAULT_MAX_ROWS,
            delimiter: None,
        }
    }
}

impl ReadOptions {
    pub fn with_max_rows(mut self, max_rows: usize) -> Self {
        self.max_rows = max_rows;
        self
    }

    pub fn with_delimiter(mut self, delimiter: u8) -> Self {
        self.delimiter = Some(delimiter);
        self
    }

    fn validate(&self) -> Result<()> {
        if self.max_rows == 0 {
            return Err(FluxError::config("max_rows must be at least 1"));
        }
        Ok(())
    }
}

/// A source of rows.
///
/// # Examples
///
/// ```rust,no_run
/// use fluxguard::sources::{CsvSource, ReadOptions, TableSource};
///
/// # fn example() -> fluxguard::Result<()> {
/// let source = CsvSource::new("data/current.csv");
/// let rows = source.read(&ReadOptions::default())?;
/// println!("{}: {} rows", source.description(), rows.len());
/// # Ok(())
/// # }
/// ```
pub trait TableSource: Debug + Send + Sync {
    /// Reads at most `options.max_rows` rows.
    fn read(&self, options: &ReadOptions) -> Result<Vec<Row>>;

    /// Returns a human-readable description of this source.
    fn description(&self) -> String;
}

/// Physical table formats recognized by extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TableFormat {
    Csv,
    Tsv,
    Json,
    JsonLines,
    Parquet,
}

impl TableFormat {
    /// Detects the format from the file extension, case-insensitively.
    pub fn from_path(path: &Path) -> Result<Self> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase)
            .unwrap_or_default();
        match ext.as_str() {
            "csv" => Ok(Self::Csv),
            "tsv" => Ok(Self::Tsv),
            "json" => Ok(Self::Json),
            "jsonl" | "ndjson" => Ok(Self::JsonLines),
            "parquet" => Ok(Self::Parquet),
            _ => Err(FluxError::UnsupportedFormat(format!(
                "'{}' (expected .csv, .tsv, .json, .jsonl, .ndjson or .parquet)",
                path.display()
            ))),
        }
    }
}

/// Creates the source matching the extension of `path`.
pub fn source_for_path(path: impl AsRef<Path>) -> Result<Box<dyn TableSource>> {
    let path = path.as_ref();
    let source: Box<dyn TableSource> = match TableFormat::from_path(path)? {
        TableFormat::Csv => Box::new(CsvSource::new(path)),
        TableFormat::Tsv => Box::new(CsvSource::tsv(path)),
        TableFormat::Json => Box::new(JsonSource::new(path)),
        TableFormat::JsonLines => Box::new(JsonSource::lines(path)),
        #[cfg(feature = "parquet")]
        TableFormat::Parquet => Box::new(ParquetSource::new(path)),
        #[cfg(not(feature = "parquet"))]
        TableFormat::Parquet => {
            return Err(FluxError::UnsupportedFormat(format!(
                "'{}' requires the `parquet` feature",
                path.display()
            )))
        }
    };
    Ok(source)
}

/// Reads a table, selecting the source by extension.
///
/// # Errors
///
/// Fails when the file does not exist, the extension is unknown, the content
/// cannot be decoded or `options.max_rows` is 0.
#[instrument(skip_all, fields(path = %path.as_ref().display()))]
pub fn read_table(path: impl AsRef<Path>, options: &ReadOptions) -> Result<Vec<Row>> {
    options.validate()?;
    let path = path.as_ref();
    if !path.exists() {
        return Err(FluxError::Io(io::Error::new(
            io::ErrorKind::NotFound,
            format!("table not found: {}", path.display()),
        )));
    }
    let source = source_for_path(path)?;
    let rows = source.read(options)?;
    info!(rows = rows.len(), source = %source.description(), "Read table");
    Ok(rows)
}

/// SHA-256 of a file's bytes, lowercase hex.
pub fn fingerprint_file(path: impl AsRef<Path>) -> Result<String> {
    let mut file = File::open(path.as_ref())?;
    let mut hasher = Sha256::new();
    io::copy(&mut file, &mut hasher)?;
    Ok(hex::encode(hasher.finalize()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_detection() {
        assert_eq!(TableFormat::from_path(Path::new("a.CSV")).unwrap(), TableFormat::Csv);
        assert_eq!(TableFormat::from_path(Path::new("a.tsv")).unwrap(), TableFormat::Tsv);
        assert_eq!(
            TableFormat::from_path(Path::new("a.ndjson")).unwrap(),
            TableFormat::JsonLines
        );
        assert!(matches!(
            TableFormat::from_path(Path::new("a.xlsx")),
            Err(FluxError::UnsupportedFormat(_))
        ));
        assert!(TableFormat::from_path(Path::new("noext")).is_err());
    }

    #[test]
    fn test_read_options_validation() {
        assert!(ReadOptions::default().validate().is_ok());
        assert!(ReadOptions::default()
            .with_max_rows(0)
            .validate()
            .unwrap_err()
            .is_configuration());
    }

    #[test]
    fn test_missing_file() {
        let err = read_table("definitely/not/here.csv", &ReadOptions::default()).unwrap_err();
        assert!(matches!(err, FluxError::Io(ref e) if e.kind() == io::ErrorKind::NotFound));
    }

    #[test]
    fn test_fingerprint() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("x.txt");
        std::fs::write(&path, b"abc").unwrap();
        assert_eq!(
            fingerprint_file(&path).unwrap(),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }
}
