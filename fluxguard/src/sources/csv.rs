//! CSV and TSV file source.
//!
//! Every column is read as text so numeric coercion stays in one place
//! ([`Cell::as_f64`](crate::table::Cell::as_f64)); an Arrow-inferred integer
//! column would otherwise turn a stray `n/a` into a hard decode error.

use std::fs::File;
use std::io::Seek;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use arrow::csv::reader::Format;
use arrow::csv::ReaderBuilder;
use arrow::datatypes::{DataType, Field, Schema};
use arrow::error::ArrowError;
use tracing::{debug, instrument};

use super::batch::rows_from_record_batch;
use super::{ReadOptions, TableSource};
use crate::error::{FluxError, Result};
use crate::table::Row;

/// Options for configuring CSV file reading.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CsvOptions {
    /// Field delimiter (default: ',')
    pub delimiter: u8,
    /// Quote character (default: '"')
    pub quote: u8,
    /// Rows decoded per Arrow batch
    pub batch_size: usize,
}

impl Default for CsvOptions {
    fn default() -> Self {
        Self {
            delimiter: b',',
            quote: b'"',
            batch_size: 8192,
        }
    }
}

/// A delimited text file with a header row.
///
/// Rows shorter than the header are padded with missing cells. A row with
/// more fields than the header fails the read with
/// [`FluxError::MalformedInput`] naming the file.
#[derive(Debug, Clone)]
pub struct CsvSource {
    path: PathBuf,
    options: CsvOptions,
}

impl CsvSource {
    /// Comma-separated file.
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self::with_options(path, CsvOptions::default())
    }

    /// Tab-separated file.
    pub fn tsv(path: impl AsRef<Path>) -> Self {
        Self::with_options(
            path,
            CsvOptions {
                delimiter: b'\t',
                ..Default::default()
            },
        )
    }

    pub fn with_options(path: impl AsRef<Path>, options: CsvOptions) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            options,
        }
    }

    pub fn options(&self) -> &CsvOptions {
        &self.options
    }

    fn format(&self, delimiter: u8) -> Format {
        Format::default()
            .with_header(true)
            .with_delimiter(delimiter)
            .with_quote(self.options.quote)
    }

    /// Reads the header and builds an all-text schema from it.
    fn text_schema(&self, file: &mut File, format: &Format) -> Result<Arc<Schema>> {
        let (inferred, _) = format.infer_schema(&mut *file, Some(1))?;
        if inferred.fields().is_empty() {
            return Err(FluxError::malformed(format!(
                "{} has no header row",
                self.path.display()
            )));
        }
        let fields: Vec<Field> = inferred
            .fields()
            .iter()
            .map(|f| Field::new(f.name(), DataType::Utf8, true))
            .collect();
        file.rewind()?;
        Ok(Arc::new(Schema::new(fields)))
    }

    fn decode_error(&self, err: ArrowError) -> FluxError {
        match err {
            ArrowError::CsvError(msg) => {
                FluxError::malformed(format!("{}: {msg}", self.path.display()))
            }
            other => other.into(),
        }
    }
}

impl TableSource for CsvSource {
    #[instrument(skip_all, fields(path = %self.path.display(), max_rows = options.max_rows))]
    fn read(&self, options: &ReadOptions) -> Result<Vec<Row>> {
        let delimiter = options.delimiter.unwrap_or(self.options.delimiter);
        let format = self.format(delimiter);

        let mut file = File::open(&self.path)?;
        let schema = self.text_schema(&mut file, &format)?;
        debug!(columns = schema.fields().len(), "Resolved CSV header");

        let reader = ReaderBuilder::new(schema)
            .with_header(true)
            .with_delimiter(delimiter)
            .with_quote(self.options.quote)
            .with_truncated_rows(true)
            .with_batch_size(self.options.batch_size.min(options.max_rows).max(1))
            .build(file)?;

        let mut rows = Vec::new();
        for batch in reader {
            let batch = batch.map_err(|e| self.decode_error(e))?;
            let remaining = options.max_rows - rows.len();
            let take = batch.num_rows().min(remaining);
            rows.extend(rows_from_record_batch(&batch.slice(0, take))?);
            if rows.len() >= options.max_rows {
                debug!(max_rows = options.max_rows, "Row cap reached");
                break;
            }
        }
        Ok(rows)
    }

    fn description(&self) -> String {
        let kind = if self.options.delimiter == b'\t' {
            "TSV"
        } else {
            "CSV"
        };
        format!("{kind} file {}", self.path.display())
    }
}
