//! Parquet file source.

use std::fs::File;
use std::path::{Path, PathBuf};

use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use tracing::{debug, instrument};

use super::batch::rows_from_record_batch;
use super::{ReadOptions, TableSource};
use crate::error::Result;
use crate::table::Row;

/// A Parquet file, decoded through Arrow.
#[derive(Debug, Clone)]
pub struct ParquetSource {
    path: PathBuf,
}

impl ParquetSource {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }
}

impl TableSource for ParquetSource {
    #[instrument(skip_all, fields(path = %self.path.display(), max_rows = options.max_rows))]
    fn read(&self, options: &ReadOptions) -> Result<Vec<Row>> {
        let file = File::open(&self.path)?;
        let builder = ParquetRecordBatchReaderBuilder::try_new(file)?;
        debug!(
            rows = builder.metadata().file_metadata().num_rows(),
            "Opened Parquet file"
        );
        let reader = builder.with_limit(options.max_rows).build()?;

        let mut rows = Vec::new();
        for batch in reader {
            rows.extend(rows_from_record_batch(&batch?)?);
        }
        rows.truncate(options.max_rows);
        Ok(rows)
    }

    fn description(&self) -> String {
        format!("Parquet file {}", self.path.display())
    }
}
