//! JSON and JSON Lines file source.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};

use serde_json::{Map, Value};
use tracing::{debug, instrument};

use super::{ReadOptions, TableSource};
use crate::error::{FluxError, Result};
use crate::table::{Cell, Row};

/// A JSON document of row objects.
///
/// In document mode the file holds either an array of objects or an object
/// with a `rows` array. In lines mode every non-blank line holds one JSON
/// value. Entries that are not objects are ignored in both modes.
#[derive(Debug, Clone)]
pub struct JsonSource {
    path: PathBuf,
    lines: bool,
}

impl JsonSource {
    /// Document mode (`.json`).
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            lines: false,
        }
    }

    /// Lines mode (`.jsonl`, `.ndjson`).
    pub fn lines(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            lines: true,
        }
    }

    fn read_document(&self, max_rows: usize) -> Result<Vec<Row>> {
        let file = BufReader::new(File::open(&self.path)?);
        let document: Value = serde_json::from_reader(file)?;
        let entries = match document {
            Value::Array(items) => items,
            Value::Object(mut map) => match map.remove("rows") {
                Some(Value::Array(items)) => items,
                _ => return Err(self.unsupported_shape()),
            },
            _ => return Err(self.unsupported_shape()),
        };

        Ok(entries
            .into_iter()
            .filter_map(|entry| match entry {
                Value::Object(map) => Some(object_to_row(map)),
                _ => None,
            })
            .take(max_rows)
            .collect())
    }

    fn read_lines(&self, max_rows: usize) -> Result<Vec<Row>> {
        let file = BufReader::new(File::open(&self.path)?);
        let mut rows = Vec::new();
        for (index, line) in file.lines().enumerate() {
            let line = line?;
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            let value: Value = serde_json::from_str(line).map_err(|e| {
                FluxError::malformed(format!(
                    "{} line {}: {e}",
                    self.path.display(),
                    index + 1
                ))
            })?;
            if let Value::Object(map) = value {
                rows.push(object_to_row(map));
            }
            if rows.len() >= max_rows {
                debug!(max_rows, "Row cap reached");
                break;
            }
        }
        Ok(rows)
    }

    fn unsupported_shape(&self) -> FluxError {
        FluxError::malformed(format!(
            "{}: expected an array of objects or {{\"rows\": [...]}}",
            self.path.display()
        ))
    }
}

fn object_to_row(map: Map<String, Value>) -> Row {
    map.into_iter().map(|(k, v)| (k, Cell::from(v))).collect()
}

impl TableSource for JsonSource {
    #[instrument(skip_all, fields(path = %self.path.display(), lines = self.lines))]
    fn read(&self, options: &ReadOptions) -> Result<Vec<Row>> {
        if self.lines {
            self.read_lines(options.max_rows)
        } else {
            self.read_document(options.max_rows)
        }
    }

    fn description(&self) -> String {
        let kind = if self.lines { "JSON Lines" } else { "JSON" };
        format!("{kind} file {}", self.path.display())
    }
}
