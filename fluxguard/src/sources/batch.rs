//! Conversion from Arrow record batches to rows.

use arrow::array::{Array, ArrayRef, AsArray};
use arrow::compute::cast;
use arrow::datatypes::{DataType, Float64Type};
use arrow::record_batch::RecordBatch;
use arrow::util::display::array_value_to_string;

use crate::error::Result;
use crate::table::{Cell, Row};

/// Converts every row of `batch` into a [`Row`].
///
/// Nulls become [`Cell::Missing`], booleans [`Cell::Bool`], integer, float
/// and decimal columns [`Cell::Number`], string columns [`Cell::Text`]. Any
/// other type is rendered with Arrow's display formatting as text.
pub fn rows_from_record_batch(batch: &RecordBatch) -> Result<Vec<Row>> {
    let schema = batch.schema();
    let mut rows: Vec<Row> = vec![Row::new(); batch.num_rows()];

    for (field, column) in schema.fields().iter().zip(batch.columns()) {
        for (row, cell) in rows.iter_mut().zip(column_cells(column)?) {
            row.insert(field.name().clone(), cell);
        }
    }
    Ok(rows)
}

fn column_cells(array: &ArrayRef) -> Result<Vec<Cell>> {
    let len = array.len();
    let cells = match array.data_type() {
        DataType::Null => vec![Cell::Missing; len],
        DataType::Boolean => {
            let values = array.as_boolean();
            (0..len)
                .map(|i| {
                    if values.is_null(i) {
                        Cell::Missing
                    } else {
                        Cell::Bool(values.value(i))
                    }
                })
                .collect()
        }
        dt if dt.is_numeric() => {
            let floats = cast(array, &DataType::Float64)?;
            let values = floats.as_primitive::<Float64Type>();
            (0..len)
                .map(|i| {
                    if values.is_null(i) {
                        Cell::Missing
                    } else {
                        Cell::Number(values.value(i))
                    }
                })
                .collect()
        }
        DataType::Utf8 | DataType::LargeUtf8 | DataType::Utf8View => {
            let text = cast(array, &DataType::Utf8)?;
            let values = text.as_string::<i32>();
            (0..len)
                .map(|i| {
                    if values.is_null(i) {
                        Cell::Missing
                    } else {
                        Cell::Text(values.value(i).to_string())
                    }
                })
                .collect()
        }
        _ => (0..len)
            .map(|i| {
                if array.is_null(i) {
                    Ok(Cell::Missing)
                } else {
                    Ok(Cell::Text(array_value_to_string(array, i)?))
                }
            })
            .collect::<Result<Vec<_>>>()?,
    };
    Ok(cells)
}
