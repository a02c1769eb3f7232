//! Columnar export: Table to snappy-compressed Parquet.
//!
//! The conversion is a direct mapping: integer columns become Int64, real
//! columns Float64, text Utf8, boolean Boolean and timestamp columns
//! microsecond timestamps. All columns are nullable.

use std::fs::File;
use std::path::Path;
use std::sync::Arc;

use arrow::array::{
    ArrayRef, BooleanArray, Float64Array, Int64Array, StringArray, TimestampMicrosecondArray,
};
use arrow::datatypes::{DataType, Field, Schema, TimeUnit};
use arrow::record_batch::RecordBatch;
use parquet::arrow::ArrowWriter;
use parquet::basic::Compression;
use parquet::file::properties::WriterProperties;
use tracing::debug;

use crate::error::{Result, TabsightError};
use crate::table::{CellValue, ColumnType, Table};

/// Writes a table to a Parquet file, creating parent directories as needed.
pub fn write_parquet(table: &Table, path: &Path) -> Result<()> {
    if table.column_count() == 0 {
        return Err(TabsightError::export("table has no columns"));
    }

    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .map_err(|e| TabsightError::export(format!("Failed to create {}: {}", parent.display(), e)))?;
    }

    let schema = Arc::new(arrow_schema(table));
    let batch = record_batch(table, Arc::clone(&schema))?;

    let file = File::create(path)
        .map_err(|e| TabsightError::export(format!("Failed to create {}: {}", path.display(), e)))?;

    let props = WriterProperties::builder()
        .set_compression(Compression::SNAPPY)
        .build();

    let mut writer = ArrowWriter::try_new(file, schema, Some(props))
        .map_err(|e| TabsightError::export(format!("Failed to create Parquet writer: {e}")))?;

    writer
        .write(&batch)
        .map_err(|e| TabsightError::export(format!("Failed to write batch: {e}")))?;

    writer
        .close()
        .map_err(|e| TabsightError::export(format!("Failed to close writer: {e}")))?;

    debug!("Wrote {} rows to {}", table.row_count(), path.display());

    Ok(())
}

/// Builds the Arrow schema matching the table's columns.
fn arrow_schema(table: &Table) -> Schema {
    let fields: Vec<Field> = table
        .columns()
        .iter()
        .map(|c| Field::new(&c.name, arrow_type(c.ty), true))
        .collect();
    Schema::new(fields)
}

fn arrow_type(ty: ColumnType) -> DataType {
    match ty {
        ColumnType::Integer => DataType::Int64,
        ColumnType::Real => DataType::Float64,
        ColumnType::Text => DataType::Utf8,
        ColumnType::Boolean => DataType::Boolean,
        ColumnType::Timestamp => DataType::Timestamp(TimeUnit::Microsecond, None),
    }
}

/// Converts the table's rows into a single record batch.
fn record_batch(table: &Table, schema: Arc<Schema>) -> Result<RecordBatch> {
    let arrays: Vec<ArrayRef> = table
        .columns()
        .iter()
        .enumerate()
        .map(|(idx, column)| column_array(table, idx, column.ty))
        .collect();

    RecordBatch::try_new(schema, arrays)
        .map_err(|e| TabsightError::export(format!("Failed to build record batch: {e}")))
}

fn column_array(table: &Table, idx: usize, ty: ColumnType) -> ArrayRef {
    match ty {
        ColumnType::Integer => {
            let values: Vec<Option<i64>> = table
                .rows()
                .iter()
                .map(|row| match &row[idx] {
                    CellValue::Int(i) => Some(*i),
                    _ => None,
                })
                .collect();
            Arc::new(Int64Array::from(values))
        }
        ColumnType::Real => {
            let values: Vec<Option<f64>> = table
                .rows()
                .iter()
                .map(|row| match &row[idx] {
                    CellValue::Real(f) => Some(*f),
                    CellValue::Int(i) => Some(*i as f64),
                    _ => None,
                })
                .collect();
            Arc::new(Float64Array::from(values))
        }
        ColumnType::Text => {
            let values: Vec<Option<String>> = table
                .rows()
                .iter()
                .map(|row| match &row[idx] {
                    CellValue::Null => None,
                    value => Some(value.to_display_string()),
                })
                .collect();
            Arc::new(StringArray::from(values))
        }
        ColumnType::Boolean => {
            let values: Vec<Option<bool>> = table
                .rows()
                .iter()
                .map(|row| match &row[idx] {
                    CellValue::Bool(b) => Some(*b),
                    _ => None,
                })
                .collect();
            Arc::new(BooleanArray::from(values))
        }
        ColumnType::Timestamp => {
            let values: Vec<Option<i64>> = table
                .rows()
                .iter()
                .map(|row| match &row[idx] {
                    CellValue::Timestamp(ts) => Some(ts.and_utc().timestamp_micros()),
                    _ => None,
                })
                .collect();
            Arc::new(TimestampMicrosecondArray::from(values))
        }
    }
}
