//! Spreadsheet loading via calamine.
//!
//! Reads the first worksheet of an .xlsx/.xls/.ods file into a [`Table`],
//! taking the first row as the header and inferring one element type per
//! column from the cells below it.

use std::path::Path;

use calamine::{open_workbook_auto, Data, Reader};
use tracing::{debug, warn};

use crate::error::{Result, TabsightError};
use crate::table::{CellValue, Column, ColumnType, Table};

/// Loads a spreadsheet file into a table.
///
/// The first worksheet is used; the first row becomes the header. Columns
/// with an empty header cell are named `column_N` by position, and duplicate
/// header names get a numeric suffix to keep names unique.
pub fn load_table(path: &Path) -> Result<Table> {
    let mut workbook = open_workbook_auto(path)
        .map_err(|e| TabsightError::load(format!("Failed to open {}: {}", path.display(), e)))?;

    let sheet_names = workbook.sheet_names().to_vec();
    let first_sheet = sheet_names
        .first()
        .ok_or_else(|| TabsightError::load(format!("{} contains no sheets", path.display())))?
        .clone();

    let range = workbook
        .worksheet_range(&first_sheet)
        .map_err(|e| TabsightError::load(format!("Failed to read sheet '{first_sheet}': {e}")))?;

    let mut rows_iter = range.rows();
    let header = match rows_iter.next() {
        Some(header) => header,
        None => return Ok(Table::default()),
    };

    let names = header_names(header);
    let width = names.len();

    let mut rows: Vec<Vec<CellValue>> = Vec::new();
    for row in rows_iter {
        let mut cells = Vec::with_capacity(width);
        for col in 0..width {
            cells.push(convert_cell(row.get(col).unwrap_or(&Data::Empty)));
        }
        // Trailing fully-empty rows are common in exported sheets
        if cells.iter().all(CellValue::is_null) {
            continue;
        }
        rows.push(cells);
    }

    let columns = infer_columns(&names, &rows);
    coerce_rows(&columns, &mut rows);

    debug!(
        "Loaded {} from sheet '{}': {} rows x {} columns",
        path.display(),
        first_sheet,
        rows.len(),
        columns.len()
    );

    Ok(Table::new(columns, rows))
}

/// Converts header cells to unique, non-empty column names.
fn header_names(header: &[Data]) -> Vec<String> {
    let mut names: Vec<String> = Vec::with_capacity(header.len());
    for (idx, cell) in header.iter().enumerate() {
        let raw = match cell {
            Data::Empty => String::new(),
            other => other.to_string().trim().to_string(),
        };
        let mut name = if raw.is_empty() {
            format!("column_{}", idx + 1)
        } else {
            raw
        };
        if names.contains(&name) {
            let mut suffix = 2;
            while names.contains(&format!("{name}_{suffix}")) {
                suffix += 1;
            }
            name = format!("{name}_{suffix}");
        }
        names.push(name);
    }
    names
}

/// Converts a single calamine cell to a table cell.
fn convert_cell(data: &Data) -> CellValue {
    match data {
        Data::Empty => CellValue::Null,
        Data::Int(i) => CellValue::Int(*i),
        Data::Float(f) => {
            // Excel stores most numbers as floats; keep exact integers whole
            if f.fract() == 0.0 && f.abs() < i64::MAX as f64 {
                CellValue::Int(*f as i64)
            } else {
                CellValue::Real(*f)
            }
        }
        Data::String(s) => {
            let trimmed = s.trim();
            if trimmed.is_empty() {
                CellValue::Null
            } else {
                CellValue::Text(trimmed.to_string())
            }
        }
        Data::Bool(b) => CellValue::Bool(*b),
        Data::DateTime(dt) => match dt.as_datetime() {
            Some(ts) => CellValue::Timestamp(ts),
            None => CellValue::Real(dt.as_f64()),
        },
        Data::DateTimeIso(s) | Data::DurationIso(s) => CellValue::Text(s.clone()),
        Data::Error(e) => {
            warn!("Cell error treated as empty: {e:?}");
            CellValue::Null
        }
    }
}

/// Infers one element type per column from the converted cells.
///
/// All-integer columns are integer; integer/real mixes are real; columns
/// mixing anything else degrade to text. Columns with no values at all
/// default to text.
fn infer_columns(names: &[String], rows: &[Vec<CellValue>]) -> Vec<Column> {
    names
        .iter()
        .enumerate()
        .map(|(idx, name)| {
            let mut ty: Option<ColumnType> = None;
            for row in rows {
                let Some(cell_ty) = row[idx].column_type() else {
                    continue;
                };
                ty = Some(match ty {
                    None => cell_ty,
                    Some(current) if current == cell_ty => current,
                    Some(ColumnType::Integer) if cell_ty == ColumnType::Real => ColumnType::Real,
                    Some(ColumnType::Real) if cell_ty == ColumnType::Integer => ColumnType::Real,
                    Some(_) => ColumnType::Text,
                });
                if ty == Some(ColumnType::Text) {
                    break;
                }
            }
            Column::new(name.clone(), ty.unwrap_or(ColumnType::Text))
        })
        .collect()
}

/// Coerces cells to their column's inferred type.
///
/// Integers widen to reals in real columns; everything becomes its display
/// string in text columns. Nulls stay null.
fn coerce_rows(columns: &[Column], rows: &mut [Vec<CellValue>]) {
    for row in rows.iter_mut() {
        for (idx, column) in columns.iter().enumerate() {
            let cell = &mut row[idx];
            if cell.is_null() {
                continue;
            }
            match (column.ty, &*cell) {
                (ColumnType::Real, CellValue::Int(i)) => *cell = CellValue::Real(*i as f64),
                (ColumnType::Text, value) if value.column_type() != Some(ColumnType::Text) => {
                    *cell = CellValue::Text(value.to_display_string());
                }
                _ => {}
            }
        }
    }
}
