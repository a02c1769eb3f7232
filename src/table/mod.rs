//! Table abstraction for Tabsight.
//!
//! Represents a spreadsheet loaded into memory as an ordered set of typed
//! columns plus rows of values, and provides the structure description
//! handed to the code generator.

mod parquet;
mod xlsx;

pub use parquet::write_parquet;
pub use xlsx::load_table;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Inferred element type of a table column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColumnType {
    /// Whole numbers.
    Integer,
    /// Floating point numbers.
    Real,
    /// Free text (also the fallback for mixed columns).
    Text,
    /// Booleans.
    Boolean,
    /// Date/time values.
    Timestamp,
}

impl ColumnType {
    /// Returns the type as a string for display and prompts.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Integer => "integer",
            Self::Real => "real",
            Self::Text => "text",
            Self::Boolean => "boolean",
            Self::Timestamp => "timestamp",
        }
    }
}

impl fmt::Display for ColumnType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A single cell value from a loaded table.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub enum CellValue {
    /// Missing/empty cell.
    #[default]
    Null,

    /// Whole number.
    Int(i64),

    /// Floating point number.
    Real(f64),

    /// Text value.
    Text(String),

    /// Boolean value.
    Bool(bool),

    /// Date/time value.
    Timestamp(NaiveDateTime),
}

impl CellValue {
    /// Returns true if this cell is empty.
    pub fn is_null(&self) -> bool {
        matches!(self, CellValue::Null)
    }

    /// Returns the column type this value belongs to, if any.
    pub fn column_type(&self) -> Option<ColumnType> {
        match self {
            CellValue::Null => None,
            CellValue::Int(_) => Some(ColumnType::Integer),
            CellValue::Real(_) => Some(ColumnType::Real),
            CellValue::Text(_) => Some(ColumnType::Text),
            CellValue::Bool(_) => Some(ColumnType::Boolean),
            CellValue::Timestamp(_) => Some(ColumnType::Timestamp),
        }
    }

    /// Converts the value to a string representation for display.
    pub fn to_display_string(&self) -> String {
        match self {
            CellValue::Null => String::new(),
            CellValue::Int(i) => i.to_string(),
            CellValue::Real(f) => f.to_string(),
            CellValue::Text(s) => s.clone(),
            CellValue::Bool(b) => b.to_string(),
            CellValue::Timestamp(ts) => ts.format("%Y-%m-%d %H:%M:%S").to_string(),
        }
    }
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_display_string())
    }
}

impl From<i64> for CellValue {
    fn from(v: i64) -> Self {
        CellValue::Int(v)
    }
}

impl From<f64> for CellValue {
    fn from(v: f64) -> Self {
        CellValue::Real(v)
    }
}

impl From<&str> for CellValue {
    fn from(v: &str) -> Self {
        CellValue::Text(v.to_string())
    }
}

impl From<String> for CellValue {
    fn from(v: String) -> Self {
        CellValue::Text(v)
    }
}

impl From<bool> for CellValue {
    fn from(v: bool) -> Self {
        CellValue::Bool(v)
    }
}

impl<T> From<Option<T>> for CellValue
where
    T: Into<CellValue>,
{
    fn from(v: Option<T>) -> Self {
        match v {
            Some(val) => val.into(),
            None => CellValue::Null,
        }
    }
}

/// A named, typed table column.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Column {
    /// Column name (unique within a table).
    pub name: String,

    /// Inferred element type.
    pub ty: ColumnType,
}

impl Column {
    /// Creates a new column with the given name and type.
    pub fn new(name: impl Into<String>, ty: ColumnType) -> Self {
        Self {
            name: name.into(),
            ty,
        }
    }
}

/// A spreadsheet loaded into memory.
///
/// Immutable once loaded: analysis runs against copies, never against the
/// rows held here. Invariant: every row has exactly one cell per column.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Table {
    columns: Vec<Column>,
    rows: Vec<Vec<CellValue>>,
}

impl Table {
    /// Creates a table from columns and rows.
    ///
    /// Rows shorter than the header are padded with nulls; longer rows are
    /// truncated to the header width.
    pub fn new(columns: Vec<Column>, rows: Vec<Vec<CellValue>>) -> Self {
        let width = columns.len();
        let rows = rows
            .into_iter()
            .map(|mut row| {
                row.resize(width, CellValue::Null);
                row
            })
            .collect();
        Self { columns, rows }
    }

    /// Returns the table columns in order.
    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    /// Returns the column names in order.
    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.name.as_str()).collect()
    }

    /// Returns the rows in order.
    pub fn rows(&self) -> &[Vec<CellValue>] {
        &self.rows
    }

    /// Returns the number of rows.
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// Returns the number of columns.
    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    /// Returns true if the table has no rows.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Builds the structure description handed to the code generator.
    pub fn structure(&self) -> TableStructure {
        TableStructure {
            columns: self.columns.clone(),
            row_count: self.row_count(),
            column_count: self.column_count(),
        }
    }
}

/// Shape description of a table: column names, types and counts.
///
/// This is the only table information the code generator sees; cell data
/// never leaves the process.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableStructure {
    /// Columns in table order.
    pub columns: Vec<Column>,

    /// Number of data rows.
    pub row_count: usize,

    /// Number of columns.
    pub column_count: usize,
}

impl TableStructure {
    /// Formats the structure for inclusion in an LLM prompt.
    ///
    /// Produces a human-readable representation that helps the model ground
    /// its generated code in the actual columns.
    pub fn format_for_llm(&self) -> String {
        let column_lines = self
            .columns
            .iter()
            .map(|c| format!("  - {}: {}\n", c.name, c.ty))
            .collect::<Vec<_>>()
            .join("");

        format!(
            "Table: {} rows x {} columns\nColumns:\n{}",
            self.row_count, self.column_count, column_lines
        )
    }
}
