//! In-memory tabular dataset handed to the engine by external loaders.
//!
//! A `Dataset` is an ordered set of named columns sharing one row count.
//! The engine only ever reads it; every rule receives `&Dataset`.

use std::collections::HashSet;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{MedvalError, MedvalResult};

/// A single typed cell.
///
/// Serializes untagged so a dataset round-trips through plain JSON arrays
/// (`[38, "P001", null, 98.6, true]`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CellValue {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
}

impl CellValue {
    /// True for `Null` and for NaN floats.
    pub fn is_missing(&self) -> bool {
        match self {
            CellValue::Null => true,
            CellValue::Float(f) => f.is_nan(),
            _ => false,
        }
    }

    /// The semantic kind name used in type-mismatch messages.
    pub fn kind(&self) -> &'static str {
        match self {
            CellValue::Null => "null",
            CellValue::Bool(_) => "bool",
            CellValue::Int(_) => "int",
            CellValue::Float(_) => "float",
            CellValue::Text(_) => "string",
        }
    }

    /// Numeric view of the cell. Text is parsed after trimming; booleans and
    /// missing values have no numeric view.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            CellValue::Int(i) => Some(*i as f64),
            CellValue::Float(f) if !f.is_nan() => Some(*f),
            CellValue::Text(s) => s.trim().parse::<f64>().ok().filter(|f| !f.is_nan()),
            _ => None,
        }
    }

    /// Textual view of a non-missing cell, as a loader would have read it.
    pub fn as_text(&self) -> Option<String> {
        match self {
            CellValue::Null => None,
            CellValue::Float(f) if f.is_nan() => None,
            CellValue::Bool(b) => Some(b.to_string()),
            CellValue::Int(i) => Some(i.to_string()),
            CellValue::Float(f) => Some(f.to_string()),
            CellValue::Text(s) => Some(s.clone()),
        }
    }

    /// A hashable identity for the cell. Two cells share a key iff they are
    /// the same kind and value; all missing cells share one key.
    pub fn identity_key(&self) -> String {
        if self.is_missing() {
            return "\u{0}null".to_string();
        }
        match self {
            CellValue::Bool(b) => format!("b:{b}"),
            CellValue::Int(i) => format!("i:{i}"),
            CellValue::Float(f) => format!("f:{}", f.to_bits()),
            CellValue::Text(s) => format!("s:{s}"),
            CellValue::Null => "\u{0}null".to_string(),
        }
    }
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.as_text() {
            Some(text) => f.write_str(&text),
            None => f.write_str("null"),
        }
    }
}

impl From<&str> for CellValue {
    fn from(value: &str) -> Self {
        CellValue::Text(value.to_string())
    }
}

impl From<String> for CellValue {
    fn from(value: String) -> Self {
        CellValue::Text(value)
    }
}

impl From<i64> for CellValue {
    fn from(value: i64) -> Self {
        CellValue::Int(value)
    }
}

impl From<i32> for CellValue {
    fn from(value: i32) -> Self {
        CellValue::Int(i64::from(value))
    }
}

impl From<f64> for CellValue {
    fn from(value: f64) -> Self {
        CellValue::Float(value)
    }
}

impl From<bool> for CellValue {
    fn from(value: bool) -> Self {
        CellValue::Bool(value)
    }
}

impl<T: Into<CellValue>> From<Option<T>> for CellValue {
    fn from(value: Option<T>) -> Self {
        value.map(Into::into).unwrap_or(CellValue::Null)
    }
}

/// One named column of cells.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Column {
    pub name: String,
    pub values: Vec<CellValue>,
}

impl Column {
    pub fn new<V: Into<CellValue>>(name: impl Into<String>, values: impl IntoIterator<Item = V>) -> Self {
        Self {
            name: name.into(),
            values: values.into_iter().map(Into::into).collect(),
        }
    }

    /// Iterator over the non-missing cells of this column.
    pub fn present(&self) -> impl Iterator<Item = &CellValue> {
        self.values.iter().filter(|v| !v.is_missing())
    }

    /// Number of missing cells.
    pub fn missing_count(&self) -> usize {
        self.values.iter().filter(|v| v.is_missing()).count()
    }
}

/// A rectangular, column-oriented table.
///
/// Invariants enforced at construction: column names are unique and every
/// column has the same length.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Dataset {
    columns: Vec<Column>,
}

impl Dataset {
    /// Build a dataset from columns, rejecting ragged or duplicate columns.
    pub fn new(columns: Vec<Column>) -> MedvalResult<Self> {
        let mut seen = HashSet::new();
        for column in &columns {
            if !seen.insert(column.name.as_str()) {
                return Err(MedvalError::DataShape {
                    reason: format!("duplicate column name '{}'", column.name),
                });
            }
        }
        if let Some(first) = columns.first() {
            let expected = first.values.len();
            if let Some(bad) = columns.iter().find(|c| c.values.len() != expected) {
                return Err(MedvalError::DataShape {
                    reason: format!(
                        "column '{}' has {} rows but column '{}' has {}",
                        bad.name,
                        bad.values.len(),
                        first.name,
                        expected
                    ),
                });
            }
        }
        Ok(Self { columns })
    }

    /// Builder-style helper: append a column and re-check the shape.
    pub fn with_column<V: Into<CellValue>>(
        self,
        name: impl Into<String>,
        values: impl IntoIterator<Item = V>,
    ) -> MedvalResult<Self> {
        let mut columns = self.columns;
        columns.push(Column::new(name, values));
        Self::new(columns)
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name == name)
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.column(name).is_some()
    }

    pub fn column_names(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(|c| c.name.as_str())
    }

    pub fn row_count(&self) -> usize {
        self.columns.first().map(|c| c.values.len()).unwrap_or(0)
    }

    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    /// Number of rows identical (cell by cell) to an earlier row.
    pub fn duplicate_row_count(&self) -> usize {
        let mut seen = HashSet::new();
        let mut duplicates = 0;
        for row in 0..self.row_count() {
            let key: Vec<String> = self
                .columns
                .iter()
                .map(|c| c.values[row].identity_key())
                .collect();
            if !seen.insert(key) {
                duplicates += 1;
            }
        }
        duplicates
    }
}
