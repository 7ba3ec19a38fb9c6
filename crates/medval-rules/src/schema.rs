//! Structural checks: required columns and declared column types.

use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::debug;

use medval_contracts::{CellValue, Dataset, Issue, MedvalError, MedvalResult};
use medval_core::traits::Rule;

use crate::util::parse_date;

pub const RULE_NAME: &str = "SchemaValidator";

/// Metadata `check` values emitted by this rule.
pub mod checks {
    pub const MISSING_COLUMN: &str = "missing_column";
    pub const TYPE_MISMATCH: &str = "type_mismatch";
}

/// Semantic column type a schema can declare.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColumnType {
    Int,
    Float,
    String,
    Datetime,
    Bool,
}

impl ColumnType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ColumnType::Int => "int",
            ColumnType::Float => "float",
            ColumnType::String => "string",
            ColumnType::Datetime => "datetime",
            ColumnType::Bool => "bool",
        }
    }

    /// True if `value` can be coerced to this type without loss.
    ///
    /// Callers only pass non-missing cells.
    pub fn accepts(&self, value: &CellValue) -> bool {
        match (self, value) {
            (ColumnType::Int, CellValue::Int(_)) => true,
            (ColumnType::Int, CellValue::Float(f)) => f.fract() == 0.0,
            (ColumnType::Int, CellValue::Text(s)) => s.trim().parse::<i64>().is_ok(),
            (ColumnType::Float, v) => v.as_f64().is_some(),
            (ColumnType::String, CellValue::Text(_)) => true,
            (ColumnType::Datetime, v) => parse_date(v).is_some(),
            (ColumnType::Bool, CellValue::Bool(_)) => true,
            (ColumnType::Bool, CellValue::Int(i)) => *i == 0 || *i == 1,
            (ColumnType::Bool, CellValue::Text(s)) => matches!(
                s.trim().to_ascii_lowercase().as_str(),
                "true" | "false" | "yes" | "no" | "1" | "0"
            ),
            _ => false,
        }
    }
}

impl fmt::Display for ColumnType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ColumnType {
    type Err = MedvalError;

    fn from_str(s: &str) -> MedvalResult<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "int" | "integer" | "int64" => Ok(ColumnType::Int),
            "float" | "double" | "number" | "float64" => Ok(ColumnType::Float),
            "string" | "str" | "text" | "object" => Ok(ColumnType::String),
            "datetime" | "date" | "datetime64" | "timestamp" => Ok(ColumnType::Datetime),
            "bool" | "boolean" => Ok(ColumnType::Bool),
            other => Err(MedvalError::config(format!("unknown column type '{other}'"))),
        }
    }
}

/// Checks that required columns exist and typed columns hold conforming values.
///
/// A missing required column yields one `error` naming the column. A typed
/// column yields an `error` when every non-missing value fails coercion and a
/// `warning` when only some do.
#[derive(Debug, Clone, Default)]
pub struct SchemaValidator {
    required: Vec<String>,
    types: Vec<(String, ColumnType)>,
}

impl SchemaValidator {
    pub fn new<R, K>(
        required: impl IntoIterator<Item = R>,
        types: impl IntoIterator<Item = (K, ColumnType)>,
    ) -> Self
    where
        R: Into<String>,
        K: Into<String>,
    {
        let mut validator = Self {
            required: required.into_iter().map(Into::into).collect(),
            types: Vec::new(),
        };
        for (column, ty) in types {
            validator.set_type(column, ty);
        }
        validator
    }

    /// Like [`new`](Self::new), with type names resolved through `ColumnType::from_str`.
    pub fn from_type_names<R, K, T>(
        required: impl IntoIterator<Item = R>,
        types: impl IntoIterator<Item = (K, T)>,
    ) -> MedvalResult<Self>
    where
        R: Into<String>,
        K: Into<String>,
        T: AsRef<str>,
    {
        let resolved = types
            .into_iter()
            .map(|(k, t)| -> MedvalResult<(K, ColumnType)> { Ok((k, t.as_ref().parse()?)) })
            .collect::<MedvalResult<Vec<_>>>()?;
        Ok(Self::new(required, resolved))
    }

    /// Declare or re-declare the type of `column`.
    pub fn set_type(&mut self, column: impl Into<String>, ty: ColumnType) {
        let column = column.into();
        match self.types.iter_mut().find(|(c, _)| *c == column) {
            Some(entry) => entry.1 = ty,
            None => self.types.push((column, ty)),
        }
    }

    pub fn required_columns(&self) -> &[String] {
        &self.required
    }
}

impl Rule for SchemaValidator {
    fn name(&self) -> &str {
        RULE_NAME
    }

    fn evaluate(&self, dataset: &Dataset) -> MedvalResult<Vec<Issue>> {
        let mut issues = Vec::new();

        let mut reported = BTreeSet::new();
        for column in &self.required {
            if !dataset.has_column(column) && reported.insert(column.as_str()) {
                issues.push(
                    Issue::error(RULE_NAME, format!("Required column '{column}' is missing"))
                        .with_column(column.as_str())
                        .with_metadata("check", checks::MISSING_COLUMN),
                );
            }
        }

        for (name, expected) in &self.types {
            let Some(column) = dataset.column(name) else {
                continue;
            };
            let mut checked = 0usize;
            let mut observed = BTreeSet::new();
            let mut non_conforming = 0usize;
            for value in column.present() {
                checked += 1;
                if !expected.accepts(value) {
                    non_conforming += 1;
                    observed.insert(value.kind());
                }
            }
            debug!(column = %name, expected = %expected, checked, non_conforming, "type check");
            if non_conforming == 0 {
                continue;
            }
            let observed = observed.into_iter().collect::<Vec<_>>().join("/");
            let message = format!(
                "Column '{name}' expected type {expected} but found {observed} in {non_conforming} of {checked} values"
            );
            let issue = if non_conforming == checked {
                Issue::error(RULE_NAME, message)
            } else {
                Issue::warning(RULE_NAME, message)
            };
            issues.push(
                issue
                    .with_column(name.as_str())
                    .with_metadata("check", checks::TYPE_MISMATCH)
                    .with_metadata("expected_type", expected.as_str())
                    .with_metadata("observed_type", observed)
                    .with_metadata("non_conforming_count", non_conforming)
                    .with_metadata("checked_count", checked),
            );
        }

        Ok(issues)
    }
}
