//! Inclusive numeric range checks.

use serde::{Deserialize, Serialize};
use tracing::debug;

use medval_contracts::{Dataset, Issue, MedvalError, MedvalResult};
use medval_core::traits::Rule;

use crate::util::samples;

pub const RULE_NAME: &str = "RangeValidator";

/// Inclusive bounds. Either side may be open.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NumericRange {
    #[serde(default)]
    pub min: Option<f64>,
    #[serde(default)]
    pub max: Option<f64>,
}

impl NumericRange {
    pub fn new(min: Option<f64>, max: Option<f64>) -> MedvalResult<Self> {
        let range = Self { min, max };
        range.check()?;
        Ok(range)
    }

    pub fn between(min: f64, max: f64) -> MedvalResult<Self> {
        Self::new(Some(min), Some(max))
    }

    pub fn at_least(min: f64) -> MedvalResult<Self> {
        Self::new(Some(min), None)
    }

    pub fn at_most(max: f64) -> MedvalResult<Self> {
        Self::new(None, Some(max))
    }

    /// Reject NaN bounds and inverted ranges.
    pub fn check(&self) -> MedvalResult<()> {
        if self.min.is_some_and(f64::is_nan) || self.max.is_some_and(f64::is_nan) {
            return Err(MedvalError::config("range bounds must not be NaN"));
        }
        if let (Some(min), Some(max)) = (self.min, self.max) {
            if min > max {
                return Err(MedvalError::config(format!(
                    "range minimum {min} is greater than maximum {max}"
                )));
            }
        }
        Ok(())
    }

    pub fn contains(&self, value: f64) -> bool {
        self.min.map_or(true, |min| value >= min) && self.max.map_or(true, |max| value <= max)
    }

    fn describe(&self) -> String {
        let fmt = |b: Option<f64>| b.map_or_else(|| "unbounded".to_string(), |v| v.to_string());
        format!("[{}, {}]", fmt(self.min), fmt(self.max))
    }
}

/// Flags numeric values outside configured per-column bounds.
#[derive(Debug, Clone, Default)]
pub struct RangeValidator {
    ranges: Vec<(String, NumericRange)>,
}

impl RangeValidator {
    /// Every range is re-checked, so hand-built `NumericRange` values are
    /// validated too.
    pub fn new<K: Into<String>>(
        ranges: impl IntoIterator<Item = (K, NumericRange)>,
    ) -> MedvalResult<Self> {
        let mut validator = Self::default();
        for (column, range) in ranges {
            validator.set_range(column, range)?;
        }
        Ok(validator)
    }

    pub fn set_range(&mut self, column: impl Into<String>, range: NumericRange) -> MedvalResult<()> {
        let column = column.into();
        range.check().map_err(|e| match e {
            MedvalError::ConfigError { reason } => {
                MedvalError::config(format!("column '{column}': {reason}"))
            }
            other => other,
        })?;
        match self.ranges.iter_mut().find(|(c, _)| *c == column) {
            Some(entry) => entry.1 = range,
            None => self.ranges.push((column, range)),
        }
        Ok(())
    }

    pub fn ranges(&self) -> &[(String, NumericRange)] {
        &self.ranges
    }
}

impl Rule for RangeValidator {
    fn name(&self) -> &str {
        RULE_NAME
    }

    fn evaluate(&self, dataset: &Dataset) -> MedvalResult<Vec<Issue>> {
        let mut issues = Vec::new();
        for (name, range) in &self.ranges {
            let Some(column) = dataset.column(name) else {
                continue;
            };
            let mut out_of_range = Vec::new();
            let mut non_numeric = 0usize;
            for value in column.present() {
                match value.as_f64() {
                    Some(v) if !range.contains(v) => out_of_range.push(value),
                    Some(_) => {}
                    None => non_numeric += 1,
                }
            }
            debug!(
                column = %name,
                out_of_range = out_of_range.len(),
                non_numeric,
                "range checked"
            );
            if out_of_range.is_empty() {
                continue;
            }
            let mut issue = Issue::error(
                RULE_NAME,
                format!(
                    "Column '{name}' has {} values outside {}",
                    out_of_range.len(),
                    range.describe()
                ),
            )
            .with_column(name.as_str())
            .with_metadata("out_of_range_count", out_of_range.len())
            .with_metadata("non_numeric_count", non_numeric)
            .with_metadata("samples", samples(out_of_range, 5));
            if let Some(min) = range.min {
                issue = issue.with_metadata("min", min);
            }
            if let Some(max) = range.max {
                issue = issue.with_metadata("max", max);
            }
            issues.push(issue);
        }
        Ok(issues)
    }
}
