//! Date parsing and inclusive date-range checks.

use chrono::NaiveDate;
use tracing::debug;

use medval_contracts::{Dataset, Issue, MedvalError, MedvalResult};
use medval_core::traits::Rule;

use crate::util::{parse_date, parse_date_str, samples};

pub const RULE_NAME: &str = "DateValidator";

/// Metadata `check` values emitted by this rule.
pub mod checks {
    pub const DATE_FORMAT: &str = "date_format";
    pub const DATE_RANGE: &str = "date_range";
}

/// Checks that date columns parse, and that parsed dates fall within bounds.
///
/// Unparseable values produce one `error` per column; parsed values outside
/// `[min_date, max_date]` produce a separate `warning`.
#[derive(Debug, Clone)]
pub struct DateValidator {
    columns: Vec<String>,
    min_date: Option<NaiveDate>,
    max_date: Option<NaiveDate>,
}

impl DateValidator {
    /// Bounds use the same accepted shapes as cell values.
    pub fn new<K: Into<String>>(
        columns: impl IntoIterator<Item = K>,
        min_date: Option<&str>,
        max_date: Option<&str>,
    ) -> MedvalResult<Self> {
        let min_date = min_date.map(parse_bound).transpose()?;
        let max_date = max_date.map(parse_bound).transpose()?;
        Self::with_bounds(columns, min_date, max_date)
    }

    pub fn with_bounds<K: Into<String>>(
        columns: impl IntoIterator<Item = K>,
        min_date: Option<NaiveDate>,
        max_date: Option<NaiveDate>,
    ) -> MedvalResult<Self> {
        if let (Some(min), Some(max)) = (min_date, max_date) {
            if min > max {
                return Err(MedvalError::config(format!(
                    "minimum date {min} is after maximum date {max}"
                )));
            }
        }
        Ok(Self {
            columns: columns.into_iter().map(Into::into).collect(),
            min_date,
            max_date,
        })
    }

    fn in_bounds(&self, date: NaiveDate) -> bool {
        self.min_date.map_or(true, |min| date >= min) && self.max_date.map_or(true, |max| date <= max)
    }
}

fn parse_bound(raw: &str) -> MedvalResult<NaiveDate> {
    parse_date_str(raw).ok_or_else(|| MedvalError::config(format!("unparseable date bound '{raw}'")))
}

impl Rule for DateValidator {
    fn name(&self) -> &str {
        RULE_NAME
    }

    fn evaluate(&self, dataset: &Dataset) -> MedvalResult<Vec<Issue>> {
        let mut issues = Vec::new();
        for name in &self.columns {
            let Some(column) = dataset.column(name) else {
                continue;
            };
            let mut unparseable = Vec::new();
            let mut out_of_range = Vec::new();
            for value in column.present() {
                match parse_date(value) {
                    None => unparseable.push(value),
                    Some(date) if !self.in_bounds(date) => out_of_range.push(value),
                    Some(_) => {}
                }
            }
            debug!(
                column = %name,
                unparseable = unparseable.len(),
                out_of_range = out_of_range.len(),
                "dates checked"
            );

            if !unparseable.is_empty() {
                issues.push(
                    Issue::error(
                        RULE_NAME,
                        format!(
                            "Column '{name}' has {} values that are not valid dates",
                            unparseable.len()
                        ),
                    )
                    .with_column(name.as_str())
                    .with_metadata("check", checks::DATE_FORMAT)
                    .with_metadata("invalid_count", unparseable.len())
                    .with_metadata("samples", samples(unparseable, 5)),
                );
            }

            if !out_of_range.is_empty() {
                let bound = |d: Option<NaiveDate>| d.map_or_else(|| "-".to_string(), |d| d.to_string());
                issues.push(
                    Issue::warning(
                        RULE_NAME,
                        format!(
                            "Column '{name}' has {} dates outside [{}, {}]",
                            out_of_range.len(),
                            bound(self.min_date),
                            bound(self.max_date)
                        ),
                    )
                    .with_column(name.as_str())
                    .with_metadata("check", checks::DATE_RANGE)
                    .with_metadata("out_of_range_count", out_of_range.len())
                    .with_metadata("samples", samples(out_of_range, 5)),
                );
            }
        }
        Ok(issues)
    }
}
