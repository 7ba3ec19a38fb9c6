//! Data quality checks: missing values, constant columns, duplicate rows.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use tracing::debug;

use medval_contracts::{Dataset, Issue, MedvalError, MedvalResult};
use medval_core::traits::Rule;

pub const RULE_NAME: &str = "DataQualityChecker";

/// Metadata `check` values emitted by this rule.
pub mod checks {
    pub const ALL_MISSING: &str = "all_missing";
    pub const MISSING_VALUES: &str = "missing_values";
    pub const CONSTANT_COLUMN: &str = "constant_column";
    pub const DUPLICATE_ROWS: &str = "duplicate_rows";
}

/// Missing-value ratios above which a column is flagged.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct QualityThresholds {
    pub missing_warning: f64,
    pub missing_error: f64,
}

impl Default for QualityThresholds {
    fn default() -> Self {
        Self {
            missing_warning: 0.1,
            missing_error: 0.5,
        }
    }
}

impl QualityThresholds {
    /// Both ratios must lie in `[0, 1]` with `warning <= error`.
    pub fn new(missing_warning: f64, missing_error: f64) -> MedvalResult<Self> {
        let in_unit = |v: f64| (0.0..=1.0).contains(&v);
        if !in_unit(missing_warning) || !in_unit(missing_error) {
            return Err(MedvalError::config(format!(
                "missing-value thresholds must be within [0, 1], got {missing_warning} and {missing_error}"
            )));
        }
        if missing_warning > missing_error {
            return Err(MedvalError::config(format!(
                "warning threshold {missing_warning} exceeds error threshold {missing_error}"
            )));
        }
        Ok(Self {
            missing_warning,
            missing_error,
        })
    }
}

/// Per-column completeness and variability, plus dataset-level duplicates.
#[derive(Debug, Clone, Default)]
pub struct DataQualityChecker {
    thresholds: QualityThresholds,
}

impl DataQualityChecker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_thresholds(thresholds: QualityThresholds) -> Self {
        Self { thresholds }
    }

    pub fn thresholds(&self) -> QualityThresholds {
        self.thresholds
    }
}

impl Rule for DataQualityChecker {
    fn name(&self) -> &str {
        RULE_NAME
    }

    fn evaluate(&self, dataset: &Dataset) -> MedvalResult<Vec<Issue>> {
        let mut issues = Vec::new();
        let rows = dataset.row_count();

        for column in dataset.columns() {
            if rows == 0 {
                break;
            }
            let missing = column.missing_count();
            let ratio = missing as f64 / rows as f64;

            if missing == rows {
                issues.push(
                    Issue::error(
                        RULE_NAME,
                        format!("Column '{}' has no values (all {rows} missing)", column.name),
                    )
                    .with_column(column.name.as_str())
                    .with_metadata("check", checks::ALL_MISSING)
                    .with_metadata("missing_count", missing),
                );
                continue;
            }

            if ratio > self.thresholds.missing_warning {
                let message = format!(
                    "Column '{}' has {:.1}% missing values ({missing} of {rows})",
                    column.name,
                    ratio * 100.0
                );
                let issue = if ratio > self.thresholds.missing_error {
                    Issue::error(RULE_NAME, message)
                } else {
                    Issue::warning(RULE_NAME, message)
                };
                issues.push(
                    issue
                        .with_column(column.name.as_str())
                        .with_metadata("check", checks::MISSING_VALUES)
                        .with_metadata("missing_count", missing)
                        .with_metadata("missing_ratio", ratio),
                );
            }

            let present: Vec<String> = column.present().map(|v| v.identity_key()).collect();
            if rows >= 2 && present.len() >= 2 {
                let distinct: HashSet<&String> = present.iter().collect();
                if distinct.len() == 1 {
                    let value = column
                        .present()
                        .next()
                        .map(|v| v.to_string())
                        .unwrap_or_default();
                    issues.push(
                        Issue::info(
                            RULE_NAME,
                            format!("Column '{}' has a single constant value '{value}'", column.name),
                        )
                        .with_column(column.name.as_str())
                        .with_metadata("check", checks::CONSTANT_COLUMN)
                        .with_metadata("value", value),
                    );
                }
            }
        }

        let duplicates = dataset.duplicate_row_count();
        debug!(rows, duplicates, "quality scan complete");
        if duplicates > 0 {
            issues.push(
                Issue::warning(RULE_NAME, format!("Found {duplicates} duplicate rows"))
                    .with_metadata("check", checks::DUPLICATE_ROWS)
                    .with_metadata("duplicate_count", duplicates),
            );
        }

        Ok(issues)
    }
}

#[cfg(test)]
mod tests {
    use medval_contracts::{CellValue, Column, Severity};

    use super::*;

    fn check_of(issue: &Issue) -> &str {
        issue.meta_str("check").unwrap_or("")
    }

    /// An all-null column and a constant column produce distinct issues.
    #[test]
    fn all_missing_is_distinct_from_constant() {
        let ds = Dataset::new(vec![
            Column::new("empty", vec![CellValue::Null, CellValue::Null, CellValue::Null]),
            Column::new("site", ["Boston", "Boston", "Boston"]),
            Column::new("id", [1, 2, 3]),
        ])
        .unwrap();

        let issues = DataQualityChecker::new().evaluate(&ds).unwrap();

        let empty: Vec<_> = issues.iter().filter(|i| i.column.as_deref() == Some("empty")).collect();
        assert_eq!(empty.len(), 1, "issues: {:?}", issues);
        assert_eq!(check_of(empty[0]), checks::ALL_MISSING);
        assert_eq!(empty[0].severity, Severity::Error);

        let site: Vec<_> = issues.iter().filter(|i| i.column.as_deref() == Some("site")).collect();
        assert_eq!(site.len(), 1);
        assert_eq!(check_of(site[0]), checks::CONSTANT_COLUMN);
        assert_eq!(site[0].severity, Severity::Info);

        assert!(issues.iter().all(|i| i.column.as_deref() != Some("id")));
    }

    #[test]
    fn missing_ratio_thresholds() {
        // 1 of 5 missing (20%) → warning; 3 of 5 (60%) → error; 0 → nothing.
        let ds = Dataset::new(vec![
            Column::new("a", vec![Some(1), None, Some(3), Some(4), Some(5)]),
            Column::new("b", vec![Some(1), None, None, None, Some(5)]),
            Column::new("c", [1, 2, 3, 4, 5]),
        ])
        .unwrap();

        let issues = DataQualityChecker::new().evaluate(&ds).unwrap();

        let a = issues.iter().find(|i| i.column.as_deref() == Some("a")).unwrap();
        assert_eq!(a.severity, Severity::Warning);
        let b = issues.iter().find(|i| i.column.as_deref() == Some("b")).unwrap();
        assert_eq!(b.severity, Severity::Error);
        assert!(issues.iter().all(|i| i.column.as_deref() != Some("c")));
    }

    #[test]
    fn duplicate_rows_are_a_dataset_level_warning() {
        let ds = Dataset::new(vec![
            Column::new("id", ["A", "B", "A"]),
            Column::new("v", [1, 2, 1]),
        ])
        .unwrap();

        let issues = DataQualityChecker::new().evaluate(&ds).unwrap();

        let dup = issues
            .iter()
            .find(|i| check_of(i) == checks::DUPLICATE_ROWS)
            .unwrap();
        assert_eq!(dup.severity, Severity::Warning);
        assert!(dup.column.is_none());
        assert_eq!(dup.meta_u64("duplicate_count"), Some(1));
    }

    #[test]
    fn single_row_is_never_constant() {
        let ds = Dataset::new(vec![Column::new("site", ["Boston"])]).unwrap();
        assert!(DataQualityChecker::new().evaluate(&ds).unwrap().is_empty());
    }

    #[test]
    fn custom_thresholds_are_validated() {
        assert!(QualityThresholds::new(0.2, 0.8).is_ok());
        assert!(matches!(
            QualityThresholds::new(0.6, 0.4),
            Err(MedvalError::ConfigError { .. })
        ));
        assert!(QualityThresholds::new(-0.1, 0.5).is_err());
    }
}
