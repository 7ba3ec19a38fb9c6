//! Medical code validation against per-system lexical grammars.

use tracing::debug;

use medval_contracts::{CodeSystem, Dataset, Issue, MedvalResult};
use medval_core::traits::Rule;

use crate::util::samples;

pub const RULE_NAME: &str = "MedicalCodeValidator";

const SAMPLE_LIMIT: usize = 5;

/// Validates configured columns as codes of a given system.
///
/// Configured columns absent from the dataset are skipped.
#[derive(Debug, Clone, Default)]
pub struct MedicalCodeValidator {
    columns: Vec<(String, CodeSystem)>,
}

impl MedicalCodeValidator {
    pub fn new<K: Into<String>>(code_columns: impl IntoIterator<Item = (K, CodeSystem)>) -> Self {
        let mut validator = Self::default();
        for (column, system) in code_columns {
            validator.add_code_type(column, system);
        }
        validator
    }

    /// Build from code-system names (`"icd10"`, `"LOINC"`, ...).
    pub fn from_names<K, S>(code_columns: impl IntoIterator<Item = (K, S)>) -> MedvalResult<Self>
    where
        K: Into<String>,
        S: AsRef<str>,
    {
        let mut validator = Self::default();
        for (column, system) in code_columns {
            validator.add_code_type(column, system.as_ref().parse()?);
        }
        Ok(validator)
    }

    /// Map `column` to `system`, replacing any earlier mapping for that column.
    pub fn add_code_type(&mut self, column: impl Into<String>, system: CodeSystem) -> &mut Self {
        let column = column.into();
        match self.columns.iter_mut().find(|(c, _)| *c == column) {
            Some(entry) => entry.1 = system,
            None => self.columns.push((column, system)),
        }
        self
    }

    pub fn code_columns(&self) -> &[(String, CodeSystem)] {
        &self.columns
    }
}

impl Rule for MedicalCodeValidator {
    fn name(&self) -> &str {
        RULE_NAME
    }

    fn evaluate(&self, dataset: &Dataset) -> MedvalResult<Vec<Issue>> {
        let mut issues = Vec::new();
        for (name, system) in &self.columns {
            let Some(column) = dataset.column(name) else {
                debug!(column = %name, "code column absent, skipping");
                continue;
            };
            let mut total = 0usize;
            let mut invalid = Vec::new();
            for value in column.present() {
                total += 1;
                let valid = value
                    .as_text()
                    .is_some_and(|text| system.is_valid(&text));
                if !valid {
                    invalid.push(value);
                }
            }
            debug!(column = %name, system = %system, total, invalid = invalid.len(), "codes checked");
            if invalid.is_empty() {
                continue;
            }
            issues.push(
                Issue::error(
                    RULE_NAME,
                    format!(
                        "Column '{name}' has {} invalid {} codes out of {total}",
                        invalid.len(),
                        system.label()
                    ),
                )
                .with_column(name.as_str())
                .with_metadata("code_system", system.as_str())
                .with_metadata("invalid_count", invalid.len())
                .with_metadata("total_checked", total)
                .with_metadata("samples", samples(invalid, SAMPLE_LIMIT)),
            );
        }
        Ok(issues)
    }
}

#[cfg(test)]
mod tests {
    use medval_contracts::{CellValue, Column, MedvalError, Severity};

    use super::*;

    fn dataset() -> Dataset {
        Dataset::new(vec![
            Column::new("diagnosis", vec![
                CellValue::from("E11.9"),
                CellValue::from("INVALID"),
                CellValue::from("J45.909"),
                CellValue::Null,
            ]),
            Column::new("procedure", vec![
                CellValue::Int(99213),
                CellValue::from("99214"),
                CellValue::from("992"),
                CellValue::from("99215"),
            ]),
        ])
        .unwrap()
    }

    #[test]
    fn one_issue_per_column_with_invalid_count() {
        let rule = MedicalCodeValidator::new([
            ("diagnosis", CodeSystem::Icd10),
            ("procedure", CodeSystem::Cpt),
        ]);
        let issues = rule.evaluate(&dataset()).unwrap();

        assert_eq!(issues.len(), 2);
        assert_eq!(issues[0].column.as_deref(), Some("diagnosis"));
        assert_eq!(issues[0].severity, Severity::Error);
        assert_eq!(issues[0].meta_u64("invalid_count"), Some(1));
        assert_eq!(issues[0].meta_u64("total_checked"), Some(3));
        assert_eq!(issues[0].metadata["samples"], serde_json::json!(["INVALID"]));
        assert!(issues[0].message.contains("ICD-10"));
        assert_eq!(issues[1].meta_str("code_system"), Some("cpt"));
    }

    #[test]
    fn add_code_type_replaces_existing_mapping() {
        let mut rule = MedicalCodeValidator::new([("diagnosis", CodeSystem::Loinc)]);
        rule.add_code_type("diagnosis", CodeSystem::Icd10)
            .add_code_type("missing_col", CodeSystem::Ndc);

        assert_eq!(rule.code_columns().len(), 2);
        let issues = rule.evaluate(&dataset()).unwrap();
        assert_eq!(issues.len(), 1, "absent column is skipped: {:?}", issues);
        assert_eq!(issues[0].meta_u64("invalid_count"), Some(1));
    }

    #[test]
    fn unknown_system_name_is_config_error() {
        match MedicalCodeValidator::from_names([("dx", "icd11")]) {
            Err(MedvalError::ConfigError { reason }) => assert!(reason.contains("icd11")),
            other => panic!("expected ConfigError, got {:?}", other),
        }
    }
}
