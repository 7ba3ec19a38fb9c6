//! Issue and validation-result types.
//!
//! Every rule produces `Issue`s; the validator collects them into one
//! `ValidationResult` per `validate` call. Neither type is mutated after the
//! validator returns it.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::compliance::ComplianceReport;

/// Ordinal seriousness of an issue. `Error` makes a result invalid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Info,
    Warning,
    Error,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Info => "info",
            Severity::Warning => "warning",
            Severity::Error => "error",
        }
    }
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Metadata flag the validator sets on an issue standing in for a rule or
/// scorer that failed.
pub const RULE_FAILURE_KEY: &str = "rule_failure";

/// A single finding produced by one rule.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Issue {
    pub severity: Severity,
    pub message: String,
    /// The dataset column the finding concerns, if it is column-scoped.
    pub column: Option<String>,
    /// Name of the rule that produced the issue.
    pub rule_name: String,
    /// Rule-specific structured detail (counts, samples, check kind).
    #[serde(default)]
    pub metadata: Map<String, Value>,
}

impl Issue {
    pub fn new(severity: Severity, rule_name: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            severity,
            message: message.into(),
            column: None,
            rule_name: rule_name.into(),
            metadata: Map::new(),
        }
    }

    pub fn error(rule_name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(Severity::Error, rule_name, message)
    }

    pub fn warning(rule_name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(Severity::Warning, rule_name, message)
    }

    pub fn info(rule_name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(Severity::Info, rule_name, message)
    }

    pub fn with_column(mut self, column: impl Into<String>) -> Self {
        self.column = Some(column.into());
        self
    }

    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }

    /// String metadata lookup.
    pub fn meta_str(&self, key: &str) -> Option<&str> {
        self.metadata.get(key).and_then(Value::as_str)
    }

    /// Unsigned metadata lookup.
    pub fn meta_u64(&self, key: &str) -> Option<u64> {
        self.metadata.get(key).and_then(Value::as_u64)
    }

    /// True for the issue the validator records in place of a failed rule.
    pub fn is_rule_failure(&self) -> bool {
        self.metadata.get(RULE_FAILURE_KEY).and_then(Value::as_bool) == Some(true)
    }
}

/// Dataset-level statistics computed by the validator after all rules ran.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationSummary {
    pub total_rows: usize,
    pub total_columns: usize,
    /// Missing-value count per column.
    pub missing_values: BTreeMap<String, usize>,
    pub duplicate_rows: usize,
    pub validation_rules_applied: usize,
    /// Present only when the validator was built with a compliance scorer.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub compliance_report: Option<ComplianceReport>,
}

/// The outcome of one `validate` call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationResult {
    /// True iff no issue has severity `error`.
    pub is_valid: bool,
    /// Issues in rule registration order.
    pub issues: Vec<Issue>,
    pub summary: ValidationSummary,
}

impl ValidationResult {
    /// Assemble a result; `is_valid` is derived from `issues`.
    pub fn new(issues: Vec<Issue>, summary: ValidationSummary) -> Self {
        let is_valid = !issues.iter().any(|i| i.severity == Severity::Error);
        Self {
            is_valid,
            issues,
            summary,
        }
    }

    pub fn issues_by_severity(&self, severity: Severity) -> Vec<&Issue> {
        self.issues.iter().filter(|i| i.severity == severity).collect()
    }

    pub fn issues_by_column(&self, column: &str) -> Vec<&Issue> {
        self.issues
            .iter()
            .filter(|i| i.column.as_deref() == Some(column))
            .collect()
    }

    pub fn issues_by_rule(&self, rule_name: &str) -> Vec<&Issue> {
        self.issues.iter().filter(|i| i.rule_name == rule_name).collect()
    }

    pub fn error_count(&self) -> usize {
        self.count(Severity::Error)
    }

    pub fn warning_count(&self) -> usize {
        self.count(Severity::Warning)
    }

    pub fn info_count(&self) -> usize {
        self.count(Severity::Info)
    }

    fn count(&self, severity: Severity) -> usize {
        self.issues.iter().filter(|i| i.severity == severity).count()
    }

    /// The nested, JSON-ready mapping handed to API and CLI collaborators.
    ///
    /// # Panics
    ///
    /// Panics if the result cannot be serialized to JSON, which cannot happen
    /// for these types: every map key is a string and every float is finite
    /// or already rejected by `serde_json` as `null`.
    pub fn to_json_value(&self) -> Value {
        serde_json::to_value(self).expect("ValidationResult must always be serializable to JSON")
    }
}
