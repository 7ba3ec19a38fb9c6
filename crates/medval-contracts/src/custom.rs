//! User-declared custom rule definitions.
//!
//! A `CustomRuleDefinition` is the mapping API callers send and receive:
//! `{name, pattern, severity, field_pattern, description, recommendation}`.
//! Compilation and evaluation live in the policy crate.

use serde::{Deserialize, Serialize};

use crate::compliance::ComplianceSeverity;

/// A pattern rule applied to every column whose name matches `field_pattern`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomRuleDefinition {
    /// Unique key within a registry.
    pub name: String,
    /// Regex every non-missing value of a matched column must satisfy.
    pub pattern: String,
    pub severity: ComplianceSeverity,
    /// Regex selecting columns by name (case-insensitive).
    pub field_pattern: String,
    pub description: String,
    #[serde(default)]
    pub recommendation: String,
}

impl CustomRuleDefinition {
    pub fn new(
        name: impl Into<String>,
        pattern: impl Into<String>,
        field_pattern: impl Into<String>,
        severity: ComplianceSeverity,
    ) -> Self {
        Self {
            name: name.into(),
            pattern: pattern.into(),
            severity,
            field_pattern: field_pattern.into(),
            description: String::new(),
            recommendation: String::new(),
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_recommendation(mut self, recommendation: impl Into<String>) -> Self {
        self.recommendation = recommendation.into();
        self
    }
}
