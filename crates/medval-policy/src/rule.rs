//! Custom rule configuration schema and compiled form.
//!
//! A `CustomRuleEntry` is what callers write in TOML (`[[rules]]` tables) or
//! send as a JSON mapping. Compiling it checks both regexes; a
//! `CompiledCustomRule` is what the registry stores and evaluates.

use regex::{Regex, RegexBuilder};
use serde::{Deserialize, Serialize};

use medval_contracts::{
    ComplianceSeverity, CustomRuleDefinition, Dataset, Issue, MedvalError, MedvalResult,
};
use medval_core::validator::COMPLIANCE_SCORER_RULE;
use medval_rules::{codes, dates, phi, quality, range, schema};

use crate::registry::CUSTOM_RULE_SET_NAME;

/// Metadata `kind` carried by every issue a custom rule produces.
pub const CUSTOM_RULE_KIND: &str = "custom_rule";

/// Rule names the built-in rules and the validator already report under.
pub const RESERVED_RULE_NAMES: &[&str] = &[
    schema::RULE_NAME,
    phi::RULE_NAME,
    quality::RULE_NAME,
    codes::RULE_NAME,
    range::RULE_NAME,
    dates::RULE_NAME,
    CUSTOM_RULE_SET_NAME,
    COMPLIANCE_SCORER_RULE,
];

fn default_severity() -> ComplianceSeverity {
    ComplianceSeverity::High
}

/// One custom rule as written in configuration.
///
/// Example in TOML:
/// ```toml
/// [[rules]]
/// name = "patient_id_format"
/// pattern = '^P\d{8}$'
/// field_pattern = '^patient_id$'
/// severity = "high"
/// description = "Patient IDs are P followed by eight digits"
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CustomRuleEntry {
    pub name: String,
    pub pattern: String,
    pub field_pattern: String,
    /// Defaults to `high` when omitted.
    #[serde(default = "default_severity")]
    pub severity: ComplianceSeverity,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub recommendation: String,
}

impl From<CustomRuleEntry> for CustomRuleDefinition {
    fn from(entry: CustomRuleEntry) -> Self {
        CustomRuleDefinition::new(entry.name, entry.pattern, entry.field_pattern, entry.severity)
            .with_description(entry.description)
            .with_recommendation(entry.recommendation)
    }
}

/// A TOML rule file: an ordered list of `[[rules]]`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CustomRuleFile {
    #[serde(default)]
    pub rules: Vec<CustomRuleEntry>,
}

/// A definition whose regexes have been compiled.
#[derive(Debug, Clone)]
pub struct CompiledCustomRule {
    definition: CustomRuleDefinition,
    value: Regex,
    field: Regex,
}

impl CompiledCustomRule {
    /// Compile both patterns. The field pattern matches case-insensitively.
    ///
    /// Empty names and the names in [`RESERVED_RULE_NAMES`] are rejected.
    pub fn compile(definition: CustomRuleDefinition) -> MedvalResult<Self> {
        if definition.name.trim().is_empty() {
            return Err(MedvalError::config("custom rule name must not be empty"));
        }
        if RESERVED_RULE_NAMES.contains(&definition.name.as_str()) {
            return Err(MedvalError::config(format!(
                "custom rule name '{}' is reserved for a built-in rule",
                definition.name
            )));
        }
        let value = Regex::new(&definition.pattern).map_err(|e| {
            MedvalError::config(format!(
                "custom rule '{}': invalid pattern: {e}",
                definition.name
            ))
        })?;
        let field = RegexBuilder::new(&definition.field_pattern)
            .case_insensitive(true)
            .build()
            .map_err(|e| {
                MedvalError::config(format!(
                    "custom rule '{}': invalid field pattern: {e}",
                    definition.name
                ))
            })?;
        Ok(Self {
            definition,
            value,
            field,
        })
    }

    pub fn definition(&self) -> &CustomRuleDefinition {
        &self.definition
    }

    pub fn applies_to(&self, column: &str) -> bool {
        self.field.is_match(column)
    }

    /// One issue per matching column with at least one non-conforming value.
    pub fn evaluate(&self, dataset: &Dataset) -> Vec<Issue> {
        let def = &self.definition;
        let mut issues = Vec::new();
        for column in dataset.columns().iter().filter(|c| self.applies_to(&c.name)) {
            let mut checked = 0usize;
            let mut offending: Vec<String> = Vec::new();
            let mut violations = 0usize;
            for text in column.present().filter_map(|v| v.as_text()) {
                checked += 1;
                if !self.value.is_match(&text) {
                    violations += 1;
                    if offending.len() < 5 && !offending.contains(&text) {
                        offending.push(text);
                    }
                }
            }
            if violations == 0 {
                continue;
            }
            let mut message = format!(
                "Custom rule '{}' violated in column '{}': {violations} of {checked} values do not match",
                def.name, column.name
            );
            if !def.description.is_empty() {
                message.push_str(&format!(" ({})", def.description));
            }
            issues.push(
                Issue::new(def.severity.issue_severity(), def.name.as_str(), message)
                    .with_column(column.name.as_str())
                    .with_metadata("kind", CUSTOM_RULE_KIND)
                    .with_metadata("compliance_severity", def.severity.as_str())
                    .with_metadata("violation_count", violations)
                    .with_metadata("total_checked", checked)
                    .with_metadata("recommendation", def.recommendation.as_str())
                    .with_metadata("samples", offending),
            );
        }
        issues
    }
}
