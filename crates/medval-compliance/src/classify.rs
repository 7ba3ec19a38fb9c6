//! Issue → violation classification, one function per standard.
//!
//! Issues are recognized by the emitting rule's name and the `check` / `kind`
//! metadata it attaches. Stand-ins for failed rules and custom-rule issues
//! never count as built-in findings. Standards that need knowledge the rules do not
//! report (audit columns, special-category data, unchecked code columns)
//! inspect column names and values directly.

use std::collections::{BTreeMap, BTreeSet};

use serde_json::{json, Map, Value};

use medval_contracts::{
    CodeSystem, ComplianceSeverity, Dataset, Issue, MedvalError, MedvalResult, Violation,
};
use medval_policy::{CustomRuleRegistry, CUSTOM_RULE_KIND};
use medval_rules::{codes, dates, phi, quality, schema};

use crate::recommendations::{categories, invalid_code_category, recommendation_for};
use crate::standard::Standard;

/// What one standard found.
#[derive(Debug, Default)]
pub(crate) struct Findings {
    pub violations: Vec<Violation>,
    pub details: Map<String, Value>,
    /// Medical coding only: violations per code system, including systems
    /// that were checked and had none.
    pub groups: BTreeMap<String, Vec<Violation>>,
}

fn violation(
    standard: Standard,
    severity: ComplianceSeverity,
    category: &str,
    message: String,
    column: Option<&str>,
) -> Violation {
    Violation {
        standard: standard.as_str().to_string(),
        severity,
        category: category.to_string(),
        message,
        column: column.map(str::to_string),
        recommendation: recommendation_for(category).to_string(),
    }
}

/// Lowercase alphanumeric tokens of a column name.
fn name_tokens(name: &str) -> Vec<String> {
    name.split(|c: char| !c.is_ascii_alphanumeric())
        .filter(|t| !t.is_empty())
        .map(str::to_ascii_lowercase)
        .collect()
}

/// A finding the built-in `rule` actually produced.
fn emitted_by(issue: &Issue, rule: &str) -> bool {
    issue.rule_name == rule
        && !issue.is_rule_failure()
        && issue.meta_str("kind") != Some(CUSTOM_RULE_KIND)
}

fn is_check(issue: &Issue, rule: &str, check: &str) -> bool {
    emitted_by(issue, rule) && issue.meta_str("check") == Some(check)
}

/// A PHIDetector finding as the scorer needs it.
struct PhiFinding<'a> {
    phi_type: &'a str,
    tier: ComplianceSeverity,
    name_only: bool,
    column: Option<&'a str>,
}

fn phi_findings(issues: &[Issue]) -> MedvalResult<Vec<PhiFinding<'_>>> {
    issues
        .iter()
        .filter(|i| emitted_by(i, phi::RULE_NAME))
        .map(|issue| {
            let tier = issue
                .meta_str("risk")
                .and_then(|r| r.parse::<ComplianceSeverity>().ok())
                .ok_or_else(|| MedvalError::ComplianceScoring {
                    reason: format!(
                        "PHIDetector issue on column '{}' carries no usable risk tier",
                        issue.column.as_deref().unwrap_or("?")
                    ),
                })?;
            Ok(PhiFinding {
                phi_type: issue.meta_str("phi_type").unwrap_or("phi"),
                tier,
                name_only: issue.meta_str("match_source") == Some("column_name"),
                column: issue.column.as_deref(),
            })
        })
        .collect()
}

// ── HIPAA ─────────────────────────────────────────────────────────────────────

/// One violation per PHI finding. Severity is the pattern tier, one step
/// lower when only the column name matched.
pub(crate) fn hipaa(issues: &[Issue]) -> MedvalResult<Findings> {
    let mut findings = Findings::default();
    let mut columns = Vec::new();
    for f in phi_findings(issues)? {
        let severity = if f.name_only { f.tier.lowered() } else { f.tier };
        let column = f.column.unwrap_or("?");
        findings.violations.push(violation(
            Standard::Hipaa,
            severity,
            f.phi_type,
            format!("Protected health information ({}) in column '{column}'", f.phi_type),
            f.column,
        ));
        columns.push(column.to_string());
    }
    findings.details.insert("phi_columns".into(), json!(columns));
    Ok(findings)
}

// ── GDPR ──────────────────────────────────────────────────────────────────────

/// Token prefixes that mark Article 9 special-category data.
const SPECIAL_CATEGORY_PREFIXES: &[&str] = &[
    "race", "racial", "ethnic", "religio", "sexual", "politic", "genetic", "genom", "biometric",
    "union",
];

fn is_special_category(column: &str) -> bool {
    name_tokens(column)
        .iter()
        .any(|t| SPECIAL_CATEGORY_PREFIXES.iter().any(|p| t.starts_with(p)))
}

fn records_lawful_basis(column: &str) -> bool {
    let lower = column.to_ascii_lowercase();
    lower.contains("consent") || lower.contains("lawful") || lower.contains("legal_basis")
}

pub(crate) fn gdpr(issues: &[Issue], dataset: &Dataset) -> MedvalResult<Findings> {
    let mut findings = Findings::default();

    for f in phi_findings(issues)? {
        let severity = f.tier.min(ComplianceSeverity::High);
        findings.violations.push(violation(
            Standard::Gdpr,
            severity,
            categories::PERSONAL_DATA,
            format!(
                "Personal data ({}) in column '{}'",
                f.phi_type,
                f.column.unwrap_or("?")
            ),
            f.column,
        ));
    }

    let special: Vec<&str> = dataset
        .column_names()
        .filter(|name| is_special_category(name))
        .collect();
    for &name in &special {
        findings.violations.push(violation(
            Standard::Gdpr,
            ComplianceSeverity::High,
            categories::SPECIAL_CATEGORY_DATA,
            format!("Column '{name}' appears to hold special-category personal data"),
            Some(name),
        ));
    }

    let lawful_basis = dataset.column_names().any(records_lawful_basis);
    if !findings.violations.is_empty() && !lawful_basis {
        findings.violations.push(violation(
            Standard::Gdpr,
            ComplianceSeverity::Medium,
            categories::MISSING_LAWFUL_BASIS,
            "Personal data is present but no consent or lawful-basis column was found".into(),
            None,
        ));
    }

    findings
        .details
        .insert("special_category_columns".into(), json!(special));
    findings
        .details
        .insert("lawful_basis_recorded".into(), json!(lawful_basis));
    Ok(findings)
}

// ── FDA 21 CFR Part 11 ────────────────────────────────────────────────────────

const TIMESTAMP_TOKENS: &[&str] = &[
    "timestamp", "datetime", "time", "created", "modified", "updated", "recorded",
];
const USER_TOKENS: &[&str] = &[
    "user", "userid", "username", "operator", "author", "signer", "signature", "by",
];

fn find_column<'a>(dataset: &'a Dataset, tokens: &[&str]) -> Option<&'a str> {
    dataset
        .column_names()
        .find(|name| name_tokens(name).iter().any(|t| tokens.contains(&t.as_str())))
}

pub(crate) fn fda(issues: &[Issue], dataset: &Dataset) -> Findings {
    let mut findings = Findings::default();

    let timestamp = find_column(dataset, TIMESTAMP_TOKENS);
    if timestamp.is_none() {
        findings.violations.push(violation(
            Standard::Fda,
            ComplianceSeverity::High,
            categories::MISSING_AUDIT_TIMESTAMP,
            "No timestamp column: records cannot be placed on an audit trail".into(),
            None,
        ));
    }
    let user = find_column(dataset, USER_TOKENS);
    if user.is_none() {
        findings.violations.push(violation(
            Standard::Fda,
            ComplianceSeverity::High,
            categories::MISSING_USER_ATTRIBUTION,
            "No user column: records cannot be attributed to the person who entered them".into(),
            None,
        ));
    }

    for issue in issues {
        let classified = if is_check(issue, schema::RULE_NAME, schema::checks::MISSING_COLUMN) {
            Some((ComplianceSeverity::High, categories::MISSING_REQUIRED_FIELD))
        } else if is_check(issue, quality::RULE_NAME, quality::checks::MISSING_VALUES)
            || is_check(issue, quality::RULE_NAME, quality::checks::ALL_MISSING)
        {
            Some((ComplianceSeverity::Medium, categories::INCOMPLETE_RECORDS))
        } else if is_check(issue, quality::RULE_NAME, quality::checks::DUPLICATE_ROWS) {
            Some((ComplianceSeverity::Medium, categories::DUPLICATE_RECORDS))
        } else if is_check(issue, dates::RULE_NAME, dates::checks::DATE_FORMAT) {
            Some((ComplianceSeverity::Medium, categories::INVALID_DATES))
        } else {
            None
        };
        if let Some((severity, category)) = classified {
            findings.violations.push(violation(
                Standard::Fda,
                severity,
                category,
                issue.message.clone(),
                issue.column.as_deref(),
            ));
        }
    }

    findings.details.insert("timestamp_column".into(), json!(timestamp));
    findings.details.insert("user_column".into(), json!(user));
    findings
}

// ── Medical coding ────────────────────────────────────────────────────────────

/// Severity of a coding finding by the share of invalid codes.
pub(crate) fn coding_severity(invalid: usize, total: usize) -> ComplianceSeverity {
    let ratio = if total == 0 {
        1.0
    } else {
        invalid as f64 / total as f64
    };
    if ratio >= 0.5 {
        ComplianceSeverity::Critical
    } else if ratio >= 0.2 {
        ComplianceSeverity::High
    } else if ratio >= 0.05 {
        ComplianceSeverity::Medium
    } else {
        ComplianceSeverity::Low
    }
}

fn coding_violation(system: CodeSystem, column: &str, invalid: usize, total: usize) -> Violation {
    violation(
        Standard::MedicalCoding,
        coding_severity(invalid, total),
        &invalid_code_category(system.as_str()),
        format!(
            "{invalid} of {total} {} codes in column '{column}' are invalid",
            system.label()
        ),
        Some(column),
    )
}

/// One violation per MedicalCodeValidator issue, plus direct inspection of
/// code-named columns no such issue reported on.
pub(crate) fn medical_coding(issues: &[Issue], dataset: &Dataset) -> MedvalResult<Findings> {
    let mut findings = Findings::default();
    let mut reported: BTreeSet<&str> = BTreeSet::new();

    for issue in issues.iter().filter(|i| emitted_by(i, codes::RULE_NAME)) {
        let column = issue.column.as_deref().unwrap_or("?");
        let system = issue
            .meta_str("code_system")
            .and_then(|s| s.parse::<CodeSystem>().ok())
            .ok_or_else(|| MedvalError::ComplianceScoring {
                reason: format!(
                    "MedicalCodeValidator issue on column '{column}' names no known code system"
                ),
            })?;
        let invalid = issue.meta_u64("invalid_count").unwrap_or(0) as usize;
        let total = issue.meta_u64("total_checked").unwrap_or(0) as usize;
        reported.insert(column);
        findings
            .groups
            .entry(system.as_str().to_string())
            .or_default()
            .push(coding_violation(system, column, invalid, total));
    }

    let mut inspected = Vec::new();
    for column in dataset.columns() {
        if reported.contains(column.name.as_str()) {
            continue;
        }
        let Some(system) = CodeSystem::from_column_name(&column.name) else {
            continue;
        };
        let values: Vec<String> = column.present().filter_map(|v| v.as_text()).collect();
        if values.is_empty() {
            continue;
        }
        let invalid = values.iter().filter(|v| !system.is_valid(v)).count();
        let group = findings.groups.entry(system.as_str().to_string()).or_default();
        if invalid > 0 {
            group.push(coding_violation(system, &column.name, invalid, values.len()));
        }
        inspected.push(column.name.clone());
    }

    findings.violations = findings.groups.values().flatten().cloned().collect();
    findings
        .details
        .insert("columns_inspected".into(), json!(inspected));
    Ok(findings)
}

// ── Custom rules ──────────────────────────────────────────────────────────────

/// One violation per custom-rule issue, with the rule's own severity and
/// recommendation.
pub(crate) fn custom_rules(
    issues: &[Issue],
    registry: Option<&CustomRuleRegistry>,
) -> MedvalResult<Findings> {
    let mut findings = Findings::default();
    let mut violated: BTreeSet<&str> = BTreeSet::new();

    for issue in issues
        .iter()
        .filter(|i| i.meta_str("kind") == Some(CUSTOM_RULE_KIND) && !i.is_rule_failure())
    {
        let severity = issue
            .meta_str("compliance_severity")
            .and_then(|s| s.parse::<ComplianceSeverity>().ok())
            .ok_or_else(|| MedvalError::ComplianceScoring {
                reason: format!(
                    "custom rule issue from '{}' carries no usable severity",
                    issue.rule_name
                ),
            })?;
        let mut v = violation(
            Standard::CustomRules,
            severity,
            &issue.rule_name,
            issue.message.clone(),
            issue.column.as_deref(),
        );
        v.recommendation = match issue.meta_str("recommendation") {
            Some(text) if !text.is_empty() => text.to_string(),
            _ => recommendation_for(categories::CUSTOM_RULE).to_string(),
        };
        findings.violations.push(v);
        violated.insert(issue.rule_name.as_str());
    }

    let configured = registry.map_or(violated.len(), |r| r.len());
    findings
        .details
        .insert("rules_configured".into(), json!(configured));
    findings
        .details
        .insert("rules_violated".into(), json!(violated.len()));
    Ok(findings)
}
