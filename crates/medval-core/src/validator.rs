//! The medval validator: runs an ordered rule set over one dataset.
//!
//! The validator enforces the partial-failure model:
//!
//!   Rule 1 → Rule 2 → ... → Rule n → Summary → [ComplianceScorer]
//!
//! A failing rule (an `Err` return or a panic) is converted into a single
//! `error` issue naming that rule, and evaluation continues with the next
//! one. `validate` therefore always returns a `ValidationResult` for any
//! dataset that was accepted by `Dataset::new`.

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};

use tracing::{debug, info, warn};

use medval_contracts::issue::RULE_FAILURE_KEY;
use medval_contracts::{Dataset, Issue, MedvalResult, ValidationResult, ValidationSummary};

use crate::report::render_report;
use crate::traits::{ComplianceScorer, FnRule, Rule};

/// Rule name attached to the issue raised when the compliance scorer fails.
pub const COMPLIANCE_SCORER_RULE: &str = "ComplianceScorer";

/// The orchestrator that owns the rule set and the optional scorer.
///
/// Rule configuration is fixed once registered, so a built validator can be
/// shared across threads and called concurrently.
pub struct MedicalDataValidator {
    rules: Vec<Box<dyn Rule>>,
    compliance: Option<Box<dyn ComplianceScorer>>,
}

impl Default for MedicalDataValidator {
    fn default() -> Self {
        Self::new()
    }
}

impl MedicalDataValidator {
    /// An empty validator with compliance scoring disabled.
    pub fn new() -> Self {
        Self {
            rules: Vec::new(),
            compliance: None,
        }
    }

    /// A validator pre-loaded with `rules`, evaluated in the given order.
    pub fn with_rules(rules: Vec<Box<dyn Rule>>) -> Self {
        Self {
            rules,
            compliance: None,
        }
    }

    /// Enable compliance scoring with the given scorer.
    pub fn with_compliance(mut self, scorer: Box<dyn ComplianceScorer>) -> Self {
        self.compliance = Some(scorer);
        self
    }

    /// In-place variant of [`with_compliance`](Self::with_compliance).
    pub fn enable_compliance(&mut self, scorer: Box<dyn ComplianceScorer>) {
        self.compliance = Some(scorer);
    }

    pub fn disable_compliance(&mut self) {
        self.compliance = None;
    }

    pub fn is_compliance_enabled(&self) -> bool {
        self.compliance.is_some()
    }

    /// Append a rule. Registration order is evaluation order.
    pub fn add_rule<R: Rule + 'static>(&mut self, rule: R) -> &mut Self {
        self.rules.push(Box::new(rule));
        self
    }

    pub fn add_boxed_rule(&mut self, rule: Box<dyn Rule>) -> &mut Self {
        self.rules.push(rule);
        self
    }

    /// Register a closure as a named rule.
    pub fn add_validator<F>(&mut self, name: impl Into<String>, func: F) -> &mut Self
    where
        F: Fn(&Dataset) -> MedvalResult<Vec<Issue>> + Send + Sync + 'static,
    {
        self.add_rule(FnRule::new(name, func))
    }

    pub fn rule_count(&self) -> usize {
        self.rules.len()
    }

    pub fn rule_names(&self) -> Vec<&str> {
        self.rules.iter().map(|r| r.name()).collect()
    }

    /// Run every rule against `dataset` and aggregate the result.
    ///
    /// # Pipeline
    ///
    /// 1. Evaluate each rule in registration order; failures become one
    ///    `error` issue each and never stop the loop
    /// 2. Compute the summary statistics directly from the dataset
    /// 3. If compliance is enabled, score the full issue list and embed the
    ///    report; a scorer failure becomes an `error` issue instead
    pub fn validate(&self, dataset: &Dataset) -> ValidationResult {
        debug!(
            rows = dataset.row_count(),
            columns = dataset.column_count(),
            rules = self.rules.len(),
            "validation starting"
        );

        // ── Step 1: Rules ────────────────────────────────────────────────────
        let mut issues = Vec::new();
        for rule in &self.rules {
            let name = rule.name();
            match run_guarded(|| rule.evaluate(dataset)) {
                Ok(found) => {
                    debug!(rule = %name, issue_count = found.len(), "rule evaluated");
                    issues.extend(found);
                }
                Err(reason) => {
                    warn!(rule = %name, reason = %reason, "rule failed, recording as issue");
                    issues.push(
                        Issue::error(name, format!("Rule '{name}' failed: {reason}"))
                            .with_metadata(RULE_FAILURE_KEY, true),
                    );
                }
            }
        }

        // ── Step 2: Summary ──────────────────────────────────────────────────
        let mut summary = ValidationSummary {
            total_rows: dataset.row_count(),
            total_columns: dataset.column_count(),
            missing_values: dataset
                .columns()
                .iter()
                .map(|c| (c.name.clone(), c.missing_count()))
                .collect(),
            duplicate_rows: dataset.duplicate_row_count(),
            validation_rules_applied: self.rules.len(),
            compliance_report: None,
        };

        // ── Step 3: Compliance ───────────────────────────────────────────────
        if let Some(scorer) = &self.compliance {
            match run_guarded(|| scorer.score(&issues, dataset)) {
                Ok(report) => {
                    debug!(
                        overall_score = report.overall_score,
                        risk = %report.overall_risk_level,
                        "compliance report attached"
                    );
                    summary.compliance_report = Some(report);
                }
                Err(reason) => {
                    warn!(reason = %reason, "compliance scoring failed, recording as issue");
                    issues.push(
                        Issue::error(
                            COMPLIANCE_SCORER_RULE,
                            format!("Compliance scoring failed: {reason}"),
                        )
                        .with_metadata(RULE_FAILURE_KEY, true),
                    );
                }
            }
        }

        let result = ValidationResult::new(issues, summary);
        info!(
            is_valid = result.is_valid,
            issues = result.issues.len(),
            errors = result.error_count(),
            "validation complete"
        );
        result
    }

    /// Human-readable rendering of a result produced by this validator.
    pub fn get_report(&self, result: &ValidationResult) -> String {
        render_report(result)
    }
}

/// Run `f`, flattening both an `Err` and a panic into a reason string.
fn run_guarded<T>(f: impl FnOnce() -> MedvalResult<T>) -> Result<T, String> {
    match panic::catch_unwind(AssertUnwindSafe(f)) {
        Ok(Ok(value)) => Ok(value),
        Ok(Err(err)) => Err(err.reason().to_string()),
        Err(payload) => Err(format!("panicked: {}", panic_message(payload.as_ref()))),
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic payload".to_string()
    }
}

// ── Tests ────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    use medval_contracts::{
        Column, ComplianceReport, Dataset, Issue, MedvalError, MedvalResult, RiskLevel,
        Severity, ViolationSummary,
    };

    use crate::traits::{ComplianceScorer, Rule};

    use super::{MedicalDataValidator, COMPLIANCE_SCORER_RULE};

    // ── Mock helpers ─────────────────────────────────────────────────────────

    fn make_dataset() -> Dataset {
        Dataset::new(vec![
            Column::new("patient_id", ["P001", "P002", "P003"]),
            Column::new("age", [38, 33, 45]),
        ])
        .unwrap()
    }

    /// A rule that emits one warning per column and counts its calls.
    struct PerColumnRule {
        calls: Arc<AtomicUsize>,
    }

    impl Rule for PerColumnRule {
        fn name(&self) -> &str {
            "PerColumnRule"
        }

        fn evaluate(&self, dataset: &Dataset) -> MedvalResult<Vec<Issue>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(dataset
                .column_names()
                .map(|c| Issue::warning("PerColumnRule", format!("saw {c}")).with_column(c))
                .collect())
        }
    }

    /// A rule that always returns an error.
    struct FailingRule;

    impl Rule for FailingRule {
        fn name(&self) -> &str {
            "FailingRule"
        }

        fn evaluate(&self, _dataset: &Dataset) -> MedvalResult<Vec<Issue>> {
            Err(MedvalError::evaluation("FailingRule", "lookup table unavailable"))
        }
    }

    /// A rule that panics mid-evaluation.
    struct PanickingRule;

    impl Rule for PanickingRule {
        fn name(&self) -> &str {
            "PanickingRule"
        }

        fn evaluate(&self, _dataset: &Dataset) -> MedvalResult<Vec<Issue>> {
            panic!("index out of bounds");
        }
    }

    /// A scorer returning a fixed score, or failing when configured to.
    struct MockScorer {
        fail: bool,
    }

    impl ComplianceScorer for MockScorer {
        fn score(&self, issues: &[Issue], _dataset: &Dataset) -> MedvalResult<ComplianceReport> {
            if self.fail {
                return Err(MedvalError::ComplianceScoring {
                    reason: "weights missing".to_string(),
                });
            }
            let score = 100.0 - issues.len() as f64;
            Ok(ComplianceReport {
                overall_score: score,
                overall_risk_level: RiskLevel::from_score(score),
                standards: BTreeMap::new(),
                summary: ViolationSummary::default(),
                all_violations: vec![],
            })
        }
    }

    // ── Test cases ────────────────────────────────────────────────────────────

    /// A rule returning `Err` produces exactly one error issue naming the rule,
    /// and later rules still run.
    #[test]
    fn failing_rule_is_downgraded_and_later_rules_run() {
        let calls = Arc::new(AtomicUsize::new(0));
        let mut validator = MedicalDataValidator::new();
        validator.add_rule(FailingRule);
        validator.add_rule(PerColumnRule { calls: calls.clone() });

        let result = validator.validate(&make_dataset());

        assert_eq!(calls.load(Ordering::SeqCst), 1, "rule after the failure must run");
        assert!(!result.is_valid);
        let failures = result.issues_by_rule("FailingRule");
        assert_eq!(failures.len(), 1);
        assert_eq!(failures[0].severity, Severity::Error);
        assert_eq!(
            failures[0].message,
            "Rule 'FailingRule' failed: lookup table unavailable"
        );
        assert!(failures[0].is_rule_failure());
        assert_eq!(result.issues_by_rule("PerColumnRule").len(), 2);
    }

    /// A panicking rule is isolated the same way as an `Err`.
    #[test]
    fn panicking_rule_is_downgraded() {
        let mut validator = MedicalDataValidator::new();
        validator.add_rule(PanickingRule);
        validator.add_validator("AlwaysClean", |_| Ok(vec![]));

        let result = validator.validate(&make_dataset());

        assert_eq!(result.issues.len(), 1);
        assert_eq!(result.issues[0].rule_name, "PanickingRule");
        assert!(result.issues[0].message.contains("index out of bounds"));
        assert_eq!(result.summary.validation_rules_applied, 2);
    }

    /// Issues appear in registration order and two runs are identical.
    #[test]
    fn validate_is_deterministic_and_ordered() {
        let mut validator = MedicalDataValidator::new();
        validator.add_validator("First", |_| Ok(vec![Issue::info("First", "one")]));
        validator.add_rule(PerColumnRule {
            calls: Arc::new(AtomicUsize::new(0)),
        });
        validator.add_validator("Last", |_| Ok(vec![Issue::info("Last", "three")]));

        let ds = make_dataset();
        let a = validator.validate(&ds);
        let b = validator.validate(&ds);

        assert_eq!(a, b);
        let order: Vec<&str> = a.issues.iter().map(|i| i.rule_name.as_str()).collect();
        assert_eq!(order, vec!["First", "PerColumnRule", "PerColumnRule", "Last"]);
        assert_eq!(
            serde_json::to_string(&a.to_json_value()).unwrap(),
            serde_json::to_string(&b.to_json_value()).unwrap()
        );
    }

    /// Summary statistics come from the dataset, not from the rules.
    #[test]
    fn summary_counts_rows_missing_and_duplicates() {
        let ds = Dataset::new(vec![
            Column::new("id", vec![Some("A"), Some("B"), Some("A"), None]),
            Column::new("v", vec![Some(1), Some(2), Some(1), None]),
        ])
        .unwrap();

        let result = MedicalDataValidator::new().validate(&ds);

        assert!(result.is_valid);
        assert_eq!(result.summary.total_rows, 4);
        assert_eq!(result.summary.total_columns, 2);
        assert_eq!(result.summary.missing_values["id"], 1);
        assert_eq!(result.summary.missing_values["v"], 1);
        assert_eq!(result.summary.duplicate_rows, 1);
        assert_eq!(result.summary.validation_rules_applied, 0);
        assert!(result.summary.compliance_report.is_none());
    }

    #[test]
    fn compliance_report_is_embedded_when_enabled() {
        let mut validator =
            MedicalDataValidator::new().with_compliance(Box::new(MockScorer { fail: false }));
        validator.add_validator("One", |_| Ok(vec![Issue::warning("One", "w")]));
        assert!(validator.is_compliance_enabled());

        let result = validator.validate(&make_dataset());

        let report = result.summary.compliance_report.as_ref().unwrap();
        assert_eq!(report.overall_score, 99.0);
        let json = result.to_json_value();
        assert_eq!(json["summary"]["compliance_report"]["overall_risk_level"], "low");
    }

    /// A failing scorer yields an error issue and no report.
    #[test]
    fn failing_scorer_is_downgraded() {
        let validator =
            MedicalDataValidator::new().with_compliance(Box::new(MockScorer { fail: true }));

        let result = validator.validate(&make_dataset());

        assert!(!result.is_valid);
        assert!(result.summary.compliance_report.is_none());
        let failures = result.issues_by_rule(COMPLIANCE_SCORER_RULE);
        assert_eq!(failures.len(), 1);
        assert_eq!(failures[0].message, "Compliance scoring failed: weights missing");
    }

    #[test]
    fn get_report_mentions_status_and_issues() {
        let mut validator = MedicalDataValidator::new();
        validator.add_rule(FailingRule);
        let result = validator.validate(&make_dataset());

        let text = validator.get_report(&result);

        assert!(text.contains("INVALID"), "report: {text}");
        assert!(text.contains("FailingRule"), "report: {text}");
    }

    #[test]
    fn rule_names_follow_registration_order() {
        let mut validator = MedicalDataValidator::new();
        validator
            .add_validator("b", |_| Ok(vec![]))
            .add_validator("a", |_| Ok(vec![]));
        assert_eq!(validator.rule_names(), vec!["b", "a"]);
        assert_eq!(validator.rule_count(), 2);
    }
}
