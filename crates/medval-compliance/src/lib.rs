//! # medval-compliance
//!
//! Regulatory compliance scoring for medval validation passes.
//!
//! [`ComplianceEngine`] implements [`medval_core::traits::ComplianceScorer`].
//! It reads the issues a validation pass produced and scores five standards:
//!
//! | key              | source of violations                                   |
//! |------------------|--------------------------------------------------------|
//! | `hipaa`          | PHIDetector issues                                     |
//! | `gdpr`           | PHIDetector issues, special-category and consent columns |
//! | `fda`            | audit columns, missing fields, quality and date issues |
//! | `medical_coding` | MedicalCodeValidator issues and code-named columns     |
//! | `custom_rules`   | custom rule registry issues                            |
//!
//! ```rust,ignore
//! use medval_compliance::ComplianceEngine;
//! use medval_core::MedicalDataValidator;
//!
//! let validator = MedicalDataValidator::new()
//!     .with_compliance(Box::new(ComplianceEngine::new()));
//! ```

mod classify;
pub mod engine;
pub mod recommendations;
pub mod standard;

pub use engine::ComplianceEngine;
pub use recommendations::recommendation_for;
pub use standard::{SeverityWeights, Standard};

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use medval_contracts::{Column, Dataset, Issue, MedvalError, RiskLevel};
    use medval_core::{validator::COMPLIANCE_SCORER_RULE, MedicalDataValidator, Rule};
    use medval_policy::ValidatorPolicyExt;
    use medval_rules::{
        ColumnType, DataQualityChecker, NumericRange, PHIDetector, RangeValidator,
        SchemaValidator,
    };

    use crate::{ComplianceEngine, Standard};

    // ── Helpers ───────────────────────────────────────────────────────────────

    fn compliant_validator() -> MedicalDataValidator {
        let mut validator =
            MedicalDataValidator::new().with_compliance(Box::new(ComplianceEngine::new()));
        validator
            .add_rule(PHIDetector::new())
            .add_rule(DataQualityChecker::new());
        validator
    }

    fn hipaa_score(validator: &MedicalDataValidator, ds: &Dataset) -> (f64, RiskLevel) {
        let result = validator.validate(ds);
        let report = result
            .summary
            .compliance_report
            .expect("compliance report should be attached");
        let hipaa = &report.standards["hipaa"];
        (hipaa.score, hipaa.risk_level)
    }

    fn assert_close(actual: f64, expected: f64) {
        assert!(
            (actual - expected).abs() < 1e-9,
            "expected {expected}, got {actual}"
        );
    }

    // ── 1. HIPAA ──────────────────────────────────────────────────────────────

    /// No PHI-pattern match scores HIPAA 100 with low risk.
    #[test]
    fn test_no_phi_scores_perfect_hipaa() {
        let ds = Dataset::new(vec![
            Column::new("age", [38, 33, 45]),
            Column::new("visit_count", [1, 4, 2]),
        ])
        .unwrap();
        let (score, risk) = hipaa_score(&compliant_validator(), &ds);
        assert_close(score, 100.0);
        assert_eq!(risk, RiskLevel::Low);
    }

    /// Adding a PHI column strictly lowers the HIPAA score.
    #[test]
    fn test_phi_column_lowers_hipaa() {
        let validator = compliant_validator();
        let base = Dataset::new(vec![Column::new("age", [38, 33])]).unwrap();
        let with_email = base
            .clone()
            .with_column("email", ["a@example.org", "b@example.org"])
            .unwrap();
        let with_ssn = with_email
            .clone()
            .with_column("ssn", ["123-45-6789", "987-65-4321"])
            .unwrap();

        let (s0, _) = hipaa_score(&validator, &base);
        let (s1, _) = hipaa_score(&validator, &with_email);
        let (s2, _) = hipaa_score(&validator, &with_ssn);
        assert!(s1 < s0, "{s1} should be below {s0}");
        assert!(s2 < s1, "{s2} should be below {s1}");
        assert_close(s2, 100.0 - 15.0 - 25.0);
    }

    /// Two SSN columns give two violations but one recommendation.
    #[test]
    fn test_recommendations_are_per_category() {
        let ds = Dataset::new(vec![
            Column::new("ssn", ["123-45-6789"]),
            Column::new("social_security_number", ["987-65-4321"]),
        ])
        .unwrap();
        let report = compliant_validator()
            .validate(&ds)
            .summary
            .compliance_report
            .unwrap();
        let hipaa = &report.standards["hipaa"];
        assert_eq!(hipaa.violations_count, 2);
        assert_eq!(hipaa.recommendations.len(), 1, "{:?}", hipaa.recommendations);
    }

    // ── 2. overall score ──────────────────────────────────────────────────────

    /// patient_id/ssn/age end-to-end with compliance: the overall score is
    /// the weighted average of the five standards.
    #[test]
    fn test_end_to_end_overall_score() {
        let ds = Dataset::new(vec![
            Column::new("patient_id", ["P001", "P002", "P003", "P004", "P005"]),
            Column::new(
                "ssn",
                ["123-45-6789", "987-65-4321", "111-22-3333", "222-33-4444", "333-44-5555"],
            ),
            Column::new("age", [38, 33, 45, 150, 35]),
        ])
        .unwrap();
        let mut validator =
            MedicalDataValidator::new().with_compliance(Box::new(ComplianceEngine::new()));
        validator
            .add_rule(SchemaValidator::new(
                ["patient_id", "age"],
                Vec::<(String, ColumnType)>::new(),
            ))
            .add_rule(PHIDetector::new())
            .add_rule(
                RangeValidator::new([("age", NumericRange::between(0.0, 120.0).unwrap())])
                    .unwrap(),
            );

        let result = validator.validate(&ds);
        assert!(!result.is_valid);
        let report = result.summary.compliance_report.as_ref().unwrap();

        // hipaa: ssn critical (25) → 75
        // gdpr: ssn high (12) + no lawful basis medium (6) → 82
        // fda: no timestamp (10) + no user column (10) → 80
        assert_close(report.standards["hipaa"].score, 75.0);
        assert_close(report.standards["gdpr"].score, 82.0);
        assert_close(report.standards["fda"].score, 80.0);
        assert_close(report.standards["medical_coding"].score, 100.0);
        assert_close(report.standards["custom_rules"].score, 100.0);
        assert_close(
            report.overall_score,
            0.30 * 75.0 + 0.20 * 82.0 + 0.20 * 80.0 + 0.15 * 100.0 + 0.15 * 100.0,
        );
        assert_eq!(report.overall_risk_level, RiskLevel::Medium);
        assert_eq!(report.summary.total_violations, 5);
        assert_eq!(report.summary.critical_violations, 1);
        assert_eq!(report.all_violations.len(), 5);

        let mapping = result.to_json_value();
        assert_eq!(
            mapping["summary"]["compliance_report"]["overall_risk_level"],
            "medium"
        );
    }

    /// With one standard evaluated, the overall score is that standard's score.
    #[test]
    fn test_narrowed_standards_normalize_weights() {
        let engine = ComplianceEngine::with_standards([Standard::Hipaa]).unwrap();
        let ds = Dataset::new(vec![Column::new("email", ["a@example.org"])]).unwrap();
        let issues = PHIDetector::new().evaluate(&ds).unwrap();

        let report = engine.evaluate(&issues, &ds).unwrap();
        assert_eq!(report.standards.len(), 1);
        assert_close(report.overall_score, report.standards["hipaa"].score);
        assert_close(report.overall_score, 85.0);
    }

    #[test]
    fn test_empty_standard_set_is_config_error() {
        match ComplianceEngine::with_standards(Vec::new()) {
            Err(MedvalError::ConfigError { reason }) => assert!(reason.contains("at least one")),
            other => panic!("expected ConfigError, got {:?}", other),
        }
    }

    // ── 3. FDA and medical coding on an audited extract ───────────────────────

    /// An extract with timestamp/user_id columns and valid code columns has no
    /// FDA or coding violations, with one sub-score per code system.
    #[test]
    fn test_audited_extract_with_valid_codes() {
        let ds = Dataset::new(vec![
            Column::new("patient_name", ["John Smith", "Jane Doe", "Bob Johnson", "Alice Brown"]),
            Column::new("icd10_code", ["E11.9", "I10", "J45.909", "I25.10"]),
            Column::new("loinc_code", ["2345-7", "58410-2", "3456-8", "7890-1"]),
            Column::new("cpt_code", ["99213", "99214", "99215", "99212"]),
            Column::new(
                "timestamp",
                [
                    "2024-01-01 10:00:00",
                    "2024-01-01 11:00:00",
                    "2024-01-01 12:00:00",
                    "2024-01-01 13:00:00",
                ],
            ),
            Column::new("user_id", ["user1", "user2", "user3", "user4"]),
        ])
        .unwrap();
        let report = compliant_validator()
            .validate(&ds)
            .summary
            .compliance_report
            .unwrap();

        let fda = &report.standards["fda"];
        assert_eq!(fda.violations_count, 0, "{:?}", fda.violations);
        assert_close(fda.score, 100.0);

        let coding = &report.standards["medical_coding"];
        let systems: Vec<&String> = coding.sub_scores.keys().collect();
        assert_eq!(systems, vec!["cpt", "icd10", "loinc"]);
        assert!(coding.sub_scores.values().all(|s| s.score == 100.0));

        // patient_name matched on its name only: high tier lowered to medium
        let hipaa = &report.standards["hipaa"];
        assert_eq!(hipaa.violations_count, 1);
        assert_close(hipaa.score, 92.0);
    }

    // ── 4. custom rules ───────────────────────────────────────────────────────

    #[test]
    fn test_custom_rules_use_rule_severity_and_recommendation() {
        let mut validator = MedicalDataValidator::new();
        let registry = validator.apply_template("ehr").unwrap();
        validator.enable_compliance(Box::new(
            ComplianceEngine::new().with_custom_rules(registry),
        ));
        let ds = Dataset::new(vec![Column::new("patient_id", ["P12345678", "X1"])]).unwrap();

        let report = validator.validate(&ds).summary.compliance_report.unwrap();
        let custom = &report.standards["custom_rules"];
        assert_eq!(custom.violations_count, 1);
        assert_close(custom.score, 90.0);
        assert_eq!(
            custom.recommendations,
            vec!["Normalize patient identifiers to the P######## format".to_string()]
        );
        assert_eq!(custom.details["rules_configured"], 3);
        assert_eq!(custom.details["rules_violated"], 1);
    }

    // ── 5. scorer failures ────────────────────────────────────────────────────

    /// A malformed PHI issue fails scoring; the validator records the failure
    /// as an issue and attaches no report.
    #[test]
    fn test_malformed_issue_fails_scoring_not_validation() {
        let mut validator =
            MedicalDataValidator::new().with_compliance(Box::new(ComplianceEngine::new()));
        validator.add_validator(medval_rules::phi::RULE_NAME, |_ds| {
            Ok(vec![Issue::warning(medval_rules::phi::RULE_NAME, "no tier").with_column("x")])
        });
        let ds = Dataset::new(vec![Column::new("x", [1])]).unwrap();

        let result = validator.validate(&ds);
        assert!(result.summary.compliance_report.is_none());
        let failures = result.issues_by_rule(COMPLIANCE_SCORER_RULE);
        assert_eq!(failures.len(), 1);
        assert!(failures[0].message.contains("risk tier"), "{}", failures[0].message);
    }

    /// A built-in rule that fails still leaves every standard scored: its
    /// stand-in issue is recorded but never classified.
    #[test]
    fn test_failed_builtin_rule_keeps_the_report() {
        let mut validator = compliant_validator();
        validator.add_validator(medval_rules::codes::RULE_NAME, |_ds| {
            Err(MedvalError::evaluation(
                medval_rules::codes::RULE_NAME,
                "code table unavailable",
            ))
        });
        let ds = Dataset::new(vec![
            Column::new("patient_id", ["P001", "P002"]),
            Column::new("ssn", ["123-45-6789", "987-65-4321"]),
        ])
        .unwrap();

        let result = validator.validate(&ds);

        assert!(result.issues_by_rule(COMPLIANCE_SCORER_RULE).is_empty());
        assert_eq!(result.issues_by_rule(medval_rules::codes::RULE_NAME).len(), 1);
        let report = result
            .summary
            .compliance_report
            .expect("a failed rule must not suppress the report");
        assert_eq!(report.standards.len(), 5);
        let hipaa = &report.standards["hipaa"];
        assert_eq!(hipaa.violations_count, 1);
        assert_eq!(hipaa.violations[0].column.as_deref(), Some("ssn"));
        assert_close(report.standards["medical_coding"].score, 100.0);
    }

    /// A caller rule that labels its issues as custom findings under a
    /// built-in name is scored as a custom rule only.
    #[test]
    fn test_custom_issue_under_builtin_name_is_not_phi() {
        let mut validator = compliant_validator();
        validator.add_validator("ssn_shape", |_ds| {
            Ok(vec![Issue::error(medval_rules::phi::RULE_NAME, "bad ssn")
                .with_column("ssn")
                .with_metadata("kind", medval_policy::CUSTOM_RULE_KIND)
                .with_metadata("compliance_severity", "medium")])
        });
        let ds = Dataset::new(vec![Column::new("visit_count", [1, 2])]).unwrap();

        let report = validator
            .validate(&ds)
            .summary
            .compliance_report
            .expect("report should be attached");
        assert_close(report.standards["hipaa"].score, 100.0);
        assert_eq!(report.standards["custom_rules"].violations_count, 1);
    }
}
