//! # medval-policy
//!
//! User-declared rules and named rule templates for medval.
//!
//! ## Overview
//!
//! - [`CustomRuleRegistry`]: a lock-guarded, name-keyed registry of pattern
//!   rules, loadable from TOML rule files or JSON mappings
//! - [`CustomRuleSet`]: the [`Rule`](medval_core::traits::Rule) adapter that
//!   evaluates a shared registry inside a validator
//! - [`TemplateLibrary`]: TOML-defined bundles of rule configurations, with
//!   five built-in templates
//!
//! ## Quick start
//!
//! ```rust,ignore
//! use medval_core::MedicalDataValidator;
//! use medval_policy::{CustomRuleRegistry, CustomRuleSet, TemplateLibrary};
//!
//! let registry = CustomRuleRegistry::shared();
//! registry.load_toml_str(include_str!("site_rules.toml"))?;
//!
//! let mut validator = MedicalDataValidator::new();
//! TemplateLibrary::builtin()?.apply("ehr", &mut validator)?;
//! validator.add_rule(CustomRuleSet::new(registry.clone()));
//! ```

pub mod registry;
pub mod rule;
pub mod templates;

use std::sync::Arc;

use medval_contracts::MedvalResult;
use medval_core::MedicalDataValidator;

pub use registry::{CustomRuleRegistry, CustomRuleSet, CUSTOM_RULE_SET_NAME};
pub use rule::{
    CompiledCustomRule, CustomRuleEntry, CustomRuleFile, CUSTOM_RULE_KIND, RESERVED_RULE_NAMES,
};
pub use templates::{BuiltTemplate, RuleConfig, Template, TemplateLibrary};

/// Policy entry points on the validator.
pub trait ValidatorPolicyExt {
    /// Apply a built-in template by name.
    fn apply_template(&mut self, name: &str) -> MedvalResult<Arc<CustomRuleRegistry>>;

    /// Evaluate `registry` as part of this validator.
    fn add_custom_rules(&mut self, registry: Arc<CustomRuleRegistry>) -> &mut Self;
}

impl ValidatorPolicyExt for MedicalDataValidator {
    fn apply_template(&mut self, name: &str) -> MedvalResult<Arc<CustomRuleRegistry>> {
        TemplateLibrary::builtin()?.apply(name, self)
    }

    fn add_custom_rules(&mut self, registry: Arc<CustomRuleRegistry>) -> &mut Self {
        self.add_rule(CustomRuleSet::new(registry))
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use serde_json::json;

    use medval_contracts::{
        Column, ComplianceSeverity, CustomRuleDefinition, Dataset, MedvalError, Severity,
    };
    use medval_core::{traits::Rule, MedicalDataValidator};
    use medval_rules::{
        phi, range, NumericRange, PHIDetector, RangeValidator, SchemaValidator,
    };

    use crate::{CustomRuleRegistry, CustomRuleSet, TemplateLibrary, ValidatorPolicyExt};

    // ── Helpers ───────────────────────────────────────────────────────────────

    fn ssn_rule() -> CustomRuleDefinition {
        CustomRuleDefinition::new(
            "ssn_format",
            r"^\d{3}-\d{2}-\d{4}$",
            "ssn|social",
            ComplianceSeverity::Critical,
        )
        .with_description("SSNs use the ddd-dd-dddd layout")
        .with_recommendation("Mask or tokenize SSNs before export")
    }

    fn patient_dataset() -> Dataset {
        Dataset::new(vec![
            Column::new("patient_id", ["P001", "P002", "P003", "P004", "P005"]),
            Column::new(
                "ssn",
                ["123-45-6789", "987-65-4321", "111-22-3333", "222-33-4444", "333-44-5555"],
            ),
            Column::new("age", [38, 33, 45, 150, 35]),
        ])
        .unwrap()
    }

    // ── 1. registry round-trip ────────────────────────────────────────────────

    /// Register → evaluate → remove leaves the registry as it was, and the
    /// rule's violations disappear.
    #[test]
    fn test_register_evaluate_remove_round_trip() {
        let registry = CustomRuleRegistry::new();
        let before = registry.list();

        registry.register(ssn_rule()).unwrap();
        let ds = Dataset::new(vec![Column::new("SSN", ["123-45-6789", "123456789", "bad"])]).unwrap();
        let issues = registry.evaluate_all(&ds);

        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].rule_name, "ssn_format");
        assert_eq!(issues[0].severity, Severity::Error);
        assert_eq!(issues[0].meta_u64("violation_count"), Some(2));
        assert_eq!(issues[0].meta_str("compliance_severity"), Some("critical"));
        assert_eq!(
            issues[0].meta_str("recommendation"),
            Some("Mask or tokenize SSNs before export")
        );

        assert!(registry.remove("ssn_format"));
        assert_eq!(registry.list(), before);
        assert!(registry.evaluate_all(&ds).is_empty());
    }

    /// Removing an absent name succeeds as a no-op.
    #[test]
    fn test_remove_absent_is_noop() {
        let registry = CustomRuleRegistry::new();
        assert!(!registry.remove("never_registered"));
        assert!(registry.is_empty());
    }

    // ── 2. registration errors ────────────────────────────────────────────────

    #[test]
    fn test_invalid_pattern_is_config_error() {
        let registry = CustomRuleRegistry::new();
        let bad = CustomRuleDefinition::new("broken", "([unclosed", "x", ComplianceSeverity::Low);
        match registry.register(bad) {
            Err(MedvalError::ConfigError { reason }) => {
                assert!(reason.contains("broken"), "reason should name the rule: {reason}");
            }
            other => panic!("expected ConfigError, got {:?}", other),
        }
        assert!(registry.is_empty());
    }

    /// A second `register` under the same name is refused; `replace` overwrites.
    #[test]
    fn test_duplicate_name_requires_replace() {
        let registry = CustomRuleRegistry::new();
        registry.register(ssn_rule()).unwrap();

        let again = registry.register(ssn_rule().with_description("changed"));
        assert!(matches!(again, Err(MedvalError::ConfigError { .. })));
        assert_eq!(registry.get("ssn_format").unwrap().description, "SSNs use the ddd-dd-dddd layout");

        let previous = registry.replace(ssn_rule().with_description("changed")).unwrap();
        assert!(previous.is_some());
        assert_eq!(registry.get("ssn_format").unwrap().description, "changed");
        assert_eq!(registry.len(), 1);
    }

    /// Custom rules cannot report under a built-in rule's name.
    #[test]
    fn test_builtin_rule_name_is_reserved() {
        let registry = CustomRuleRegistry::new();
        let impostor =
            CustomRuleDefinition::new(phi::RULE_NAME, r"^\d+$", "ssn", ComplianceSeverity::High);
        match registry.register(impostor) {
            Err(MedvalError::ConfigError { reason }) => {
                assert!(reason.contains("reserved"), "got: {reason}");
            }
            other => panic!("expected ConfigError, got {:?}", other),
        }
        assert!(registry.is_empty());
    }

    // ── 3. JSON and TOML loading ──────────────────────────────────────────────

    #[test]
    fn test_register_json_mapping() {
        let registry = CustomRuleRegistry::new();
        registry
            .register_json(&json!({
                "name": "mrn_format",
                "pattern": "^MRN\\d{6}$",
                "field_pattern": "mrn",
                "description": "MRNs are MRN plus six digits"
            }))
            .unwrap();

        let def = registry.get("mrn_format").unwrap();
        assert_eq!(def.severity, ComplianceSeverity::High, "severity defaults to high");

        let listed = registry.to_json_value();
        assert_eq!(listed[0]["name"], "mrn_format");
        assert_eq!(listed[0]["severity"], "high");
    }

    #[test]
    fn test_register_json_rejects_bad_shape() {
        let registry = CustomRuleRegistry::new();
        let result = registry.register_json(&json!({
            "name": "x",
            "pattern": "a",
            "severity": "urgent"
        }));
        match result {
            Err(MedvalError::ConfigError { reason }) => {
                assert!(reason.contains("invalid custom rule mapping"), "got: {reason}");
            }
            other => panic!("expected ConfigError, got {:?}", other),
        }
    }

    #[test]
    fn test_load_toml_rules() {
        let toml = r#"
            [[rules]]
            name = "bp_format"
            pattern = '^\d{2,3}/\d{2,3}$'
            field_pattern = '^bp$'
            severity = "medium"

            [[rules]]
            name = "dose_units"
            pattern = '^\d+ mg$'
            field_pattern = 'dose'
        "#;
        let registry = CustomRuleRegistry::from_toml_str(toml).unwrap();
        let names: Vec<String> = registry.list().into_iter().map(|d| d.name).collect();
        assert_eq!(names, vec!["bp_format", "dose_units"]);

        let ds = Dataset::new(vec![Column::new("BP", ["120/80", "high"])]).unwrap();
        let issues = registry.evaluate_all(&ds);
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].severity, Severity::Warning);
    }

    /// A bad entry late in the file leaves the registry exactly as it was.
    #[test]
    fn test_failed_toml_load_leaves_registry_unchanged() {
        let registry = CustomRuleRegistry::new();
        registry.register(ssn_rule()).unwrap();

        let bad_pattern = r#"
            [[rules]]
            name = "bp_format"
            pattern = '^\d{2,3}/\d{2,3}$'
            field_pattern = '^bp$'

            [[rules]]
            name = "broken"
            pattern = '([unclosed'
            field_pattern = 'x'
        "#;
        assert!(matches!(
            registry.load_toml_str(bad_pattern),
            Err(MedvalError::ConfigError { .. })
        ));

        let clashing = r#"
            [[rules]]
            name = "dose_units"
            pattern = '^\d+ mg$'
            field_pattern = 'dose'

            [[rules]]
            name = "ssn_format"
            pattern = '.*'
            field_pattern = 'ssn'
        "#;
        match registry.load_toml_str(clashing) {
            Err(MedvalError::ConfigError { reason }) => {
                assert!(reason.contains("ssn_format"), "got: {reason}");
            }
            other => panic!("expected ConfigError, got {:?}", other),
        }

        let names: Vec<String> = registry.list().into_iter().map(|d| d.name).collect();
        assert_eq!(names, vec!["ssn_format"]);
        assert_eq!(registry.get("ssn_format").unwrap().pattern, r"^\d{3}-\d{2}-\d{4}$");
    }

    #[test]
    fn test_toml_parse_error() {
        match CustomRuleRegistry::from_toml_str("this is not valid toml ][[[") {
            Err(MedvalError::ConfigError { reason }) => {
                assert!(reason.contains("failed to parse custom rule TOML"), "got: {reason}");
            }
            other => panic!("expected ConfigError, got {:?}", other),
        }
    }

    // ── 4. registry inside a validator ───────────────────────────────────────

    /// Rules added to a shared registry after the validator is built are seen
    /// on the next `validate` call.
    #[test]
    fn test_custom_rule_set_reads_live_registry() {
        let registry = CustomRuleRegistry::shared();
        let mut validator = MedicalDataValidator::new();
        validator.add_custom_rules(registry.clone());
        let ds = Dataset::new(vec![Column::new("ssn", ["bad"])]).unwrap();

        assert!(validator.validate(&ds).is_valid);
        registry.register(ssn_rule()).unwrap();
        let result = validator.validate(&ds);
        assert!(!result.is_valid);
        assert_eq!(result.issues_by_rule("ssn_format").len(), 1);
    }

    /// Concurrent readers and a writer never observe a partially-registered rule.
    #[test]
    fn test_registry_is_shareable_across_threads() {
        let registry = CustomRuleRegistry::shared();
        let ds = Arc::new(Dataset::new(vec![Column::new("ssn", ["bad"])]).unwrap());
        let handles: Vec<_> = (0..4)
            .map(|i| {
                let registry = registry.clone();
                let ds = ds.clone();
                std::thread::spawn(move || {
                    let def = CustomRuleDefinition::new(
                        format!("rule_{i}"),
                        "^ok$",
                        "ssn",
                        ComplianceSeverity::Low,
                    );
                    registry.register(def).unwrap();
                    CustomRuleSet::new(registry).evaluate(&ds).unwrap().len()
                })
            })
            .collect();
        for handle in handles {
            let seen = handle.join().unwrap();
            assert!((1..=4).contains(&seen), "each thread sees its own rule at least: {seen}");
        }
        assert_eq!(registry.len(), 4);
    }

    // ── 5. templates ──────────────────────────────────────────────────────────

    #[test]
    fn test_builtin_templates_are_listed() {
        let library = TemplateLibrary::builtin().unwrap();
        let names: Vec<String> = library.list().into_keys().collect();
        assert_eq!(
            names,
            vec!["clinical_trials", "ehr", "imaging", "laboratory", "research"]
        );
        assert!(library.list().values().all(|d| !d.is_empty()));
    }

    /// Every built-in template builds without configuration errors.
    #[test]
    fn test_every_builtin_template_builds() {
        let library = TemplateLibrary::builtin().unwrap();
        for name in library.list().keys() {
            let built = library.build(name).unwrap_or_else(|e| panic!("{name}: {e}"));
            assert!(!built.rules.is_empty(), "{name} has no rules");
        }
    }

    #[test]
    fn test_unknown_template_is_config_error() {
        let mut validator = MedicalDataValidator::new();
        match TemplateLibrary::builtin().unwrap().apply("oncology", &mut validator) {
            Err(MedvalError::ConfigError { reason }) => {
                assert!(reason.contains("oncology"));
                assert!(reason.contains("ehr"), "available names are listed: {reason}");
            }
            other => panic!("expected ConfigError, got {:?}", other.map(|r| r.len())),
        }
        assert_eq!(validator.rule_count(), 0, "failed apply must not add rules");
    }

    #[test]
    fn test_ehr_template_flags_bad_patient_ids() {
        let ds = Dataset::new(vec![
            Column::new("patient_id", ["P12345678", "X1"]),
            Column::new("bp", ["120/80", "140/90"]),
            Column::new("dosage", ["10 mg", "5 mcg"]),
        ])
        .unwrap();
        let mut validator = MedicalDataValidator::new();
        let registry = validator.apply_template("ehr").unwrap();
        assert_eq!(registry.len(), 3);

        let result = validator.validate(&ds);

        let id_issues = result.issues_by_rule("ehr_patient_id_format");
        assert_eq!(id_issues.len(), 1, "issues: {:?}", result.issues);
        assert_eq!(id_issues[0].meta_u64("violation_count"), Some(1));
        assert!(result.issues_by_rule("ehr_blood_pressure_format").is_empty());
        assert!(result.issues_by_rule("ehr_dosage_format").is_empty());
    }

    #[test]
    fn test_template_with_bad_range_fails_to_build() {
        let toml = r#"
            [templates.broken]
            description = "inverted range"

            [[templates.broken.rules]]
            kind = "range"
            ranges = { age = { min = 10, max = 1 } }
        "#;
        let library = TemplateLibrary::from_toml_str(toml).unwrap();
        assert!(matches!(
            library.build("broken"),
            Err(MedvalError::ConfigError { .. })
        ));
    }

    #[test]
    fn test_unknown_rule_kind_is_parse_error() {
        let toml = r#"
            [templates.x]
            description = "unknown kind"

            [[templates.x.rules]]
            kind = "telepathy"
        "#;
        assert!(matches!(
            TemplateLibrary::from_toml_str(toml),
            Err(MedvalError::ConfigError { .. })
        ));
    }

    // ── 6. end-to-end ─────────────────────────────────────────────────────────

    /// patient_id/ssn/age with age=[38,33,45,150,35]: invalid, one range error
    /// with count 1, one PHI error on `ssn`.
    #[test]
    fn test_end_to_end_example() {
        let mut validator = MedicalDataValidator::new();
        validator
            .add_rule(SchemaValidator::new(
                ["patient_id", "age"],
                Vec::<(String, medval_rules::ColumnType)>::new(),
            ))
            .add_rule(PHIDetector::new())
            .add_rule(
                RangeValidator::new([("age", NumericRange::between(0.0, 120.0).unwrap())])
                    .unwrap(),
            );

        let result = validator.validate(&patient_dataset());

        assert!(!result.is_valid);
        let range_issues = result.issues_by_rule(range::RULE_NAME);
        assert_eq!(range_issues.len(), 1);
        assert_eq!(range_issues[0].meta_u64("out_of_range_count"), Some(1));
        let phi_issues = result.issues_by_rule(phi::RULE_NAME);
        assert_eq!(phi_issues.len(), 1, "PHI issues: {:?}", phi_issues);
        assert_eq!(phi_issues[0].column.as_deref(), Some("ssn"));
        assert_eq!(phi_issues[0].severity, Severity::Error);
        assert!(result.issues_by_rule(medval_rules::schema::RULE_NAME).is_empty());
    }
}
