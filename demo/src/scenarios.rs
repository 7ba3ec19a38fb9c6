//! The demo scenarios.
//!
//! Each scenario builds a validator from real medval components, runs it over
//! one of the sample datasets and prints either the text report or, with
//! `--json`, the serializable result mapping.

use std::sync::Arc;
use std::time::Instant;

use serde_json::json;

use medval_compliance::ComplianceEngine;
use medval_contracts::{Dataset, Issue, MedvalError, MedvalResult, ValidationResult};
use medval_core::MedicalDataValidator;
use medval_monitor::{MonitorConfig, TrendMetric, ValidationMonitor};
use medval_policy::{TemplateLibrary, ValidatorPolicyExt};
use medval_rules::{
    DataQualityChecker, DateValidator, MedicalCodeValidator, NumericRange, PHIDetector,
    RangeValidator, SchemaValidator,
};

use crate::samples;

/// How scenario results are printed.
#[derive(Debug, Clone, Copy)]
pub struct Output {
    pub json: bool,
}

impl Output {
    fn emit(&self, title: &str, validator: &MedicalDataValidator, result: &ValidationResult) -> MedvalResult<()> {
        if self.json {
            let text = serde_json::to_string_pretty(&json!({
                "scenario": title,
                "result": result.to_json_value(),
            }))
            .map_err(|e| MedvalError::config(format!("failed to render JSON: {e}")))?;
            println!("{text}");
        } else {
            println!("── {title} ──");
            println!("{}", validator.get_report(result));
        }
        Ok(())
    }
}

// ── Basic ─────────────────────────────────────────────────────────────────────

/// Schema, PHI and quality checks over a PHI-heavy patient extract.
pub fn basic(out: Output) -> MedvalResult<()> {
    let mut validator = MedicalDataValidator::new();
    validator
        .add_rule(SchemaValidator::from_type_names(
            ["patient_id", "age", "diagnosis"],
            [("age", "int"), ("temperature", "float")],
        )?)
        .add_rule(PHIDetector::new())
        .add_rule(DataQualityChecker::new());

    let result = validator.validate(&samples::patient_extract()?);
    out.emit("basic validation", &validator, &result)
}

// ── Advanced ──────────────────────────────────────────────────────────────────

/// All six built-in rules over an extract with one problem of each kind.
pub fn advanced(out: Output) -> MedvalResult<()> {
    let mut validator = MedicalDataValidator::new();
    validator
        .add_rule(SchemaValidator::from_type_names(
            ["patient_id", "age"],
            [("age", "int"), ("temperature", "float")],
        )?)
        .add_rule(PHIDetector::new())
        .add_rule(DataQualityChecker::new())
        .add_rule(MedicalCodeValidator::from_names([("icd10_code", "icd10")])?)
        .add_rule(RangeValidator::new([
            ("age", NumericRange::between(0.0, 120.0)?),
            ("temperature", NumericRange::between(95.0, 105.0)?),
        ])?)
        .add_rule(DateValidator::new(
            ["date_of_birth"],
            Some("1900-01-01"),
            Some("2024-12-31"),
        )?);

    let result = validator.validate(&samples::problematic_extract()?);
    out.emit("advanced validation", &validator, &result)
}

// ── Custom function rule ──────────────────────────────────────────────────────

fn blood_pressure_order(ds: &Dataset) -> MedvalResult<Vec<Issue>> {
    let (Some(systolic), Some(diastolic)) = (
        ds.column("blood_pressure_systolic"),
        ds.column("blood_pressure_diastolic"),
    ) else {
        return Ok(vec![]);
    };
    let inverted = systolic
        .values
        .iter()
        .zip(&diastolic.values)
        .filter(|(s, d)| matches!((s.as_f64(), d.as_f64()), (Some(s), Some(d)) if s <= d))
        .count();
    if inverted == 0 {
        return Ok(vec![]);
    }
    Ok(vec![Issue::error(
        "BloodPressureValidator",
        format!("Found {inverted} records where systolic pressure <= diastolic pressure"),
    )
    .with_metadata("inverted_count", inverted)])
}

/// A caller-supplied function registered by name.
pub fn custom(out: Output) -> MedvalResult<()> {
    let mut validator = MedicalDataValidator::new();
    validator.add_validator("BloodPressureValidator", blood_pressure_order);

    let result = validator.validate(&samples::patient_extract()?);
    out.emit("custom function rule", &validator, &result)
}

// ── Compliance ────────────────────────────────────────────────────────────────

/// The `ehr` template plus a runtime rule, scored against all five standards.
pub fn compliance(out: Output) -> MedvalResult<()> {
    let mut validator = MedicalDataValidator::new();
    let registry = validator.apply_template("ehr")?;
    registry.register_json(&json!({
        "name": "loinc_check_digit_present",
        "pattern": "^\\d{1,5}-\\d$",
        "field_pattern": "loinc",
        "severity": "medium",
        "description": "LOINC codes carry a check digit",
        "recommendation": "Append the LOINC check digit to every laboratory code"
    }))?;
    validator.enable_compliance(Box::new(
        ComplianceEngine::new().with_custom_rules(Arc::clone(&registry)),
    ));

    let result = validator.validate(&samples::audited_ehr_extract()?);
    out.emit("compliance scoring", &validator, &result)
}

// ── Templates ─────────────────────────────────────────────────────────────────

/// List the built-in templates and apply `laboratory`.
pub fn templates(out: Output) -> MedvalResult<()> {
    let library = TemplateLibrary::builtin()?;
    if out.json {
        let listing = serde_json::to_string_pretty(&library.list())
            .map_err(|e| MedvalError::config(format!("failed to render JSON: {e}")))?;
        println!("{listing}");
    } else {
        println!("── built-in templates ──");
        for (name, description) in library.list() {
            println!("  {name:<16} {description}");
        }
        println!();
    }

    let mut validator = MedicalDataValidator::new();
    let registry = library.apply("laboratory", &mut validator)?;
    if !out.json {
        println!(
            "laboratory: {} rules, {} custom patterns ({})",
            validator.rule_count(),
            registry.len(),
            registry
                .list()
                .iter()
                .map(|d| d.name.as_str())
                .collect::<Vec<_>>()
                .join(", ")
        );
        println!();
    }

    let result = validator.validate(&samples::lab_extract()?);
    out.emit("laboratory template", &validator, &result)
}

// ── Monitor ───────────────────────────────────────────────────────────────────

/// Record several compliance-scored passes and print the monitor's view.
pub fn monitor(out: Output) -> MedvalResult<()> {
    let monitor = ValidationMonitor::new(MonitorConfig {
        history_capacity: 3,
        ..MonitorConfig::default()
    })?;
    let mut validator =
        MedicalDataValidator::new().with_compliance(Box::new(ComplianceEngine::new()));
    validator
        .add_rule(PHIDetector::new())
        .add_rule(DataQualityChecker::new());

    let datasets = [
        samples::lab_extract()?,
        samples::audited_ehr_extract()?,
        samples::patient_extract()?,
        samples::problematic_extract()?,
    ];
    let mut raised = Vec::new();
    for ds in &datasets {
        let started = Instant::now();
        let result = validator.validate(ds);
        raised.extend(monitor.record(&result, started.elapsed()));
    }

    let stats = monitor.stats();
    let trend = monitor.trend(TrendMetric::ComplianceScore);
    if out.json {
        let text = serde_json::to_string_pretty(&json!({
            "scenario": "monitor",
            "stats": stats,
            "alerts": monitor.active_alerts(),
            "compliance_trend": trend,
            "chain_valid": monitor.verify_integrity(),
        }))
        .map_err(|e| MedvalError::config(format!("failed to render JSON: {e}")))?;
        println!("{text}");
        return Ok(());
    }

    println!("── validation monitor ──");
    println!(
        "validations: {} (retained {}), success rate {:.0}%, avg {:.2} ms",
        stats.total_validations,
        stats.history_len,
        stats.success_rate * 100.0,
        stats.average_processing_ms
    );
    println!("chain valid: {}", monitor.verify_integrity());
    println!("compliance trend:");
    for point in &trend {
        println!("  #{} {:>6.1} {:?}", point.sequence, point.value, point.status);
    }
    println!("alerts raised: {}", raised.len());
    for alert in monitor.active_alerts() {
        println!("  [{:?}] {}", alert.severity, alert.message);
    }
    if let Some(first) = raised.first() {
        monitor.acknowledge(first.id);
        println!("after acknowledging one: {} active", monitor.active_alerts().len());
    }
    println!();
    Ok(())
}
