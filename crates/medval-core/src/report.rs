//! Plain-text rendering of a `ValidationResult`.
//!
//! Pure presentation: everything printed is already in the result.

use std::fmt::Write;

use medval_contracts::{Severity, ValidationResult};

const RULE: &str = "============================================================";

/// Render `result` as a human-readable report.
pub fn render_report(result: &ValidationResult) -> String {
    let mut out = String::new();
    // Writing into a String cannot fail.
    let _ = write_report(&mut out, result);
    out
}

fn write_report(out: &mut String, result: &ValidationResult) -> std::fmt::Result {
    let summary = &result.summary;

    writeln!(out, "MEDICAL DATA VALIDATION REPORT")?;
    writeln!(out, "{RULE}")?;
    writeln!(
        out,
        "Status: {}",
        if result.is_valid { "VALID" } else { "INVALID" }
    )?;
    writeln!(out, "Rows: {}", summary.total_rows)?;
    writeln!(out, "Columns: {}", summary.total_columns)?;
    writeln!(
        out,
        "Missing values: {}",
        summary.missing_values.values().sum::<usize>()
    )?;
    writeln!(out, "Duplicate rows: {}", summary.duplicate_rows)?;
    writeln!(out, "Rules applied: {}", summary.validation_rules_applied)?;
    writeln!(
        out,
        "Issues: {} ({} errors, {} warnings, {} info)",
        result.issues.len(),
        result.error_count(),
        result.warning_count(),
        result.info_count()
    )?;

    for severity in [Severity::Error, Severity::Warning, Severity::Info] {
        let issues = result.issues_by_severity(severity);
        if issues.is_empty() {
            continue;
        }
        writeln!(out)?;
        writeln!(
            out,
            "{} ({})",
            severity.as_str().to_ascii_uppercase(),
            issues.len()
        )?;
        for issue in issues {
            match &issue.column {
                Some(column) => writeln!(
                    out,
                    "  - [{}] {}: {}",
                    issue.rule_name, column, issue.message
                )?,
                None => writeln!(out, "  - [{}] {}", issue.rule_name, issue.message)?,
            }
        }
    }

    if let Some(report) = &summary.compliance_report {
        writeln!(out)?;
        writeln!(out, "COMPLIANCE")?;
        writeln!(out, "{RULE}")?;
        writeln!(
            out,
            "Overall score: {:.1} ({} risk)",
            report.overall_score, report.overall_risk_level
        )?;
        for (name, standard) in &report.standards {
            writeln!(
                out,
                "  {:<16} {:>5.1}  {:<8} {} violation(s)",
                name, standard.score, standard.risk_level, standard.violations_count
            )?;
            for (sub, score) in &standard.sub_scores {
                writeln!(out, "    {:<14} {:>5.1}  {}", sub, score.score, score.risk_level)?;
            }
        }
        writeln!(
            out,
            "Violations: {} total, {} critical, {} high, {} medium, {} low",
            report.summary.total_violations,
            report.summary.critical_violations,
            report.summary.high_violations,
            report.summary.medium_violations,
            report.summary.low_violations
        )?;

        let recommendations: Vec<&String> = report
            .standards
            .values()
            .flat_map(|s| s.recommendations.iter())
            .collect();
        if !recommendations.is_empty() {
            writeln!(out, "Recommendations:")?;
            for rec in recommendations {
                writeln!(out, "  * {rec}")?;
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use medval_contracts::{Issue, ValidationResult, ValidationSummary};

    use super::render_report;

    fn result_with(issues: Vec<Issue>) -> ValidationResult {
        let mut missing = BTreeMap::new();
        missing.insert("age".to_string(), 2);
        ValidationResult::new(
            issues,
            ValidationSummary {
                total_rows: 5,
                total_columns: 3,
                missing_values: missing,
                duplicate_rows: 0,
                validation_rules_applied: 2,
                compliance_report: None,
            },
        )
    }

    #[test]
    fn valid_result_has_no_issue_sections() {
        let text = render_report(&result_with(vec![]));
        assert!(text.contains("Status: VALID"));
        assert!(text.contains("Missing values: 2"));
        assert!(!text.contains("ERROR ("));
        assert!(!text.contains("COMPLIANCE"));
    }

    #[test]
    fn issues_are_grouped_by_severity_with_columns() {
        let text = render_report(&result_with(vec![
            Issue::warning("DataQualityChecker", "40% missing").with_column("age"),
            Issue::error("RangeValidator", "1 value out of range").with_column("age"),
        ]));
        let error_at = text.find("ERROR (1)").unwrap();
        let warning_at = text.find("WARNING (1)").unwrap();
        assert!(error_at < warning_at, "errors print before warnings:\n{text}");
        assert!(text.contains("[RangeValidator] age: 1 value out of range"));
    }
}
