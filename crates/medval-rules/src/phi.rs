//! Protected health information detection.
//!
//! Each column is checked two ways: its name against identifying keywords,
//! and a sample of its text values against value shapes. A column reports at
//! most one issue, for the highest-risk pattern that matched.

use once_cell::sync::Lazy;
use regex::Regex;
use tracing::debug;

use medval_contracts::{ComplianceSeverity, Dataset, Issue, MedvalResult};
use medval_core::traits::Rule;

use crate::util::text_sample;

pub const RULE_NAME: &str = "PHIDetector";

/// Number of non-missing text values inspected per column by default.
pub const DEFAULT_SAMPLE_SIZE: usize = 100;

/// Where a PHI match came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchSource {
    ColumnName,
    Values,
    Both,
}

impl MatchSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            MatchSource::ColumnName => "column_name",
            MatchSource::Values => "values",
            MatchSource::Both => "both",
        }
    }
}

/// One entry of the PHI table.
pub struct PhiPattern {
    pub phi_type: &'static str,
    pub tier: ComplianceSeverity,
    /// Matched as whole `_`-delimited token runs of the normalized column name.
    keywords: &'static [&'static str],
    /// Matched only against the entire normalized column name.
    exact_names: &'static [&'static str],
    value: Option<Regex>,
}

impl PhiPattern {
    fn name_matches(&self, normalized: &str) -> bool {
        if self.exact_names.contains(&normalized) {
            return true;
        }
        let padded = format!("_{normalized}_");
        self.keywords
            .iter()
            .any(|kw| padded.contains(&format!("_{kw}_")))
    }

    fn value_matches(&self, value: &str) -> bool {
        self.value
            .as_ref()
            .is_some_and(|re| re.is_match(value.trim()))
    }
}

fn pattern(
    phi_type: &'static str,
    tier: ComplianceSeverity,
    keywords: &'static [&'static str],
    exact_names: &'static [&'static str],
    value: Option<&str>,
) -> PhiPattern {
    PhiPattern {
        phi_type,
        tier,
        keywords,
        exact_names,
        value: value.map(|v| Regex::new(v).expect("static PHI value pattern")),
    }
}

/// The fixed PHI table, in tie-break order.
pub static PHI_PATTERNS: Lazy<Vec<PhiPattern>> = Lazy::new(|| {
    use ComplianceSeverity::*;
    vec![
        pattern("ssn", Critical, &["ssn", "social_security"], &[], Some(r"^\d{3}-\d{2}-\d{4}$")),
        pattern("medical_record_number", Critical, &["mrn", "medical_record"], &[], None),
        pattern(
            "email",
            High,
            &["email", "e_mail"],
            &[],
            Some(r"^[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,}$"),
        ),
        pattern(
            "phone",
            High,
            &["phone", "telephone", "tel", "mobile", "fax", "cell"],
            &[],
            Some(r"^(?:(?:\+?1[\s.-]?)?(?:\(\d{3}\)|\d{3})[\s.-]?\d{3}[\s.-]?\d{4}|\d{3}-\d{4})$"),
        ),
        pattern(
            "name",
            High,
            &[
                "first_name",
                "last_name",
                "full_name",
                "patient_name",
                "surname",
                "given_name",
                "firstname",
                "lastname",
            ],
            &["name"],
            None,
        ),
        pattern(
            "address",
            High,
            &["address", "street", "addr"],
            &[],
            Some(
                r"(?i)^\d+\s+[A-Za-z0-9.\s]+\s(?:street|st|avenue|ave|road|rd|boulevard|blvd|lane|ln|drive|dr|court|ct|way|place|pl)\.?$",
            ),
        ),
        pattern(
            "date_of_birth",
            High,
            &["dob", "birth", "birth_date", "date_of_birth"],
            &[],
            None,
        ),
        pattern("zip_code", Medium, &["zip", "zipcode", "postal", "postal_code"], &[], None),
        pattern(
            "ip_address",
            Medium,
            &["ip", "ip_address"],
            &[],
            Some(r"^(?:(?:25[0-5]|2[0-4]\d|1?\d?\d)\.){3}(?:25[0-5]|2[0-4]\d|1?\d?\d)$"),
        ),
    ]
});

/// Lowercase, with every non-alphanumeric run folded into one `_`.
fn normalize_column_name(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    for ch in name.trim().chars() {
        if ch.is_ascii_alphanumeric() {
            out.push(ch.to_ascii_lowercase());
        } else if !out.ends_with('_') {
            out.push('_');
        }
    }
    out.trim_matches('_').to_string()
}

/// A PHI finding for one column, before it is turned into an issue.
#[derive(Debug, Clone, PartialEq)]
pub struct PhiMatch {
    pub phi_type: &'static str,
    pub tier: ComplianceSeverity,
    pub source: MatchSource,
    pub match_count: usize,
    pub sampled: usize,
}

/// Flags columns that look like they carry PHI.
#[derive(Debug, Clone)]
pub struct PHIDetector {
    sample_size: usize,
}

impl Default for PHIDetector {
    fn default() -> Self {
        Self::new()
    }
}

impl PHIDetector {
    pub fn new() -> Self {
        Self {
            sample_size: DEFAULT_SAMPLE_SIZE,
        }
    }

    /// Inspect at most `sample_size` values per column (minimum 1).
    pub fn with_sample_size(mut self, sample_size: usize) -> Self {
        self.sample_size = sample_size.max(1);
        self
    }

    /// Classify one column. Highest tier wins; table order breaks ties.
    pub fn classify(&self, column_name: &str, sample: &[&str]) -> Option<PhiMatch> {
        let normalized = normalize_column_name(column_name);
        let mut best: Option<PhiMatch> = None;
        for p in PHI_PATTERNS.iter() {
            let by_name = p.name_matches(&normalized);
            let match_count = sample.iter().filter(|v| p.value_matches(v)).count();
            let source = match (by_name, match_count > 0) {
                (true, true) => MatchSource::Both,
                (true, false) => MatchSource::ColumnName,
                (false, true) => MatchSource::Values,
                (false, false) => continue,
            };
            if best.as_ref().map_or(true, |b| p.tier > b.tier) {
                best = Some(PhiMatch {
                    phi_type: p.phi_type,
                    tier: p.tier,
                    source,
                    match_count,
                    sampled: sample.len(),
                });
            }
        }
        best
    }
}

impl Rule for PHIDetector {
    fn name(&self) -> &str {
        RULE_NAME
    }

    fn evaluate(&self, dataset: &Dataset) -> MedvalResult<Vec<Issue>> {
        let mut issues = Vec::new();
        for column in dataset.columns() {
            let sample = text_sample(column, self.sample_size);
            let Some(found) = self.classify(&column.name, &sample) else {
                continue;
            };
            debug!(
                column = %column.name,
                phi_type = found.phi_type,
                tier = %found.tier,
                source = found.source.as_str(),
                "PHI pattern matched"
            );
            let message = match found.source {
                MatchSource::ColumnName => format!(
                    "Potential PHI ({}) in column '{}': column name matches an identifying keyword",
                    found.phi_type, column.name
                ),
                _ => format!(
                    "Potential PHI ({}) in column '{}': {} of {} sampled values match",
                    found.phi_type, column.name, found.match_count, found.sampled
                ),
            };
            issues.push(
                Issue::new(found.tier.issue_severity(), RULE_NAME, message)
                    .with_column(column.name.as_str())
                    .with_metadata("phi_type", found.phi_type)
                    .with_metadata("risk", found.tier.as_str())
                    .with_metadata("match_source", found.source.as_str())
                    .with_metadata("match_count", found.match_count)
                    .with_metadata("sampled", found.sampled),
            );
        }
        Ok(issues)
    }
}
