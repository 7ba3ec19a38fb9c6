//! Compliance report types.
//!
//! The compliance scorer consumes the issues of one validation pass and
//! produces a `ComplianceReport`: one `ComplianceStandardResult` per
//! evaluated standard plus an overall weighted score.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{MedvalError, MedvalResult};
use crate::issue::Severity;

/// Seriousness of a compliance violation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ComplianceSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl ComplianceSeverity {
    pub fn as_str(&self) -> &'static str {
        match self {
            ComplianceSeverity::Low => "low",
            ComplianceSeverity::Medium => "medium",
            ComplianceSeverity::High => "high",
            ComplianceSeverity::Critical => "critical",
        }
    }

    /// One step less severe; `Low` stays `Low`.
    pub fn lowered(self) -> Self {
        match self {
            ComplianceSeverity::Critical => ComplianceSeverity::High,
            ComplianceSeverity::High => ComplianceSeverity::Medium,
            ComplianceSeverity::Medium | ComplianceSeverity::Low => ComplianceSeverity::Low,
        }
    }

    /// The issue severity a finding of this compliance severity carries.
    pub fn issue_severity(&self) -> Severity {
        match self {
            ComplianceSeverity::Critical | ComplianceSeverity::High => Severity::Error,
            ComplianceSeverity::Medium => Severity::Warning,
            ComplianceSeverity::Low => Severity::Info,
        }
    }
}

impl fmt::Display for ComplianceSeverity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for ComplianceSeverity {
    type Err = MedvalError;

    fn from_str(s: &str) -> MedvalResult<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "low" => Ok(Self::Low),
            "medium" => Ok(Self::Medium),
            "high" => Ok(Self::High),
            "critical" => Ok(Self::Critical),
            other => Err(MedvalError::config(format!(
                "unknown severity '{other}' (expected low, medium, high or critical)"
            ))),
        }
    }
}

/// Compliance-facing classification of a 0–100 score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskLevel {
    Low,
    Medium,
    High,
    Critical,
}

impl RiskLevel {
    /// Lower bound (inclusive) of the `Low` bucket.
    pub const LOW_THRESHOLD: f64 = 90.0;
    /// Lower bound (inclusive) of the `Medium` bucket.
    pub const MEDIUM_THRESHOLD: f64 = 70.0;
    /// Lower bound (inclusive) of the `High` bucket.
    pub const HIGH_THRESHOLD: f64 = 40.0;

    /// Fixed monotone step function: a higher score never yields a higher risk.
    pub fn from_score(score: f64) -> Self {
        if score >= Self::LOW_THRESHOLD {
            RiskLevel::Low
        } else if score >= Self::MEDIUM_THRESHOLD {
            RiskLevel::Medium
        } else if score >= Self::HIGH_THRESHOLD {
            RiskLevel::High
        } else {
            RiskLevel::Critical
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            RiskLevel::Low => "low",
            RiskLevel::Medium => "medium",
            RiskLevel::High => "high",
            RiskLevel::Critical => "critical",
        }
    }
}

impl fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Clamp a raw score into `[0, 100]`. NaN collapses to 0.
pub fn clamp_score(score: f64) -> f64 {
    if score.is_nan() {
        0.0
    } else {
        score.clamp(0.0, 100.0)
    }
}

/// One compliance finding, derived from an issue or from dataset inspection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Violation {
    /// Key of the standard that raised it (`hipaa`, `gdpr`, ...).
    pub standard: String,
    pub severity: ComplianceSeverity,
    /// Recommendation lookup key (`ssn`, `missing_audit_timestamp`, ...).
    pub category: String,
    pub message: String,
    #[serde(default)]
    pub column: Option<String>,
    pub recommendation: String,
}

/// Score of one sub-area of a standard (one code system for medical coding).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubScore {
    pub score: f64,
    pub risk_level: RiskLevel,
    pub violations_count: usize,
}

/// Result for one compliance standard.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComplianceStandardResult {
    pub standard: String,
    pub score: f64,
    pub risk_level: RiskLevel,
    pub violations_count: usize,
    pub violations: Vec<Violation>,
    pub recommendations: Vec<String>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty", default)]
    pub sub_scores: BTreeMap<String, SubScore>,
    #[serde(skip_serializing_if = "Map::is_empty", default)]
    pub details: Map<String, Value>,
}

/// Violation counts across all standards.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ViolationSummary {
    pub total_violations: usize,
    pub critical_violations: usize,
    pub high_violations: usize,
    pub medium_violations: usize,
    pub low_violations: usize,
}

impl ViolationSummary {
    pub fn from_violations<'a>(violations: impl IntoIterator<Item = &'a Violation>) -> Self {
        let mut summary = Self::default();
        for violation in violations {
            summary.total_violations += 1;
            match violation.severity {
                ComplianceSeverity::Critical => summary.critical_violations += 1,
                ComplianceSeverity::High => summary.high_violations += 1,
                ComplianceSeverity::Medium => summary.medium_violations += 1,
                ComplianceSeverity::Low => summary.low_violations += 1,
            }
        }
        summary
    }
}

/// The full multi-standard compliance report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComplianceReport {
    pub overall_score: f64,
    pub overall_risk_level: RiskLevel,
    /// Keyed by standard name.
    pub standards: BTreeMap<String, ComplianceStandardResult>,
    pub summary: ViolationSummary,
    /// Every violation of every standard, in standard-evaluation order.
    pub all_violations: Vec<Violation>,
}
