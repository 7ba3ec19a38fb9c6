//! The compliance standards and their fixed weight tables.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use medval_contracts::{ComplianceSeverity, MedvalError, MedvalResult, Violation};

/// Score deduction per violation, by severity.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SeverityWeights {
    pub critical: f64,
    pub high: f64,
    pub medium: f64,
    pub low: f64,
}

impl SeverityWeights {
    pub fn weight(&self, severity: ComplianceSeverity) -> f64 {
        match severity {
            ComplianceSeverity::Critical => self.critical,
            ComplianceSeverity::High => self.high,
            ComplianceSeverity::Medium => self.medium,
            ComplianceSeverity::Low => self.low,
        }
    }

    /// `Σ weight(v.severity)` over `violations`.
    pub fn deduction<'a>(&self, violations: impl IntoIterator<Item = &'a Violation>) -> f64 {
        violations.into_iter().map(|v| self.weight(v.severity)).sum()
    }
}

/// A compliance standard the engine can score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Standard {
    Hipaa,
    Gdpr,
    Fda,
    MedicalCoding,
    CustomRules,
}

impl Standard {
    /// Every standard, in evaluation order.
    pub const ALL: [Standard; 5] = [
        Standard::Hipaa,
        Standard::Gdpr,
        Standard::Fda,
        Standard::MedicalCoding,
        Standard::CustomRules,
    ];

    /// Key used in `ComplianceReport::standards` and `Violation::standard`.
    pub fn as_str(&self) -> &'static str {
        match self {
            Standard::Hipaa => "hipaa",
            Standard::Gdpr => "gdpr",
            Standard::Fda => "fda",
            Standard::MedicalCoding => "medical_coding",
            Standard::CustomRules => "custom_rules",
        }
    }

    pub fn weights(&self) -> SeverityWeights {
        let (critical, high, medium, low) = match self {
            Standard::Hipaa => (25.0, 15.0, 8.0, 3.0),
            Standard::Gdpr => (20.0, 12.0, 6.0, 2.0),
            Standard::Fda | Standard::MedicalCoding | Standard::CustomRules => {
                (20.0, 10.0, 5.0, 2.0)
            }
        };
        SeverityWeights {
            critical,
            high,
            medium,
            low,
        }
    }

    /// Weight of this standard in the overall score.
    pub fn overall_weight(&self) -> f64 {
        match self {
            Standard::Hipaa => 0.30,
            Standard::Gdpr | Standard::Fda => 0.20,
            Standard::MedicalCoding | Standard::CustomRules => 0.15,
        }
    }
}

impl fmt::Display for Standard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Standard {
    type Err = MedvalError;

    fn from_str(s: &str) -> MedvalResult<Self> {
        match s.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "hipaa" => Ok(Standard::Hipaa),
            "gdpr" => Ok(Standard::Gdpr),
            "fda" | "fda_21_cfr_part_11" | "21_cfr_part_11" => Ok(Standard::Fda),
            "medical_coding" | "coding" => Ok(Standard::MedicalCoding),
            "custom_rules" | "custom" => Ok(Standard::CustomRules),
            other => Err(MedvalError::config(format!(
                "unknown compliance standard '{other}' (expected hipaa, gdpr, fda, medical_coding or custom_rules)"
            ))),
        }
    }
}
