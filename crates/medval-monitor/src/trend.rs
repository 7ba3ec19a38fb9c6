//! Trend series over the retained history.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use medval_contracts::{MedvalError, MedvalResult, RiskLevel};

use crate::record::ValidationSnapshot;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrendMetric {
    ComplianceScore,
    ErrorCount,
    IssueCount,
}

impl TrendMetric {
    pub fn as_str(&self) -> &'static str {
        match self {
            TrendMetric::ComplianceScore => "compliance_score",
            TrendMetric::ErrorCount => "error_count",
            TrendMetric::IssueCount => "issue_count",
        }
    }
}

impl fmt::Display for TrendMetric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TrendMetric {
    type Err = MedvalError;

    fn from_str(s: &str) -> MedvalResult<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "compliance_score" => Ok(TrendMetric::ComplianceScore),
            "error_count" => Ok(TrendMetric::ErrorCount),
            "issue_count" => Ok(TrendMetric::IssueCount),
            other => Err(MedvalError::config(format!(
                "unknown trend metric '{other}' (expected compliance_score, error_count or issue_count)"
            ))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TrendStatus {
    Good,
    Warning,
    Critical,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrendPoint {
    pub sequence: u64,
    pub timestamp: DateTime<Utc>,
    pub value: f64,
    pub status: TrendStatus,
}

/// Thresholds that classify a trend point.
#[derive(Debug, Clone, Copy)]
pub(crate) struct TrendLimits {
    pub max_error_issues: usize,
    pub max_issues: usize,
}

fn count_status(count: usize, limit: usize) -> TrendStatus {
    if count == 0 {
        TrendStatus::Good
    } else if count <= limit {
        TrendStatus::Warning
    } else {
        TrendStatus::Critical
    }
}

/// The metric value and status for one snapshot, or `None` when the snapshot
/// has no value for it (a pass without compliance scoring).
pub(crate) fn point_value(
    metric: TrendMetric,
    snapshot: &ValidationSnapshot,
    limits: TrendLimits,
) -> Option<(f64, TrendStatus)> {
    match metric {
        TrendMetric::ComplianceScore => snapshot.compliance_score.map(|score| {
            let status = match RiskLevel::from_score(score) {
                RiskLevel::Low => TrendStatus::Good,
                RiskLevel::Medium => TrendStatus::Warning,
                RiskLevel::High | RiskLevel::Critical => TrendStatus::Critical,
            };
            (score, status)
        }),
        TrendMetric::ErrorCount => Some((
            snapshot.error_count as f64,
            count_status(snapshot.error_count, limits.max_error_issues),
        )),
        TrendMetric::IssueCount => Some((
            snapshot.issue_count() as f64,
            count_status(snapshot.issue_count(), limits.max_issues),
        )),
    }
}
