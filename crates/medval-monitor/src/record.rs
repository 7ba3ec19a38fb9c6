//! History record types.
//!
//! `ValidationSnapshot` is what the monitor keeps of one validation pass.
//! `ValidationRecord` wraps it with a sequence number and the SHA-256 hashes
//! that link it to the record before it.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use medval_contracts::{RiskLevel, ValidationResult};

/// The monitored facts of one validation pass.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationSnapshot {
    pub id: Uuid,
    pub timestamp: DateTime<Utc>,
    pub is_valid: bool,
    pub total_rows: usize,
    pub error_count: usize,
    pub warning_count: usize,
    pub info_count: usize,
    /// Present only when the pass ran with compliance scoring.
    pub compliance_score: Option<f64>,
    pub risk_level: Option<RiskLevel>,
    pub processing_time_ms: f64,
}

impl ValidationSnapshot {
    pub fn from_result(result: &ValidationResult, processing_time_ms: f64) -> Self {
        let report = result.summary.compliance_report.as_ref();
        Self {
            id: Uuid::new_v4(),
            timestamp: Utc::now(),
            is_valid: result.is_valid,
            total_rows: result.summary.total_rows,
            error_count: result.error_count(),
            warning_count: result.warning_count(),
            info_count: result.info_count(),
            compliance_score: report.map(|r| r.overall_score),
            risk_level: report.map(|r| r.overall_risk_level),
            processing_time_ms,
        }
    }

    pub fn issue_count(&self) -> usize {
        self.error_count + self.warning_count + self.info_count
    }
}

/// One entry of the hash-chained history.
///
/// Changing any field of `snapshot` invalidates `this_hash` and the
/// `prev_hash` of the record after it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationRecord {
    /// Position in the monitor's lifetime, starting at 0. Evicted records
    /// keep their numbers, so the retained window may start above 0.
    pub sequence: u64,
    pub snapshot: ValidationSnapshot,
    /// Hash of the previous record, or `GENESIS_HASH` for sequence 0.
    pub prev_hash: String,
    pub this_hash: String,
}

impl ValidationRecord {
    /// `prev_hash` of the first record ever written: 64 hex zeros.
    pub const GENESIS_HASH: &'static str =
        "0000000000000000000000000000000000000000000000000000000000000000";
}
