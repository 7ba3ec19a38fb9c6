//! The caller-owned validation monitor.
//!
//! `ValidationMonitor` keeps a bounded, hash-chained history of validation
//! passes and a bounded list of alerts, both behind one `Mutex`. Cloning the
//! monitor shares the same state, so a host can hand clones to every worker
//! that validates.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use uuid::Uuid;

use medval_contracts::{MedvalError, MedvalResult, RiskLevel, ValidationResult};

use crate::alert::{Alert, AlertKind, AlertSeverity};
use crate::chain::{hash_record, verify_chain};
use crate::record::{ValidationRecord, ValidationSnapshot};
use crate::trend::{point_value, TrendLimits, TrendMetric, TrendPoint};

/// Capacities and alert thresholds.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MonitorConfig {
    /// Records kept before the oldest is evicted.
    pub history_capacity: usize,
    /// Alerts kept before the oldest is evicted.
    pub alert_capacity: usize,
    /// A compliance score below this raises `LowComplianceScore`.
    pub min_compliance_score: f64,
    /// An error count above this raises `HighErrorCount`.
    pub max_error_issues: usize,
    /// Issue counts above this are `critical` in the issue-count trend.
    pub max_issues: usize,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            history_capacity: 1000,
            alert_capacity: 100,
            min_compliance_score: 70.0,
            max_error_issues: 10,
            max_issues: 50,
        }
    }
}

impl MonitorConfig {
    /// Returns `ConfigError` for zero capacities or a score threshold
    /// outside `[0, 100]`.
    pub fn validate(&self) -> MedvalResult<()> {
        if self.history_capacity == 0 || self.alert_capacity == 0 {
            return Err(MedvalError::config(
                "monitor history and alert capacities must be at least 1",
            ));
        }
        if !(0.0..=100.0).contains(&self.min_compliance_score) {
            return Err(MedvalError::config(format!(
                "min_compliance_score must lie in [0, 100], got {}",
                self.min_compliance_score
            )));
        }
        Ok(())
    }
}

/// Aggregate counters over the monitor's lifetime.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonitorStats {
    /// Every recorded pass, including evicted ones.
    pub total_validations: u64,
    pub successful_validations: u64,
    /// `successful / total`, or 0 before the first pass.
    pub success_rate: f64,
    pub average_processing_ms: f64,
    pub active_alerts: usize,
    pub history_len: usize,
}

// ── Internal mutable state ────────────────────────────────────────────────────

pub(crate) struct MonitorState {
    pub(crate) records: VecDeque<ValidationRecord>,
    pub(crate) alerts: VecDeque<Alert>,
    /// Next sequence number to assign.
    sequence: u64,
    /// `this_hash` of the newest record, or `GENESIS_HASH`.
    last_hash: String,
    /// `this_hash` of the newest evicted record, or `GENESIS_HASH`.
    anchor_hash: String,
    total_validations: u64,
    successful_validations: u64,
    total_processing_ms: f64,
}

// ── Public monitor ────────────────────────────────────────────────────────────

/// Bounded validation history with alerting.
///
/// # Thread safety
///
/// Every method takes the internal `Mutex` once; clones share state.
#[derive(Clone)]
pub struct ValidationMonitor {
    config: MonitorConfig,
    pub(crate) state: Arc<Mutex<MonitorState>>,
}

impl ValidationMonitor {
    /// Returns `ConfigError` if `config` fails `MonitorConfig::validate`.
    pub fn new(config: MonitorConfig) -> MedvalResult<Self> {
        config.validate()?;
        Ok(Self::build(config))
    }

    /// A monitor with `MonitorConfig::default()`.
    pub fn with_defaults() -> Self {
        Self::build(MonitorConfig::default())
    }

    fn build(config: MonitorConfig) -> Self {
        let state = MonitorState {
            records: VecDeque::with_capacity(config.history_capacity.min(1024)),
            alerts: VecDeque::new(),
            sequence: 0,
            last_hash: ValidationRecord::GENESIS_HASH.to_string(),
            anchor_hash: ValidationRecord::GENESIS_HASH.to_string(),
            total_validations: 0,
            successful_validations: 0,
            total_processing_ms: 0.0,
        };
        Self {
            config,
            state: Arc::new(Mutex::new(state)),
        }
    }

    pub fn config(&self) -> &MonitorConfig {
        &self.config
    }

    fn state(&self) -> MutexGuard<'_, MonitorState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Append one pass to the history and return the alerts it raised.
    pub fn record(&self, result: &ValidationResult, processing_time: Duration) -> Vec<Alert> {
        let snapshot = ValidationSnapshot::from_result(result, processing_time.as_secs_f64() * 1000.0);
        let raised = self.alerts_for(&snapshot);

        let mut state = self.state();

        // ── Step 1: chain ────────────────────────────────────────────────────
        let sequence = state.sequence;
        let prev_hash = state.last_hash.clone();
        let this_hash = hash_record(sequence, &snapshot, &prev_hash);
        let record = ValidationRecord {
            sequence,
            snapshot,
            prev_hash,
            this_hash: this_hash.clone(),
        };

        // ── Step 2: append with FIFO eviction ────────────────────────────────
        if state.records.len() == self.config.history_capacity {
            if let Some(evicted) = state.records.pop_front() {
                debug!(sequence = evicted.sequence, "history record evicted");
                state.anchor_hash = evicted.this_hash;
            }
        }
        state.total_validations += 1;
        if record.snapshot.is_valid {
            state.successful_validations += 1;
        }
        state.total_processing_ms += record.snapshot.processing_time_ms;
        state.records.push_back(record);
        state.sequence += 1;
        state.last_hash = this_hash;

        // ── Step 3: alerts ───────────────────────────────────────────────────
        for alert in &raised {
            info!(
                alert_id = %alert.id,
                kind = ?alert.kind,
                severity = ?alert.severity,
                message = %alert.message,
                "monitor alert raised"
            );
            if state.alerts.len() == self.config.alert_capacity {
                state.alerts.pop_front();
            }
            state.alerts.push_back(alert.clone());
        }
        raised
    }

    fn alerts_for(&self, snapshot: &ValidationSnapshot) -> Vec<Alert> {
        let mut alerts = Vec::new();
        if let Some(score) = snapshot.compliance_score {
            if score < self.config.min_compliance_score {
                alerts.push(Alert::new(
                    AlertKind::LowComplianceScore,
                    AlertSeverity::Warning,
                    format!(
                        "Compliance score {score:.1} is below the minimum of {:.1}",
                        self.config.min_compliance_score
                    ),
                    snapshot.id,
                ));
            }
        }
        if snapshot.risk_level == Some(RiskLevel::Critical) {
            alerts.push(Alert::new(
                AlertKind::CriticalRisk,
                AlertSeverity::Critical,
                "Overall compliance risk is critical",
                snapshot.id,
            ));
        }
        if snapshot.error_count > self.config.max_error_issues {
            alerts.push(Alert::new(
                AlertKind::HighErrorCount,
                AlertSeverity::Warning,
                format!(
                    "{} error issues exceed the maximum of {}",
                    snapshot.error_count, self.config.max_error_issues
                ),
                snapshot.id,
            ));
        }
        alerts
    }

    /// The retained history, oldest first.
    pub fn history(&self) -> Vec<ValidationRecord> {
        self.state().records.iter().cloned().collect()
    }

    /// Check the retained window's hash chain.
    pub fn verify_integrity(&self) -> bool {
        let mut state = self.state();
        let anchor = state.anchor_hash.clone();
        verify_chain(state.records.make_contiguous(), &anchor)
    }

    pub fn stats(&self) -> MonitorStats {
        let state = self.state();
        let total = state.total_validations;
        let ratio = |n: f64| if total == 0 { 0.0 } else { n / total as f64 };
        MonitorStats {
            total_validations: total,
            successful_validations: state.successful_validations,
            success_rate: ratio(state.successful_validations as f64),
            average_processing_ms: ratio(state.total_processing_ms),
            active_alerts: state.alerts.iter().filter(|a| !a.acknowledged).count(),
            history_len: state.records.len(),
        }
    }

    /// Retained alerts that have not been acknowledged, oldest first.
    pub fn active_alerts(&self) -> Vec<Alert> {
        self.state()
            .alerts
            .iter()
            .filter(|a| !a.acknowledged)
            .cloned()
            .collect()
    }

    /// Every retained alert, acknowledged or not.
    pub fn alerts(&self) -> Vec<Alert> {
        self.state().alerts.iter().cloned().collect()
    }

    /// Mark alert `id` acknowledged. Returns `false` if no retained alert
    /// has that id.
    pub fn acknowledge(&self, id: Uuid) -> bool {
        let mut state = self.state();
        match state.alerts.iter_mut().find(|a| a.id == id) {
            Some(alert) => {
                alert.acknowledged = true;
                debug!(alert_id = %id, "alert acknowledged");
                true
            }
            None => false,
        }
    }

    /// Time-ordered points of `metric` over the retained history.
    pub fn trend(&self, metric: TrendMetric) -> Vec<TrendPoint> {
        let limits = TrendLimits {
            max_error_issues: self.config.max_error_issues,
            max_issues: self.config.max_issues,
        };
        self.state()
            .records
            .iter()
            .filter_map(|record| {
                point_value(metric, &record.snapshot, limits).map(|(value, status)| TrendPoint {
                    sequence: record.sequence,
                    timestamp: record.snapshot.timestamp,
                    value,
                    status,
                })
            })
            .collect()
    }
}
