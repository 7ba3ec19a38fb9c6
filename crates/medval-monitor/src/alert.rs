//! Alerts raised by the monitor.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// What tripped an alert.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertKind {
    /// Overall compliance score fell below the configured minimum.
    LowComplianceScore,
    /// Overall compliance risk was `critical`.
    CriticalRisk,
    /// Error issue count exceeded the configured maximum.
    HighErrorCount,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AlertSeverity {
    Warning,
    Critical,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Alert {
    pub id: Uuid,
    pub kind: AlertKind,
    pub severity: AlertSeverity,
    pub message: String,
    pub timestamp: DateTime<Utc>,
    /// Id of the snapshot that raised it.
    pub validation_id: Uuid,
    pub acknowledged: bool,
}

impl Alert {
    pub fn new(
        kind: AlertKind,
        severity: AlertSeverity,
        message: impl Into<String>,
        validation_id: Uuid,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            kind,
            severity,
            message: message.into(),
            timestamp: Utc::now(),
            validation_id,
            acknowledged: false,
        }
    }
}
