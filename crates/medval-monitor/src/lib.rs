//! # medval-monitor
//!
//! Caller-owned monitoring of validation passes.
//!
//! ## Overview
//!
//! [`ValidationMonitor`] records one [`ValidationRecord`] per pass in a
//! bounded history. Records link to their predecessor through SHA-256
//! hashes; evicting the oldest record moves the chain's anchor forward, so
//! the retained window always verifies with `verify_integrity`.
//!
//! Each pass can raise [`Alert`]s (low compliance score, critical risk, too
//! many errors). Alerts stay active until acknowledged.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use std::time::Instant;
//! use medval_monitor::{TrendMetric, ValidationMonitor};
//!
//! let monitor = ValidationMonitor::with_defaults();
//! let started = Instant::now();
//! let result = validator.validate(&dataset);
//! for alert in monitor.record(&result, started.elapsed()) {
//!     eprintln!("{}", alert.message);
//! }
//! let scores = monitor.trend(TrendMetric::ComplianceScore);
//! ```

pub mod alert;
pub mod chain;
pub mod monitor;
pub mod record;
pub mod trend;

pub use alert::{Alert, AlertKind, AlertSeverity};
pub use chain::{hash_record, verify_chain};
pub use monitor::{MonitorConfig, MonitorStats, ValidationMonitor};
pub use record::{ValidationRecord, ValidationSnapshot};
pub use trend::{TrendMetric, TrendPoint, TrendStatus};

// ── Tests ─────────────────────────────────────────────────────────────────────
