//! Error types for the medval validation engine.
//!
//! Configuration mistakes surface to the caller as `MedvalError::ConfigError`
//! at construction or registration time. Failures raised while a rule is
//! evaluating are never returned from `validate`; the validator downgrades
//! them to issues.

use thiserror::Error;

/// The unified error type for the medval crates.
#[derive(Debug, Error)]
pub enum MedvalError {
    /// A rule, template or registry entry was configured with invalid values
    /// (bad pattern, unknown template, unknown type name, inverted range).
    #[error("configuration error: {reason}")]
    ConfigError { reason: String },

    /// A rule failed while evaluating a dataset.
    #[error("rule '{rule}' failed during evaluation: {reason}")]
    RuleEvaluation { rule: String, reason: String },

    /// The dataset is not tabular (ragged columns, duplicate column names).
    #[error("malformed dataset: {reason}")]
    DataShape { reason: String },

    /// The compliance scorer could not produce a report.
    #[error("compliance scoring failed: {reason}")]
    ComplianceScoring { reason: String },
}

impl MedvalError {
    /// Shorthand for building a `ConfigError`.
    pub fn config(reason: impl Into<String>) -> Self {
        Self::ConfigError {
            reason: reason.into(),
        }
    }

    /// Shorthand for building a `RuleEvaluation` error attributed to `rule`.
    pub fn evaluation(rule: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::RuleEvaluation {
            rule: rule.into(),
            reason: reason.into(),
        }
    }

    /// The message without the variant's prefix, for callers that add their
    /// own context (the validator's failure issues).
    pub fn reason(&self) -> &str {
        match self {
            Self::ConfigError { reason }
            | Self::RuleEvaluation { reason, .. }
            | Self::DataShape { reason }
            | Self::ComplianceScoring { reason } => reason,
        }
    }
}

/// Convenience alias used throughout the medval crates.
pub type MedvalResult<T> = Result<T, MedvalError>;
