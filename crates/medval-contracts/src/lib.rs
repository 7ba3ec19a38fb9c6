//! # medval-contracts
//!
//! Shared types for the medval validation engine.
//!
//! Every crate in the workspace imports from here. No validation logic lives
//! in this crate, only the dataset model, issue and result types, compliance
//! report types, code-system grammars and the error type.

pub mod codes;
pub mod compliance;
pub mod custom;
pub mod dataset;
pub mod error;
pub mod issue;

pub use codes::CodeSystem;
pub use compliance::{
    clamp_score, ComplianceReport, ComplianceSeverity, ComplianceStandardResult, RiskLevel,
    SubScore, Violation, ViolationSummary,
};
pub use custom::CustomRuleDefinition;
pub use dataset::{CellValue, Column, Dataset};
pub use error::{MedvalError, MedvalResult};
pub use issue::{Issue, Severity, ValidationResult, ValidationSummary};
