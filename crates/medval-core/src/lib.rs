//! # medval-core
//!
//! The validation orchestrator for medval.
//!
//! This crate provides:
//! - The two seam traits (`Rule`, `ComplianceScorer`)
//! - `FnRule`, which lifts a closure into a named rule
//! - The `MedicalDataValidator` that runs rules in order and aggregates issues
//!
//! ## Usage
//!
//! ```rust,ignore
//! use medval_core::{MedicalDataValidator, traits::Rule};
//! ```

pub mod report;
pub mod traits;
pub mod validator;

pub use traits::{ComplianceScorer, FnRule, Rule};
pub use validator::MedicalDataValidator;
