//! # medval-rules
//!
//! The built-in rule library. Every type here implements
//! [`medval_core::traits::Rule`] and is configured once at construction:
//!
//! - [`schema::SchemaValidator`]: required columns and declared column types
//! - [`phi::PHIDetector`]: identifying column names and value shapes
//! - [`quality::DataQualityChecker`]: missing ratios, constant columns, duplicates
//! - [`codes::MedicalCodeValidator`]: ICD-10, ICD-9, LOINC, CPT, SNOMED CT, NDC
//! - [`range::RangeValidator`]: inclusive numeric bounds
//! - [`dates::DateValidator`]: parseable dates within inclusive bounds
//!
//! ## Quick start
//!
//! ```rust,ignore
//! use medval_core::MedicalDataValidator;
//! use medval_rules::{phi::PHIDetector, range::{NumericRange, RangeValidator}};
//!
//! let mut validator = MedicalDataValidator::new();
//! validator.add_rule(PHIDetector::new());
//! validator.add_rule(RangeValidator::new([("age", NumericRange::between(0.0, 120.0)?)])?);
//! ```

pub mod codes;
pub mod dates;
pub mod phi;
pub mod quality;
pub mod range;
pub mod schema;
pub mod util;

pub use codes::MedicalCodeValidator;
pub use dates::DateValidator;
pub use phi::PHIDetector;
pub use quality::{DataQualityChecker, QualityThresholds};
pub use range::{NumericRange, RangeValidator};
pub use schema::{ColumnType, SchemaValidator};
