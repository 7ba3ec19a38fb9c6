//! Trait seams of the validation pipeline.
//!
//! - `Rule`: one independent check over a dataset
//! - `ComplianceScorer`: optional second pass over the aggregated issues
//!
//! The validator owns boxed trait objects of both and never depends on a
//! concrete rule type.

use std::fmt;

use medval_contracts::{ComplianceReport, Dataset, Issue, MedvalResult};

/// A validation rule.
///
/// Rules hold only construction-time configuration and must be
/// deterministic given a dataset. Returning `Err` (or panicking) does not
/// abort validation: the validator turns the failure into one `error`
/// issue attributed to `name()` and moves on to the next rule.
pub trait Rule: Send + Sync {
    /// Stable name used as `Issue::rule_name` and in failure reports.
    fn name(&self) -> &str;

    /// Evaluate the dataset and return the issues found, in a deterministic order.
    fn evaluate(&self, dataset: &Dataset) -> MedvalResult<Vec<Issue>>;
}

/// The compliance scorer: consumes every issue of one validation pass.
pub trait ComplianceScorer: Send + Sync {
    /// Build a report from the full issue list. The dataset is available for
    /// standards that need direct column inspection.
    fn score(&self, issues: &[Issue], dataset: &Dataset) -> MedvalResult<ComplianceReport>;
}

type RuleFn = dyn Fn(&Dataset) -> MedvalResult<Vec<Issue>> + Send + Sync;

/// A caller-supplied function registered as a rule.
pub struct FnRule {
    name: String,
    func: Box<RuleFn>,
}

impl FnRule {
    pub fn new<F>(name: impl Into<String>, func: F) -> Self
    where
        F: Fn(&Dataset) -> MedvalResult<Vec<Issue>> + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            func: Box::new(func),
        }
    }
}

impl fmt::Debug for FnRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FnRule").field("name", &self.name).finish()
    }
}

impl Rule for FnRule {
    fn name(&self) -> &str {
        &self.name
    }

    fn evaluate(&self, dataset: &Dataset) -> MedvalResult<Vec<Issue>> {
        (self.func)(dataset)
    }
}
