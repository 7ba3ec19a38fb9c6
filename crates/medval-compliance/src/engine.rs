//! The compliance engine: the `ComplianceScorer` implementation.
//!
//! # Pipeline
//!
//! For each evaluated standard, in `Standard::ALL` order:
//!
//! 1. **Classify**: turn the standard's issues (and, where needed, direct
//!    column inspection) into `Violation`s.
//! 2. **Score**: `100 − Σ weight(severity)` clamped to `[0, 100]`; medical
//!    coding averages one such score per code system.
//! 3. **Recommend**: one recommendation per distinct violation category,
//!    in first-seen order.
//!
//! Then the overall score is the weight-normalized average of the evaluated
//! standards' scores, bucketed with the same risk thresholds.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use serde_json::json;
use tracing::{debug, info};

use medval_contracts::{
    clamp_score, ComplianceReport, ComplianceStandardResult, Dataset, Issue, MedvalError,
    MedvalResult, RiskLevel, SubScore, Violation, ViolationSummary,
};
use medval_core::traits::ComplianceScorer;
use medval_policy::CustomRuleRegistry;

use crate::classify::{self, Findings};
use crate::standard::Standard;

/// Multi-standard compliance scorer.
///
/// Evaluates all five standards unless narrowed with [`with_standards`].
///
/// [`with_standards`]: ComplianceEngine::with_standards
#[derive(Debug, Clone)]
pub struct ComplianceEngine {
    standards: Vec<Standard>,
    custom_rules: Option<Arc<CustomRuleRegistry>>,
}

impl Default for ComplianceEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl ComplianceEngine {
    pub fn new() -> Self {
        Self {
            standards: Standard::ALL.to_vec(),
            custom_rules: None,
        }
    }

    /// Evaluate only `standards`. Order and duplicates in the argument are
    /// ignored; an empty set is a `ConfigError`.
    pub fn with_standards(standards: impl IntoIterator<Item = Standard>) -> MedvalResult<Self> {
        let wanted: BTreeSet<Standard> = standards.into_iter().collect();
        if wanted.is_empty() {
            return Err(MedvalError::config(
                "a compliance engine needs at least one standard",
            ));
        }
        Ok(Self {
            standards: Standard::ALL
                .into_iter()
                .filter(|s| wanted.contains(s))
                .collect(),
            custom_rules: None,
        })
    }

    /// Report `rules_configured` for the custom-rules standard from `registry`.
    pub fn with_custom_rules(mut self, registry: Arc<CustomRuleRegistry>) -> Self {
        self.custom_rules = Some(registry);
        self
    }

    pub fn standards(&self) -> &[Standard] {
        &self.standards
    }

    /// Build the full report for one validation pass.
    pub fn evaluate(&self, issues: &[Issue], dataset: &Dataset) -> MedvalResult<ComplianceReport> {
        let mut standards = BTreeMap::new();
        let mut all_violations = Vec::new();
        let mut weighted = 0.0;
        let mut total_weight = 0.0;

        for &standard in &self.standards {
            let result = self.evaluate_standard(standard, issues, dataset)?;
            debug!(
                standard = %standard,
                score = result.score,
                risk = %result.risk_level,
                violations = result.violations_count,
                "compliance standard scored"
            );
            weighted += standard.overall_weight() * result.score;
            total_weight += standard.overall_weight();
            all_violations.extend(result.violations.iter().cloned());
            standards.insert(standard.as_str().to_string(), result);
        }

        let overall_score = if total_weight > 0.0 {
            clamp_score(weighted / total_weight)
        } else {
            100.0
        };
        let overall_risk_level = RiskLevel::from_score(overall_score);
        let summary = ViolationSummary::from_violations(&all_violations);

        info!(
            overall_score,
            risk = %overall_risk_level,
            total_violations = summary.total_violations,
            "compliance report built"
        );

        Ok(ComplianceReport {
            overall_score,
            overall_risk_level,
            standards,
            summary,
            all_violations,
        })
    }

    /// Classify, score and summarize a single standard.
    pub fn evaluate_standard(
        &self,
        standard: Standard,
        issues: &[Issue],
        dataset: &Dataset,
    ) -> MedvalResult<ComplianceStandardResult> {
        // ── Step 1: classify ─────────────────────────────────────────────────
        let findings = match standard {
            Standard::Hipaa => classify::hipaa(issues)?,
            Standard::Gdpr => classify::gdpr(issues, dataset)?,
            Standard::Fda => classify::fda(issues, dataset),
            Standard::MedicalCoding => classify::medical_coding(issues, dataset)?,
            Standard::CustomRules => {
                classify::custom_rules(issues, self.custom_rules.as_deref())?
            }
        };
        let Findings {
            violations,
            details,
            groups,
        } = findings;

        // ── Step 2: score ────────────────────────────────────────────────────
        let weights = standard.weights();
        let sub_scores: BTreeMap<String, SubScore> = groups
            .iter()
            .map(|(system, group)| {
                let score = clamp_score(100.0 - weights.deduction(group));
                let sub = SubScore {
                    score,
                    risk_level: RiskLevel::from_score(score),
                    violations_count: group.len(),
                };
                (system.clone(), sub)
            })
            .collect();
        let score = if standard == Standard::MedicalCoding {
            if sub_scores.is_empty() {
                100.0
            } else {
                sub_scores.values().map(|s| s.score).sum::<f64>() / sub_scores.len() as f64
            }
        } else {
            clamp_score(100.0 - weights.deduction(&violations))
        };

        // ── Step 3: recommend ────────────────────────────────────────────────
        let recommendations = recommendations(&violations);

        let mut details = details;
        details.insert("evaluated".into(), json!(true));

        Ok(ComplianceStandardResult {
            standard: standard.as_str().to_string(),
            score,
            risk_level: RiskLevel::from_score(score),
            violations_count: violations.len(),
            violations,
            recommendations,
            sub_scores,
            details,
        })
    }
}

/// One recommendation per distinct category, in first-seen order.
fn recommendations(violations: &[Violation]) -> Vec<String> {
    let mut seen = BTreeSet::new();
    violations
        .iter()
        .filter(|v| !v.recommendation.is_empty() && seen.insert(v.category.as_str()))
        .map(|v| v.recommendation.clone())
        .collect()
}

impl ComplianceScorer for ComplianceEngine {
    fn score(&self, issues: &[Issue], dataset: &Dataset) -> MedvalResult<ComplianceReport> {
        self.evaluate(issues, dataset)
    }
}
