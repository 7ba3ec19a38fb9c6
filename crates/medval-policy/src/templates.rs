//! Named validation templates.
//!
//! A `TemplateLibrary` is a read-only map from template name to a list of
//! `RuleConfig`s, deserialized from TOML. The built-in library is embedded at
//! build time; callers may load their own documents with the same schema.
//!
//! Applying a template builds every rule first and only then appends them to
//! the validator, so an invalid configuration leaves the validator untouched.

use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use medval_contracts::{CodeSystem, ComplianceSeverity, MedvalError, MedvalResult};
use medval_core::{traits::Rule, MedicalDataValidator};
use medval_rules::{
    ColumnType, DataQualityChecker, DateValidator, MedicalCodeValidator, NumericRange,
    PHIDetector, QualityThresholds, RangeValidator, SchemaValidator,
};

use crate::registry::{CustomRuleRegistry, CustomRuleSet};
use crate::rule::CustomRuleEntry;

const BUILTIN_TEMPLATES: &str = include_str!("../templates/healthcare_templates.toml");

fn default_severity() -> ComplianceSeverity {
    ComplianceSeverity::High
}

/// One rule construction inside a template, tagged by `kind`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RuleConfig {
    Schema {
        #[serde(default)]
        required_columns: Vec<String>,
        #[serde(default)]
        column_types: BTreeMap<String, ColumnType>,
    },
    PhiDetection {
        #[serde(default)]
        sample_size: Option<usize>,
    },
    DataQuality {
        #[serde(default)]
        missing_warning: Option<f64>,
        #[serde(default)]
        missing_error: Option<f64>,
    },
    MedicalCodes {
        code_columns: BTreeMap<String, CodeSystem>,
    },
    Range {
        ranges: BTreeMap<String, NumericRange>,
    },
    Date {
        columns: Vec<String>,
        #[serde(default)]
        min_date: Option<String>,
        #[serde(default)]
        max_date: Option<String>,
    },
    CustomPattern {
        name: String,
        pattern: String,
        field_pattern: String,
        #[serde(default = "default_severity")]
        severity: ComplianceSeverity,
        #[serde(default)]
        description: String,
        #[serde(default)]
        recommendation: String,
    },
}

impl RuleConfig {
    /// Build the rule this configuration describes.
    ///
    /// `CustomPattern` entries have no standalone rule; they are collected
    /// into a registry by [`TemplateLibrary::build`] and return `None` here.
    pub fn build(&self) -> MedvalResult<Option<Box<dyn Rule>>> {
        let rule: Box<dyn Rule> = match self {
            RuleConfig::Schema {
                required_columns,
                column_types,
            } => Box::new(SchemaValidator::new(
                required_columns.iter().cloned(),
                column_types.iter().map(|(c, t)| (c.clone(), *t)),
            )),
            RuleConfig::PhiDetection { sample_size } => {
                let detector = PHIDetector::new();
                Box::new(match sample_size {
                    Some(n) => detector.with_sample_size(*n),
                    None => detector,
                })
            }
            RuleConfig::DataQuality {
                missing_warning,
                missing_error,
            } => {
                let defaults = QualityThresholds::default();
                let thresholds = QualityThresholds::new(
                    missing_warning.unwrap_or(defaults.missing_warning),
                    missing_error.unwrap_or(defaults.missing_error),
                )?;
                Box::new(DataQualityChecker::with_thresholds(thresholds))
            }
            RuleConfig::MedicalCodes { code_columns } => Box::new(MedicalCodeValidator::new(
                code_columns.iter().map(|(c, s)| (c.clone(), *s)),
            )),
            RuleConfig::Range { ranges } => Box::new(RangeValidator::new(
                ranges.iter().map(|(c, r)| (c.clone(), *r)),
            )?),
            RuleConfig::Date {
                columns,
                min_date,
                max_date,
            } => Box::new(DateValidator::new(
                columns.iter().cloned(),
                min_date.as_deref(),
                max_date.as_deref(),
            )?),
            RuleConfig::CustomPattern { .. } => return Ok(None),
        };
        Ok(Some(rule))
    }

    fn custom_entry(&self) -> Option<CustomRuleEntry> {
        match self {
            RuleConfig::CustomPattern {
                name,
                pattern,
                field_pattern,
                severity,
                description,
                recommendation,
            } => Some(CustomRuleEntry {
                name: name.clone(),
                pattern: pattern.clone(),
                field_pattern: field_pattern.clone(),
                severity: *severity,
                description: description.clone(),
                recommendation: recommendation.clone(),
            }),
            _ => None,
        }
    }
}

/// A named bundle of rule configurations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Template {
    pub description: String,
    #[serde(default)]
    pub rules: Vec<RuleConfig>,
}

#[derive(Debug, Deserialize)]
struct TemplateDocument {
    #[serde(default)]
    templates: BTreeMap<String, Template>,
}

/// Rules produced by building one template.
pub struct BuiltTemplate {
    pub rules: Vec<Box<dyn Rule>>,
    /// Registry holding the template's custom patterns; empty when it has none.
    pub custom_rules: Arc<CustomRuleRegistry>,
}

/// Read-only map from template name to template.
#[derive(Debug, Clone, Default)]
pub struct TemplateLibrary {
    templates: BTreeMap<String, Template>,
}

impl TemplateLibrary {
    /// The library embedded in this crate: `clinical_trials`, `ehr`,
    /// `laboratory`, `imaging` and `research`.
    pub fn builtin() -> MedvalResult<Self> {
        Self::from_toml_str(BUILTIN_TEMPLATES)
    }

    /// Parse `s` as a template document.
    ///
    /// Returns `MedvalError::ConfigError` if the TOML is malformed or does not
    /// match the template schema.
    pub fn from_toml_str(s: &str) -> MedvalResult<Self> {
        let doc: TemplateDocument = toml::from_str(s).map_err(|e| {
            MedvalError::config(format!("failed to parse template TOML: {}", e))
        })?;
        Ok(Self {
            templates: doc.templates,
        })
    }

    /// Read the file at `path` and parse it as a template document.
    pub fn from_file(path: &Path) -> MedvalResult<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| {
            MedvalError::config(format!(
                "failed to read template file '{}': {}",
                path.display(),
                e
            ))
        })?;
        Self::from_toml_str(&contents)
    }

    /// Add or overwrite templates from another library.
    pub fn merge(&mut self, other: TemplateLibrary) {
        self.templates.extend(other.templates);
    }

    /// `{template_name: description}`, ordered by name.
    pub fn list(&self) -> BTreeMap<String, String> {
        self.templates
            .iter()
            .map(|(name, t)| (name.clone(), t.description.clone()))
            .collect()
    }

    pub fn get(&self, name: &str) -> Option<&Template> {
        self.templates.get(name)
    }

    pub fn len(&self) -> usize {
        self.templates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.templates.is_empty()
    }

    /// Instantiate every rule of template `name` without touching any validator.
    ///
    /// Custom patterns go into a fresh registry, represented in `rules` by a
    /// single `CustomRuleSet` placed where the first pattern was declared.
    pub fn build(&self, name: &str) -> MedvalResult<BuiltTemplate> {
        let template = self.templates.get(name).ok_or_else(|| {
            MedvalError::config(format!(
                "unknown template '{name}' (available: {})",
                self.templates.keys().cloned().collect::<Vec<_>>().join(", ")
            ))
        })?;

        let registry = CustomRuleRegistry::shared();
        let mut rules: Vec<Box<dyn Rule>> = Vec::new();
        let mut custom_slot = false;
        for config in &template.rules {
            if let Some(entry) = config.custom_entry() {
                registry.register(entry.into())?;
                if !custom_slot {
                    rules.push(Box::new(CustomRuleSet::new(registry.clone())));
                    custom_slot = true;
                }
                continue;
            }
            if let Some(rule) = config.build()? {
                rules.push(rule);
            }
        }
        debug!(template = %name, rules = rules.len(), custom = registry.len(), "template built");
        Ok(BuiltTemplate {
            rules,
            custom_rules: registry,
        })
    }

    /// Build template `name` and append its rules to `validator`.
    ///
    /// Unknown names and invalid configurations are `ConfigError`s, and leave
    /// the validator unchanged. Returns the template's custom-rule registry so
    /// callers can report on it (for example to a compliance scorer).
    pub fn apply(
        &self,
        name: &str,
        validator: &mut MedicalDataValidator,
    ) -> MedvalResult<Arc<CustomRuleRegistry>> {
        let built = self.build(name)?;
        let added = built.rules.len();
        for rule in built.rules {
            validator.add_boxed_rule(rule);
        }
        info!(template = %name, rules_added = added, "template applied");
        Ok(built.custom_rules)
    }
}
