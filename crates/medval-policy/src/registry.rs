//! The custom rule registry.
//!
//! `CustomRuleRegistry` is the only shared mutable structure the engine has.
//! It is an `RwLock`-guarded map keyed by rule name, shared through `Arc`:
//! registration and removal take the write lock, evaluation and listing take
//! the read lock, so no caller ever observes a half-applied change.
//!
//! `CustomRuleSet` adapts a shared registry to the `Rule` trait so it can be
//! added to a validator like any built-in rule.

use std::collections::BTreeMap;
use std::path::Path;
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use once_cell::sync::Lazy;
use serde_json::{json, Value};
use tracing::{debug, info, warn};

use medval_contracts::{CustomRuleDefinition, Dataset, Issue, MedvalError, MedvalResult};
use medval_core::traits::Rule;

use crate::rule::{CompiledCustomRule, CustomRuleEntry, CustomRuleFile};

/// Rule name of the `CustomRuleSet` adapter.
pub const CUSTOM_RULE_SET_NAME: &str = "CustomRules";

static CUSTOM_RULE_SCHEMA: Lazy<Value> = Lazy::new(|| {
    json!({
        "type": "object",
        "required": ["name", "pattern", "field_pattern"],
        "properties": {
            "name": { "type": "string", "minLength": 1 },
            "pattern": { "type": "string", "minLength": 1 },
            "field_pattern": { "type": "string", "minLength": 1 },
            "severity": { "enum": ["low", "medium", "high", "critical"] },
            "description": { "type": "string" },
            "recommendation": { "type": "string" }
        },
        "additionalProperties": false
    })
});

/// Process-scoped registry of user-declared pattern rules.
///
/// Names are unique at every instant. `register` refuses an existing name;
/// `replace` is the explicit overwrite.
#[derive(Debug, Default)]
pub struct CustomRuleRegistry {
    rules: RwLock<BTreeMap<String, CompiledCustomRule>>,
}

impl CustomRuleRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Convenience for the common shared form.
    pub fn shared() -> Arc<Self> {
        Arc::new(Self::new())
    }

    /// Build a registry from a TOML rule file body (`[[rules]]` tables).
    ///
    /// Returns `MedvalError::ConfigError` if the TOML is malformed, a rule is
    /// invalid, or two rules share a name.
    pub fn from_toml_str(s: &str) -> MedvalResult<Self> {
        let registry = Self::new();
        registry.load_toml_str(s)?;
        Ok(registry)
    }

    /// Read the file at `path` and build a registry from it.
    pub fn from_file(path: &Path) -> MedvalResult<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| {
            MedvalError::config(format!(
                "failed to read custom rule file '{}': {}",
                path.display(),
                e
            ))
        })?;
        Self::from_toml_str(&contents)
    }

    fn read(&self) -> RwLockReadGuard<'_, BTreeMap<String, CompiledCustomRule>> {
        self.rules.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, BTreeMap<String, CompiledCustomRule>> {
        self.rules.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Compile and insert a new rule.
    ///
    /// Fails with `ConfigError` on an invalid pattern or an existing name.
    pub fn register(&self, definition: CustomRuleDefinition) -> MedvalResult<()> {
        let compiled = CompiledCustomRule::compile(definition).inspect_err(|e| {
            warn!(error = %e, "custom rule rejected");
        })?;
        let name = compiled.definition().name.clone();
        let mut rules = self.write();
        if rules.contains_key(&name) {
            warn!(rule = %name, "custom rule already registered");
            return Err(MedvalError::config(format!(
                "custom rule '{name}' is already registered; use replace to overwrite it"
            )));
        }
        rules.insert(name.clone(), compiled);
        info!(rule = %name, total = rules.len(), "custom rule registered");
        Ok(())
    }

    /// Compile and insert, overwriting any rule of the same name.
    ///
    /// Returns the definition that was replaced, if any.
    pub fn replace(&self, definition: CustomRuleDefinition) -> MedvalResult<Option<CustomRuleDefinition>> {
        let compiled = CompiledCustomRule::compile(definition)?;
        let name = compiled.definition().name.clone();
        let previous = self.write().insert(name.clone(), compiled);
        debug!(rule = %name, replaced = previous.is_some(), "custom rule replaced");
        Ok(previous.map(|p| p.definition().clone()))
    }

    /// Remove a rule. Returns whether it existed; removing an absent name is not an error.
    pub fn remove(&self, name: &str) -> bool {
        let removed = self.write().remove(name).is_some();
        if removed {
            info!(rule = %name, "custom rule removed");
        }
        removed
    }

    pub fn get(&self, name: &str) -> Option<CustomRuleDefinition> {
        self.read().get(name).map(|r| r.definition().clone())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.read().contains_key(name)
    }

    /// All definitions, ordered by name.
    pub fn list(&self) -> Vec<CustomRuleDefinition> {
        self.read().values().map(|r| r.definition().clone()).collect()
    }

    pub fn len(&self) -> usize {
        self.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.read().is_empty()
    }

    /// Run every rule, in name order, against every column its field pattern selects.
    pub fn evaluate_all(&self, dataset: &Dataset) -> Vec<Issue> {
        let rules = self.read();
        let mut issues = Vec::new();
        for (name, rule) in rules.iter() {
            let found = rule.evaluate(dataset);
            debug!(rule = %name, issue_count = found.len(), "custom rule evaluated");
            issues.extend(found);
        }
        issues
    }

    /// Register a rule from a JSON mapping
    /// `{name, pattern, severity, field_pattern, description, recommendation}`.
    ///
    /// The mapping is validated against a JSON Schema first so callers get
    /// every structural problem in one message.
    pub fn register_json(&self, mapping: &Value) -> MedvalResult<()> {
        let validator = jsonschema::validator_for(&CUSTOM_RULE_SCHEMA).map_err(|e| {
            MedvalError::config(format!("invalid custom rule schema document: {e}"))
        })?;
        let problems: Vec<String> = validator
            .iter_errors(mapping)
            .map(|error| format!("at '{}': {}", error.instance_path, error))
            .collect();
        if !problems.is_empty() {
            return Err(MedvalError::config(format!(
                "invalid custom rule mapping: {}",
                problems.join("; ")
            )));
        }
        let entry: CustomRuleEntry = serde_json::from_value(mapping.clone())
            .map_err(|e| MedvalError::config(format!("invalid custom rule mapping: {e}")))?;
        self.register(entry.into())
    }

    /// Register every `[[rules]]` entry of a TOML document.
    ///
    /// All or nothing: every entry is compiled and checked for name clashes
    /// before any is inserted, so a failed load leaves the registry as it
    /// was. Returns the number of rules registered.
    pub fn load_toml_str(&self, s: &str) -> MedvalResult<usize> {
        let file: CustomRuleFile = toml::from_str(s).map_err(|e| {
            MedvalError::config(format!("failed to parse custom rule TOML: {}", e))
        })?;

        let mut staged = BTreeMap::new();
        for entry in file.rules {
            let compiled = CompiledCustomRule::compile(entry.into())?;
            let name = compiled.definition().name.clone();
            if staged.contains_key(&name) {
                return Err(MedvalError::config(format!(
                    "custom rule '{name}' appears more than once in the rule file"
                )));
            }
            staged.insert(name, compiled);
        }

        let mut rules = self.write();
        if let Some(name) = staged.keys().find(|name| rules.contains_key(*name)) {
            warn!(rule = %name, "custom rule already registered");
            return Err(MedvalError::config(format!(
                "custom rule '{name}' is already registered; use replace to overwrite it"
            )));
        }
        let count = staged.len();
        rules.extend(staged);
        info!(loaded = count, total = rules.len(), "custom rule file loaded");
        Ok(count)
    }

    /// The registry's content as the mapping API callers exchange.
    pub fn to_json_value(&self) -> Value {
        Value::Array(
            self.list()
                .into_iter()
                .map(|d| {
                    json!({
                        "name": d.name,
                        "pattern": d.pattern,
                        "severity": d.severity.as_str(),
                        "field_pattern": d.field_pattern,
                        "description": d.description,
                        "recommendation": d.recommendation,
                    })
                })
                .collect(),
        )
    }
}

/// A `Rule` that evaluates every rule of a shared registry.
///
/// The registry is read at evaluation time, so rules registered or removed
/// after the validator was built take effect on the next `validate` call.
#[derive(Debug, Clone)]
pub struct CustomRuleSet {
    registry: Arc<CustomRuleRegistry>,
}

impl CustomRuleSet {
    pub fn new(registry: Arc<CustomRuleRegistry>) -> Self {
        Self { registry }
    }

    pub fn registry(&self) -> &Arc<CustomRuleRegistry> {
        &self.registry
    }
}

impl Rule for CustomRuleSet {
    fn name(&self) -> &str {
        CUSTOM_RULE_SET_NAME
    }

    fn evaluate(&self, dataset: &Dataset) -> MedvalResult<Vec<Issue>> {
        Ok(self.registry.evaluate_all(dataset))
    }
}
