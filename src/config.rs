//! Resolved configuration consumed by the engine
//!
//! Discovery, inheritance and presets belong to the caller. This module only
//! holds the final answer (which rules run, at which severity, with how many
//! workers) and can parse it from a YAML or JSON string.

use crate::catalog::Catalog;
use crate::diagnostic::Severity;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use thiserror::Error;

/// Configuration error
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("YAML parse error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Engine settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Enable parallel processing
    pub parallel: bool,

    /// Number of parallel jobs (0 = auto-detect)
    pub jobs: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            parallel: true,
            jobs: 0,
        }
    }
}

/// The configuration the engine runs with
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResolvedConfig {
    /// Rule ids that run
    pub enabled_rules: BTreeSet<String>,

    /// Severity overrides (rule_id -> severity)
    pub severity_overrides: BTreeMap<String, Severity>,

    /// Engine settings
    pub engine: EngineConfig,
}

impl Default for ResolvedConfig {
    fn default() -> Self {
        Self::recommended(&Catalog::shared())
    }
}

impl ResolvedConfig {
    /// Every rule the catalog enables by default
    pub fn recommended(catalog: &Catalog) -> Self {
        Self {
            enabled_rules: catalog
                .rules()
                .iter()
                .filter(|r| r.enabled)
                .map(|r| r.id.clone())
                .collect(),
            severity_overrides: BTreeMap::new(),
            engine: EngineConfig::default(),
        }
    }

    /// Every rule in the catalog, including opt-in ones
    pub fn all(catalog: &Catalog) -> Self {
        Self {
            enabled_rules: catalog.ids().map(String::from).collect(),
            ..Self::recommended(catalog)
        }
    }

    /// Only the listed rules
    pub fn only(rule_ids: &[&str]) -> Self {
        Self {
            enabled_rules: rule_ids.iter().map(|id| id.to_string()).collect(),
            severity_overrides: BTreeMap::new(),
            engine: EngineConfig::default(),
        }
    }

    pub fn enable(mut self, rule_id: &str) -> Self {
        self.enabled_rules.insert(rule_id.to_string());
        self
    }

    pub fn disable(mut self, rule_id: &str) -> Self {
        self.enabled_rules.remove(rule_id);
        self
    }

    pub fn with_severity(mut self, rule_id: &str, severity: Severity) -> Self {
        self.severity_overrides
            .insert(rule_id.to_string(), severity);
        self
    }

    pub fn with_engine(mut self, engine: EngineConfig) -> Self {
        self.engine = engine;
        self
    }

    /// Check if a rule is enabled
    pub fn is_rule_enabled(&self, rule_id: &str) -> bool {
        self.enabled_rules.contains(rule_id)
    }

    /// Get severity override for a rule
    pub fn get_severity_override(&self, rule_id: &str) -> Option<Severity> {
        self.severity_overrides.get(rule_id).copied()
    }

    /// Parse from YAML
    pub fn from_yaml_str(content: &str) -> Result<Self, ConfigError> {
        Ok(serde_yaml::from_str(content)?)
    }

    /// Parse from JSON
    pub fn from_json_str(content: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(content)?)
    }

    /// Reject rule ids the catalog does not know
    pub fn validate(&self, catalog: &Catalog) -> Result<(), ConfigError> {
        let unknown: Vec<&str> = self
            .enabled_rules
            .iter()
            .chain(self.severity_overrides.keys())
            .filter(|id| catalog.get(id).is_none())
            .map(String::as_str)
            .collect();

        if unknown.is_empty() {
            Ok(())
        } else {
            Err(ConfigError::Invalid(format!(
                "unknown rule id(s): {}",
                unknown.join(", ")
            )))
        }
    }
}
