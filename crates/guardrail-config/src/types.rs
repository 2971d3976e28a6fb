//! Core configuration types and data structures

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, Result};

/// Keywords the reference content-safety rule looks for
pub const DEFAULT_HARMFUL_KEYWORDS: [&str; 4] = ["harmful", "dangerous", "illegal", "inappropriate"];

/// Default maximum content length in characters
pub const DEFAULT_MAX_CONTENT_LENGTH: usize = 10_000;

/// Default minimum score for a verdict to count as safe
pub const DEFAULT_SAFETY_THRESHOLD: f64 = 0.8;

/// Default per-rule threshold when a rule entry omits it
pub const DEFAULT_RULE_THRESHOLD: f64 = 0.8;

const LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

/// Top-level guardrails configuration document
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct GuardrailsConfig {
    /// Document version
    pub version: String,
    /// Human-readable configuration name
    pub name: String,
    /// Free-form description
    pub description: String,
    /// Global engine settings
    pub settings: Settings,
    /// Ordered rule entries; a document without rules has none
    #[serde(default)]
    pub rules: Vec<RuleConfig>,
}

/// Global engine settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Settings {
    /// Outputs longer than this many characters fail validation
    pub max_content_length: usize,
    /// Minimum score for a verdict to count as safe
    pub safety_threshold: f64,
    /// Whether hosts should install a log subscriber
    pub enable_logging: bool,
    /// Log level name (trace, debug, info, warn, error)
    pub log_level: String,
}

/// A single rule entry as written in a configuration file
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RuleConfig {
    /// Unique rule name
    pub name: String,
    /// Rule description
    #[serde(default)]
    pub description: String,
    /// Whether the rule participates in evaluation
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    /// Rule-specific severity cutoff
    #[serde(default = "default_rule_threshold")]
    pub threshold: f64,
    /// RFC 3339 creation time, written on save
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
    /// RFC 3339 update time, written on save
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<String>,
    /// Open parameter bag interpreted by the rule's matcher
    #[serde(default)]
    pub parameters: serde_json::Map<String, serde_json::Value>,
}

fn default_enabled() -> bool {
    true
}

fn default_rule_threshold() -> f64 {
    DEFAULT_RULE_THRESHOLD
}

impl RuleConfig {
    /// Create an enabled rule entry with no parameters
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            enabled: true,
            threshold: DEFAULT_RULE_THRESHOLD,
            created_at: None,
            updated_at: None,
            parameters: serde_json::Map::new(),
        }
    }

    /// Set the threshold
    pub fn with_threshold(mut self, threshold: f64) -> Self {
        self.threshold = threshold;
        self
    }

    /// Insert a parameter
    pub fn with_parameter(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.parameters.insert(key.into(), value);
        self
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            max_content_length: DEFAULT_MAX_CONTENT_LENGTH,
            safety_threshold: DEFAULT_SAFETY_THRESHOLD,
            enable_logging: true,
            log_level: "INFO".to_string(),
        }
    }
}

impl Default for GuardrailsConfig {
    fn default() -> Self {
        Self {
            version: "1.0".to_string(),
            name: "Guardrails".to_string(),
            description: "Default configuration for AI safety guardrails".to_string(),
            settings: Settings::default(),
            rules: vec![
                RuleConfig::new("content_safety", "Basic content safety check")
                    .with_threshold(0.8)
                    .with_parameter(
                        "harmful_keywords",
                        serde_json::json!(DEFAULT_HARMFUL_KEYWORDS),
                    ),
                RuleConfig::new("length_check", "Check content length")
                    .with_threshold(0.9)
                    .with_parameter(
                        "max_length",
                        serde_json::json!(DEFAULT_MAX_CONTENT_LENGTH),
                    ),
            ],
        }
    }
}

impl GuardrailsConfig {
    /// Check the document for semantic problems parsing cannot catch
    pub fn validate(&self) -> Result<()> {
        let settings = &self.settings;
        if settings.max_content_length == 0 {
            return Err(ConfigError::Validation(
                "settings.max_content_length must be greater than 0".to_string(),
            ));
        }
        if !(0.0..=1.0).contains(&settings.safety_threshold) {
            return Err(ConfigError::Validation(format!(
                "settings.safety_threshold must be within 0.0..=1.0, got {}",
                settings.safety_threshold
            )));
        }
        if !LOG_LEVELS.contains(&settings.log_level.to_ascii_lowercase().as_str()) {
            return Err(ConfigError::Validation(format!(
                "settings.log_level '{}' is not one of {}",
                settings.log_level,
                LOG_LEVELS.join(", ")
            )));
        }

        let mut seen = HashSet::new();
        for rule in &self.rules {
            if rule.name.trim().is_empty() {
                return Err(ConfigError::Validation(
                    "rule name must not be empty".to_string(),
                ));
            }
            if !seen.insert(rule.name.as_str()) {
                return Err(ConfigError::Validation(format!(
                    "duplicate rule name '{}'",
                    rule.name
                )));
            }
            if !(0.0..=1.0).contains(&rule.threshold) {
                return Err(ConfigError::Validation(format!(
                    "rule '{}' threshold must be within 0.0..=1.0, got {}",
                    rule.name, rule.threshold
                )));
            }
        }

        Ok(())
    }

    /// Look up a rule entry by name
    pub fn rule(&self, name: &str) -> Option<&RuleConfig> {
        self.rules.iter().find(|r| r.name == name)
    }
}
