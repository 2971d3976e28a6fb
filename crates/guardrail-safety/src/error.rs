//! Error types for the safety crate

use guardrail_config::ConfigError;
use thiserror::Error;

/// Result type for safety operations
pub type Result<T> = std::result::Result<T, SafetyError>;

/// Errors raised while building rules or engines.
///
/// Evaluation itself never fails; these only surface from construction and
/// configuration paths.
#[derive(Error, Debug)]
pub enum SafetyError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Invalid rule '{rule}': {message}")]
    InvalidRule { rule: String, message: String },

    #[error("Unknown severity '{0}' (expected low, medium, high or critical)")]
    UnknownSeverity(String),
}

impl SafetyError {
    pub(crate) fn invalid_rule(rule: &str, message: impl Into<String>) -> Self {
        SafetyError::InvalidRule {
            rule: rule.to_string(),
            message: message.into(),
        }
    }
}
