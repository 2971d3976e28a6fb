//! Error types for the sessions crate

use guardrail_safety::SafetyError;
use thiserror::Error;

/// Errors that can occur when constructing a conversation store
#[derive(Error, Debug)]
pub enum SessionError {
    /// Store limits are out of range
    #[error("Invalid store configuration: {0}")]
    InvalidConfig(String),

    /// The shared engine could not be built
    #[error("Safety engine error: {0}")]
    Safety(#[from] SafetyError),
}

/// Result type for session operations
pub type SessionResult<T> = Result<T, SessionError>;
