use guardrail_config::ConfigError;
use guardrail_safety::SafetyError;
use guardrail_sessions::SessionError;
use thiserror::Error;

/// CLI-specific errors
#[derive(Error, Debug)]
pub enum CliError {
    #[error("Invalid argument: {message}")]
    InvalidArgument { message: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Engine error: {0}")]
    Safety(#[from] SafetyError),

    #[error("Session error: {0}")]
    Session(#[from] SessionError),

    #[error("Transcript error: {0}")]
    Transcript(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl CliError {
    pub fn invalid_argument(message: impl Into<String>) -> Self {
        CliError::InvalidArgument {
            message: message.into(),
        }
    }

    /// Get a user-friendly error message with suggestions
    pub fn user_message(&self) -> String {
        match self {
            CliError::InvalidArgument { message } => {
                format!("Invalid argument: {}\n\nRun 'guardrail --help' for usage information.", message)
            }
            CliError::Io(e) => format!("File operation failed: {}", e),
            CliError::Config(e) => {
                format!("Configuration error: {}\n\nRun 'guardrail init <path>' to write a valid starting configuration.", e)
            }
            CliError::Safety(e) => format!("Could not build the rule set: {}", e),
            CliError::Session(e) => format!("Session store error: {}", e),
            CliError::Transcript(msg) => {
                format!("Transcript error: {}\n\nExpected a JSON array of {{\"user_id\", \"content\"}} objects.", msg)
            }
            CliError::Internal(msg) => format!("Internal error: {}", msg),
        }
    }
}

pub type CliResult<T> = Result<T, CliError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_messages_point_at_help() {
        let err = CliError::invalid_argument("no input");
        assert!(err.user_message().contains("guardrail --help"));

        let err = CliError::from(ConfigError::NoPath);
        assert!(err.user_message().starts_with("Configuration error"));
    }
}
