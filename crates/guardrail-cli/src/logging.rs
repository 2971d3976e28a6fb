//! Tracing subscriber setup

use guardrail_config::Settings;
use tracing::Level;

use crate::error::{CliError, CliResult};

/// Pick the log level: an explicit flag wins, otherwise the configuration
/// decides, and `enable_logging: false` turns logging off.
pub fn resolve_level(flag: Option<&str>, settings: &Settings) -> CliResult<Option<Level>> {
    let raw = match flag {
        Some(level) => level,
        None if settings.enable_logging => settings.log_level.as_str(),
        None => return Ok(None),
    };
    raw.parse::<Level>()
        .map(Some)
        .map_err(|_| CliError::invalid_argument(format!("unknown log level '{}'", raw)))
}

/// Install the global fmt subscriber, writing to stderr.
///
/// A subscriber that is already installed is left in place.
pub fn init_logging(level: Option<Level>) {
    let Some(level) = level else {
        return;
    };
    if tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .try_init()
        .is_err()
    {
        tracing::debug!("Log subscriber already installed");
    }
}
