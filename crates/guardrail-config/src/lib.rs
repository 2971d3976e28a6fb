//! Guardrail Configuration Management
//!
//! This crate loads, validates and saves the configuration document that
//! drives the Guardrail content-safety engine: global settings plus the
//! ordered list of rule entries.
//!
//! Supported formats are chosen by file extension: `.yaml`/`.yml`, `.json`
//! and `.toml`. When no path is supplied the built-in default document is
//! used.

pub mod error;
pub mod format;
pub mod manager;
pub mod types;

pub use error::{ConfigError, Result};
pub use format::ConfigFormat;
pub use manager::ConfigManager;
pub use types::{GuardrailsConfig, RuleConfig, Settings};
