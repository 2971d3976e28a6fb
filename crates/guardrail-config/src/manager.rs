//! Configuration manager implementation

use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::{
    error::{ConfigError, Result},
    format::ConfigFormat,
    types::{GuardrailsConfig, RuleConfig},
};

/// Whether the manager has produced its document yet
#[derive(Debug, Clone)]
enum LoadState {
    Unloaded,
    Loaded(GuardrailsConfig),
}

/// Configuration manager
///
/// Loading happens at most once per instance: the first `load_config` reads
/// and validates the document, later calls return the loaded copy. Use
/// [`ConfigManager::reload`] to read the file again.
#[derive(Debug, Clone)]
pub struct ConfigManager {
    /// Configuration file path; `None` selects the built-in defaults
    config_path: Option<PathBuf>,
    state: LoadState,
}

impl ConfigManager {
    /// Create a manager that serves the built-in default configuration
    pub fn new() -> Self {
        Self {
            config_path: None,
            state: LoadState::Unloaded,
        }
    }

    /// Create with custom config path
    pub fn with_path(path: impl Into<PathBuf>) -> Self {
        Self {
            config_path: Some(path.into()),
            state: LoadState::Unloaded,
        }
    }

    /// Create a manager that is already loaded with the given document
    pub fn from_config(config: GuardrailsConfig) -> Self {
        Self {
            config_path: None,
            state: LoadState::Loaded(config),
        }
    }

    /// The configured path, if any
    pub fn config_path(&self) -> Option<&Path> {
        self.config_path.as_deref()
    }

    /// Whether a document has been loaded
    pub fn is_loaded(&self) -> bool {
        matches!(self.state, LoadState::Loaded(_))
    }

    /// The loaded document, if any
    pub fn config(&self) -> Option<&GuardrailsConfig> {
        match &self.state {
            LoadState::Loaded(config) => Some(config),
            LoadState::Unloaded => None,
        }
    }

    /// Load the configuration, reading the file only on first call
    pub fn load_config(&mut self) -> Result<&GuardrailsConfig> {
        if !self.is_loaded() {
            let config = match &self.config_path {
                Some(path) => read_config_file(path)?,
                None => {
                    debug!("No configuration path given, using built-in defaults");
                    GuardrailsConfig::default()
                }
            };
            self.state = LoadState::Loaded(config);
        }
        self.loaded()
    }

    /// Load the configuration with the file read on the tokio runtime
    pub async fn load_config_async(&mut self) -> Result<&GuardrailsConfig> {
        if !self.is_loaded() {
            let config = match &self.config_path {
                Some(path) => {
                    let format = check_path(path)?;
                    let raw = tokio::fs::read_to_string(path).await?;
                    parse_document(path, format, &raw)?
                }
                None => GuardrailsConfig::default(),
            };
            self.state = LoadState::Loaded(config);
        }
        self.loaded()
    }

    /// Discard the loaded document and read it again
    pub fn reload(&mut self) -> Result<&GuardrailsConfig> {
        self.state = LoadState::Unloaded;
        self.load_config()
    }

    /// Replace the rule entries of the loaded document
    pub fn update_rules(&mut self, rules: Vec<RuleConfig>) -> Result<()> {
        self.load_config()?;
        if let LoadState::Loaded(config) = &mut self.state {
            config.rules = rules;
        }
        Ok(())
    }

    /// Save the document to `path`, or to the configured path when `None`
    pub fn save_config(&mut self, path: Option<&Path>) -> Result<()> {
        let target = path
            .map(Path::to_path_buf)
            .or_else(|| self.config_path.clone())
            .ok_or(ConfigError::NoPath)?;
        let format = ConfigFormat::from_path(&target)?;

        let config = self.load_config()?;
        config.validate()?;
        let rendered = format.render(config)?;

        if let Some(parent) = target.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&target, rendered)?;

        info!(
            "Configuration saved to {:?} ({} rules)",
            target,
            config.rules.len()
        );
        Ok(())
    }

    fn loaded(&self) -> Result<&GuardrailsConfig> {
        self.config()
            .ok_or_else(|| ConfigError::Validation("configuration not loaded".to_string()))
    }
}

impl Default for ConfigManager {
    fn default() -> Self {
        Self::new()
    }
}

/// Read, parse and validate a configuration file
pub fn read_config_file(path: &Path) -> Result<GuardrailsConfig> {
    let format = check_path(path)?;
    let raw = std::fs::read_to_string(path)?;
    parse_document(path, format, &raw)
}

fn check_path(path: &Path) -> Result<ConfigFormat> {
    if !path.exists() {
        return Err(ConfigError::NotFound(path.display().to_string()));
    }
    ConfigFormat::from_path(path)
}

fn parse_document(path: &Path, format: ConfigFormat, raw: &str) -> Result<GuardrailsConfig> {
    let config = format.parse(raw)?;
    config.validate()?;
    info!(
        "Loaded configuration '{}' from {:?} ({} rules)",
        config.name,
        path,
        config.rules.len()
    );
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_manager_serves_defaults() {
        let mut manager = ConfigManager::new();
        assert!(!manager.is_loaded());
        let config = manager.load_config().unwrap();
        assert_eq!(config.rules.len(), 2);
        assert!(manager.is_loaded());
    }

    #[test]
    fn test_missing_file_is_not_found() {
        let mut manager = ConfigManager::with_path("/definitely/not/here.yaml");
        let err = manager.load_config().unwrap_err();
        assert!(matches!(err, ConfigError::NotFound(_)));
        assert!(!manager.is_loaded());
    }

    #[test]
    fn test_save_without_path_fails() {
        let mut manager = ConfigManager::new();
        assert!(matches!(
            manager.save_config(None),
            Err(ConfigError::NoPath)
        ));
    }

    #[test]
    fn test_update_rules_replaces_entries() {
        let mut manager = ConfigManager::new();
        manager
            .update_rules(vec![RuleConfig::new("only", "the only rule")])
            .unwrap();
        let config = manager.config().unwrap();
        assert_eq!(config.rules.len(), 1);
        assert_eq!(config.rules[0].name, "only");
    }
}
