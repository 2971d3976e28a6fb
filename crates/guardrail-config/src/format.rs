//! Configuration file formats

use std::path::Path;

use crate::{
    error::{ConfigError, Result},
    types::GuardrailsConfig,
};

/// Serialization format of a configuration file, chosen by extension
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigFormat {
    Yaml,
    Json,
    Toml,
}

impl ConfigFormat {
    /// Infer the format from a file extension (case-insensitive)
    pub fn from_path(path: &Path) -> Result<Self> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase())
            .unwrap_or_default();

        match ext.as_str() {
            "yaml" | "yml" => Ok(ConfigFormat::Yaml),
            "json" => Ok(ConfigFormat::Json),
            "toml" => Ok(ConfigFormat::Toml),
            "" => Err(ConfigError::UnsupportedFormat(
                "<no extension>".to_string(),
            )),
            other => Err(ConfigError::UnsupportedFormat(format!(".{}", other))),
        }
    }

    /// Parse a document in this format
    pub fn parse(self, raw: &str) -> Result<GuardrailsConfig> {
        let config = match self {
            ConfigFormat::Yaml => serde_yaml::from_str(raw)?,
            ConfigFormat::Json => serde_json::from_str(raw)?,
            ConfigFormat::Toml => toml::from_str(raw)?,
        };
        Ok(config)
    }

    /// Render a document in this format
    pub fn render(self, config: &GuardrailsConfig) -> Result<String> {
        let rendered = match self {
            ConfigFormat::Yaml => serde_yaml::to_string(config)?,
            ConfigFormat::Json => serde_json::to_string_pretty(config)?,
            ConfigFormat::Toml => toml::to_string_pretty(config)?,
        };
        Ok(rendered)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_format_from_extension() {
        assert_eq!(
            ConfigFormat::from_path(&PathBuf::from("rules.YML")).unwrap(),
            ConfigFormat::Yaml
        );
        assert_eq!(
            ConfigFormat::from_path(&PathBuf::from("rules.json")).unwrap(),
            ConfigFormat::Json
        );
        assert_eq!(
            ConfigFormat::from_path(&PathBuf::from("rules.toml")).unwrap(),
            ConfigFormat::Toml
        );
    }

    #[test]
    fn test_unsupported_extension() {
        let err = ConfigFormat::from_path(&PathBuf::from("rules.ini")).unwrap_err();
        assert!(matches!(err, ConfigError::UnsupportedFormat(ref ext) if ext == ".ini"));
        assert!(ConfigFormat::from_path(&PathBuf::from("rules")).is_err());
    }

    #[test]
    fn test_yaml_document_parses() {
        let raw = r#"
version: "2.0"
name: custom
settings:
  safety_threshold: 0.9
rules:
  - name: profanity
    description: Blocks profanity
    parameters:
      harmful_keywords: [darn, heck]
  - name: disabled_rule
    description: Off
    enabled: false
"#;
        let config = ConfigFormat::Yaml.parse(raw).unwrap();
        assert_eq!(config.version, "2.0");
        assert_eq!(config.settings.safety_threshold, 0.9);
        assert_eq!(config.settings.max_content_length, 10_000);
        assert_eq!(config.rules.len(), 2);
        assert!(!config.rules[1].enabled);
        assert_eq!(config.rules[1].threshold, 0.8);
    }

    #[test]
    fn test_malformed_json_is_parse_error() {
        let err = ConfigFormat::Json.parse("{ not json").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }
}
