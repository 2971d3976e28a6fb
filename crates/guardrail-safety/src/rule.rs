//! Rule definitions and conversion from configuration entries

use chrono::{DateTime, Utc};
use guardrail_config::{
    types::{DEFAULT_HARMFUL_KEYWORDS, DEFAULT_MAX_CONTENT_LENGTH},
    GuardrailsConfig, RuleConfig,
};
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

use crate::{
    error::{Result, SafetyError},
    models::Severity,
};

/// Default severity for keyword and pattern rules
pub const DEFAULT_MATCH_SEVERITY: Severity = Severity::Medium;
/// Default confidence for keyword and pattern rules
pub const DEFAULT_MATCH_CONFIDENCE: f64 = 0.7;
/// Default severity for length rules
pub const DEFAULT_LENGTH_SEVERITY: Severity = Severity::Low;
/// Default confidence for length rules
pub const DEFAULT_LENGTH_CONFIDENCE: f64 = 1.0;

/// A named regular expression
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NamedPattern {
    pub name: String,
    pub pattern: String,
}

/// What a rule looks for, with its typed parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RuleKind {
    /// Case-insensitive substring match; the first listed keyword found wins
    Keywords {
        keywords: Vec<String>,
        severity: Severity,
        confidence: f64,
    },
    /// Regular expressions; the first listed pattern found wins
    Patterns {
        patterns: Vec<NamedPattern>,
        severity: Severity,
        confidence: f64,
    },
    /// Content longer than `max_length` characters
    MaxLength {
        max_length: usize,
        severity: Severity,
        confidence: f64,
    },
    /// Opaque parameters, only evaluated by a matcher registered for the rule
    Custom { parameters: Map<String, Value> },
}

impl RuleKind {
    /// Keyword rule with default severity and confidence
    pub fn keywords<I, S>(keywords: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        RuleKind::Keywords {
            keywords: keywords.into_iter().map(Into::into).collect(),
            severity: DEFAULT_MATCH_SEVERITY,
            confidence: DEFAULT_MATCH_CONFIDENCE,
        }
    }

    /// Keyword rule over the built-in harmful keyword set
    pub fn default_keywords() -> Self {
        Self::keywords(DEFAULT_HARMFUL_KEYWORDS)
    }

    /// Pattern rule with default severity and confidence
    pub fn patterns(patterns: Vec<NamedPattern>) -> Self {
        RuleKind::Patterns {
            patterns,
            severity: DEFAULT_MATCH_SEVERITY,
            confidence: DEFAULT_MATCH_CONFIDENCE,
        }
    }

    /// Length rule with default severity and confidence
    pub fn max_length(max_length: usize) -> Self {
        RuleKind::MaxLength {
            max_length,
            severity: DEFAULT_LENGTH_SEVERITY,
            confidence: DEFAULT_LENGTH_CONFIDENCE,
        }
    }

    /// Interpret a configuration parameter bag.
    ///
    /// Recognised keys, in priority order: `harmful_keywords`/`keywords`,
    /// `patterns`/`pii_patterns`, `max_length`. `severity` and `confidence`
    /// override the defaults. A bag with nothing else selects the built-in
    /// keyword set; unrecognised keys make the rule custom.
    pub fn from_parameters(rule: &str, parameters: &Map<String, Value>) -> Result<Self> {
        let keywords = parameters
            .get("harmful_keywords")
            .or_else(|| parameters.get("keywords"));
        let patterns = parameters
            .get("patterns")
            .or_else(|| parameters.get("pii_patterns"));

        if let Some(value) = keywords {
            let (severity, confidence) =
                scoring_overrides(rule, parameters, DEFAULT_MATCH_SEVERITY, DEFAULT_MATCH_CONFIDENCE)?;
            return Ok(RuleKind::Keywords {
                keywords: string_list(rule, value)?,
                severity,
                confidence,
            });
        }

        if let Some(value) = patterns {
            let (severity, confidence) =
                scoring_overrides(rule, parameters, DEFAULT_MATCH_SEVERITY, DEFAULT_MATCH_CONFIDENCE)?;
            return Ok(RuleKind::Patterns {
                patterns: named_patterns(rule, value)?,
                severity,
                confidence,
            });
        }

        if let Some(value) = parameters.get("max_length") {
            let (severity, confidence) = scoring_overrides(
                rule,
                parameters,
                DEFAULT_LENGTH_SEVERITY,
                DEFAULT_LENGTH_CONFIDENCE,
            )?;
            let max_length = value
                .as_u64()
                .ok_or_else(|| SafetyError::invalid_rule(rule, "max_length must be a non-negative integer"))?;
            return Ok(RuleKind::MaxLength {
                max_length: max_length as usize,
                severity,
                confidence,
            });
        }

        let only_scoring = parameters
            .keys()
            .all(|k| k == "severity" || k == "confidence");
        if only_scoring {
            let (severity, confidence) =
                scoring_overrides(rule, parameters, DEFAULT_MATCH_SEVERITY, DEFAULT_MATCH_CONFIDENCE)?;
            return Ok(RuleKind::Keywords {
                keywords: DEFAULT_HARMFUL_KEYWORDS.iter().map(|k| k.to_string()).collect(),
                severity,
                confidence,
            });
        }

        Ok(RuleKind::Custom {
            parameters: parameters.clone(),
        })
    }

    /// Render back into a configuration parameter bag
    pub fn to_parameters(&self) -> Map<String, Value> {
        let mut map = Map::new();
        match self {
            RuleKind::Keywords {
                keywords,
                severity,
                confidence,
            } => {
                map.insert("harmful_keywords".to_string(), json!(keywords));
                insert_overrides(&mut map, *severity, *confidence, DEFAULT_MATCH_SEVERITY, DEFAULT_MATCH_CONFIDENCE);
            }
            RuleKind::Patterns {
                patterns,
                severity,
                confidence,
            } => {
                let unnamed = patterns.iter().all(|p| p.name == p.pattern);
                let value = if unnamed {
                    json!(patterns.iter().map(|p| p.pattern.as_str()).collect::<Vec<_>>())
                } else {
                    Value::Object(
                        patterns
                            .iter()
                            .map(|p| (p.name.clone(), json!(p.pattern)))
                            .collect(),
                    )
                };
                map.insert("patterns".to_string(), value);
                insert_overrides(&mut map, *severity, *confidence, DEFAULT_MATCH_SEVERITY, DEFAULT_MATCH_CONFIDENCE);
            }
            RuleKind::MaxLength {
                max_length,
                severity,
                confidence,
            } => {
                map.insert("max_length".to_string(), json!(max_length));
                insert_overrides(&mut map, *severity, *confidence, DEFAULT_LENGTH_SEVERITY, DEFAULT_LENGTH_CONFIDENCE);
            }
            RuleKind::Custom { parameters } => map = parameters.clone(),
        }
        map
    }

    fn validate(&self, rule: &str) -> Result<()> {
        let confidence = match self {
            RuleKind::Keywords { keywords, confidence, .. } => {
                if keywords.iter().any(|k| k.is_empty()) {
                    return Err(SafetyError::invalid_rule(rule, "keywords must not be empty strings"));
                }
                *confidence
            }
            RuleKind::Patterns { patterns, confidence, .. } => {
                for p in patterns {
                    Regex::new(&p.pattern).map_err(|e| {
                        SafetyError::invalid_rule(rule, format!("pattern '{}': {}", p.name, e))
                    })?;
                }
                *confidence
            }
            RuleKind::MaxLength { confidence, .. } => *confidence,
            RuleKind::Custom { .. } => return Ok(()),
        };
        check_unit_range(rule, "confidence", confidence)
    }
}

/// A named, configurable check contributing to a safety verdict
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Rule {
    /// Unique key within a rule store
    pub name: String,
    pub description: String,
    /// Disabled rules are skipped by the evaluator
    pub enabled: bool,
    /// Rule-specific cutoff in 0.0..=1.0, available to custom matchers
    pub threshold: f64,
    pub kind: RuleKind,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Rule {
    /// Create an enabled rule with the default threshold
    pub fn new(name: impl Into<String>, description: impl Into<String>, kind: RuleKind) -> Self {
        let now = Utc::now();
        Self {
            name: name.into(),
            description: description.into(),
            enabled: true,
            threshold: guardrail_config::types::DEFAULT_RULE_THRESHOLD,
            kind,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn with_enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    pub fn with_threshold(mut self, threshold: f64) -> Self {
        self.threshold = threshold;
        self
    }

    /// Check threshold and confidence ranges and compile any patterns
    pub fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            return Err(SafetyError::invalid_rule(&self.name, "name must not be empty"));
        }
        check_unit_range(&self.name, "threshold", self.threshold)?;
        self.kind.validate(&self.name)
    }

    /// Build a rule from a configuration entry
    pub fn from_config(config: &RuleConfig) -> Result<Self> {
        let kind = RuleKind::from_parameters(&config.name, &config.parameters)?;
        let now = Utc::now();
        let rule = Self {
            name: config.name.clone(),
            description: config.description.clone(),
            enabled: config.enabled,
            threshold: config.threshold,
            kind,
            created_at: parse_timestamp(config.created_at.as_deref()).unwrap_or(now),
            updated_at: parse_timestamp(config.updated_at.as_deref()).unwrap_or(now),
        };
        rule.validate()?;
        Ok(rule)
    }

    /// Render as a configuration entry, timestamps included
    pub fn to_config(&self) -> RuleConfig {
        RuleConfig {
            name: self.name.clone(),
            description: self.description.clone(),
            enabled: self.enabled,
            threshold: self.threshold,
            created_at: Some(self.created_at.to_rfc3339()),
            updated_at: Some(self.updated_at.to_rfc3339()),
            parameters: self.kind.to_parameters(),
        }
    }

    /// Parameters as a JSON value, for violation evidence
    pub fn parameters(&self) -> Value {
        Value::Object(self.kind.to_parameters())
    }

    /// The two baseline rules: `content_safety` and `length_check`
    pub fn default_rules() -> Vec<Rule> {
        vec![
            Rule::new(
                "content_safety",
                "Basic content safety check",
                RuleKind::default_keywords(),
            )
            .with_threshold(0.8),
            Rule::new(
                "length_check",
                "Check content length",
                RuleKind::max_length(DEFAULT_MAX_CONTENT_LENGTH),
            )
            .with_threshold(0.9),
        ]
    }
}

/// Convert every rule entry of a configuration document
pub fn rules_from_config(config: &GuardrailsConfig) -> Result<Vec<Rule>> {
    config.rules.iter().map(Rule::from_config).collect()
}

fn parse_timestamp(raw: Option<&str>) -> Option<DateTime<Utc>> {
    raw.and_then(|s| DateTime::parse_from_rfc3339(s).ok())
        .map(|t| t.with_timezone(&Utc))
}

fn check_unit_range(rule: &str, field: &str, value: f64) -> Result<()> {
    if (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(SafetyError::invalid_rule(
            rule,
            format!("{} must be within 0.0..=1.0, got {}", field, value),
        ))
    }
}

fn scoring_overrides(
    rule: &str,
    parameters: &Map<String, Value>,
    default_severity: Severity,
    default_confidence: f64,
) -> Result<(Severity, f64)> {
    let severity = match parameters.get("severity") {
        Some(Value::String(s)) => s.parse()?,
        Some(_) => return Err(SafetyError::invalid_rule(rule, "severity must be a string")),
        None => default_severity,
    };
    let confidence = match parameters.get("confidence") {
        Some(v) => v
            .as_f64()
            .ok_or_else(|| SafetyError::invalid_rule(rule, "confidence must be a number"))?,
        None => default_confidence,
    };
    Ok((severity, confidence))
}

fn insert_overrides(
    map: &mut Map<String, Value>,
    severity: Severity,
    confidence: f64,
    default_severity: Severity,
    default_confidence: f64,
) {
    if severity != default_severity {
        map.insert("severity".to_string(), json!(severity));
    }
    if confidence != default_confidence {
        map.insert("confidence".to_string(), json!(confidence));
    }
}

fn string_list(rule: &str, value: &Value) -> Result<Vec<String>> {
    let items = value
        .as_array()
        .ok_or_else(|| SafetyError::invalid_rule(rule, "keyword list must be an array"))?;
    items
        .iter()
        .map(|item| {
            item.as_str()
                .map(str::to_string)
                .ok_or_else(|| SafetyError::invalid_rule(rule, "keywords must be strings"))
        })
        .collect()
}

fn named_patterns(rule: &str, value: &Value) -> Result<Vec<NamedPattern>> {
    match value {
        Value::Array(_) => Ok(string_list(rule, value)?
            .into_iter()
            .map(|p| NamedPattern {
                name: p.clone(),
                pattern: p,
            })
            .collect()),
        Value::Object(entries) => entries
            .iter()
            .map(|(name, pattern)| {
                pattern
                    .as_str()
                    .map(|p| NamedPattern {
                        name: name.clone(),
                        pattern: p.to_string(),
                    })
                    .ok_or_else(|| SafetyError::invalid_rule(rule, "patterns must be strings"))
            })
            .collect(),
        _ => Err(SafetyError::invalid_rule(
            rule,
            "patterns must be a list or a name-to-pattern map",
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_maps_to_default_rules() {
        let from_config = rules_from_config(&GuardrailsConfig::default()).unwrap();
        let defaults = Rule::default_rules();
        assert_eq!(from_config.len(), defaults.len());
        for (a, b) in from_config.iter().zip(defaults.iter()) {
            assert_eq!(a.name, b.name);
            assert_eq!(a.kind, b.kind);
            assert_eq!(a.threshold, b.threshold);
        }
    }

    #[test]
    fn test_empty_parameters_select_builtin_keywords() {
        let kind = RuleKind::from_parameters("r", &Map::new()).unwrap();
        assert_eq!(kind, RuleKind::default_keywords());
    }

    #[test]
    fn test_pattern_map_and_overrides() {
        let params = json!({
            "pii_patterns": {"ssn": r"\b\d{3}-\d{2}-\d{4}\b"},
            "severity": "high",
            "confidence": 0.9
        });
        let kind = RuleKind::from_parameters("pii", params.as_object().unwrap()).unwrap();
        match kind {
            RuleKind::Patterns { patterns, severity, confidence } => {
                assert_eq!(patterns[0].name, "ssn");
                assert_eq!(severity, Severity::High);
                assert_eq!(confidence, 0.9);
            }
            other => panic!("unexpected kind {:?}", other),
        }
    }

    #[test]
    fn test_unknown_severity_is_rejected() {
        let params = json!({"keywords": ["x"], "severity": "severe"});
        let err = RuleKind::from_parameters("r", params.as_object().unwrap()).unwrap_err();
        assert!(matches!(err, SafetyError::UnknownSeverity(_)));
    }

    #[test]
    fn test_unrecognised_parameters_make_custom_rule() {
        let params = json!({"model": "toxicity-v2"});
        let kind = RuleKind::from_parameters("r", params.as_object().unwrap()).unwrap();
        assert!(matches!(kind, RuleKind::Custom { .. }));
    }

    #[test]
    fn test_invalid_pattern_fails_validation() {
        let rule = Rule::new(
            "broken",
            "bad regex",
            RuleKind::patterns(vec![NamedPattern {
                name: "open".to_string(),
                pattern: "(unclosed".to_string(),
            }]),
        );
        assert!(matches!(rule.validate(), Err(SafetyError::InvalidRule { .. })));
    }

    #[test]
    fn test_threshold_out_of_range_fails_validation() {
        let rule = Rule::new("r", "d", RuleKind::default_keywords()).with_threshold(1.2);
        assert!(rule.validate().is_err());
    }

    #[test]
    fn test_config_round_trip_keeps_kind_and_timestamps() {
        let rule = Rule::new(
            "lengthy",
            "length",
            RuleKind::MaxLength {
                max_length: 20,
                severity: Severity::High,
                confidence: 0.5,
            },
        )
        .with_enabled(false);
        let back = Rule::from_config(&rule.to_config()).unwrap();
        assert_eq!(back.kind, rule.kind);
        assert!(!back.enabled);
        assert_eq!(back.created_at.timestamp(), rule.created_at.timestamp());
    }
}
