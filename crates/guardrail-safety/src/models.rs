//! Verdict types produced by the evaluator and validator

use std::{collections::HashMap, fmt, str::FromStr};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::SafetyError;

/// Caller-supplied context passed through evaluation untouched
pub type EvaluationContext = HashMap<String, serde_json::Value>;

/// Violation severity, ordered from least to most severe
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Low,
    Medium,
    High,
    Critical,
}

impl Severity {
    /// All severities in ascending order
    pub const ALL: [Severity; 4] = [
        Severity::Low,
        Severity::Medium,
        Severity::High,
        Severity::Critical,
    ];

    /// Fraction of the score a fully confident violation of this severity removes
    pub fn multiplier(self) -> f64 {
        match self {
            Severity::Low => 0.1,
            Severity::Medium => 0.3,
            Severity::High => 0.6,
            Severity::Critical => 1.0,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Severity::Low => "low",
            Severity::Medium => "medium",
            Severity::High => "high",
            Severity::Critical => "critical",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Severity {
    type Err = SafetyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "low" => Ok(Severity::Low),
            "medium" => Ok(Severity::Medium),
            "high" => Ok(Severity::High),
            "critical" => Ok(Severity::Critical),
            _ => Err(SafetyError::UnknownSeverity(s.to_string())),
        }
    }
}

/// Evidence attached to a violation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ViolationContext {
    /// The keyword, pattern name or measurement that triggered the match
    pub matched: Option<String>,
    /// Parameters of the rule that produced the violation
    pub rule_parameters: serde_json::Value,
}

/// A single rule match found in content
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Violation {
    /// Name of the rule that matched
    pub rule_name: String,
    pub severity: Severity,
    /// Human-readable explanation
    pub description: String,
    /// Matcher confidence in 0.0..=1.0
    pub confidence: f64,
    pub context: Option<ViolationContext>,
    pub timestamp: DateTime<Utc>,
}

impl Violation {
    /// Fraction of the running score this violation removes
    pub fn penalty(&self) -> f64 {
        self.confidence * self.severity.multiplier()
    }
}

/// Metadata attached to a safety verdict
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SafetyMetadata {
    /// Caller context, passed through
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context: Option<EvaluationContext>,
    /// Set when the verdict covers a conversation session
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session_id: Option<String>,
    /// Number of messages evaluated for a session verdict
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message_count: Option<usize>,
}

/// Result of a content safety check
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SafetyResult {
    /// True iff the score meets the threshold and nothing matched
    pub safe: bool,
    /// 0.0 to 1.0, higher is safer
    pub score: f64,
    /// Violations in rule evaluation order
    pub violations: Vec<Violation>,
    pub timestamp: DateTime<Utc>,
    #[serde(default)]
    pub metadata: SafetyMetadata,
}

impl SafetyResult {
    /// Build a verdict from a raw score, clamping it and deriving `safe`
    pub fn from_violations(score: f64, violations: Vec<Violation>, threshold: f64) -> Self {
        let score = score.clamp(0.0, 1.0);
        Self {
            safe: score >= threshold && violations.is_empty(),
            score,
            violations,
            timestamp: Utc::now(),
            metadata: SafetyMetadata::default(),
        }
    }

    /// A verdict with no violations and a perfect score
    pub fn clean() -> Self {
        Self::from_violations(1.0, Vec::new(), 0.0)
    }

    pub fn with_metadata(mut self, metadata: SafetyMetadata) -> Self {
        self.metadata = metadata;
        self
    }

    /// Highest severity among the violations
    pub fn max_severity(&self) -> Option<Severity> {
        self.violations.iter().map(|v| v.severity).max()
    }
}

/// Metadata attached to an output validation
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ValidationMetadata {
    /// Score of the underlying safety check
    pub safety_score: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context: Option<EvaluationContext>,
}

/// Result of output validation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationResult {
    /// True iff no issues were found
    pub valid: bool,
    pub issues: Vec<String>,
    pub suggestions: Vec<String>,
    pub timestamp: DateTime<Utc>,
    pub metadata: ValidationMetadata,
}

impl ValidationResult {
    pub fn new(issues: Vec<String>, suggestions: Vec<String>, metadata: ValidationMetadata) -> Self {
        Self {
            valid: issues.is_empty(),
            issues,
            suggestions,
            timestamp: Utc::now(),
            metadata,
        }
    }
}
