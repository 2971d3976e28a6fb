//! PII detection and redaction
//!
//! Replaces personal information with typed placeholders before content is
//! logged, stored in a conversation or handed to a model. Redaction is
//! independent of the safety evaluator; [`pii_rule`] exposes the same patterns
//! as a rule for hosts that also want PII to lower the safety score.

use std::fmt;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::rule::{NamedPattern, Rule, RuleKind};

/// Category of personal information
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PiiKind {
    CreditCard,
    Ssn,
    Email,
    Phone,
    Address,
}

impl PiiKind {
    /// Redaction order
    pub const ALL: [PiiKind; 5] = [
        PiiKind::CreditCard,
        PiiKind::Ssn,
        PiiKind::Email,
        PiiKind::Phone,
        PiiKind::Address,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            PiiKind::CreditCard => "credit_card",
            PiiKind::Ssn => "ssn",
            PiiKind::Email => "email",
            PiiKind::Phone => "phone",
            PiiKind::Address => "address",
        }
    }

    /// Text substituted for each match
    pub fn placeholder(self) -> &'static str {
        match self {
            PiiKind::CreditCard => "[CREDIT_CARD]",
            PiiKind::Ssn => "[SSN]",
            PiiKind::Email => "[EMAIL]",
            PiiKind::Phone => "[PHONE]",
            PiiKind::Address => "[ADDRESS]",
        }
    }

    pub fn pattern(self) -> &'static str {
        match self {
            PiiKind::CreditCard => r"\b\d{4}[- ]?\d{4}[- ]?\d{4}[- ]?\d{4}\b",
            PiiKind::Ssn => r"\b\d{3}-\d{2}-\d{4}\b",
            PiiKind::Email => r"\b[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Z|a-z]{2,}\b",
            PiiKind::Phone => r"\b\d{3}[-.]?\d{3}[-.]?\d{4}\b",
            PiiKind::Address => {
                r"\b\d+\s+[A-Za-z\s]+(?:Street|St|Avenue|Ave|Road|Rd|Boulevard|Blvd)\b"
            }
        }
    }
}

impl fmt::Display for PiiKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Redacted text together with the categories that were found
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Redaction {
    pub text: String,
    /// Categories found, in redaction order
    pub detected: Vec<PiiKind>,
}

impl Redaction {
    pub fn has_pii(&self) -> bool {
        !self.detected.is_empty()
    }
}

struct PiiPattern {
    kind: PiiKind,
    regex: Regex,
}

static PII_PATTERNS: Lazy<Vec<PiiPattern>> = Lazy::new(|| {
    PiiKind::ALL
        .into_iter()
        .filter_map(|kind| {
            Regex::new(kind.pattern())
                .ok()
                .map(|regex| PiiPattern { kind, regex })
        })
        .collect()
});

/// Redactor over the built-in PII categories
#[derive(Debug, Clone, Copy, Default)]
pub struct PiiRedactor;

impl PiiRedactor {
    pub fn new() -> Self {
        Self
    }

    /// Replace every PII match with its placeholder.
    ///
    /// Categories are applied in [`PiiKind::ALL`] order, each to the output of
    /// the previous one, so text already replaced by an earlier category is
    /// not reported again.
    pub fn redact(&self, text: &str) -> Redaction {
        let mut redacted = text.to_string();
        let mut detected = Vec::new();

        for pattern in PII_PATTERNS.iter() {
            if pattern.regex.is_match(&redacted) {
                redacted = pattern
                    .regex
                    .replace_all(&redacted, pattern.kind.placeholder())
                    .into_owned();
                detected.push(pattern.kind);
            }
        }

        if !detected.is_empty() {
            debug!(
                "Redacted PII: {}",
                detected
                    .iter()
                    .map(|k| k.as_str())
                    .collect::<Vec<_>>()
                    .join(", ")
            );
        }

        Redaction {
            text: redacted,
            detected,
        }
    }

    /// Whether any category matches
    pub fn contains_pii(&self, text: &str) -> bool {
        PII_PATTERNS.iter().any(|p| p.regex.is_match(text))
    }
}

/// Redact `text` with the built-in categories
pub fn redact(text: &str) -> Redaction {
    PiiRedactor.redact(text)
}

pub fn contains_pii(text: &str) -> bool {
    PiiRedactor.contains_pii(text)
}

/// Pattern rule named `pii_protection` covering every PII category
pub fn pii_rule() -> Rule {
    Rule::new(
        "pii_protection",
        "Detect and redact personal information",
        RuleKind::patterns(
            PiiKind::ALL
                .into_iter()
                .map(|kind| NamedPattern {
                    name: kind.as_str().to_string(),
                    pattern: kind.pattern().to_string(),
                })
                .collect(),
        ),
    )
}
