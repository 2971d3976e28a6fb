//! Guardrail Content Safety
//!
//! This crate evaluates text against an ordered set of named rules and
//! produces a graded verdict: a score in `0.0..=1.0` plus the list of
//! violations that lowered it.
//!
//! ## Features
//!
//! - **Rule Store**: thread-safe ordered rule set with replace-by-name semantics
//! - **Violation Scoring**: typed keyword, pattern and length rules, plus
//!   per-rule custom matchers
//! - **Safety Evaluation**: multiplicative penalty scoring against a threshold
//! - **Output Validation**: length and emptiness checks merged with the verdict
//! - **PII Redaction**: placeholder substitution for personal information
//! - **Metrics**: lock-free evaluation counters
//!
//! ## Usage
//!
//! ```rust
//! use guardrail_safety::GuardrailsEngine;
//!
//! let engine = GuardrailsEngine::builder().build().unwrap();
//!
//! let result = engine.check_content("this is a safe message", None);
//! assert!(result.safe);
//!
//! let result = engine.check_content("this message contains harmful content", None);
//! assert!(!result.safe);
//! assert_eq!(result.violations.len(), 1);
//! ```

pub mod engine;
pub mod error;
pub mod matcher;
pub mod models;
pub mod monitoring;
pub mod redaction;
pub mod rule;
pub mod store;
pub mod validation;

pub use engine::{EngineBuilder, GuardrailsEngine, LazyGuardrails};
pub use error::{Result, SafetyError};
pub use matcher::{violation_for, BuiltinMatcher, MatcherRegistry, RuleMatcher};
pub use models::{
    EvaluationContext, SafetyMetadata, SafetyResult, Severity, ValidationMetadata,
    ValidationResult, Violation, ViolationContext,
};
pub use monitoring::{EngineMetrics, SafetyMetrics};
pub use redaction::{contains_pii, pii_rule, redact, PiiKind, PiiRedactor, Redaction};
pub use rule::{rules_from_config, NamedPattern, Rule, RuleKind};
pub use store::RuleStore;
pub use validation::OutputValidator;
