//! Violation scoring: mapping a rule and content to an optional violation

use std::{collections::HashMap, fmt, sync::Arc};

use chrono::Utc;
use parking_lot::RwLock;
use regex::Regex;
use tracing::warn;

use crate::{
    models::{EvaluationContext, Severity, Violation, ViolationContext},
    rule::{NamedPattern, Rule, RuleKind},
};

/// Decides whether a rule matches a piece of content.
///
/// Implementations must be pure with respect to the rule and content: the
/// same inputs produce the same violation (timestamps aside).
pub trait RuleMatcher: Send + Sync {
    /// Evaluate `rule` against `content`, returning at most one violation
    fn evaluate(
        &self,
        rule: &Rule,
        content: &str,
        context: Option<&EvaluationContext>,
    ) -> Option<Violation>;
}

impl<F> RuleMatcher for F
where
    F: Fn(&Rule, &str, Option<&EvaluationContext>) -> Option<Violation> + Send + Sync,
{
    fn evaluate(
        &self,
        rule: &Rule,
        content: &str,
        context: Option<&EvaluationContext>,
    ) -> Option<Violation> {
        self(rule, content, context)
    }
}

/// Build a violation for `rule` carrying the rule's parameters as evidence
pub fn violation_for(
    rule: &Rule,
    severity: Severity,
    confidence: f64,
    description: String,
    matched: Option<String>,
) -> Violation {
    Violation {
        rule_name: rule.name.clone(),
        severity,
        description,
        confidence,
        context: Some(ViolationContext {
            matched,
            rule_parameters: rule.parameters(),
        }),
        timestamp: Utc::now(),
    }
}

/// Matcher for the typed rule kinds
///
/// Compiled regular expressions are cached by pattern text.
#[derive(Default)]
pub struct BuiltinMatcher {
    compiled: RwLock<HashMap<String, Regex>>,
}

impl BuiltinMatcher {
    pub fn new() -> Self {
        Self::default()
    }

    fn match_keywords(&self, keywords: &[String], content: &str) -> Option<String> {
        let content_lower = content.to_lowercase();
        keywords
            .iter()
            .find(|keyword| content_lower.contains(&keyword.to_lowercase()))
            .cloned()
    }

    fn match_patterns<'a>(&self, patterns: &'a [NamedPattern], content: &str) -> Option<&'a NamedPattern> {
        patterns
            .iter()
            .find(|p| self.regex(&p.pattern).is_some_and(|re| re.is_match(content)))
    }

    fn regex(&self, pattern: &str) -> Option<Regex> {
        if let Some(re) = self.compiled.read().get(pattern) {
            return Some(re.clone());
        }
        match Regex::new(pattern) {
            Ok(re) => {
                self.compiled
                    .write()
                    .insert(pattern.to_string(), re.clone());
                Some(re)
            }
            Err(e) => {
                // Rules are validated on construction; this only fires for
                // rules assembled by hand and never validated.
                warn!("Skipping invalid pattern {:?}: {}", pattern, e);
                None
            }
        }
    }
}

impl RuleMatcher for BuiltinMatcher {
    fn evaluate(
        &self,
        rule: &Rule,
        content: &str,
        _context: Option<&EvaluationContext>,
    ) -> Option<Violation> {
        match &rule.kind {
            RuleKind::Keywords {
                keywords,
                severity,
                confidence,
            } => self.match_keywords(keywords, content).map(|keyword| {
                violation_for(
                    rule,
                    *severity,
                    *confidence,
                    format!("Content contains potentially harmful keyword: {}", keyword),
                    Some(keyword),
                )
            }),
            RuleKind::Patterns {
                patterns,
                severity,
                confidence,
            } => self.match_patterns(patterns, content).map(|p| {
                violation_for(
                    rule,
                    *severity,
                    *confidence,
                    format!("Content matches restricted pattern: {}", p.name),
                    Some(p.name.clone()),
                )
            }),
            RuleKind::MaxLength {
                max_length,
                severity,
                confidence,
            } => {
                let length = content.chars().count();
                (length > *max_length).then(|| {
                    violation_for(
                        rule,
                        *severity,
                        *confidence,
                        format!(
                            "Content length {} exceeds maximum of {} characters",
                            length, max_length
                        ),
                        Some(length.to_string()),
                    )
                })
            }
            RuleKind::Custom { .. } => None,
        }
    }
}

/// Maps rules to matchers: registered per-name matchers first, then the
/// built-in matcher for the rule's kind.
#[derive(Clone)]
pub struct MatcherRegistry {
    custom: HashMap<String, Arc<dyn RuleMatcher>>,
    builtin: Arc<BuiltinMatcher>,
}

impl MatcherRegistry {
    pub fn new() -> Self {
        Self {
            custom: HashMap::new(),
            builtin: Arc::new(BuiltinMatcher::new()),
        }
    }

    /// Route the rule named `rule_name` to `matcher`, replacing any previous one
    pub fn register(&mut self, rule_name: impl Into<String>, matcher: Arc<dyn RuleMatcher>) {
        self.custom.insert(rule_name.into(), matcher);
    }

    /// Remove a per-name matcher; returns whether one was registered
    pub fn unregister(&mut self, rule_name: &str) -> bool {
        self.custom.remove(rule_name).is_some()
    }

    pub fn has_custom(&self, rule_name: &str) -> bool {
        self.custom.contains_key(rule_name)
    }

    /// Evaluate a rule with whichever matcher it resolves to
    pub fn evaluate(
        &self,
        rule: &Rule,
        content: &str,
        context: Option<&EvaluationContext>,
    ) -> Option<Violation> {
        match self.custom.get(&rule.name) {
            Some(matcher) => matcher.evaluate(rule, content, context),
            None => self.builtin.evaluate(rule, content, context),
        }
    }
}

impl Default for MatcherRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for MatcherRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names: Vec<&String> = self.custom.keys().collect();
        names.sort();
        f.debug_struct("MatcherRegistry")
            .field("custom", &names)
            .finish()
    }
}
