//! Rendering command results as text or JSON

use std::fmt::Write;

use guardrail_safety::{Redaction, SafetyResult, ValidationResult};
use guardrail_sessions::{Message, SessionStats};
use serde::Serialize;

use crate::error::{CliError, CliResult};

/// A command result that can be printed
pub trait Report: Serialize {
    fn render_text(&self) -> String;

    /// Whether the command should exit successfully
    fn success(&self) -> bool {
        true
    }
}

/// Render `report` in the requested format
pub fn render<R: Report>(report: &R, json: bool) -> CliResult<String> {
    if json {
        serde_json::to_string_pretty(report).map_err(|e| CliError::Internal(e.to_string()))
    } else {
        Ok(report.render_text())
    }
}

impl Report for SafetyResult {
    fn render_text(&self) -> String {
        let mut out = format!(
            "{} (score {:.2})",
            if self.safe { "SAFE" } else { "UNSAFE" },
            self.score
        );
        for v in &self.violations {
            let _ = write!(
                out,
                "\n  - [{}] {}: {} (confidence {:.2})",
                v.severity, v.rule_name, v.description, v.confidence
            );
        }
        out
    }

    fn success(&self) -> bool {
        self.safe
    }
}

impl Report for ValidationResult {
    fn render_text(&self) -> String {
        let mut out = format!(
            "{} (safety score {:.2})",
            if self.valid { "VALID" } else { "INVALID" },
            self.metadata.safety_score
        );
        for issue in &self.issues {
            let _ = write!(out, "\n  issue: {}", issue);
        }
        for suggestion in &self.suggestions {
            let _ = write!(out, "\n  suggestion: {}", suggestion);
        }
        out
    }

    fn success(&self) -> bool {
        self.valid
    }
}

impl Report for Redaction {
    fn render_text(&self) -> String {
        if self.detected.is_empty() {
            return self.text.clone();
        }
        let kinds: Vec<&str> = self.detected.iter().map(|k| k.as_str()).collect();
        format!("{}\n  detected: {}", self.text, kinds.join(", "))
    }
}

/// One row of `rules list`
#[derive(Debug, Clone, Serialize)]
pub struct RuleSummary {
    pub name: String,
    pub description: String,
    pub enabled: bool,
    pub threshold: f64,
    pub kind: String,
    pub parameters: serde_json::Value,
}

#[derive(Debug, Clone, Serialize)]
pub struct RulesReport {
    pub rules: Vec<RuleSummary>,
}

impl Report for RulesReport {
    fn render_text(&self) -> String {
        if self.rules.is_empty() {
            return "No rules configured".to_string();
        }
        self.rules
            .iter()
            .map(|r| {
                format!(
                    "{:<24} {:<10} {:<8} {}",
                    r.name,
                    r.kind,
                    if r.enabled { "enabled" } else { "disabled" },
                    r.description
                )
            })
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// Replay outcome for a single session
#[derive(Debug, Clone, Serialize)]
pub struct SessionReport {
    pub stats: SessionStats,
    pub safety: SafetyResult,
    pub recent: Vec<Message>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ReplayReport {
    pub sessions: Vec<SessionReport>,
}

impl Report for ReplayReport {
    fn render_text(&self) -> String {
        let mut out = String::new();
        for (i, session) in self.sessions.iter().enumerate() {
            if i > 0 {
                out.push('\n');
            }
            let stats = &session.stats;
            let _ = writeln!(
                out,
                "session {}: {} message(s), {} user(s), {:.1}s",
                stats.session_id,
                stats.message_count,
                stats.users.len(),
                stats.duration_seconds
            );
            let _ = write!(out, "  {}", session.safety.render_text().replace('\n', "\n  "));
            for message in &session.recent {
                let _ = write!(out, "\n  > {}: {}", message.user_id, message.content);
            }
        }
        out
    }

    fn success(&self) -> bool {
        self.sessions.iter().all(|s| s.safety.safe)
    }
}

/// Plain confirmation line
#[derive(Debug, Clone, Serialize)]
pub struct Notice {
    pub message: String,
}

impl Report for Notice {
    fn render_text(&self) -> String {
        self.message.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use guardrail_safety::GuardrailsEngine;

    #[test]
    fn test_safety_text() {
        let engine = GuardrailsEngine::new();
        let text = engine.check_content("this is harmful", None).render_text();
        assert!(text.starts_with("UNSAFE (score 0.79)"));
        assert!(text.contains("[medium] content_safety"));
    }

    #[test]
    fn test_validation_json_has_issues() {
        let engine = GuardrailsEngine::new();
        let result = engine.validate_output("", None);
        let json = render(&result, true).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["valid"], false);
        assert_eq!(value["issues"].as_array().unwrap().len(), 1);
        assert!(!result.success());
    }

    #[test]
    fn test_empty_rules_report() {
        let report = RulesReport { rules: vec![] };
        assert_eq!(report.render_text(), "No rules configured");
    }
}
