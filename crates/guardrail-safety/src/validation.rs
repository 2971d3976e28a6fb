//! Structural checks applied to AI output before the safety verdict is merged in

use guardrail_config::types::DEFAULT_MAX_CONTENT_LENGTH;

use crate::models::{EvaluationContext, SafetyResult, ValidationMetadata, ValidationResult};

/// Output-specific checks layered over a safety verdict
#[derive(Debug, Clone, Copy)]
pub struct OutputValidator {
    max_length: usize,
}

impl OutputValidator {
    pub fn new(max_length: usize) -> Self {
        Self { max_length }
    }

    pub fn max_length(&self) -> usize {
        self.max_length
    }

    /// Combine structural checks on `output` with its safety verdict.
    ///
    /// Every check runs; issues and suggestions accumulate in check order.
    pub fn validate(
        &self,
        output: &str,
        safety: &SafetyResult,
        context: Option<&EvaluationContext>,
    ) -> ValidationResult {
        let mut issues = Vec::new();
        let mut suggestions = Vec::new();

        if output.chars().count() > self.max_length {
            issues.push(format!(
                "Output is too long (max {} characters)",
                group_thousands(self.max_length)
            ));
            suggestions.push("Consider breaking the response into smaller parts".to_string());
        }

        if output.trim().is_empty() {
            issues.push("Output is empty or contains only whitespace".to_string());
            suggestions.push("Ensure the AI generates meaningful content".to_string());
        }

        if !safety.safe {
            issues.push(format!(
                "Content safety check failed (score: {:.2})",
                safety.score
            ));
            suggestions.push("Review and revise the output for safety concerns".to_string());
        }

        ValidationResult::new(
            issues,
            suggestions,
            ValidationMetadata {
                safety_score: safety.score,
                context: context.cloned(),
            },
        )
    }
}

impl Default for OutputValidator {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_CONTENT_LENGTH)
    }
}

fn group_thousands(n: usize) -> String {
    let digits = n.to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    grouped
}
