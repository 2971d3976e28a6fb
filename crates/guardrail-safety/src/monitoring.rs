//! Evaluation counters

use std::sync::atomic::{AtomicU64, Ordering};

use serde::{Deserialize, Serialize};

use crate::models::{SafetyResult, Severity, ValidationResult};

/// Point-in-time copy of the engine counters
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SafetyMetrics {
    /// Content checks performed
    pub checks: u64,
    /// Checks that produced an unsafe verdict
    pub unsafe_verdicts: u64,
    /// Output validations performed
    pub validations: u64,
    /// Validations that reported at least one issue
    pub failed_validations: u64,
    pub low_violations: u64,
    pub medium_violations: u64,
    pub high_violations: u64,
    pub critical_violations: u64,
}

impl SafetyMetrics {
    /// Total violations across all severities
    pub fn total_violations(&self) -> u64 {
        self.low_violations + self.medium_violations + self.high_violations + self.critical_violations
    }
}

/// Lock-free counters updated on every evaluation
#[derive(Debug, Default)]
pub struct EngineMetrics {
    checks: AtomicU64,
    unsafe_verdicts: AtomicU64,
    validations: AtomicU64,
    failed_validations: AtomicU64,
    violations: [AtomicU64; 4],
}

impl EngineMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a safety verdict
    pub fn record_check(&self, result: &SafetyResult) {
        self.checks.fetch_add(1, Ordering::Relaxed);
        if !result.safe {
            self.unsafe_verdicts.fetch_add(1, Ordering::Relaxed);
        }
        for violation in &result.violations {
            self.violations[severity_slot(violation.severity)].fetch_add(1, Ordering::Relaxed);
        }
    }

    /// Record an output validation
    pub fn record_validation(&self, result: &ValidationResult) {
        self.validations.fetch_add(1, Ordering::Relaxed);
        if !result.valid {
            self.failed_validations.fetch_add(1, Ordering::Relaxed);
        }
    }

    pub fn snapshot(&self) -> SafetyMetrics {
        let count = |severity| self.violations[severity_slot(severity)].load(Ordering::Relaxed);
        SafetyMetrics {
            checks: self.checks.load(Ordering::Relaxed),
            unsafe_verdicts: self.unsafe_verdicts.load(Ordering::Relaxed),
            validations: self.validations.load(Ordering::Relaxed),
            failed_validations: self.failed_validations.load(Ordering::Relaxed),
            low_violations: count(Severity::Low),
            medium_violations: count(Severity::Medium),
            high_violations: count(Severity::High),
            critical_violations: count(Severity::Critical),
        }
    }

    pub fn reset(&self) {
        for counter in [
            &self.checks,
            &self.unsafe_verdicts,
            &self.validations,
            &self.failed_validations,
        ]
        .into_iter()
        .chain(self.violations.iter())
        {
            counter.store(0, Ordering::Relaxed);
        }
    }
}

fn severity_slot(severity: Severity) -> usize {
    match severity {
        Severity::Low => 0,
        Severity::Medium => 1,
        Severity::High => 2,
        Severity::Critical => 3,
    }
}
