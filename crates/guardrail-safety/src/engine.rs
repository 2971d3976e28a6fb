//! Safety evaluation engine

use std::{
    path::{Path, PathBuf},
    sync::Arc,
};

use guardrail_config::{ConfigManager, GuardrailsConfig, Settings};
use once_cell::sync::OnceCell;
use tracing::{debug, info, warn};

use crate::{
    error::Result,
    matcher::{MatcherRegistry, RuleMatcher},
    models::{EvaluationContext, SafetyMetadata, SafetyResult, ValidationResult},
    monitoring::{EngineMetrics, SafetyMetrics},
    rule::{rules_from_config, Rule},
    store::RuleStore,
    validation::OutputValidator,
};

/// Evaluates content against an ordered rule set
///
/// Construct with [`GuardrailsEngine::builder`]; a built engine is fully
/// loaded and never performs I/O while evaluating. Share it behind an `Arc`.
#[derive(Debug)]
pub struct GuardrailsEngine {
    rules: Arc<RuleStore>,
    matchers: MatcherRegistry,
    config: GuardrailsConfig,
    validator: OutputValidator,
    metrics: EngineMetrics,
}

impl GuardrailsEngine {
    pub fn builder() -> EngineBuilder {
        EngineBuilder::default()
    }

    /// Engine with the built-in default configuration
    pub fn new() -> Self {
        let config = GuardrailsConfig {
            rules: Vec::new(),
            ..GuardrailsConfig::default()
        };
        Self::from_parts(
            config,
            RuleStore::with_rules(Rule::default_rules()),
            MatcherRegistry::new(),
        )
    }

    fn from_parts(config: GuardrailsConfig, rules: RuleStore, matchers: MatcherRegistry) -> Self {
        info!(
            "Guardrails engine ready with {} rules ({} enabled)",
            rules.len(),
            rules.list_enabled_rules().len()
        );
        Self {
            rules: Arc::new(rules),
            matchers,
            validator: OutputValidator::new(config.settings.max_content_length),
            config,
            metrics: EngineMetrics::new(),
        }
    }

    /// Global settings the engine was built with
    pub fn settings(&self) -> &Settings {
        &self.config.settings
    }

    /// Shared handle to the rule store
    pub fn rule_store(&self) -> Arc<RuleStore> {
        Arc::clone(&self.rules)
    }

    /// Validate and add a rule, replacing any rule with the same name
    pub fn add_rule(&self, rule: Rule) -> Result<()> {
        rule.validate()?;
        self.rules.add_rule(rule);
        Ok(())
    }

    pub fn remove_rule(&self, name: &str) -> bool {
        self.rules.remove_rule(name)
    }

    pub fn get_rule(&self, name: &str) -> Option<Rule> {
        self.rules.get_rule(name)
    }

    pub fn list_rules(&self) -> Vec<Rule> {
        self.rules.list_rules()
    }

    pub fn list_enabled_rules(&self) -> Vec<Rule> {
        self.rules.list_enabled_rules()
    }

    /// Check content for safety violations.
    ///
    /// Each enabled rule, in store order, may contribute one violation. The
    /// score starts at 1.0 and every violation multiplies it by
    /// `1 - confidence * severity_multiplier`.
    pub fn check_content(&self, content: &str, context: Option<&EvaluationContext>) -> SafetyResult {
        let mut violations = Vec::new();
        let mut score = 1.0;

        for rule in self.rules.list_enabled_rules() {
            if let Some(violation) = self.matchers.evaluate(&rule, content, context) {
                score *= 1.0 - violation.penalty();
                violations.push(violation);
            }
        }

        let result = SafetyResult::from_violations(score, violations, self.settings().safety_threshold)
            .with_metadata(SafetyMetadata {
                context: context.cloned(),
                ..SafetyMetadata::default()
            });

        self.metrics.record_check(&result);
        if result.safe {
            debug!("Content passed safety check (score {:.3})", result.score);
        } else {
            warn!(
                "Content failed safety check: score {:.3}, {} violation(s) from [{}]",
                result.score,
                result.violations.len(),
                result
                    .violations
                    .iter()
                    .map(|v| v.rule_name.as_str())
                    .collect::<Vec<_>>()
                    .join(", ")
            );
        }

        result
    }

    /// Validate AI output: length, emptiness and content safety
    pub fn validate_output(&self, output: &str, context: Option<&EvaluationContext>) -> ValidationResult {
        let safety = self.check_content(output, context);
        let result = self.validator.validate(output, &safety, context);
        self.metrics.record_validation(&result);
        if !result.valid {
            debug!("Output validation found {} issue(s)", result.issues.len());
        }
        result
    }

    /// Snapshot of the evaluation counters
    pub fn metrics(&self) -> SafetyMetrics {
        self.metrics.snapshot()
    }

    /// The current working set as a configuration document
    pub fn to_config(&self) -> GuardrailsConfig {
        GuardrailsConfig {
            rules: self.rules.list_rules().iter().map(Rule::to_config).collect(),
            ..self.config.clone()
        }
    }

    /// Write the current working set to `path`
    pub fn save_config(&self, path: &Path) -> Result<()> {
        ConfigManager::from_config(self.to_config()).save_config(Some(path))?;
        Ok(())
    }
}

impl Default for GuardrailsEngine {
    fn default() -> Self {
        Self::new()
    }
}

/// Two-phase construction for [`GuardrailsEngine`]
///
/// Rule sources, in order:
/// 1. a configuration document or file, if given, supplies settings and rules;
/// 2. without one, explicitly added rules alone, or the two default rules
///    when none were added;
/// 3. explicit rules are then merged by name over whatever step 1 produced.
#[derive(Debug, Clone, Default)]
pub struct EngineBuilder {
    config_path: Option<PathBuf>,
    config: Option<GuardrailsConfig>,
    rules: Vec<Rule>,
    matchers: MatcherRegistry,
}

impl EngineBuilder {
    /// Load configuration from a YAML, JSON or TOML file
    pub fn config_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.config_path = Some(path.into());
        self
    }

    /// Use an in-memory configuration document; takes precedence over a path
    pub fn config(mut self, config: GuardrailsConfig) -> Self {
        self.config = Some(config);
        self
    }

    pub fn rule(mut self, rule: Rule) -> Self {
        self.rules.push(rule);
        self
    }

    pub fn rules(mut self, rules: impl IntoIterator<Item = Rule>) -> Self {
        self.rules.extend(rules);
        self
    }

    /// Route the rule named `rule_name` to a custom matcher
    pub fn matcher(mut self, rule_name: impl Into<String>, matcher: Arc<dyn RuleMatcher>) -> Self {
        self.matchers.register(rule_name, matcher);
        self
    }

    /// Load configuration (if any) and produce a ready engine
    pub fn build(mut self) -> Result<GuardrailsEngine> {
        let loaded = match (self.config.take(), &self.config_path) {
            (Some(config), _) => {
                config.validate()?;
                Some(config)
            }
            (None, Some(path)) => {
                let mut manager = ConfigManager::with_path(path);
                Some(manager.load_config()?.clone())
            }
            (None, None) => None,
        };
        self.assemble(loaded)
    }

    /// As [`EngineBuilder::build`], reading the configuration file on the tokio runtime
    pub async fn build_async(mut self) -> Result<GuardrailsEngine> {
        let loaded = match (self.config.take(), &self.config_path) {
            (Some(config), _) => {
                config.validate()?;
                Some(config)
            }
            (None, Some(path)) => {
                let mut manager = ConfigManager::with_path(path);
                Some(manager.load_config_async().await?.clone())
            }
            (None, None) => None,
        };
        self.assemble(loaded)
    }

    fn assemble(self, loaded: Option<GuardrailsConfig>) -> Result<GuardrailsEngine> {
        for rule in &self.rules {
            rule.validate()?;
        }

        let (config, base_rules) = match loaded {
            Some(config) => {
                let rules = rules_from_config(&config)?;
                (config, rules)
            }
            None => {
                let defaults = if self.rules.is_empty() {
                    Rule::default_rules()
                } else {
                    Vec::new()
                };
                (GuardrailsConfig::default(), defaults)
            }
        };

        let store = RuleStore::with_rules(base_rules);
        for rule in self.rules {
            store.add_rule(rule);
        }

        let config = GuardrailsConfig {
            rules: Vec::new(),
            ..config
        };
        Ok(GuardrailsEngine::from_parts(config, store, self.matchers))
    }
}

/// Engine that is built on first use
///
/// `initialize` may be called any number of times from any number of
/// threads; the builder runs once and every caller observes the same engine.
/// A failed build is not cached, so a later call retries.
#[derive(Debug, Default)]
pub struct LazyGuardrails {
    builder: EngineBuilder,
    engine: OnceCell<GuardrailsEngine>,
}

impl LazyGuardrails {
    pub fn new(builder: EngineBuilder) -> Self {
        Self {
            builder,
            engine: OnceCell::new(),
        }
    }

    /// Build the engine if that has not happened yet
    pub fn initialize(&self) -> Result<&GuardrailsEngine> {
        self.engine.get_or_try_init(|| {
            debug!("Initializing guardrails engine on first use");
            self.builder.clone().build()
        })
    }

    pub fn is_initialized(&self) -> bool {
        self.engine.get().is_some()
    }

    pub fn check_content(&self, content: &str, context: Option<&EvaluationContext>) -> Result<SafetyResult> {
        Ok(self.initialize()?.check_content(content, context))
    }

    pub fn validate_output(
        &self,
        output: &str,
        context: Option<&EvaluationContext>,
    ) -> Result<ValidationResult> {
        Ok(self.initialize()?.validate_output(output, context))
    }
}
