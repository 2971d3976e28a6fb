//! Engine construction and evaluation across configuration, matchers and threads

use std::{fs, sync::Arc, thread};

use guardrail_config::{ConfigManager, GuardrailsConfig, RuleConfig};
use guardrail_safety::{
    pii_rule, violation_for, EvaluationContext, GuardrailsEngine, LazyGuardrails, Rule, RuleKind,
    SafetyError, Severity,
};
use serde_json::json;
use tempfile::TempDir;

fn write_config(dir: &TempDir, file: &str, contents: &str) -> std::path::PathBuf {
    let path = dir.path().join(file);
    fs::write(&path, contents).unwrap();
    path
}

#[test]
fn test_build_from_yaml_replaces_defaults() {
    let dir = TempDir::new().unwrap();
    let path = write_config(
        &dir,
        "guardrails.yaml",
        r#"
version: "1.0"
name: strict
settings:
  max_content_length: 50
  safety_threshold: 0.9
rules:
  - name: profanity
    description: Block profanity
    parameters:
      keywords: [darn]
      severity: high
      confidence: 0.5
"#,
    );

    let engine = GuardrailsEngine::builder().config_path(&path).build().unwrap();
    let names: Vec<String> = engine.list_rules().into_iter().map(|r| r.name).collect();
    assert_eq!(names, vec!["profanity"]);
    assert_eq!(engine.settings().safety_threshold, 0.9);

    // The default keyword set is gone
    assert!(engine.check_content("harmful", None).safe);

    let result = engine.check_content("well DARN it", None);
    assert_eq!(result.violations[0].severity, Severity::High);
    assert!((result.score - 0.7).abs() < 1e-9);

    let validation = engine.validate_output(&"a".repeat(51), None);
    assert_eq!(validation.issues, vec!["Output is too long (max 50 characters)"]);
}

#[tokio::test]
async fn test_build_async_matches_sync() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("guardrails.json");
    ConfigManager::from_config(GuardrailsConfig::default())
        .save_config(Some(&path))
        .unwrap();

    let sync = GuardrailsEngine::builder().config_path(&path).build().unwrap();
    let async_engine = GuardrailsEngine::builder()
        .config_path(&path)
        .build_async()
        .await
        .unwrap();
    let summary = |engine: &GuardrailsEngine| {
        engine
            .list_rules()
            .into_iter()
            .map(|r| (r.name, r.enabled, r.kind))
            .collect::<Vec<_>>()
    };
    assert_eq!(summary(&sync), summary(&async_engine));
}

#[test]
fn test_unknown_severity_is_rejected() {
    let config = GuardrailsConfig {
        rules: vec![RuleConfig::new("r", "r")
            .with_parameter("keywords", json!(["x"]))
            .with_parameter("severity", json!("extreme"))],
        ..GuardrailsConfig::default()
    };
    let err = GuardrailsEngine::builder().config(config).build().unwrap_err();
    assert!(matches!(err, SafetyError::UnknownSeverity(_)));
}

#[test]
fn test_invalid_pattern_is_rejected() {
    let config = GuardrailsConfig {
        rules: vec![RuleConfig::new("r", "r").with_parameter("patterns", json!(["(unclosed"]))],
        ..GuardrailsConfig::default()
    };
    assert!(GuardrailsEngine::builder().config(config).build().is_err());
}

#[test]
fn test_missing_config_file_is_an_error() {
    let err = GuardrailsEngine::builder()
        .config_path("/definitely/not/here.yaml")
        .build()
        .unwrap_err();
    assert!(matches!(err, SafetyError::Config(_)));
}

#[test]
fn test_save_and_rebuild_keeps_working_set() {
    let dir = TempDir::new().unwrap();
    let engine = GuardrailsEngine::new();
    engine.add_rule(pii_rule()).unwrap();
    engine.remove_rule("length_check");

    let path = dir.path().join("saved.toml");
    engine.save_config(&path).unwrap();

    let rebuilt = GuardrailsEngine::builder().config_path(&path).build().unwrap();
    assert_eq!(rebuilt.list_rules().len(), 2);
    let pattern_names = |rule: Rule| match rule.kind {
        RuleKind::Patterns { patterns, .. } => {
            let mut names: Vec<String> = patterns.into_iter().map(|p| p.name).collect();
            names.sort();
            names
        }
        other => panic!("unexpected kind {:?}", other),
    };
    assert_eq!(
        pattern_names(rebuilt.get_rule("pii_protection").unwrap()),
        pattern_names(pii_rule())
    );
    assert!(rebuilt.get_rule("length_check").is_none());
}

#[test]
fn test_pii_rule_lowers_score() {
    let engine = GuardrailsEngine::builder().rule(pii_rule()).build().unwrap();
    let result = engine.check_content("my SSN is 123-45-6789", None);
    assert!(!result.safe);
    assert_eq!(
        result.violations[0].description,
        "Content matches restricted pattern: ssn"
    );
}

#[test]
fn test_custom_matcher_sees_context() {
    let engine = GuardrailsEngine::builder()
        .rule(Rule::new(
            "minors",
            "age gate",
            RuleKind::Custom {
                parameters: serde_json::Map::new(),
            },
        ))
        .matcher(
            "minors",
            Arc::new(
                |rule: &Rule, _: &str, context: Option<&EvaluationContext>| {
                    let age = context?.get("age")?.as_u64()?;
                    (age < 18).then(|| {
                        violation_for(rule, Severity::Critical, 1.0, "minor".to_string(), None)
                    })
                },
            ),
        )
        .build()
        .unwrap();

    let mut context = EvaluationContext::new();
    context.insert("age".to_string(), json!(12));
    let result = engine.check_content("hi", Some(&context));
    assert_eq!(result.score, 0.0);

    context.insert("age".to_string(), json!(30));
    assert!(engine.check_content("hi", Some(&context)).safe);
    assert!(engine.check_content("hi", None).safe);
}

#[test]
fn test_concurrent_checks_and_rule_updates() {
    let engine = Arc::new(GuardrailsEngine::new());

    let handles: Vec<_> = (0..8)
        .map(|i| {
            let engine = Arc::clone(&engine);
            thread::spawn(move || {
                for j in 0..50 {
                    if i == 0 && j % 10 == 0 {
                        engine
                            .add_rule(Rule::new(
                                format!("extra_{}", j),
                                "extra",
                                RuleKind::keywords(["zzz"]),
                            ))
                            .unwrap();
                    }
                    let result = engine.check_content("this is harmful", None);
                    assert!(!result.safe);
                    assert!((0.0..=1.0).contains(&result.score));
                }
            })
        })
        .collect();

    for handle in handles {
        handle.join().unwrap();
    }

    assert_eq!(engine.list_rules().len(), 7);
    assert_eq!(engine.metrics().checks, 400);
}

#[test]
fn test_lazy_guardrails_initializes_once_across_threads() {
    let lazy = Arc::new(LazyGuardrails::default());
    let addresses: Vec<usize> = (0..8)
        .map(|_| {
            let lazy = Arc::clone(&lazy);
            thread::spawn(move || lazy.initialize().unwrap() as *const GuardrailsEngine as usize)
        })
        .collect::<Vec<_>>()
        .into_iter()
        .map(|h| h.join().unwrap())
        .collect();

    assert!(addresses.windows(2).all(|w| w[0] == w[1]));
    assert!(lazy.is_initialized());
}
