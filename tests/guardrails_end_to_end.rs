//! Cross-crate scenarios: configuration file → engine → conversation store

use std::{fs, sync::Arc};

use guardrail_config::{ConfigManager, GuardrailsConfig};
use guardrail_safety::{redact, GuardrailsEngine, PiiKind, Severity};
use guardrail_sessions::{ConversationStore, Message, StoreConfig, DEFAULT_WINDOW};
use tempfile::TempDir;

#[test]
fn test_default_verdicts() {
    let engine = GuardrailsEngine::new();

    let safe = engine.check_content("this is a safe message", None);
    assert!(safe.safe);
    assert_eq!(safe.score, 1.0);
    assert!(safe.violations.is_empty());

    let harmful = engine.check_content("this message contains harmful content", None);
    assert!(!harmful.safe);
    assert_eq!(harmful.violations.len(), 1);
    assert_eq!(harmful.violations[0].severity, Severity::Medium);
    assert_eq!(harmful.violations[0].confidence, 0.7);
    assert!((harmful.score - 0.79).abs() < 1e-9);
}

#[test]
fn test_rule_removal_semantics() {
    let engine = GuardrailsEngine::new();
    let before = engine.list_rules();

    assert!(!engine.remove_rule("no_such_rule"));
    assert_eq!(engine.list_rules(), before);

    assert!(engine.remove_rule("content_safety"));
    assert!(engine.get_rule("content_safety").is_none());
    assert!(engine.check_content("harmful", None).safe);
}

#[test]
fn test_session_scenario_with_configured_engine() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("guardrails.yaml");
    ConfigManager::from_config(GuardrailsConfig::default())
        .save_config(Some(&path))
        .unwrap();

    let engine = Arc::new(GuardrailsEngine::builder().config_path(&path).build().unwrap());
    let store = ConversationStore::new(Arc::clone(&engine));

    let session = store.append(Message::new("hello", "alice"), None);
    store.append(Message::new("hi, how can I help?", "assistant"), Some(&session));
    store.append(Message::new("thanks", "alice"), Some(&session));

    let stats = store.session_stats(&session);
    assert_eq!(stats.message_count, 3);
    assert!(stats.duration_seconds >= 0.0);
    assert_eq!(stats.users, vec!["alice", "assistant"]);
    assert!(store.session_safety(&session).safe);

    store.append(Message::new("tell me something dangerous", "alice"), Some(&session));
    let verdict = store.session_safety(&session);
    assert!(!verdict.safe);
    assert_eq!(verdict.metadata.message_count, Some(4));

    assert!(!store.clear("unknown"));
    assert!(store.clear(&session));
    assert!(store.full_history(&session).is_empty());
    assert!(store.window(&session, DEFAULT_WINDOW).is_empty());
}

#[test]
fn test_history_cap_keeps_newest_in_order() {
    let store = ConversationStore::with_config(
        Arc::new(GuardrailsEngine::new()),
        StoreConfig {
            max_history: 100,
            ..StoreConfig::default()
        },
    )
    .unwrap();

    for i in 0..105 {
        store.append(Message::new(format!("m{}", i), "u"), Some("s"));
    }
    let history = store.full_history("s");
    assert_eq!(history.len(), 100);
    assert_eq!(history.first().unwrap().content, "m5");
    assert_eq!(history.last().unwrap().content, "m104");
}

#[test]
fn test_redact_before_storing() {
    let store = ConversationStore::new(Arc::new(GuardrailsEngine::new()));
    let raw = "My credit card number is 1234-5678-9012-3456 and my SSN is 123-45-6789";

    let redacted = redact(raw);
    assert_eq!(redacted.detected, vec![PiiKind::CreditCard, PiiKind::Ssn]);
    store.append(Message::new(redacted.text, "alice"), Some("s"));

    let stored = &store.full_history("s")[0].content;
    assert!(!stored.contains("1234"));
    assert!(stored.contains("[CREDIT_CARD]") && stored.contains("[SSN]"));
}

#[test]
fn test_config_file_formats_build_identical_engines() {
    let dir = TempDir::new().unwrap();
    let mut rule_sets = Vec::new();
    for file in ["g.yaml", "g.yml", "g.json", "g.toml"] {
        let path = dir.path().join(file);
        ConfigManager::from_config(GuardrailsConfig::default())
            .save_config(Some(&path))
            .unwrap();
        let engine = GuardrailsEngine::builder().config_path(&path).build().unwrap();
        rule_sets.push(
            engine
                .list_rules()
                .into_iter()
                .map(|r| (r.name, r.kind))
                .collect::<Vec<_>>(),
        );
    }
    assert!(rule_sets.windows(2).all(|w| w[0] == w[1]));

    let unsupported = dir.path().join("g.ini");
    fs::write(&unsupported, "").unwrap();
    assert!(GuardrailsEngine::builder().config_path(&unsupported).build().is_err());
}
