//! Thread-safe ordered rule store

use parking_lot::RwLock;
use tracing::{debug, info};

use crate::rule::Rule;

/// Ordered set of named rules
///
/// Uses RwLock for concurrent read access with exclusive write access.
/// Every read hands out cloned rules so callers never observe later writes.
#[derive(Debug, Default)]
pub struct RuleStore {
    rules: RwLock<Vec<Rule>>,
}

impl RuleStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self {
            rules: RwLock::new(Vec::new()),
        }
    }

    /// Create a store holding `rules` in the given order
    pub fn with_rules(rules: Vec<Rule>) -> Self {
        let store = Self::new();
        for rule in rules {
            store.add_rule(rule);
        }
        store
    }

    /// Add a rule, replacing in place any rule with the same name
    pub fn add_rule(&self, rule: Rule) {
        let mut rules = self.rules.write();
        match rules.iter_mut().find(|existing| existing.name == rule.name) {
            Some(existing) => {
                info!("Replacing rule: {}", rule.name);
                *existing = rule;
            }
            None => {
                info!("Adding rule: {}", rule.name);
                rules.push(rule);
            }
        }
    }

    /// Remove the rule called `name`; returns whether it existed
    pub fn remove_rule(&self, name: &str) -> bool {
        let mut rules = self.rules.write();
        match rules.iter().position(|r| r.name == name) {
            Some(index) => {
                rules.remove(index);
                info!("Removed rule: {}", name);
                true
            }
            None => {
                debug!("No rule named {} to remove", name);
                false
            }
        }
    }

    /// Look up a rule by name
    pub fn get_rule(&self, name: &str) -> Option<Rule> {
        self.rules.read().iter().find(|r| r.name == name).cloned()
    }

    /// Snapshot of all rules in insertion order
    pub fn list_rules(&self) -> Vec<Rule> {
        self.rules.read().clone()
    }

    /// Snapshot of the enabled rules in insertion order
    pub fn list_enabled_rules(&self) -> Vec<Rule> {
        self.rules
            .read()
            .iter()
            .filter(|r| r.enabled)
            .cloned()
            .collect()
    }

    /// Swap the whole working set
    pub fn replace_all(&self, rules: Vec<Rule>) {
        let replacement = RuleStore::with_rules(rules).rules.into_inner();
        info!("Replacing rule set ({} rules)", replacement.len());
        *self.rules.write() = replacement;
    }

    pub fn len(&self) -> usize {
        self.rules.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.read().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rule::RuleKind;

    fn rule(name: &str) -> Rule {
        Rule::new(name, format!("{} rule", name), RuleKind::default_keywords())
    }

    #[test]
    fn test_add_appends_in_order() {
        let store = RuleStore::new();
        store.add_rule(rule("a"));
        store.add_rule(rule("b"));
        store.add_rule(rule("c"));
        let names: Vec<String> = store.list_rules().into_iter().map(|r| r.name).collect();
        assert_eq!(names, vec!["a", "b", "c"]);
    }

    #[test]
    fn test_add_replaces_in_place() {
        let store = RuleStore::with_rules(vec![rule("a"), rule("b"), rule("c")]);
        store.add_rule(rule("b").with_enabled(false));

        let rules = store.list_rules();
        assert_eq!(rules.len(), 3);
        assert_eq!(rules[1].name, "b");
        assert!(!rules[1].enabled);
    }

    #[test]
    fn test_remove_unknown_leaves_store_unchanged() {
        let store = RuleStore::with_rules(vec![rule("a")]);
        let before = store.list_rules();
        assert!(!store.remove_rule("missing"));
        assert_eq!(store.list_rules(), before);
    }

    #[test]
    fn test_remove_existing_then_absent() {
        let store = RuleStore::with_rules(vec![rule("a"), rule("b")]);
        assert!(store.remove_rule("a"));
        assert!(store.get_rule("a").is_none());
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_enabled_view_filters() {
        let store = RuleStore::with_rules(vec![rule("a"), rule("b").with_enabled(false), rule("c")]);
        let names: Vec<String> = store
            .list_enabled_rules()
            .into_iter()
            .map(|r| r.name)
            .collect();
        assert_eq!(names, vec!["a", "c"]);
    }

    #[test]
    fn test_snapshots_are_detached() {
        let store = RuleStore::with_rules(vec![rule("a")]);
        let mut snapshot = store.list_rules();
        snapshot.push(rule("z"));
        snapshot[0].enabled = false;
        assert_eq!(store.len(), 1);
        assert!(store.get_rule("a").unwrap().enabled);
    }

    #[test]
    fn test_replace_all_collapses_duplicates() {
        let store = RuleStore::with_rules(vec![rule("a")]);
        store.replace_all(vec![rule("x"), rule("y"), rule("x").with_enabled(false)]);
        let rules = store.list_rules();
        assert_eq!(rules.len(), 2);
        assert_eq!(rules[0].name, "x");
        assert!(!rules[0].enabled);
    }
}
