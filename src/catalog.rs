//! Rule catalog: id -> rule

use crate::rule::Rule;
use crate::rules::builtin_rules;
use std::collections::HashMap;
use std::sync::{Arc, LazyLock};
use thiserror::Error;

static BUILTIN: LazyLock<Arc<Catalog>> = LazyLock::new(|| Arc::new(Catalog::indexed(builtin_rules())));

/// Error building a catalog
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CatalogError {
    #[error("duplicate rule id: {0}")]
    DuplicateRule(String),

    #[error("rule id '{0}' is reserved")]
    ReservedId(String),
}

/// An immutable set of rules with unique ids
#[derive(Debug, Clone)]
pub struct Catalog {
    rules: Vec<Rule>,
    index: HashMap<String, usize>,
}

impl Catalog {
    /// Build a catalog, rejecting duplicate and reserved ids
    pub fn new(rules: Vec<Rule>) -> Result<Self, CatalogError> {
        let mut index = HashMap::with_capacity(rules.len());
        for (i, rule) in rules.iter().enumerate() {
            if rule.id == crate::diagnostic::PARSE_ERROR
                || rule.id == crate::diagnostic::INTERNAL_RULE_ERROR
            {
                return Err(CatalogError::ReservedId(rule.id.clone()));
            }
            if index.insert(rule.id.clone(), i).is_some() {
                return Err(CatalogError::DuplicateRule(rule.id.clone()));
            }
        }
        Ok(Self { rules, index })
    }

    fn indexed(rules: Vec<Rule>) -> Self {
        let index = rules
            .iter()
            .enumerate()
            .map(|(i, r)| (r.id.clone(), i))
            .collect();
        Self { rules, index }
    }

    /// The built-in catalog, shared across engines
    pub fn shared() -> Arc<Catalog> {
        Arc::clone(&BUILTIN)
    }

    pub fn get(&self, id: &str) -> Option<&Rule> {
        self.index.get(id).map(|&i| &self.rules[i])
    }

    /// Rules in registration order
    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.rules.iter().map(|r| r.id.as_str())
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rule::{Emitter, RuleContext, Unit};

    fn noop(_: &RuleContext<'_>, _: &Unit<'_>, _: &mut Emitter<'_>) {}

    #[test]
    fn test_builtin_ids_are_unique() {
        let catalog = Catalog::new(builtin_rules()).unwrap();
        assert_eq!(catalog.len(), Catalog::shared().len());
    }

    #[test]
    fn test_duplicate_rejected() {
        let rules = vec![Rule::new("a", "m", noop), Rule::new("a", "m", noop)];
        assert_eq!(
            Catalog::new(rules).unwrap_err(),
            CatalogError::DuplicateRule("a".to_string())
        );
    }

    #[test]
    fn test_reserved_rejected() {
        let rules = vec![Rule::new("parse-error", "m", noop)];
        assert!(matches!(
            Catalog::new(rules),
            Err(CatalogError::ReservedId(_))
        ));
    }

    #[test]
    fn test_lookup() {
        let catalog = Catalog::shared();
        assert!(catalog.get("zero-unit").is_some());
        assert!(catalog.get("missing").is_none());
        assert!(!catalog.is_empty());
    }

    #[test]
    fn test_every_rule_has_targets_and_description() {
        for rule in Catalog::shared().rules() {
            assert!(!rule.targets.is_empty(), "{} has no targets", rule.id);
            assert!(rule.description.is_some(), "{} has no description", rule.id);
        }
    }
}
