//! The final directive grammar

use crate::rule::GrammarRule;
use crate::symbol::Symbol;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Directive name to rules, while the build pipeline still edits it
pub type RuleMap = BTreeMap<String, Vec<GrammarRule>>;

/// Read-only directive grammar for one (distribution, version, module).
///
/// Rules for a name are kept in extraction order and are not deduplicated.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GrammarTable {
    directives: RuleMap,
}

impl GrammarTable {
    pub fn new(directives: RuleMap) -> Self {
        Self { directives }
    }

    /// Build a table from the literal emitted by [`crate::render::render_rust`]
    pub fn from_static(entries: &[(&str, &[&[Symbol]])]) -> Self {
        let directives = entries
            .iter()
            .map(|(name, rules)| {
                let rules = rules.iter().map(|r| GrammarRule::from(*r)).collect();
                (name.to_string(), rules)
            })
            .collect();
        Self { directives }
    }

    /// Rules for `name`, or `None` when the directive is unknown
    pub fn lookup(&self, name: &str) -> Option<&[GrammarRule]> {
        self.directives.get(name).map(Vec::as_slice)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.directives.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.directives.len()
    }

    pub fn is_empty(&self) -> bool {
        self.directives.is_empty()
    }

    /// Directive names in sorted order
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.directives.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[GrammarRule])> {
        self.directives.iter().map(|(k, v)| (k.as_str(), v.as_slice()))
    }

    pub fn into_inner(self) -> RuleMap {
        self.directives
    }
}

impl From<RuleMap> for GrammarTable {
    fn from(directives: RuleMap) -> Self {
        Self::new(directives)
    }
}
