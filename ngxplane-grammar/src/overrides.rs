//! Override stages applied after extraction
//!
//! 1. Structural rewrite: `block + takeN` becomes `take(N+1)` for sources
//!    that count the block body as an argument (lua-nginx-module).
//! 2. Forced replacement from [`GrammarSettings::forced`].
//! 3. Documented-directive filter against an allowlist.
//!
//! The order is fixed: the rewrite sees raw rules, forced rules win over the
//! rewrite, and the filter only removes whole entries.

use crate::rule::GrammarRule;
use crate::settings::{GrammarSettings, SourceVariant};
use crate::symbol::Symbol;
use crate::table::RuleMap;
use std::collections::BTreeSet;
use thiserror::Error;

/// Override errors
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum OverrideError {
    #[error("too many arguments for block directive '{directive}': {symbol} has no higher take-N")]
    ArityOverflow { directive: String, symbol: Symbol },
}

/// What the override stages changed
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct OverrideReport {
    /// Rules that lost their block symbol
    pub rewritten: usize,
    /// Directives whose rules were replaced
    pub forced: usize,
    /// Directives dropped by the allowlist
    pub filtered: usize,
}

/// Applies the three override stages with one set of settings
pub struct OverrideMerger<'a> {
    settings: &'a GrammarSettings,
}

impl<'a> OverrideMerger<'a> {
    pub fn new(settings: &'a GrammarSettings) -> Self {
        Self { settings }
    }

    /// Run every stage in order
    pub fn apply(
        &self,
        rules: &mut RuleMap,
        variant: Option<SourceVariant>,
        allowlist: Option<&BTreeSet<String>>,
    ) -> Result<OverrideReport, OverrideError> {
        let mut report = OverrideReport::default();

        if self.rewrite_applies(rules, variant) {
            report.rewritten = rewrite_block_arity(rules)?;
            tracing::info!("Block-to-arity rewrite changed {} rule(s)", report.rewritten);
        }

        report.forced = apply_forced(rules, &self.settings.forced);

        if let Some(allowlist) = allowlist {
            report.filtered = filter_documented(rules, allowlist);
            tracing::info!(
                "Dropped {} undocumented directive(s), {} remain",
                report.filtered,
                rules.len()
            );
        }

        Ok(report)
    }

    /// The variant tag decides; without one, probe for the marker directives
    pub fn rewrite_applies(&self, rules: &RuleMap, variant: Option<SourceVariant>) -> bool {
        match variant {
            Some(variant) => variant.rewrites_blocks(),
            None => {
                let probe = &self.settings.rewrite_probe;
                let found = !probe.is_empty() && probe.iter().all(|name| rules.contains_key(name));
                if found {
                    tracing::debug!("No source variant given; probe {:?} matched", probe);
                }
                found
            }
        }
    }
}

/// Drop `block` from every rule carrying it and bump its takeN symbol.
///
/// Returns the number of rules changed. Rules without `block` are untouched,
/// so a second run is a no-op.
pub fn rewrite_block_arity(rules: &mut RuleMap) -> Result<usize, OverrideError> {
    let mut rewritten = 0;

    for (directive, list) in rules.iter_mut() {
        for rule in list.iter_mut().filter(|r| r.is_block()) {
            let mut symbols = Vec::with_capacity(rule.symbols().len());
            for &symbol in rule.symbols() {
                match symbol.take_count() {
                    _ if symbol == Symbol::Block => {}
                    Some(count) => {
                        let bumped = Symbol::take(count + 1).ok_or_else(|| OverrideError::ArityOverflow {
                            directive: directive.clone(),
                            symbol,
                        })?;
                        symbols.push(bumped);
                    }
                    None => symbols.push(symbol),
                }
            }
            *rule.symbols_mut() = symbols;
            rewritten += 1;
        }
    }

    Ok(rewritten)
}

/// Overwrite extracted entries with forced rules.
///
/// Only directives already in `rules` are replaced; a forced rule never adds
/// a directive the source does not define.
pub fn apply_forced(rules: &mut RuleMap, forced: &RuleMap) -> usize {
    let mut replaced = 0;
    for (name, forced_rules) in forced {
        if let Some(entry) = rules.get_mut(name) {
            tracing::debug!("Forcing rules for '{}'", name);
            *entry = forced_rules.iter().cloned().collect::<Vec<GrammarRule>>();
            replaced += 1;
        }
    }
    replaced
}

/// Remove every entry whose name is not in `allowlist`
pub fn filter_documented(rules: &mut RuleMap, allowlist: &BTreeSet<String>) -> usize {
    let before = rules.len();
    rules.retain(|name, _| allowlist.contains(name));
    before - rules.len()
}
