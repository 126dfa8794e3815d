//! Context inference for directives declared without an inline context

use crate::symbol::Symbol;
use std::collections::HashMap;

/// Array name of the N+ management module's directives, which carry no
/// context bits and are only legal inside `mgmt {}`.
pub const MGMT_BLOCK_COMMANDS: &str = "ngx_mgmt_block_commands";

/// Directive-array name to the context its directives belong to
#[derive(Debug, Clone)]
pub struct ContextInference {
    sites: HashMap<String, Symbol>,
}

impl ContextInference {
    pub fn new() -> Self {
        let mut sites = HashMap::new();
        sites.insert(MGMT_BLOCK_COMMANDS.to_string(), Symbol::MgmtMain);
        Self { sites }
    }

    /// A table with no entries
    pub fn empty() -> Self {
        Self {
            sites: HashMap::new(),
        }
    }

    pub fn insert(&mut self, site: impl Into<String>, context: Symbol) {
        self.sites.insert(site.into(), context);
    }

    pub fn get(&self, site: &str) -> Option<Symbol> {
        self.sites.get(site).copied()
    }

    /// Append the site's context when the symbols carry none
    pub fn apply(&self, site: &str, symbols: &mut Vec<Symbol>, has_context: bool) {
        if has_context {
            return;
        }
        if let Some(context) = self.get(site) {
            tracing::debug!("Inferred context {} from array {}", context, site);
            symbols.push(context);
        }
    }
}

impl Default for ContextInference {
    fn default() -> Self {
        Self::new()
    }
}
