//! Grammar rules

use crate::symbol::Symbol;
use serde::{Deserialize, Serialize};
use std::fmt;

/// One legal (arity, contexts) combination for a directive.
///
/// Symbols are kept in source order so that rules built from the same
/// source compare and render identically.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GrammarRule {
    symbols: Vec<Symbol>,
}

impl GrammarRule {
    pub fn new(symbols: Vec<Symbol>) -> Self {
        Self { symbols }
    }

    pub fn symbols(&self) -> &[Symbol] {
        &self.symbols
    }

    pub fn contains(&self, symbol: Symbol) -> bool {
        self.symbols.contains(&symbol)
    }

    /// The rule's arity symbol, when it carries exactly one
    pub fn arity(&self) -> Option<Symbol> {
        let mut arities = self.symbols.iter().copied().filter(|s| s.is_arity());
        match (arities.next(), arities.next()) {
            (Some(arity), None) => Some(arity),
            _ => None,
        }
    }

    pub fn contexts(&self) -> impl Iterator<Item = Symbol> + '_ {
        self.symbols.iter().copied().filter(|s| s.is_context())
    }

    pub fn has_context(&self) -> bool {
        self.contexts().next().is_some()
    }

    pub fn is_block(&self) -> bool {
        self.contains(Symbol::Block)
    }

    pub fn is_flag(&self) -> bool {
        self.contains(Symbol::Flag)
    }

    pub fn is_expr(&self) -> bool {
        self.contains(Symbol::Expr)
    }

    /// Whether an occurrence with `count` arguments satisfies the arity
    pub fn accepts_args(&self, count: usize) -> bool {
        self.symbols.iter().any(|s| s.accepts(count))
    }

    /// A rule without any context symbol is valid anywhere
    pub fn allows_context(&self, context: Symbol) -> bool {
        !self.has_context() || self.contains(Symbol::AnyContext) || self.contains(context)
    }

    pub(crate) fn symbols_mut(&mut self) -> &mut Vec<Symbol> {
        &mut self.symbols
    }
}

impl From<Vec<Symbol>> for GrammarRule {
    fn from(symbols: Vec<Symbol>) -> Self {
        Self::new(symbols)
    }
}

impl From<&[Symbol]> for GrammarRule {
    fn from(symbols: &[Symbol]) -> Self {
        Self::new(symbols.to_vec())
    }
}

impl fmt::Display for GrammarRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (idx, sym) in self.symbols.iter().enumerate() {
            if idx > 0 {
                write!(f, " | ")?;
            }
            write!(f, "{}", sym)?;
        }
        Ok(())
    }
}
