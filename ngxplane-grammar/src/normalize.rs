//! Token normalization
//!
//! Maps upstream bitmask tokens (`NGX_CONF_TAKE1`) to canonical [`Symbol`]s.
//! The vocabulary is closed: a token nobody mapped means upstream grew a new
//! encoding, and the build stops instead of emitting an incomplete rule.

use crate::extract::RawEntry;
use crate::symbol::Symbol;
use std::collections::HashMap;
use std::ops::Range;
use std::path::PathBuf;
use thiserror::Error;

/// A bitmask token missing from the [`TokenMap`]
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("directive '{directive}' uses unknown bitmask token '{token}' ({}:{line})", file.display())]
pub struct UnknownSymbol {
    pub directive: String,
    pub token: String,
    pub file: PathBuf,
    pub line: usize,
    pub span: Range<usize>,
}

/// The normalized form of one raw entry
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Normalized {
    pub symbols: Vec<Symbol>,
    /// Whether any symbol is a context
    pub has_context: bool,
}

/// Raw token to canonical symbol table
#[derive(Debug, Clone)]
pub struct TokenMap {
    tokens: HashMap<String, Symbol>,
}

impl TokenMap {
    /// Map holding every symbol's upstream spelling
    pub fn new() -> Self {
        let tokens = Symbol::ALL
            .iter()
            .filter_map(|sym| sym.upstream_name().map(|name| (name.to_string(), *sym)))
            .collect();
        Self { tokens }
    }

    /// Add or replace a mapping
    pub fn insert(&mut self, token: impl Into<String>, symbol: Symbol) {
        self.tokens.insert(token.into(), symbol);
    }

    pub fn get(&self, token: &str) -> Option<Symbol> {
        self.tokens.get(token).copied()
    }

    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    /// Normalize one entry's tokens, preserving their order
    pub fn normalize(&self, directive: &str, entry: &RawEntry) -> Result<Normalized, UnknownSymbol> {
        let mut symbols = Vec::with_capacity(entry.tokens.len());
        let mut has_context = false;

        for token in &entry.tokens {
            let symbol = self.get(token).ok_or_else(|| UnknownSymbol {
                directive: directive.to_string(),
                token: token.clone(),
                file: entry.file.clone(),
                line: entry.line,
                span: entry.span.clone(),
            })?;
            has_context |= symbol.is_context();
            symbols.push(symbol);
        }

        Ok(Normalized { symbols, has_context })
    }
}

impl Default for TokenMap {
    fn default() -> Self {
        Self::new()
    }
}
