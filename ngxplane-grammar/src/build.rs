//! Grammar build pipeline
//!
//! ```text
//! source tree ──extract──▶ RawDirectives ──normalize + infer──▶ RuleMap
//!             ──overrides──▶ GrammarTable
//! ```

use crate::extract::{ExtractError, PatternExtractor, RawDirectives, SourceExtractor};
use crate::normalize::UnknownSymbol;
use crate::overrides::{OverrideError, OverrideMerger};
use crate::rule::GrammarRule;
use crate::settings::{GrammarSettings, SettingsError, SourceVariant};
use crate::table::{GrammarTable, RuleMap};
use std::collections::BTreeSet;
use std::path::Path;
use thiserror::Error;

/// Grammar build errors
#[derive(Debug, Error)]
pub enum BuildError {
    #[error("Extraction error: {0}")]
    Extract(#[from] ExtractError),

    #[error("Normalization error: {0}")]
    UnknownSymbol(#[from] UnknownSymbol),

    #[error("Override error: {0}")]
    Override(#[from] OverrideError),

    #[error("Settings error: {0}")]
    Settings(#[from] SettingsError),
}

/// Per-build inputs that are not part of the settings
#[derive(Debug, Clone, Default)]
pub struct BuildOptions {
    /// Source distribution tag; `None` falls back to probing
    pub variant: Option<SourceVariant>,
    /// Directive names to keep; `None` keeps everything
    pub allowlist: Option<BTreeSet<String>>,
}

/// Builds a [`GrammarTable`] from a source tree
pub struct GrammarBuilder<'a> {
    settings: &'a GrammarSettings,
    extractor: Box<dyn SourceExtractor + 'a>,
}

impl<'a> GrammarBuilder<'a> {
    pub fn new(settings: &'a GrammarSettings) -> Self {
        Self {
            settings,
            extractor: Box::new(PatternExtractor::new()),
        }
    }

    /// Replace the default regex extractor
    pub fn with_extractor(mut self, extractor: impl SourceExtractor + 'a) -> Self {
        self.extractor = Box::new(extractor);
        self
    }

    /// Run the whole pipeline over `root`
    pub fn build(&self, root: &Path, options: &BuildOptions) -> Result<GrammarTable, BuildError> {
        tracing::info!("Building grammar from {}", root.display());

        let raw = self.extractor.extract(root)?;
        let mut rules = self.normalize(raw)?;

        let report = OverrideMerger::new(self.settings).apply(
            &mut rules,
            options.variant,
            options.allowlist.as_ref(),
        )?;
        tracing::debug!("Override report: {:?}", report);

        let table = GrammarTable::new(rules);
        tracing::info!("Grammar has {} directive(s)", table.len());
        Ok(table)
    }

    /// Normalize every raw entry and fill in inferred contexts
    pub fn normalize(&self, raw: RawDirectives) -> Result<RuleMap, UnknownSymbol> {
        let mut rules = RuleMap::new();

        for (name, entries) in raw {
            let mut list = Vec::with_capacity(entries.len());
            for entry in &entries {
                let normalized = self.settings.tokens.normalize(&name, entry)?;
                let mut symbols = normalized.symbols;
                self.settings
                    .contexts
                    .apply(&entry.site, &mut symbols, normalized.has_context);

                let rule = GrammarRule::new(symbols);
                if rule.arity().is_none() {
                    tracing::warn!(
                        "Directive '{}' at {}:{} has {} arity symbols: {}",
                        name,
                        entry.file.display(),
                        entry.line,
                        rule.symbols().iter().filter(|s| s.is_arity()).count(),
                        rule
                    );
                }
                list.push(rule);
            }
            rules.insert(name, list);
        }

        Ok(rules)
    }
}
