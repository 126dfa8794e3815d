//! Directive validation against grammar tables
//!
//! Walks an assembled configuration, tracking the block context each
//! directive appears in, and checks it against the union of the rules that
//! one or more [`GrammarTable`]s define for its name.

use crate::assemble::{ConfigAssembler, IncludeError};
use ngxplane_core::{Config, ConfigError, Directive, Payload};
use ngxplane_grammar::{GrammarRule, GrammarTable, Symbol};
use thiserror::Error;

/// What is wrong with a directive
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DiagnosticKind {
    #[error("unknown directive")]
    UnknownDirective,

    #[error("directive is not allowed here")]
    NotAllowedHere,

    #[error("invalid number of arguments: {0}")]
    WrongArgCount(usize),

    #[error("invalid value \"{0}\", it must be \"on\" or \"off\"")]
    NotAFlag(String),

    #[error("invalid condition, it must be enclosed in \"(\" and \")\"")]
    BadExpression,

    #[error("directive has no opening \"{{\"")]
    ExpectedBlock,

    #[error("directive is not terminated by \";\"")]
    UnexpectedBlock,
}

/// A problem found in one directive
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{file}:{line}: \"{directive}\" {kind}")]
pub struct Diagnostic {
    pub file: String,
    pub line: usize,
    pub directive: String,
    pub kind: DiagnosticKind,
}

/// Context a block directive opens when it appears in `parent`.
///
/// `None` for blocks the analyzer does not know how to descend into.
pub fn block_context(parent: Symbol, name: &str) -> Option<Symbol> {
    use Symbol::*;
    let context = match (parent, name) {
        (Main, "events") => Event,
        (Main, "http") => HttpMain,
        (Main, "stream") => StreamMain,
        (Main, "mail") => MailMain,
        (Main, "mgmt") => MgmtMain,
        (HttpMain, "server") => HttpServer,
        (HttpMain, "upstream") => HttpUpstream,
        (HttpServer, "location") => HttpLocation,
        (HttpServer, "if") => HttpServerIf,
        (HttpLocation, "location") => HttpLocation,
        (HttpLocation, "if") => HttpLocationIf,
        (HttpLocation, "limit_except") => HttpLimitExcept,
        (StreamMain, "server") => StreamServer,
        (StreamMain, "upstream") => StreamUpstream,
        (MailMain, "server") => MailServer,
        _ => return None,
    };
    Some(context)
}

/// Whether `value` is a valid `on`/`off` flag
pub fn valid_flag(value: &str) -> bool {
    value.eq_ignore_ascii_case("on") || value.eq_ignore_ascii_case("off")
}

/// Whether `args` form a non-empty parenthesised expression
pub fn valid_expr(args: &[String]) -> bool {
    let (Some(first), Some(last)) = (args.first(), args.last()) else {
        return false;
    };
    if !first.starts_with('(') || !last.ends_with(')') {
        return false;
    }
    match args.len() {
        // `()`
        1 => first.len() > 2,
        // `(` `)`
        2 => first.len() > 1 || last.len() > 1,
        _ => true,
    }
}

/// The assembled config of a payload and what the analyzer found in it
#[derive(Debug, Default)]
pub struct Analysis {
    /// `None` when the payload has no configs
    pub config: Option<Config>,
    pub diagnostics: Vec<Diagnostic>,
}

impl Analysis {
    /// Whether the combined config failed to parse somewhere
    pub fn parse_failed(&self) -> bool {
        self.config.as_ref().is_some_and(|c| c.status.is_failed())
    }

    /// Parse errors aggregated from every file of the payload
    pub fn parse_errors(&self) -> &[ConfigError] {
        self.config.as_ref().map(|c| c.errors.as_slice()).unwrap_or_default()
    }

    pub fn is_clean(&self) -> bool {
        self.diagnostics.is_empty() && !self.parse_failed() && self.parse_errors().is_empty()
    }
}

/// Checks configurations against a set of grammar tables
pub struct Analyzer<'g> {
    tables: Vec<&'g GrammarTable>,
}

impl<'g> Analyzer<'g> {
    pub fn new(tables: &[&'g GrammarTable]) -> Self {
        Self {
            tables: tables.to_vec(),
        }
    }

    /// Every rule any table defines for `name`
    pub fn rules(&self, name: &str) -> Vec<&'g GrammarRule> {
        self.tables
            .iter()
            .filter_map(|&table| table.lookup(name))
            .flatten()
            .collect()
    }

    /// Check one config, starting in the main context
    pub fn analyze(&self, config: &Config) -> Vec<Diagnostic> {
        let mut out = Vec::new();
        self.walk(&config.file, &config.parsed, Symbol::Main, &mut out);
        tracing::debug!("{}: {} diagnostic(s)", config.file, out.len());
        out
    }

    /// Assemble the payload's includes, then check the combined config
    pub fn analyze_payload(&self, payload: &Payload) -> Result<Analysis, IncludeError> {
        let config = ConfigAssembler::new(payload).assemble()?;
        let diagnostics = config.as_ref().map(|c| self.analyze(c)).unwrap_or_default();
        Ok(Analysis { config, diagnostics })
    }

    fn walk(&self, file: &str, block: &[Directive], context: Symbol, out: &mut Vec<Diagnostic>) {
        for directive in block {
            if let Some(kind) = self.check(directive, context) {
                out.push(Diagnostic {
                    file: file.to_string(),
                    line: directive.line,
                    directive: directive.directive.clone(),
                    kind,
                });
            }

            let Some(children) = directive.block.as_deref() else {
                continue;
            };
            match block_context(context, &directive.directive) {
                Some(inner) => self.walk(file, children, inner, out),
                None => tracing::trace!(
                    "Skipping children of '{}' at {}:{}",
                    directive.directive,
                    file,
                    directive.line
                ),
            }
        }
    }

    fn check(&self, directive: &Directive, context: Symbol) -> Option<DiagnosticKind> {
        let rules = self.rules(&directive.directive);
        if rules.is_empty() {
            return Some(DiagnosticKind::UnknownDirective);
        }

        let mut last = Some(DiagnosticKind::NotAllowedHere);
        for rule in rules.into_iter().filter(|r| r.allows_context(context)) {
            match check_rule(rule, directive) {
                Ok(()) => return None,
                Err(kind) => last = Some(kind),
            }
        }
        last
    }
}

fn check_rule(rule: &GrammarRule, directive: &Directive) -> Result<(), DiagnosticKind> {
    let has_block = directive.block.is_some();
    if rule.is_block() && !has_block {
        return Err(DiagnosticKind::ExpectedBlock);
    }
    if !rule.is_block() && has_block {
        return Err(DiagnosticKind::UnexpectedBlock);
    }

    let args = &directive.args;
    if rule.is_expr() {
        return if valid_expr(args) {
            Ok(())
        } else {
            Err(DiagnosticKind::BadExpression)
        };
    }
    if !rule.accepts_args(args.len()) {
        return Err(DiagnosticKind::WrongArgCount(args.len()));
    }
    // A flag rule may carry a second arity that admits zero arguments
    match args.first() {
        Some(value) if rule.is_flag() && !valid_flag(value) => {
            Err(DiagnosticKind::NotAFlag(value.clone()))
        }
        _ => Ok(()),
    }
}
