//! Payload type definitions
//!
//! These types mirror the JSON payload emitted by crossplane-style NGINX
//! parsers: one [`Config`] per file discovered while following `include`
//! directives, each holding the directive tree of that file.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Name of the directive that pulls other files into a configuration
pub const INCLUDE_DIRECTIVE: &str = "include";

/// Parse status of a payload or of a single file
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Status {
    #[default]
    Ok,
    Failed,
}

impl Status {
    pub fn is_failed(self) -> bool {
        self == Status::Failed
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Status::Ok => write!(f, "ok"),
            Status::Failed => write!(f, "failed"),
        }
    }
}

/// One configuration statement, optionally opening a nested block
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Directive {
    /// Directive name
    pub directive: String,

    /// Line in the originating file
    #[serde(default)]
    pub line: usize,

    /// Arguments, in source order
    #[serde(default)]
    pub args: Vec<String>,

    /// Indices into [`Payload::config`] of the files this `include` resolved to.
    ///
    /// `None` when the include was not resolved (single-file parsing).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub includes: Option<Vec<usize>>,

    /// Child directives of a block directive
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub block: Option<Vec<Directive>>,
}

impl Directive {
    pub fn new(directive: impl Into<String>, line: usize) -> Self {
        Self {
            directive: directive.into(),
            line,
            args: Vec::new(),
            includes: None,
            block: None,
        }
    }

    pub fn with_args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args = args.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_block(mut self, block: Vec<Directive>) -> Self {
        self.block = Some(block);
        self
    }

    /// Build a resolved `include` pointing at the given config indices
    pub fn include(line: usize, target: impl Into<String>, indices: Vec<usize>) -> Self {
        Self {
            directive: INCLUDE_DIRECTIVE.to_string(),
            line,
            args: vec![target.into()],
            includes: Some(indices),
            block: None,
        }
    }

    /// True when the directive carries a non-empty block
    pub fn is_block(&self) -> bool {
        self.block.as_ref().is_some_and(|b| !b.is_empty())
    }

    /// True for an `include` whose targets were resolved by the parser
    pub fn is_include(&self) -> bool {
        self.directive == INCLUDE_DIRECTIVE && self.includes.is_some()
    }
}

impl fmt::Display for Directive {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.directive)?;
        for arg in &self.args {
            write!(f, " {}", arg)?;
        }
        if self.block.is_some() {
            write!(f, " {{ ... }}")
        } else {
            write!(f, ";")
        }
    }
}

/// A parse error recorded against a single file
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ConfigError {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub line: Option<usize>,
    pub error: String,
}

impl ConfigError {
    pub fn new(line: Option<usize>, error: impl Into<String>) -> Self {
        Self {
            line,
            error: error.into(),
        }
    }
}

/// A parse error recorded at payload level
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PayloadError {
    pub file: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub line: Option<usize>,
    pub error: String,
}

/// The parsed content of one file
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct Config {
    /// File identifier (usually the path)
    pub file: String,

    #[serde(default)]
    pub status: Status,

    #[serde(default)]
    pub errors: Vec<ConfigError>,

    /// Top-level directives of the file
    #[serde(default)]
    pub parsed: Vec<Directive>,
}

impl Config {
    pub fn new(file: impl Into<String>, parsed: Vec<Directive>) -> Self {
        Self {
            file: file.into(),
            status: Status::Ok,
            errors: Vec::new(),
            parsed,
        }
    }

    /// Count every directive in the tree, nested ones included
    pub fn directive_count(&self) -> usize {
        fn count(block: &[Directive]) -> usize {
            block
                .iter()
                .map(|d| 1 + d.block.as_deref().map_or(0, count))
                .sum()
        }
        count(&self.parsed)
    }
}

/// Every file discovered while resolving includes, not yet merged.
///
/// `config[0]` is the root file.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct Payload {
    #[serde(default)]
    pub status: Status,

    #[serde(default)]
    pub errors: Vec<PayloadError>,

    #[serde(default)]
    pub config: Vec<Config>,
}

impl Payload {
    pub fn new(config: Vec<Config>) -> Self {
        let status = if config.iter().any(|c| c.status.is_failed()) {
            Status::Failed
        } else {
            Status::Ok
        };
        Self {
            status,
            errors: Vec::new(),
            config,
        }
    }

    /// The root file, if any
    pub fn root(&self) -> Option<&Config> {
        self.config.first()
    }
}
