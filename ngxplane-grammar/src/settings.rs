//! Grammar build settings
//!
//! The hand-maintained tables the pipeline consults: extra token mappings,
//! array-name context inference, forced rule replacements and the probe
//! names for the block-to-arity rewrite. Built-in defaults can be extended
//! from a TOML file:
//!
//! ```toml
//! [tokens]
//! NGX_MGMT_MAIN_CONF = "mgmt_main"
//!
//! [contexts]
//! ngx_mgmt_block_commands = "mgmt_main"
//!
//! [forced]
//! if = [["http_server", "http_location", "block", "expr", "one_more"]]
//!
//! [rewrite]
//! block_to_arity_probe = ["access_by_lua", "lua_shared_dict", "init_by_lua"]
//! ```

use crate::infer::ContextInference;
use crate::normalize::TokenMap;
use crate::rule::GrammarRule;
use crate::symbol::Symbol;
use crate::table::RuleMap;
use serde::Deserialize;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use thiserror::Error;

/// Directives whose joint presence marks lua-nginx-module source
pub const LUA_PROBE: [&str; 3] = ["access_by_lua", "lua_shared_dict", "init_by_lua"];

/// Settings errors
#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid settings: {0}")]
    Toml(#[from] toml::de::Error),
}

/// On-disk shape of the settings file
#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct SettingsFile {
    tokens: BTreeMap<String, Symbol>,
    contexts: BTreeMap<String, Symbol>,
    forced: BTreeMap<String, Vec<Vec<Symbol>>>,
    rewrite: RewriteSection,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct RewriteSection {
    block_to_arity_probe: Option<Vec<String>>,
}

/// Immutable tables passed into a grammar build
#[derive(Debug, Clone)]
pub struct GrammarSettings {
    pub tokens: TokenMap,
    pub contexts: ContextInference,
    /// Rules that replace whatever was extracted for a directive
    pub forced: RuleMap,
    /// Names that must all be present for the rewrite to apply when no
    /// variant was given
    pub rewrite_probe: Vec<String>,
}

impl Default for GrammarSettings {
    fn default() -> Self {
        use Symbol::*;

        let mut forced = RuleMap::new();
        // `if` takes a parenthesised expression; upstream encodes it as a
        // plain 1MORE block.
        forced.insert(
            "if".to_string(),
            vec![GrammarRule::new(vec![HttpServer, HttpLocation, Block, Expr, OneMore])],
        );

        Self {
            tokens: TokenMap::new(),
            contexts: ContextInference::new(),
            forced,
            rewrite_probe: LUA_PROBE.iter().map(|s| s.to_string()).collect(),
        }
    }
}

impl GrammarSettings {
    /// Load a settings file and merge it over the defaults
    pub fn load(path: impl AsRef<Path>) -> Result<Self, SettingsError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| SettingsError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&content)
    }

    /// Parse TOML settings and merge them over the defaults.
    ///
    /// A `forced` entry with an empty rule list removes that directive's
    /// built-in forced rules.
    pub fn from_toml(content: &str) -> Result<Self, SettingsError> {
        let file: SettingsFile = toml::from_str(content)?;
        let mut settings = Self::default();

        for (token, symbol) in file.tokens {
            settings.tokens.insert(token, symbol);
        }
        for (site, context) in file.contexts {
            settings.contexts.insert(site, context);
        }
        for (name, rules) in file.forced {
            if rules.is_empty() {
                settings.forced.remove(&name);
            } else {
                settings
                    .forced
                    .insert(name, rules.into_iter().map(GrammarRule::new).collect());
            }
        }
        if let Some(probe) = file.rewrite.block_to_arity_probe {
            settings.rewrite_probe = probe;
        }

        Ok(settings)
    }
}

/// Read a documented-directive allowlist: one name per line, `#` comments
pub fn load_allowlist(path: impl AsRef<Path>) -> Result<BTreeSet<String>, SettingsError> {
    let path = path.as_ref();
    let content = std::fs::read_to_string(path).map_err(|source| SettingsError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(parse_allowlist(&content))
}

pub fn parse_allowlist(content: &str) -> BTreeSet<String> {
    content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(str::to_string)
        .collect()
}

/// Which upstream tree a build reads
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SourceVariant {
    Oss,
    Plus,
    Lua,
    HeadersMore,
    Njs,
    Otel,
    AppProtect,
}

impl SourceVariant {
    /// lua-nginx-module encodes `*_by_lua_block` directives as
    /// "block + one fewer argument"
    pub fn rewrites_blocks(self) -> bool {
        self == SourceVariant::Lua
    }

    pub fn name(self) -> &'static str {
        match self {
            SourceVariant::Oss => "oss",
            SourceVariant::Plus => "plus",
            SourceVariant::Lua => "lua",
            SourceVariant::HeadersMore => "headers_more",
            SourceVariant::Njs => "njs",
            SourceVariant::Otel => "otel",
            SourceVariant::AppProtect => "app_protect",
        }
    }
}

impl fmt::Display for SourceVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown source variant '{0}' (expected oss, plus, lua, headers_more, njs, otel or app_protect)")]
pub struct UnknownVariant(pub String);

impl FromStr for SourceVariant {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match normalize_identifier(s).as_str() {
            "oss" => Ok(SourceVariant::Oss),
            "plus" | "nplus" | "n_plus" => Ok(SourceVariant::Plus),
            "lua" => Ok(SourceVariant::Lua),
            "headers_more" => Ok(SourceVariant::HeadersMore),
            "njs" => Ok(SourceVariant::Njs),
            "otel" => Ok(SourceVariant::Otel),
            "app_protect" | "app_protect_wafv5" => Ok(SourceVariant::AppProtect),
            _ => Err(UnknownVariant(s.to_string())),
        }
    }
}

/// Normalized identifier of a generated grammar, e.g. `oss_1_27`,
/// `oss_latest` or `headers_more`
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct VariantId(String);

impl VariantId {
    pub fn new(name: &str, version: Option<&str>) -> Self {
        let mut name = normalize_identifier(name);
        if name.is_empty() || name.starts_with(|c: char| c.is_ascii_digit()) {
            name.insert(0, 'v');
        }
        match version.map(str::trim) {
            None => Self(name),
            Some(v) if v.is_empty() || v.eq_ignore_ascii_case("master") || v.eq_ignore_ascii_case("latest") => {
                Self(format!("{}_latest", name))
            }
            Some(v) => Self(format!("{}_{}", name, normalize_identifier(v))),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Name of the generated table constant
    pub fn const_name(&self) -> String {
        format!("{}_DIRECTIVES", self.0.to_ascii_uppercase())
    }

    /// Name of the generated lookup function
    pub fn fn_name(&self) -> String {
        format!("match_{}", self.0)
    }
}

impl fmt::Display for VariantId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// camelCase / kebab / dotted input to lower snake_case
fn normalize_identifier(input: &str) -> String {
    let mut out = String::with_capacity(input.len() + 4);
    let mut prev_lower = false;

    for c in input.trim().chars() {
        if c.is_ascii_alphanumeric() {
            if c.is_ascii_uppercase() && prev_lower && !out.ends_with('_') {
                out.push('_');
            }
            out.push(c.to_ascii_lowercase());
            prev_lower = c.is_ascii_lowercase() || c.is_ascii_digit();
        } else {
            if !out.is_empty() && !out.ends_with('_') {
                out.push('_');
            }
            prev_lower = false;
        }
    }

    while out.ends_with('_') {
        out.pop();
    }
    out
}
