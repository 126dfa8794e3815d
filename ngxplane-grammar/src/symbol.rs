//! Grammar symbols
//!
//! A directive's grammar is a set of symbols taken from the upstream
//! `ngx_command_t.type` bitmask: how many arguments it takes, whether it
//! opens a block, and which contexts it may appear in.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Family a [`Symbol`] belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SymbolClass {
    /// Argument count, including `flag` (exactly one `on`/`off` argument)
    Arity,
    /// Shape modifiers that combine with an arity symbol
    Kind,
    /// Structural position where the directive is legal
    Context,
    /// Placement hints that are neither arity nor a concrete context
    Placement,
}

/// Canonical grammar symbol
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Symbol {
    // ============================================================
    // Arity
    // ============================================================
    NoArgs,
    Take1,
    Take2,
    Take3,
    Take4,
    Take5,
    Take6,
    Take7,
    Take12,
    Take13,
    Take23,
    Take123,
    Take1234,
    OneMore,
    TwoMore,
    AnyArgs,
    Flag,

    // ============================================================
    // Kind
    // ============================================================
    Block,
    /// Argument list is a parenthesised expression (`if (...)`).
    /// Synthetic: never spelled in upstream source.
    Expr,

    // ============================================================
    // Contexts
    // ============================================================
    Main,
    Event,
    MailMain,
    MailServer,
    StreamMain,
    StreamServer,
    StreamUpstream,
    HttpMain,
    HttpServer,
    HttpLocation,
    HttpUpstream,
    HttpServerIf,
    HttpLocationIf,
    HttpLimitExcept,
    MgmtMain,

    // ============================================================
    // Placement
    // ============================================================
    Direct,
    AnyContext,
}

/// Arity symbols ordered by the exact argument count they take
const TAKE_N: [Symbol; 8] = [
    Symbol::NoArgs,
    Symbol::Take1,
    Symbol::Take2,
    Symbol::Take3,
    Symbol::Take4,
    Symbol::Take5,
    Symbol::Take6,
    Symbol::Take7,
];

impl Symbol {
    /// Every symbol, in declaration order
    pub const ALL: [Symbol; 36] = [
        Symbol::NoArgs,
        Symbol::Take1,
        Symbol::Take2,
        Symbol::Take3,
        Symbol::Take4,
        Symbol::Take5,
        Symbol::Take6,
        Symbol::Take7,
        Symbol::Take12,
        Symbol::Take13,
        Symbol::Take23,
        Symbol::Take123,
        Symbol::Take1234,
        Symbol::OneMore,
        Symbol::TwoMore,
        Symbol::AnyArgs,
        Symbol::Flag,
        Symbol::Block,
        Symbol::Expr,
        Symbol::Main,
        Symbol::Event,
        Symbol::MailMain,
        Symbol::MailServer,
        Symbol::StreamMain,
        Symbol::StreamServer,
        Symbol::StreamUpstream,
        Symbol::HttpMain,
        Symbol::HttpServer,
        Symbol::HttpLocation,
        Symbol::HttpUpstream,
        Symbol::HttpServerIf,
        Symbol::HttpLocationIf,
        Symbol::HttpLimitExcept,
        Symbol::MgmtMain,
        Symbol::Direct,
        Symbol::AnyContext,
    ];

    /// Largest exact argument count a `takeN` symbol can express
    pub const MAX_TAKE: usize = TAKE_N.len() - 1;

    pub fn class(self) -> SymbolClass {
        use Symbol::*;
        match self {
            NoArgs | Take1 | Take2 | Take3 | Take4 | Take5 | Take6 | Take7 | Take12 | Take13
            | Take23 | Take123 | Take1234 | OneMore | TwoMore | AnyArgs | Flag => SymbolClass::Arity,
            Block | Expr => SymbolClass::Kind,
            Main | Event | MailMain | MailServer | StreamMain | StreamServer | StreamUpstream
            | HttpMain | HttpServer | HttpLocation | HttpUpstream | HttpServerIf
            | HttpLocationIf | HttpLimitExcept | MgmtMain => SymbolClass::Context,
            Direct | AnyContext => SymbolClass::Placement,
        }
    }

    pub fn is_arity(self) -> bool {
        self.class() == SymbolClass::Arity
    }

    pub fn is_context(self) -> bool {
        self.class() == SymbolClass::Context
    }

    /// Canonical name, as used in settings files and JSON tables
    pub fn name(self) -> &'static str {
        use Symbol::*;
        match self {
            NoArgs => "no_args",
            Take1 => "take1",
            Take2 => "take2",
            Take3 => "take3",
            Take4 => "take4",
            Take5 => "take5",
            Take6 => "take6",
            Take7 => "take7",
            Take12 => "take12",
            Take13 => "take13",
            Take23 => "take23",
            Take123 => "take123",
            Take1234 => "take1234",
            OneMore => "one_more",
            TwoMore => "two_more",
            AnyArgs => "any_args",
            Flag => "flag",
            Block => "block",
            Expr => "expr",
            Main => "main",
            Event => "event",
            MailMain => "mail_main",
            MailServer => "mail_server",
            StreamMain => "stream_main",
            StreamServer => "stream_server",
            StreamUpstream => "stream_upstream",
            HttpMain => "http_main",
            HttpServer => "http_server",
            HttpLocation => "http_location",
            HttpUpstream => "http_upstream",
            HttpServerIf => "http_server_if",
            HttpLocationIf => "http_location_if",
            HttpLimitExcept => "http_limit_except",
            MgmtMain => "mgmt_main",
            Direct => "direct",
            AnyContext => "any_context",
        }
    }

    /// Spelling of the symbol in upstream C source, if it has one
    pub fn upstream_name(self) -> Option<&'static str> {
        use Symbol::*;
        let name = match self {
            NoArgs => "NGX_CONF_NOARGS",
            Take1 => "NGX_CONF_TAKE1",
            Take2 => "NGX_CONF_TAKE2",
            Take3 => "NGX_CONF_TAKE3",
            Take4 => "NGX_CONF_TAKE4",
            Take5 => "NGX_CONF_TAKE5",
            Take6 => "NGX_CONF_TAKE6",
            Take7 => "NGX_CONF_TAKE7",
            Take12 => "NGX_CONF_TAKE12",
            Take13 => "NGX_CONF_TAKE13",
            Take23 => "NGX_CONF_TAKE23",
            Take123 => "NGX_CONF_TAKE123",
            Take1234 => "NGX_CONF_TAKE1234",
            OneMore => "NGX_CONF_1MORE",
            TwoMore => "NGX_CONF_2MORE",
            AnyArgs => "NGX_CONF_ANY",
            Flag => "NGX_CONF_FLAG",
            Block => "NGX_CONF_BLOCK",
            Main => "NGX_MAIN_CONF",
            Event => "NGX_EVENT_CONF",
            MailMain => "NGX_MAIL_MAIN_CONF",
            MailServer => "NGX_MAIL_SRV_CONF",
            StreamMain => "NGX_STREAM_MAIN_CONF",
            StreamServer => "NGX_STREAM_SRV_CONF",
            StreamUpstream => "NGX_STREAM_UPS_CONF",
            HttpMain => "NGX_HTTP_MAIN_CONF",
            HttpServer => "NGX_HTTP_SRV_CONF",
            HttpLocation => "NGX_HTTP_LOC_CONF",
            HttpUpstream => "NGX_HTTP_UPS_CONF",
            HttpServerIf => "NGX_HTTP_SIF_CONF",
            HttpLocationIf => "NGX_HTTP_LIF_CONF",
            HttpLimitExcept => "NGX_HTTP_LMT_CONF",
            Direct => "NGX_DIRECT_CONF",
            AnyContext => "NGX_ANY_CONF",
            // mgmt directives never carry an inline context; it is inferred
            // from the array they are declared in.
            Expr | MgmtMain => return None,
        };
        Some(name)
    }

    /// Exact argument count for `no_args` and `take1`..`take7`
    pub fn take_count(self) -> Option<usize> {
        TAKE_N.iter().position(|s| *s == self)
    }

    /// The `takeN` symbol for an exact argument count
    pub fn take(count: usize) -> Option<Symbol> {
        TAKE_N.get(count).copied()
    }

    /// Whether an arity symbol admits `count` arguments.
    ///
    /// Always false for non-arity symbols.
    pub fn accepts(self, count: usize) -> bool {
        use Symbol::*;
        match self {
            Take12 => (1..=2).contains(&count),
            Take13 => count == 1 || count == 3,
            Take23 => (2..=3).contains(&count),
            Take123 => (1..=3).contains(&count),
            Take1234 => (1..=4).contains(&count),
            OneMore => count >= 1,
            TwoMore => count >= 2,
            AnyArgs => true,
            Flag => count == 1,
            other => other.take_count() == Some(count),
        }
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Error returned when a canonical symbol name is not recognised
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown grammar symbol '{0}'")]
pub struct UnknownSymbolName(pub String);

impl FromStr for Symbol {
    type Err = UnknownSymbolName;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Symbol::ALL
            .iter()
            .copied()
            .find(|sym| sym.name() == s)
            .ok_or_else(|| UnknownSymbolName(s.to_string()))
    }
}
