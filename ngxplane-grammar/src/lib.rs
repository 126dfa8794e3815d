//! ngxplane Grammar
//!
//! Derives the directive grammar of an NGINX distribution (or third-party
//! module) from its C source. Each `ngx_command_t` entry becomes a
//! [`GrammarRule`]: the directive's legal contexts, how many arguments it
//! takes and whether it opens a block.
//!
//! # Pipeline
//!
//! 1. [`extract`]: find `ngx_command_t` arrays and pull out name/bitmask pairs
//! 2. [`normalize`]: map bitmask tokens to [`Symbol`]s
//! 3. [`infer`]: add a context for arrays known to omit one
//! 4. [`overrides`]: block-to-arity rewrite, forced rules, allowlist filter
//! 5. [`render`]: emit the resulting [`GrammarTable`]
//!
//! # Example
//!
//! ```no_run
//! use ngxplane_grammar::{BuildOptions, GrammarBuilder, GrammarSettings};
//! use std::path::Path;
//!
//! let settings = GrammarSettings::default();
//! let table = GrammarBuilder::new(&settings)
//!     .build(Path::new("nginx/src"), &BuildOptions::default())
//!     .unwrap();
//! assert!(table.lookup("server").is_some());
//! ```

pub mod build;
pub mod extract;
pub mod infer;
pub mod lexer;
pub mod normalize;
pub mod overrides;
pub mod render;
pub mod rule;
pub mod settings;
pub mod symbol;
pub mod table;

pub use build::{BuildError, BuildOptions, GrammarBuilder};
pub use extract::{ExtractError, PatternExtractor, RawDirectives, RawEntry, SourceExtractor};
pub use normalize::{TokenMap, UnknownSymbol};
pub use overrides::{OverrideError, OverrideMerger, OverrideReport};
pub use rule::GrammarRule;
pub use settings::{GrammarSettings, SettingsError, SourceVariant, VariantId};
pub use symbol::Symbol;
pub use table::{GrammarTable, RuleMap};
