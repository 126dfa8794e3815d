//! ngxplane Core Library
//!
//! This crate provides the data model shared by the ngxplane crates: the
//! parsed-but-unmerged [`Payload`] produced by an NGINX configuration parser,
//! its per-file [`Config`] entries and the [`Directive`] tree, plus the
//! error type used when loading payloads from disk.

pub mod error;
pub mod payload;

pub use error::{Error, Result};
pub use payload::{Config, ConfigError, Directive, Payload, PayloadError, PayloadLoader, Status};

/// ngxplane version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
