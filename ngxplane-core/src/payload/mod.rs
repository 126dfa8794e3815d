//! Parsed configuration payloads

mod loader;
mod types;

pub use loader::PayloadLoader;
pub use types::*;
