//! ngxplane Configuration
//!
//! Works on the payload a crossplane-style parser produces for an NGINX
//! configuration:
//!
//! - [`assemble`] splices included files back into one directive tree
//! - [`analyze`] checks that tree against one or more grammar tables
//!
//! # Example
//!
//! ```rust,ignore
//! use ngxplane_config::{combine_configs, Analyzer};
//! use ngxplane_core::PayloadLoader;
//!
//! let payload = PayloadLoader::load("payload.json")?;
//! let combined = combine_configs(&payload)?;
//! let diagnostics = Analyzer::new(&[&oss, &lua]).analyze(&combined.config[0]);
//! ```

pub mod analyze;
pub mod assemble;

pub use analyze::{Analysis, Analyzer, Diagnostic, DiagnosticKind};
pub use assemble::{combine_configs, ConfigAssembler, IncludeError};

/// Errors from loading and assembling a payload in one step
#[derive(Debug, thiserror::Error)]
pub enum AssembleError {
    #[error("Load error: {0}")]
    Load(#[from] ngxplane_core::Error),

    #[error("Include error: {0}")]
    Include(#[from] IncludeError),
}

/// Load a payload file and combine its configs
pub fn assemble_file(path: impl AsRef<std::path::Path>) -> Result<ngxplane_core::Payload, AssembleError> {
    let payload = ngxplane_core::PayloadLoader::load(path)?;
    Ok(combine_configs(&payload)?)
}
