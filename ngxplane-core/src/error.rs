//! Error types for ngxplane

use thiserror::Error;

/// Result type for ngxplane core operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for ngxplane
#[derive(Error, Debug)]
pub enum Error {
    /// Payload could not be interpreted
    #[error("Payload error: {0}")]
    Payload(String),

    /// JSON (de)serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
