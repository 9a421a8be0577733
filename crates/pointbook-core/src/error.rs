//! Error types for pointbook-core

use thiserror::Error;

/// Result type alias using pointbook-core's Error
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in pointbook-core operations
#[derive(Error, Debug)]
pub enum Error {
    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Invalid input
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// A draft with the same id is already stored
    #[error("Draft already exists: {0}")]
    DuplicateDraft(String),

    /// Draft store backend failure
    #[error("Storage error: {0}")]
    Storage(String),

    /// Invalid client configuration
    #[error("Configuration error: {0}")]
    Config(String),
}
