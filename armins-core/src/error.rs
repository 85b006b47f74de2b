//! Error types for armins-core

use thiserror::Error;

/// Main error type for the armins-core library
#[derive(Error, Debug)]
pub enum Error {
    /// Embedded database error
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON parsing error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Configuration error
    #[error("configuration error: {0}")]
    Config(String),

    /// Storage backend error
    #[error("storage error: {0}")]
    Storage(String),
}

/// Result type alias for armins-core
pub type Result<T> = std::result::Result<T, Error>;
