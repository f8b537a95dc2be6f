//! Common error types for YTCL

use thiserror::Error;

/// Common result type for YTCL operations
pub type Result<T> = std::result::Result<T, Error>;

/// Common error types across YTCL crates
#[derive(Error, Debug)]
pub enum Error {
    /// Missing or malformed input, rejected before any persistence
    #[error("Invalid input: {0}")]
    Validation(String),

    /// Missing or incorrect API token
    #[error("Unauthorized: {0}")]
    Auth(String),

    /// Requested resource not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Database operation error (wraps sqlx::Error)
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// I/O operation error (wraps std::io::Error)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration loading or validation error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Internal server error
    #[error("Internal error: {0}")]
    Internal(String),
}
