//! Common error types for bitquiz

use thiserror::Error;

/// Common result type for bitquiz operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error types shared across bitquiz crates
#[derive(Error, Debug)]
pub enum Error {
    /// I/O operation error (wraps std::io::Error)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration loading or validation error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Process-level setup failure (e.g. tracing installed twice)
    #[error("Internal error: {0}")]
    Internal(String),
}
