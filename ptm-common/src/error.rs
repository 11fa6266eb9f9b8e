//! Common error types for PTM tools

use thiserror::Error;

/// Common result type for PTM operations
pub type Result<T> = std::result::Result<T, Error>;

/// Common error types across PTM crates
///
/// Only the I/O boundary produces these. Normalization and reconciliation
/// report unusable values through `None`, never through `Error`.
#[derive(Error, Debug)]
pub enum Error {
    /// I/O operation error (wraps std::io::Error)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration loading or validation error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Delimited file read/write error (wraps csv::Error)
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// JSON serialization error (wraps serde_json::Error)
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Invalid user input or request parameter
    #[error("Invalid input: {0}")]
    InvalidInput(String),
}
