//! Error types for filegate.

use thiserror::Error;

use crate::upload::UploadError;

/// Common error type for filegate.
#[derive(Error, Debug)]
pub enum FilegateError {
    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Validation error for configuration or input.
    #[error("validation error: {0}")]
    Validation(String),

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),

    /// Upload pipeline error.
    #[error("upload error: {0}")]
    Upload(#[from] UploadError),
}

/// Result type alias for filegate operations.
pub type Result<T> = std::result::Result<T, FilegateError>;
