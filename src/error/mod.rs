//! Crate-level error type for the command-line front end

use std::path::PathBuf;

use thiserror::Error;

use crate::domain::errors::OperationError;

/// Errors raised outside a running operation: configuration, logging, front-end IO
#[derive(Error, Debug)]
pub enum GrabXError {
    /// Explicitly requested configuration file is missing
    #[error("Configuration file not found: {}", path.display())]
    ConfigNotFound { path: PathBuf },

    /// Configuration file could not be parsed
    #[error("Failed to parse configuration file {}: {message}", path.display())]
    ConfigParse { path: PathBuf, message: String },

    /// A setting (file, environment or flag) has an unusable value
    #[error("Invalid setting {key}: {message}")]
    InvalidSetting { key: String, message: String },

    /// Logging could not be initialized
    #[error("Failed to initialize logging: {0}")]
    Logging(String),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Operation error surfaced before the worker started
    #[error(transparent)]
    Operation(#[from] OperationError),
}

/// Result type alias for front-end operations
pub type GrabXResult<T> = std::result::Result<T, GrabXError>;
