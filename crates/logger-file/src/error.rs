//! Error types for rotating file sinks

use std::io;
use std::path::PathBuf;

/// Result type for file sink operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors returned while setting up a rotating file sink
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Failed to create the log directory
    #[error("failed to create log directory at {path}: {source}")]
    CreateDirectory {
        /// Directory that could not be created
        path: PathBuf,
        /// Underlying error
        source: io::Error,
    },

    /// Failed to open a log file
    #[error("failed to open log file {path}: {source}")]
    Open {
        /// File that could not be opened
        path: PathBuf,
        /// Underlying error
        source: io::Error,
    },

    /// File name pattern contains an unknown strftime specifier
    #[error("invalid file name pattern {0:?}")]
    InvalidPattern(String),

    /// Configuration error
    #[error("configuration error: {0}")]
    Configuration(String),
}
