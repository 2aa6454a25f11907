//! Error types for error-tracker sinks

use std::io;
use thiserror::Error;

/// Result type for this crate
pub type Result<T> = std::result::Result<T, Error>;

/// Errors returned while setting up an error-tracker sink
#[derive(Debug, Error)]
pub enum Error {
    /// DSN is well-formed as a URL but not usable as a DSN
    #[error("invalid DSN: {0}")]
    InvalidDsn(String),

    /// DSN is not a URL
    #[error("invalid DSN: {0}")]
    Url(#[from] url::ParseError),

    /// HTTP client could not be built
    #[error("failed to build HTTP client: {0}")]
    Client(#[from] reqwest::Error),

    /// Transport runtime could not be built
    #[error("failed to build transport runtime: {0}")]
    Runtime(#[source] io::Error),

    /// Transport thread could not be started
    #[error("failed to spawn transport thread: {0}")]
    Spawn(#[source] io::Error),

    /// Registering with the logger failed
    #[error(transparent)]
    Hooklog(#[from] hooklog::Error),
}
