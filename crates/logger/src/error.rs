//! Error types for the logging facade

use std::io;
use thiserror::Error;

/// Configuration errors, returned by setup and registration calls.
#[derive(Debug, Error)]
pub enum Error {
    /// Level name not recognised
    #[error("invalid level {0:?}, valid levels: debug, info, warn, error, fatal, panic")]
    InvalidLevel(String),

    /// Destination string is not a URL
    #[error("invalid destination: {0}")]
    InvalidDestination(#[from] url::ParseError),

    /// Destination URL does not use the `logger` scheme
    #[error("invalid scheme {0}")]
    UnsupportedScheme(String),

    /// Destination names an unknown output
    #[error("unsupported logger {0:?}")]
    UnsupportedDestination(String),

    /// Destination is known but has no implementation on this system
    #[error("system does not support {0}")]
    PlatformUnsupported(&'static str),

    /// Background delivery thread could not be started
    #[error("failed to spawn delivery worker: {0}")]
    Spawn(#[source] io::Error),
}

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;

/// Rendering a record failed.
#[derive(Debug, Error)]
pub enum FormatError {
    /// JSON encoding failed
    #[error("failed to encode record as JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// Writing into the render buffer failed
    #[error("failed to render record: {0}")]
    Write(#[from] std::fmt::Error),
}

/// A sink could not deliver a record.
///
/// These never reach the code that emitted the record; the registry reports
/// them to stderr and moves on to the next sink.
#[derive(Debug, Error)]
pub enum DeliveryError {
    /// The sink's formatter failed
    #[error(transparent)]
    Format(#[from] FormatError),

    /// Writing to the destination failed
    #[error("write failed: {0}")]
    Io(#[from] io::Error),

    /// The remote transport rejected or lost the record
    #[error("transport failed: {0}")]
    Transport(String),

    /// The async queue has shut down
    #[error("delivery queue closed")]
    Closed,
}
