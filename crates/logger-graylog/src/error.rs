//! Error types for log-aggregator sinks

use std::io;
use thiserror::Error;

/// Result type for this crate
pub type Result<T> = std::result::Result<T, Error>;

/// Errors returned while setting up a log-aggregator sink
#[derive(Debug, Error)]
pub enum Error {
    /// Aggregator address did not resolve
    #[error("failed to resolve {addr}: {source}")]
    Resolve {
        /// Address as given
        addr: String,
        /// Underlying error
        #[source]
        source: io::Error,
    },

    /// Local UDP socket could not be opened
    #[error("failed to open socket: {0}")]
    Socket(#[source] io::Error),

    /// Registering with the logger failed
    #[error(transparent)]
    Hooklog(#[from] hooklog::Error),
}
