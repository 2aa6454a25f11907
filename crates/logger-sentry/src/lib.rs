//! Error-tracker sinks for hooklog.
//!
//! Records at or above a threshold are turned into tracker events and posted
//! to the store endpoint named by a DSN, either on the emitting thread or
//! through a background queue.
//!
//! ```no_run
//! use hooklog::{Level, Logger};
//! use hooklog_sentry::SentryHookExt;
//!
//! let logger = Logger::stdout();
//! logger.add_async_sentry_hook("https://public@errors.example.com/42", Level::Error)?;
//! logger.error("payment provider unreachable");
//! logger.flush()?;
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

#![warn(missing_docs, unreachable_pub)]
#![forbid(unsafe_code)]

mod dsn;
mod error;
mod event;
mod hook;
mod sink;
mod transport;

pub use dsn::Dsn;
pub use error::{Error, Result};
pub use event::{SentryEvent, sentry_level};
pub use hook::SentryHookExt;
pub use sink::SentrySink;
pub use transport::{ErrorTransport, HttpTransport, HttpTransportConfig};
