//! Leveled logging with per-threshold hooks
//!
//! A [`Logger`] emits records at six levels. Each record is dispatched to the
//! sinks in its [`HookRegistry`] and then written to the logger's default
//! output. Sinks are registered with a threshold and receive every record at
//! or above it:
//!
//! - synchronous sinks deliver on the logging thread
//! - async sinks ([`AsyncSink`]) enqueue and deliver on a worker thread;
//!   [`Logger::flush`] drains them
//!
//! File, error-tracker and log-aggregator sinks live in the `hooklog-file`,
//! `hooklog-sentry` and `hooklog-graylog` crates.

#![warn(missing_docs, unreachable_pub)]
#![forbid(unsafe_code)]

mod base;
mod config;
mod delivery;
mod error;
mod formatter;
mod level;
mod logger;
mod macros;
mod record;
mod registry;
mod sink;

#[cfg(any(test, feature = "test-support"))]
pub mod test_support;

pub use base::{base, debug, error, fatal, flush, info, panic, set_level, set_output, warn, with};
pub use config::{Destination, DestinationKind, LogConfig};
pub use delivery::{AsyncDeliveryCoordinator, AsyncOptions, AsyncSink, DeliveryMode, OverflowPolicy};
pub use error::{DeliveryError, Error, FormatError, Result};
pub use formatter::{Formatter, JsonFormatter, PrefixedFormatter, TextFormatter};
pub use level::{Level, expand};
pub use logger::{ErrorLogWriter, Logger};
pub use record::{CallSite, Fields, Record, local_hostname};
pub use registry::HookRegistry;
pub use sink::Sink;
