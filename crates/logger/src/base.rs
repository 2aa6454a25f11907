//! Process-wide default logger
//!
//! [`base`] returns a logger created on first use: level debug, standard
//! output, text formatter, no hooks. It is never torn down, so async sinks
//! attached to it must be drained with [`flush`] before the process exits.
//! The free functions here forward to it.

use crate::error::DeliveryError;
use crate::{CallSite, Level, Logger};
use serde_json::Value;
use std::fmt;
use std::io::Write;
use std::sync::OnceLock;

static BASE: OnceLock<Logger> = OnceLock::new();

/// The process-wide logger
pub fn base() -> &'static Logger {
    BASE.get_or_init(Logger::stdout)
}

/// A handle to the base logger with one more field
pub fn with(key: impl Into<String>, value: impl Into<Value>) -> Logger {
    base().with(key, value)
}

/// Log at debug level on the base logger
#[track_caller]
pub fn debug(message: impl fmt::Display) {
    base().log_at(Level::Debug, message, CallSite::caller());
}

/// Log at info level on the base logger
#[track_caller]
pub fn info(message: impl fmt::Display) {
    base().log_at(Level::Info, message, CallSite::caller());
}

/// Log at warn level on the base logger
#[track_caller]
pub fn warn(message: impl fmt::Display) {
    base().log_at(Level::Warn, message, CallSite::caller());
}

/// Log at error level on the base logger
#[track_caller]
pub fn error(message: impl fmt::Display) {
    base().log_at(Level::Error, message, CallSite::caller());
}

/// Log at fatal level on the base logger, flush, and exit
#[track_caller]
pub fn fatal(message: impl fmt::Display) {
    base().fatal(message);
}

/// Log at panic level on the base logger and panic
#[track_caller]
pub fn panic(message: impl fmt::Display) -> ! {
    base().panic(message)
}

/// Redirect the base logger's default output
pub fn set_output<W: Write + Send + 'static>(output: W) {
    base().set_output(output);
}

/// Set the base logger's minimum level
pub fn set_level(level: Level) {
    base().set_level(level);
}

/// Drain every async sink registered on the base logger
pub fn flush() -> Result<(), DeliveryError> {
    base().flush()
}
