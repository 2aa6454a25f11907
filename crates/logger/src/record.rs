//! Log record type

use crate::Level;
use chrono::{DateTime, Local};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;
use std::panic::Location;
use std::sync::Arc;

/// Structured context attached to a record, keyed by field name.
pub type Fields = BTreeMap<String, Value>;

/// Source location of the code that emitted a record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CallSite {
    /// File name without directories
    pub file: &'static str,
    /// Line number
    pub line: u32,
}

impl CallSite {
    /// Placeholder for records whose origin is not known
    pub const UNKNOWN: CallSite = CallSite {
        file: "<???>",
        line: 1,
    };

    /// Creates a call site, keeping only the file name part of `file`.
    pub fn new(file: &'static str, line: u32) -> Self {
        let file = file
            .rsplit(|c| c == '/' || c == '\\')
            .next()
            .unwrap_or(file);
        Self { file, line }
    }

    /// Captures the location of the caller.
    ///
    /// Public entry points are `#[track_caller]`, so this resolves to the
    /// application code that called the logger rather than to this crate.
    #[track_caller]
    #[inline]
    pub fn caller() -> Self {
        let location = Location::caller();
        Self::new(location.file(), location.line())
    }
}

impl fmt::Display for CallSite {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.file, self.line)
    }
}

/// Immutable snapshot of one log event.
///
/// Fields are shared with the logger handle that produced the record, so
/// cloning a record (as async sinks do) does not copy them.
#[derive(Debug, Clone)]
pub struct Record {
    /// When the record was created
    pub time: DateTime<Local>,
    /// Severity
    pub level: Level,
    /// Rendered message
    pub message: String,
    /// Structured context
    pub fields: Arc<Fields>,
    /// Where the record was emitted
    pub call_site: CallSite,
}

impl Record {
    /// Creates a record stamped with the current time, no fields, and an
    /// unknown call site.
    pub fn new(level: Level, message: impl Into<String>) -> Self {
        Self {
            time: Local::now(),
            level,
            message: message.into(),
            fields: Arc::default(),
            call_site: CallSite::UNKNOWN,
        }
    }

    /// Builder-style method for setting fields
    pub fn with_fields(mut self, fields: Arc<Fields>) -> Self {
        self.fields = fields;
        self
    }

    /// Builder-style method for setting the call site
    pub fn with_call_site(mut self, call_site: CallSite) -> Self {
        self.call_site = call_site;
        self
    }

    /// Builder-style method for setting the timestamp
    pub fn with_time(mut self, time: DateTime<Local>) -> Self {
        self.time = time;
        self
    }

    /// Looks up a field by name
    pub fn field(&self, key: &str) -> Option<&Value> {
        self.fields.get(key)
    }

    /// `file:line` of the call site
    pub fn source(&self) -> String {
        self.call_site.to_string()
    }
}

/// Name of the machine this process runs on, `localhost` when unknown.
pub fn local_hostname() -> String {
    std::env::var("HOSTNAME")
        .ok()
        .or_else(|| std::fs::read_to_string("/etc/hostname").ok())
        .map(|name| name.trim().to_string())
        .filter(|name| !name.is_empty())
        .unwrap_or_else(|| "localhost".to_string())
}
