//! Record formatters
//!
//! A formatter turns one [`Record`] into the bytes a sink writes. Three
//! layouts are provided:
//!
//! - [`PrefixedFormatter`]: `2024-01-02 15:04:05 [info][main.rs:10] message`
//! - [`TextFormatter`]: logfmt-style `key=value` pairs
//! - [`JsonFormatter`]: one JSON object per line

use crate::Record;
use crate::error::FormatError;
use serde_json::{Map, Value};
use std::fmt::Write as _;

/// Renders a record to bytes
pub trait Formatter: Send + Sync + 'static {
    /// Render one record, including the trailing newline
    fn format(&self, record: &Record) -> Result<Vec<u8>, FormatError>;
}

/// Plain-text layout `"<timestamp> [<level>][<file:line>] <message>\n"`
#[derive(Debug, Clone, Default)]
pub struct PrefixedFormatter;

impl PrefixedFormatter {
    /// Timestamp layout used in the prefix
    pub const TIMESTAMP_FORMAT: &'static str = "%Y-%m-%d %H:%M:%S";
}

impl Formatter for PrefixedFormatter {
    fn format(&self, record: &Record) -> Result<Vec<u8>, FormatError> {
        let mut out = String::with_capacity(record.message.len() + 48);
        write!(
            out,
            "{} [{}][{}] {}",
            record.time.format(Self::TIMESTAMP_FORMAT),
            record.level,
            record.call_site,
            record.message
        )?;
        out.push('\n');
        Ok(out.into_bytes())
    }
}

/// logfmt-style layout: `time=... level=... msg=... source=... key=value`.
///
/// Field keys are written in sorted order after the fixed keys. Values that
/// contain anything other than `[A-Za-z0-9-._/@^+]` are quoted.
#[derive(Debug, Clone, Default)]
pub struct TextFormatter {
    /// chrono format string for the `time` key; RFC 3339 when `None`
    pub timestamp_format: Option<String>,
    /// Omit the `time` key entirely
    pub disable_timestamp: bool,
}

impl TextFormatter {
    /// Create a formatter with RFC 3339 timestamps
    pub fn new() -> Self {
        Self::default()
    }

    /// Use a custom chrono timestamp format
    pub fn with_timestamp_format(mut self, format: impl Into<String>) -> Self {
        self.timestamp_format = Some(format.into());
        self
    }

    /// Drop the `time` key
    pub fn without_timestamp(mut self) -> Self {
        self.disable_timestamp = true;
        self
    }

    fn append_pair(out: &mut String, key: &str, value: &str) {
        if !out.is_empty() {
            out.push(' ');
        }
        out.push_str(key);
        out.push('=');
        if needs_quoting(value) {
            // Debug formatting escapes quotes, backslashes and control characters.
            let _ = write!(out, "{value:?}");
        } else {
            out.push_str(value);
        }
    }
}

fn needs_quoting(value: &str) -> bool {
    value.is_empty()
        || !value
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '.' | '_' | '/' | '@' | '^' | '+'))
}

// An invalid user format surfaces as a fmt error rather than a panic.
fn render_time(record: &Record, format: Option<&str>) -> Result<String, FormatError> {
    let Some(format) = format else {
        return Ok(record.time.to_rfc3339());
    };
    let mut time = String::new();
    write!(time, "{}", record.time.format(format))?;
    Ok(time)
}

fn value_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

impl Formatter for TextFormatter {
    fn format(&self, record: &Record) -> Result<Vec<u8>, FormatError> {
        let mut out = String::with_capacity(record.message.len() + 64);

        if !self.disable_timestamp {
            let time = render_time(record, self.timestamp_format.as_deref())?;
            Self::append_pair(&mut out, "time", &time);
        }
        Self::append_pair(&mut out, "level", record.level.as_str());
        Self::append_pair(&mut out, "msg", &record.message);
        Self::append_pair(&mut out, "source", &record.source());

        for (key, value) in record.fields.iter() {
            Self::append_pair(&mut out, key, &value_text(value));
        }

        out.push('\n');
        Ok(out.into_bytes())
    }
}

/// One JSON object per line with `time`, `level`, `msg`, `source` and the
/// record's fields.
///
/// A field whose name collides with one of the fixed keys is written as
/// `fields.<name>` so it does not overwrite it.
#[derive(Debug, Clone, Default)]
pub struct JsonFormatter {
    /// chrono format string for `time`; RFC 3339 when `None`
    pub timestamp_format: Option<String>,
}

impl JsonFormatter {
    const RESERVED: [&'static str; 4] = ["time", "level", "msg", "source"];

    /// Create a formatter with RFC 3339 timestamps
    pub fn new() -> Self {
        Self::default()
    }

    /// Use a custom chrono timestamp format
    pub fn with_timestamp_format(mut self, format: impl Into<String>) -> Self {
        self.timestamp_format = Some(format.into());
        self
    }
}

impl Formatter for JsonFormatter {
    fn format(&self, record: &Record) -> Result<Vec<u8>, FormatError> {
        let mut object = Map::with_capacity(record.fields.len() + Self::RESERVED.len());

        for (key, value) in record.fields.iter() {
            if Self::RESERVED.contains(&key.as_str()) {
                object.insert(format!("fields.{key}"), value.clone());
            } else {
                object.insert(key.clone(), value.clone());
            }
        }

        let time = render_time(record, self.timestamp_format.as_deref())?;
        object.insert("time".into(), Value::String(time));
        object.insert("level".into(), Value::String(record.level.to_string()));
        object.insert("msg".into(), Value::String(record.message.clone()));
        object.insert("source".into(), Value::String(record.source()));

        let mut bytes = serde_json::to_vec(&object)?;
        bytes.push(b'\n');
        Ok(bytes)
    }
}
