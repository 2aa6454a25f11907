//! GELF message model

use hooklog::{Fields, Level, Record};
use serde::Serialize;
use serde_json::Value;

/// GELF format version
pub const GELF_VERSION: &str = "1.1";

/// Syslog severity for a level
pub fn gelf_level(level: Level) -> u8 {
    match level {
        Level::Panic => 1,
        Level::Fatal => 2,
        Level::Error => 3,
        Level::Warn => 4,
        Level::Info => 6,
        Level::Debug => 7,
    }
}

/// One GELF message
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GelfMessage {
    /// Always [`GELF_VERSION`]
    pub version: &'static str,
    /// Host the message came from
    pub host: String,
    /// First line of the log message
    pub short_message: String,
    /// Whole message, when it spans several lines
    #[serde(skip_serializing_if = "Option::is_none")]
    pub full_message: Option<String>,
    /// Unix time in seconds
    pub timestamp: f64,
    /// Syslog severity, see [`gelf_level`]
    pub level: u8,
    /// Additional fields, every key starting with `_`
    #[serde(flatten)]
    pub additional: Fields,
}

impl GelfMessage {
    /// Build a message from `record`.
    ///
    /// `extra` is merged first so record fields win on a clash.
    pub fn from_record(record: &Record, extra: &Fields, host: &str) -> Self {
        let (short_message, full_message) = match record.message.split_once('\n') {
            Some((first, _)) => (first.to_string(), Some(record.message.clone())),
            None => (record.message.clone(), None),
        };

        let mut additional = Fields::new();
        for (key, value) in extra.iter().chain(record.fields.iter()) {
            additional.insert(additional_key(key), value.clone());
        }
        additional.insert("_file".into(), Value::from(record.call_site.file));
        additional.insert("_line".into(), Value::from(record.call_site.line));
        additional.insert("_level_name".into(), Value::from(record.level.as_str()));

        Self {
            version: GELF_VERSION,
            host: host.to_string(),
            short_message,
            full_message,
            timestamp: record.time.timestamp_micros() as f64 / 1_000_000.0,
            level: gelf_level(record.level),
            additional,
        }
    }
}

// `_id` is reserved by the aggregator
fn additional_key(key: &str) -> String {
    if key == "id" {
        "_id_".to_string()
    } else {
        format!("_{key}")
    }
}
