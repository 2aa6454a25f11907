//! Error-tracker event model

use chrono::{SecondsFormat, Utc};
use hooklog::{Fields, Level, Record};
use serde::Serialize;
use std::collections::BTreeMap;
use uuid::Uuid;

/// Tracker vocabulary for a level. There is no panic level; it maps to fatal.
pub fn sentry_level(level: Level) -> &'static str {
    match level {
        Level::Debug => "debug",
        Level::Info => "info",
        Level::Warn => "warning",
        Level::Error => "error",
        Level::Fatal | Level::Panic => "fatal",
    }
}

/// One event as posted to the store endpoint
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SentryEvent {
    /// 32 hex digits, no dashes
    pub event_id: String,
    /// UTC, RFC 3339
    pub timestamp: String,
    /// See [`sentry_level`]
    pub level: &'static str,
    /// Log message
    pub message: String,
    /// Name of the emitting logger
    pub logger: String,
    /// Always `other`
    pub platform: &'static str,
    /// `file:line` that emitted the record
    pub culprit: String,
    /// Host the event came from
    pub server_name: String,
    /// Static tags configured on the hook
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub tags: BTreeMap<String, String>,
    /// Record fields
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub extra: Fields,
}

impl SentryEvent {
    /// Logger name reported with every event
    pub const LOGGER: &'static str = "hooklog";

    /// Build an event from `record`
    pub fn from_record(record: &Record, tags: &BTreeMap<String, String>, server_name: &str) -> Self {
        Self {
            event_id: Uuid::new_v4().simple().to_string(),
            timestamp: record
                .time
                .with_timezone(&Utc)
                .to_rfc3339_opts(SecondsFormat::Millis, true),
            level: sentry_level(record.level),
            message: record.message.clone(),
            logger: Self::LOGGER.to_string(),
            platform: "other",
            culprit: record.source(),
            server_name: server_name.to_string(),
            tags: tags.clone(),
            extra: (*record.fields).clone(),
        }
    }
}
