//! Output destination and level configuration
//!
//! A destination is written as a `logger:` URL, e.g. `logger:stdout?json=true`
//! or `logger:syslog?appname=bob&local=7`. [`LogConfig`] bundles a destination
//! with a minimum level and can be deserialised from application config.

use crate::error::{Error, Result};
use crate::formatter::JsonFormatter;
use crate::{Level, Logger};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::io;
use std::str::FromStr;
use std::sync::Arc;
use url::Url;

/// Where the default output goes
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DestinationKind {
    /// Standard output
    Stdout,
    /// Standard error
    Stderr,
    /// System log
    Syslog {
        /// Application name (`appname`)
        app_name: String,
        /// Local facility number (`local`)
        facility: String,
    },
    /// Windows event log
    Eventlog {
        /// Event source name (`name`)
        name: String,
        /// Report debug records as informational events (`debugAsInfo`)
        debug_as_info: bool,
    },
}

/// A parsed `logger:` destination URL
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Destination {
    /// Output target
    pub kind: DestinationKind,
    /// Render records as JSON
    pub json: bool,
}

impl Destination {
    /// URL scheme every destination uses
    pub const SCHEME: &'static str = "logger";

    /// Destination for `kind` with text output
    pub const fn new(kind: DestinationKind) -> Self {
        Self { kind, json: false }
    }

    /// Builder-style method for JSON output
    #[must_use]
    pub const fn json(mut self, json: bool) -> Self {
        self.json = json;
        self
    }
}

impl Default for Destination {
    fn default() -> Self {
        Self::new(DestinationKind::Stderr)
    }
}

/// Boolean parsing that accepts `1`, `t`, `true` and friends; anything else
/// is `None`.
fn parse_bool(raw: &str) -> Option<bool> {
    match raw {
        "1" | "t" | "T" | "true" | "TRUE" | "True" => Some(true),
        "0" | "f" | "F" | "false" | "FALSE" | "False" => Some(false),
        _ => None,
    }
}

impl FromStr for Destination {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let url = Url::parse(s)?;
        if url.scheme() != Self::SCHEME {
            return Err(Error::UnsupportedScheme(url.scheme().to_string()));
        }

        let query = |key: &str| {
            url.query_pairs()
                .find(|(k, _)| k == key)
                .map(|(_, v)| v.into_owned())
                .unwrap_or_default()
        };

        let kind = match url.path() {
            "stdout" => DestinationKind::Stdout,
            "stderr" => DestinationKind::Stderr,
            "syslog" => DestinationKind::Syslog {
                app_name: query("appname"),
                facility: query("local"),
            },
            "eventlog" => DestinationKind::Eventlog {
                name: query("name"),
                debug_as_info: parse_bool(&query("debugAsInfo")).unwrap_or(false),
            },
            other => return Err(Error::UnsupportedDestination(other.to_string())),
        };

        Ok(Self {
            kind,
            json: query("json") == "true",
        })
    }
}

impl fmt::Display for Destination {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut query = url::form_urlencoded::Serializer::new(String::new());
        let name = match &self.kind {
            DestinationKind::Stdout => "stdout",
            DestinationKind::Stderr => "stderr",
            DestinationKind::Syslog { app_name, facility } => {
                query.append_pair("appname", app_name);
                query.append_pair("local", facility);
                "syslog"
            }
            DestinationKind::Eventlog {
                name,
                debug_as_info,
            } => {
                query.append_pair("name", name);
                query.append_pair("debugAsInfo", if *debug_as_info { "true" } else { "false" });
                "eventlog"
            }
        };
        if self.json {
            query.append_pair("json", "true");
        }

        let query = query.finish();
        write!(f, "{}:{name}", Self::SCHEME)?;
        if !query.is_empty() {
            write!(f, "?{query}")?;
        }
        Ok(())
    }
}

impl Serialize for Destination {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Destination {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

impl Logger {
    /// Point the default output at `destination`.
    ///
    /// `json=true` switches the default formatter to [`JsonFormatter`].
    /// Syslog and eventlog are recognised but not available; they return
    /// [`Error::PlatformUnsupported`].
    pub fn apply_destination(&self, destination: &Destination) -> Result<()> {
        match &destination.kind {
            DestinationKind::Stdout => self.set_output(io::stdout()),
            DestinationKind::Stderr => self.set_output(io::stderr()),
            DestinationKind::Syslog { .. } => return Err(Error::PlatformUnsupported("syslog")),
            DestinationKind::Eventlog { .. } => {
                return Err(Error::PlatformUnsupported("eventlog"));
            }
        }

        if destination.json {
            self.set_formatter(Arc::new(JsonFormatter::new()));
        }

        tracing::debug!(%destination, "log destination applied");
        Ok(())
    }
}

/// Level and destination, as read from application configuration.
///
/// ```
/// # use hooklog::{Level, LogConfig};
/// let config: LogConfig =
///     serde_json::from_str(r#"{"level": "warn", "format": "logger:stdout?json=true"}"#).unwrap();
/// assert_eq!(config.level, Level::Warn);
/// assert!(config.format.json);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    /// Minimum level
    pub level: Level,
    /// Output destination
    pub format: Destination,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: Level::Debug,
            format: Destination::default(),
        }
    }
}

impl LogConfig {
    /// Apply the destination, then the level.
    pub fn apply(&self, logger: &Logger) -> Result<()> {
        logger.apply_destination(&self.format)?;
        logger.set_level(self.level);
        Ok(())
    }
}
