//! Severity levels and threshold expansion

use crate::error::Error;
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::str::FromStr;

/// Log severity, ordered from least to most severe.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Level {
    /// Verbose diagnostics
    Debug = 0,
    /// Normal operational messages
    Info = 1,
    /// Something unexpected that the application recovered from
    Warn = 2,
    /// An operation failed
    Error = 3,
    /// The process cannot continue and will exit
    Fatal = 4,
    /// The process cannot continue and will panic
    Panic = 5,
}

impl Level {
    /// Number of levels
    pub const COUNT: usize = 6;

    /// Every level, least severe first
    pub const ALL: [Level; Self::COUNT] = [
        Level::Debug,
        Level::Info,
        Level::Warn,
        Level::Error,
        Level::Fatal,
        Level::Panic,
    ];

    /// Stable lowercase name
    pub const fn as_str(self) -> &'static str {
        match self {
            Level::Debug => "debug",
            Level::Info => "info",
            Level::Warn => "warn",
            Level::Error => "error",
            Level::Fatal => "fatal",
            Level::Panic => "panic",
        }
    }

    /// Position in [`Level::ALL`]
    #[inline]
    pub const fn index(self) -> usize {
        self as usize
    }

    /// Inverse of [`Level::index`]
    pub const fn from_index(index: usize) -> Option<Self> {
        if index < Self::COUNT {
            Some(Self::ALL[index])
        } else {
            None
        }
    }

    /// Every level at least as severe as `self`, least severe first.
    ///
    /// `Level::Error.expand()` yields `Error`, `Fatal`, `Panic`.
    pub fn expand(self) -> impl DoubleEndedIterator<Item = Level> + ExactSizeIterator {
        Self::ALL[self.index()..].iter().copied()
    }

    /// Whether a sink registered at threshold `self` receives `level`
    #[inline]
    pub fn covers(self, level: Level) -> bool {
        level >= self
    }
}

/// Collects [`Level::expand`] into a vector.
pub fn expand(threshold: Level) -> Vec<Level> {
    threshold.expand().collect()
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Level {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "debug" => Ok(Level::Debug),
            "info" => Ok(Level::Info),
            "warn" | "warning" => Ok(Level::Warn),
            "error" => Ok(Level::Error),
            "fatal" => Ok(Level::Fatal),
            "panic" => Ok(Level::Panic),
            _ => Err(Error::InvalidLevel(s.to_string())),
        }
    }
}

impl<'de> Deserialize<'de> for Level {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let name = String::deserialize(deserializer)?;
        name.parse().map_err(serde::de::Error::custom)
    }
}
