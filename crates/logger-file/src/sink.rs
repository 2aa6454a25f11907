//! Sink writing formatted records to rotating files

use crate::error::{Error, Result};
use crate::writer::{RotatingWriter, RotatingWriterConfig};
use hooklog::{DeliveryError, Formatter, Level, Record, Sink};
use std::collections::BTreeMap;
use std::io::Write;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

/// How rotating files are named
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FileNaming {
    /// One file per level: `<path>.<level>.<pattern>`, linked from
    /// `<path>.<level>`
    #[default]
    PerLevel,
    /// One file for every level: `<path>.<pattern>`, linked from `<path>`
    Shared,
}

/// Rotation settings shared by every writer of a sink
#[derive(Debug, Clone)]
pub struct Rotation {
    /// strftime suffix appended to the base path
    pub pattern: String,
    /// Length of one rotation period
    pub period: Duration,
    /// Retention; `None` keeps files forever
    pub max_age: Option<Duration>,
    /// Size cap per file
    pub max_size: Option<u64>,
}

/// Routes each record to the rotating writer for its level
pub struct RotatingFileSink {
    writers: BTreeMap<Level, Arc<RotatingWriter>>,
    formatter: Arc<dyn Formatter>,
}

impl RotatingFileSink {
    /// Open writers for every level at or above `threshold`.
    ///
    /// Every writer is opened before this returns. On failure the sink is
    /// never built, but directories, files and alias links already created
    /// for earlier levels stay on disk.
    pub fn open(
        path: &Path,
        rotation: &Rotation,
        naming: FileNaming,
        threshold: Level,
        formatter: Arc<dyn Formatter>,
    ) -> Result<Self> {
        let base = path.to_str().ok_or_else(|| {
            Error::Configuration(format!("log path {} is not valid UTF-8", path.display()))
        })?;

        let writer_for = |stem: String| -> Result<Arc<RotatingWriter>> {
            let mut config = RotatingWriterConfig::new(format!("{stem}.{}", rotation.pattern))
                .link_name(stem)
                .rotation_period(rotation.period)
                .max_age(rotation.max_age.unwrap_or(Duration::ZERO));
            config.max_size = rotation.max_size;
            Ok(Arc::new(RotatingWriter::new(config)?))
        };

        let mut writers = BTreeMap::new();
        match naming {
            FileNaming::PerLevel => {
                for level in threshold.expand() {
                    writers.insert(level, writer_for(format!("{base}.{level}"))?);
                }
            }
            FileNaming::Shared => {
                let shared = writer_for(base.to_string())?;
                for level in threshold.expand() {
                    writers.insert(level, Arc::clone(&shared));
                }
            }
        }

        Ok(Self { writers, formatter })
    }

    /// Writer handling `level`, if any
    pub fn writer(&self, level: Level) -> Option<&Arc<RotatingWriter>> {
        self.writers.get(&level)
    }
}

impl Sink for RotatingFileSink {
    fn deliver(&self, record: &Record) -> std::result::Result<(), DeliveryError> {
        let Some(writer) = self.writers.get(&record.level) else {
            return Ok(());
        };
        let bytes = self.formatter.format(record)?;
        (&**writer).write_all(&bytes)?;
        Ok(())
    }

    fn flush(&self) -> std::result::Result<(), DeliveryError> {
        for writer in self.writers.values() {
            (&**writer).flush()?;
        }
        Ok(())
    }
}

impl std::fmt::Debug for RotatingFileSink {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RotatingFileSink")
            .field("writers", &self.writers)
            .finish_non_exhaustive()
    }
}
