//! Rotate-hook registration on [`Logger`]

use crate::error::Result;
use crate::sink::{FileNaming, RotatingFileSink, Rotation};
use hooklog::{Formatter, Level, Logger, TextFormatter};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

const HOUR: Duration = Duration::from_secs(60 * 60);
const DAY: Duration = Duration::from_secs(24 * 60 * 60);

/// Everything needed to register a rotating file sink.
///
/// ```no_run
/// use hooklog::{Level, Logger};
/// use hooklog_file::{FileNaming, RotateHookExt, RotateOptions};
/// use std::time::Duration;
///
/// let logger = Logger::stdout();
/// logger.add_rotate_hook_with_options(
///     RotateOptions::new("/var/log/app/server.log", Level::Info)
///         .pattern("%Y-%m-%d")
///         .max_size(64 * 1024 * 1024)
///         .naming(FileNaming::Shared)
///         .max_age(Duration::from_secs(3 * 24 * 60 * 60)),
/// )?;
/// # Ok::<(), hooklog_file::Error>(())
/// ```
#[derive(Clone)]
pub struct RotateOptions {
    path: PathBuf,
    level: Level,
    rotation: Rotation,
    naming: FileNaming,
    formatter: Arc<dyn Formatter>,
}

impl RotateOptions {
    /// Daily rotation, one week of retention, per-level files, text format
    pub fn new(path: impl Into<PathBuf>, level: Level) -> Self {
        Self {
            path: path.into(),
            level,
            rotation: Rotation {
                pattern: "%Y-%m-%d".to_string(),
                period: DAY,
                max_age: Some(7 * DAY),
                max_size: None,
            },
            naming: FileNaming::default(),
            formatter: default_formatter(),
        }
    }

    /// strftime suffix of rotated file names
    #[must_use]
    pub fn pattern(mut self, pattern: impl Into<String>) -> Self {
        self.rotation.pattern = pattern.into();
        self
    }

    /// Rotation period
    #[must_use]
    pub fn rotation_time(mut self, period: Duration) -> Self {
        self.rotation.period = period;
        self
    }

    /// Retention; zero keeps files forever
    #[must_use]
    pub fn max_age(mut self, max_age: Duration) -> Self {
        self.rotation.max_age = (!max_age.is_zero()).then_some(max_age);
        self
    }

    /// Size cap per file
    #[must_use]
    pub fn max_size(mut self, bytes: u64) -> Self {
        self.rotation.max_size = Some(bytes);
        self
    }

    /// File naming mode
    #[must_use]
    pub fn naming(mut self, naming: FileNaming) -> Self {
        self.naming = naming;
        self
    }

    /// Formatter for records written to the files
    #[must_use]
    pub fn formatter(mut self, formatter: Arc<dyn Formatter>) -> Self {
        self.formatter = formatter;
        self
    }
}

impl std::fmt::Debug for RotateOptions {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RotateOptions")
            .field("path", &self.path)
            .field("level", &self.level)
            .field("rotation", &self.rotation)
            .field("naming", &self.naming)
            .finish_non_exhaustive()
    }
}

fn default_formatter() -> Arc<dyn Formatter> {
    Arc::new(TextFormatter::new())
}

/// Rotating file hooks for [`Logger`].
///
/// Every method opens all files before registering anything: on error the
/// logger's registry is unchanged.
pub trait RotateHookExt {
    /// Register a rotating sink with full control over its options
    fn add_rotate_hook_with_options(&self, options: RotateOptions) -> Result<()>;

    /// Rotate every `rotation_time`, naming files `<path>.<level>.<pattern>`
    fn add_rotate_hook(
        &self,
        path: impl AsRef<Path>,
        max_age: Duration,
        rotation_time: Duration,
        pattern: &str,
        level: Level,
    ) -> Result<()> {
        self.add_rotate_hook_with_formatter(
            path,
            max_age,
            rotation_time,
            pattern,
            default_formatter(),
            level,
        )
    }

    /// [`RotateHookExt::add_rotate_hook`] with a custom formatter
    fn add_rotate_hook_with_formatter(
        &self,
        path: impl AsRef<Path>,
        max_age: Duration,
        rotation_time: Duration,
        pattern: &str,
        formatter: Arc<dyn Formatter>,
        level: Level,
    ) -> Result<()> {
        self.add_rotate_hook_with_options(
            RotateOptions::new(path.as_ref(), level)
                .pattern(pattern)
                .rotation_time(rotation_time)
                .max_age(max_age)
                .formatter(formatter),
        )
    }

    /// Rotate every `rotate_days` days and keep `max_age_days` days of files
    fn add_rotate_hook_by_day(
        &self,
        path: impl AsRef<Path>,
        max_age_days: u32,
        rotate_days: u32,
        level: Level,
    ) -> Result<()> {
        self.add_rotate_hook_by_day_with_formatter(
            path,
            max_age_days,
            rotate_days,
            default_formatter(),
            level,
        )
    }

    /// [`RotateHookExt::add_rotate_hook_by_day`] with a custom formatter
    fn add_rotate_hook_by_day_with_formatter(
        &self,
        path: impl AsRef<Path>,
        max_age_days: u32,
        rotate_days: u32,
        formatter: Arc<dyn Formatter>,
        level: Level,
    ) -> Result<()> {
        self.add_rotate_hook_with_formatter(
            path,
            DAY * max_age_days,
            DAY * rotate_days,
            "%Y-%m-%d",
            formatter,
            level,
        )
    }

    /// Rotate every `rotate_hours` hours and keep `max_age_hours` hours of
    /// files
    fn add_rotate_hook_by_hour(
        &self,
        path: impl AsRef<Path>,
        max_age_hours: u32,
        rotate_hours: u32,
        level: Level,
    ) -> Result<()> {
        self.add_rotate_hook_by_hour_with_formatter(
            path,
            max_age_hours,
            rotate_hours,
            default_formatter(),
            level,
        )
    }

    /// [`RotateHookExt::add_rotate_hook_by_hour`] with a custom formatter
    fn add_rotate_hook_by_hour_with_formatter(
        &self,
        path: impl AsRef<Path>,
        max_age_hours: u32,
        rotate_hours: u32,
        formatter: Arc<dyn Formatter>,
        level: Level,
    ) -> Result<()> {
        self.add_rotate_hook_with_formatter(
            path,
            HOUR * max_age_hours,
            HOUR * rotate_hours,
            "%Y-%m-%d@%H:00",
            formatter,
            level,
        )
    }
}

impl RotateHookExt for Logger {
    fn add_rotate_hook_with_options(&self, options: RotateOptions) -> Result<()> {
        let sink = RotatingFileSink::open(
            &options.path,
            &options.rotation,
            options.naming,
            options.level,
            options.formatter,
        )?;

        self.register_sink(Arc::new(sink), options.level);
        debug!(
            path = %options.path.display(),
            level = %options.level,
            naming = ?options.naming,
            "registered rotate hook"
        );
        Ok(())
    }
}
