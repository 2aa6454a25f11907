//! Rotating file writer
//!
//! The file name is a strftime template evaluated at the start of the current
//! rotation period. Periods are aligned to the Unix epoch, so a one-hour
//! period always starts on the hour (in UTC). When the period changes, the
//! next write opens a new file; an optional size cap opens numbered
//! generations (`name.1`, `name.2`, ...) within a period.

use crate::error::{Error, Result};
use chrono::format::{Item, StrftimeItems};
use chrono::{DateTime, Local, TimeZone};
use parking_lot::Mutex;
use std::fmt::Write as _;
use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};
use tracing::debug;

/// Settings for a [`RotatingWriter`]
#[derive(Debug, Clone)]
pub struct RotatingWriterConfig {
    /// strftime template for the file path, e.g. `/var/log/app.%Y-%m-%d`
    pub pattern: String,
    /// Symlink kept pointing at the current file
    pub link_name: Option<PathBuf>,
    /// Length of one rotation period
    pub rotation_period: Duration,
    /// Files matching the pattern older than this are deleted on rotation
    pub max_age: Option<Duration>,
    /// Start a new generation once the current file reaches this size
    pub max_size: Option<u64>,
}

impl RotatingWriterConfig {
    /// Default rotation period (one day)
    pub const DEFAULT_ROTATION_PERIOD: Duration = Duration::from_secs(24 * 60 * 60);

    /// Default retention (one week)
    pub const DEFAULT_MAX_AGE: Duration = Duration::from_secs(7 * 24 * 60 * 60);

    /// Daily rotation with one week of retention and no symlink
    pub fn new(pattern: impl Into<String>) -> Self {
        Self {
            pattern: pattern.into(),
            link_name: None,
            rotation_period: Self::DEFAULT_ROTATION_PERIOD,
            max_age: Some(Self::DEFAULT_MAX_AGE),
            max_size: None,
        }
    }

    /// Set the symlink path
    #[must_use]
    pub fn link_name(mut self, link_name: impl Into<PathBuf>) -> Self {
        self.link_name = Some(link_name.into());
        self
    }

    /// Set the rotation period
    #[must_use]
    pub const fn rotation_period(mut self, period: Duration) -> Self {
        self.rotation_period = period;
        self
    }

    /// Set the retention; zero keeps files forever
    #[must_use]
    pub const fn max_age(mut self, max_age: Duration) -> Self {
        self.max_age = if max_age.is_zero() {
            None
        } else {
            Some(max_age)
        };
        self
    }

    /// Set the size cap
    #[must_use]
    pub const fn max_size(mut self, bytes: u64) -> Self {
        self.max_size = Some(bytes);
        self
    }
}

struct State {
    file: File,
    path: PathBuf,
    base: String,
    generation: u32,
    size: u64,
}

/// A writer that switches files on period boundaries and size limits.
///
/// All methods take `&self`; writes are serialised by an internal lock.
pub struct RotatingWriter {
    config: RotatingWriterConfig,
    period_secs: i64,
    cleanup: Option<glob::Pattern>,
    state: Mutex<State>,
}

impl RotatingWriter {
    /// Validate `config` and open the file for the current period
    pub fn new(config: RotatingWriterConfig) -> Result<Self> {
        validate_pattern(&config.pattern)?;

        let period_secs = i64::try_from(config.rotation_period.as_secs())
            .ok()
            .filter(|secs| *secs > 0)
            .ok_or_else(|| {
                Error::Configuration(format!(
                    "rotation period must be at least one second, got {:?}",
                    config.rotation_period
                ))
            })?;

        let cleanup = match config.max_age {
            Some(_) => Some(cleanup_glob(&config.pattern)?),
            None => None,
        };

        let now = Local::now();
        let base = render(&config.pattern, period_start(now, period_secs))?;
        let path = PathBuf::from(&base);
        let file = open(&path)?;
        let size = file.metadata().map(|m| m.len()).unwrap_or(0);

        let writer = Self {
            config,
            period_secs,
            cleanup,
            state: Mutex::new(State {
                file,
                path,
                base,
                generation: 0,
                size,
            }),
        };

        {
            let state = writer.state.lock();
            writer.after_rotation(&state.path, now);
        }
        Ok(writer)
    }

    /// Settings this writer was created with
    pub fn config(&self) -> &RotatingWriterConfig {
        &self.config
    }

    /// Path of the file currently written to
    pub fn current_path(&self) -> PathBuf {
        self.state.lock().path.clone()
    }

    /// Write `buf` as if the current time were `now`.
    ///
    /// [`io::Write`] uses this with the wall clock.
    pub fn write_at(&self, now: DateTime<Local>, buf: &[u8]) -> io::Result<()> {
        let mut state = self.state.lock();

        let base = render(&self.config.pattern, period_start(now, self.period_secs))
            .map_err(io::Error::other)?;
        let size_exceeded = self
            .config
            .max_size
            .is_some_and(|max| state.size > 0 && state.size + buf.len() as u64 > max);

        if base != state.base {
            self.rotate(&mut state, base, 0, now)?;
        } else if size_exceeded {
            let generation = state.generation + 1;
            self.rotate(&mut state, base, generation, now)?;
        }

        state.file.write_all(buf)?;
        state.size += buf.len() as u64;
        Ok(())
    }

    fn rotate(
        &self,
        state: &mut State,
        base: String,
        generation: u32,
        now: DateTime<Local>,
    ) -> io::Result<()> {
        let path = if generation == 0 {
            PathBuf::from(&base)
        } else {
            PathBuf::from(format!("{base}.{generation}"))
        };

        let file = open(&path).map_err(io::Error::other)?;
        let size = file.metadata().map(|m| m.len()).unwrap_or(0);

        state.file.flush()?;
        debug!(from = %state.path.display(), to = %path.display(), "rotating log file");

        *state = State {
            file,
            path,
            base,
            generation,
            size,
        };
        self.after_rotation(&state.path, now);
        Ok(())
    }

    /// Symlink maintenance and pruning. Failures here do not stop logging.
    fn after_rotation(&self, current: &Path, now: DateTime<Local>) {
        if let Some(link) = &self.config.link_name {
            if let Err(err) = update_link(link, current) {
                eprintln!(
                    "hooklog-file: failed to link {} to {}: {err}",
                    link.display(),
                    current.display()
                );
            }
        }

        if let (Some(max_age), Some(cleanup)) = (self.config.max_age, &self.cleanup) {
            let cutoff = SystemTime::from(now)
                .checked_sub(max_age)
                .unwrap_or(SystemTime::UNIX_EPOCH);
            prune(cleanup, cutoff, current, self.config.link_name.as_deref());
        }
    }
}

impl Write for &RotatingWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.write_at(Local::now(), buf)?;
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        self.state.lock().file.flush()
    }
}

impl std::fmt::Debug for RotatingWriter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RotatingWriter")
            .field("config", &self.config)
            .field("current", &self.state.lock().path)
            .finish()
    }
}

fn validate_pattern(pattern: &str) -> Result<()> {
    if pattern.is_empty() || StrftimeItems::new(pattern).any(|item| matches!(item, Item::Error)) {
        return Err(Error::InvalidPattern(pattern.to_string()));
    }
    Ok(())
}

fn render(pattern: &str, at: DateTime<Local>) -> Result<String> {
    let mut out = String::new();
    write!(out, "{}", at.format(pattern)).map_err(|_| Error::InvalidPattern(pattern.to_string()))?;
    Ok(out)
}

fn period_start(now: DateTime<Local>, period_secs: i64) -> DateTime<Local> {
    let ts = now.timestamp();
    Local
        .timestamp_opt(ts - ts.rem_euclid(period_secs), 0)
        .single()
        .unwrap_or(now)
}

/// Glob matching every file the pattern can produce: each `%x` specifier
/// becomes `*`, everything else matches literally.
fn cleanup_glob(pattern: &str) -> Result<glob::Pattern> {
    let mut glob = String::with_capacity(pattern.len());
    let mut literal = String::new();
    let mut chars = pattern.chars();

    while let Some(c) = chars.next() {
        if c != '%' {
            literal.push(c);
            continue;
        }
        match chars.next() {
            Some('%') => literal.push('%'),
            _ => {
                glob.push_str(&glob::Pattern::escape(&literal));
                literal.clear();
                if !glob.ends_with('*') {
                    glob.push('*');
                }
            }
        }
    }
    glob.push_str(&glob::Pattern::escape(&literal));
    // Size-capped generations append `.N`.
    if !glob.ends_with('*') {
        glob.push('*');
    }

    glob::Pattern::new(&glob).map_err(|err| Error::InvalidPattern(format!("{pattern}: {err}")))
}

fn open(path: &Path) -> Result<File> {
    if let Some(dir) = path.parent().filter(|dir| !dir.as_os_str().is_empty()) {
        create_dir(dir)?;
    }
    OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .map_err(|source| Error::Open {
            path: path.to_path_buf(),
            source,
        })
}

/// Create `dir` and its parents, group-writable on Unix.
fn create_dir(dir: &Path) -> Result<()> {
    let mut builder = fs::DirBuilder::new();
    builder.recursive(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::DirBuilderExt;
        builder.mode(0o770);
    }
    builder.create(dir).map_err(|source| Error::CreateDirectory {
        path: dir.to_path_buf(),
        source,
    })
}

/// Point `link` at `target`, replacing any previous link atomically.
fn update_link(link: &Path, target: &Path) -> io::Result<()> {
    #[cfg(unix)]
    {
        let mut tmp = link.as_os_str().to_owned();
        tmp.push("_symlink");
        let tmp = PathBuf::from(tmp);

        let _ = fs::remove_file(&tmp);
        std::os::unix::fs::symlink(target, &tmp)?;
        fs::rename(&tmp, link)
    }

    #[cfg(not(unix))]
    {
        let _ = (link, target);
        Ok(())
    }
}

fn prune(cleanup: &glob::Pattern, cutoff: SystemTime, current: &Path, link: Option<&Path>) {
    let Ok(paths) = glob::glob(cleanup.as_str()) else {
        return;
    };

    for path in paths.flatten() {
        if path == current || Some(path.as_path()) == link {
            continue;
        }
        let Ok(meta) = fs::symlink_metadata(&path) else {
            continue;
        };
        if meta.file_type().is_symlink() || !meta.is_file() {
            continue;
        }
        if meta.modified().is_ok_and(|modified| modified < cutoff) {
            match fs::remove_file(&path) {
                Ok(()) => debug!(path = %path.display(), "removed expired log file"),
                Err(err) => eprintln!(
                    "hooklog-file: failed to remove expired log file {}: {err}",
                    path.display()
                ),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::FileTimes;
    use tempfile::TempDir;

    fn at(ts: i64) -> DateTime<Local> {
        Local.timestamp_opt(ts, 0).single().unwrap()
    }

    fn minute_writer(dir: &TempDir) -> RotatingWriter {
        let pattern = format!("{}/app.%s", dir.path().display());
        RotatingWriter::new(
            RotatingWriterConfig::new(pattern)
                .rotation_period(Duration::from_secs(60))
                .link_name(dir.path().join("app"))
                .max_age(Duration::ZERO),
        )
        .unwrap()
    }

    #[test]
    fn test_rejects_bad_config() {
        assert!(matches!(
            RotatingWriter::new(RotatingWriterConfig::new("app.%Q")),
            Err(Error::InvalidPattern(_))
        ));
        assert!(matches!(
            RotatingWriter::new(RotatingWriterConfig::new("")),
            Err(Error::InvalidPattern(_))
        ));

        let dir = TempDir::new().unwrap();
        let pattern = format!("{}/app.%s", dir.path().display());
        assert!(matches!(
            RotatingWriter::new(RotatingWriterConfig::new(pattern).rotation_period(Duration::ZERO)),
            Err(Error::Configuration(_))
        ));
    }

    #[test]
    fn test_period_boundary_opens_new_file() {
        let dir = TempDir::new().unwrap();
        let writer = minute_writer(&dir);

        writer.write_at(at(1_700_000_040), b"first\n").unwrap();
        let first = writer.current_path();
        assert!(first.ends_with("app.1700000040"));

        writer.write_at(at(1_700_000_059), b"same period\n").unwrap();
        assert_eq!(writer.current_path(), first);

        writer.write_at(at(1_700_000_100), b"second\n").unwrap();
        let second = writer.current_path();
        assert!(second.ends_with("app.1700000100"));

        assert_eq!(fs::read_to_string(&first).unwrap(), "first\nsame period\n");
        assert_eq!(fs::read_to_string(&second).unwrap(), "second\n");
    }

    #[cfg(unix)]
    #[test]
    fn test_link_follows_current_file() {
        let dir = TempDir::new().unwrap();
        let writer = minute_writer(&dir);
        let link = dir.path().join("app");

        writer.write_at(at(1_700_000_040), b"a\n").unwrap();
        assert_eq!(fs::read_link(&link).unwrap(), writer.current_path());

        writer.write_at(at(1_700_000_100), b"b\n").unwrap();
        assert_eq!(fs::read_link(&link).unwrap(), writer.current_path());
        assert_eq!(fs::read_to_string(&link).unwrap(), "b\n");
    }

    #[test]
    fn test_size_cap_starts_new_generation() {
        let dir = TempDir::new().unwrap();
        let pattern = format!("{}/sized.%s", dir.path().display());
        let writer = RotatingWriter::new(
            RotatingWriterConfig::new(pattern)
                .rotation_period(Duration::from_secs(60))
                .max_size(10),
        )
        .unwrap();

        let now = at(1_700_000_040);
        writer.write_at(now, b"12345678\n").unwrap();
        writer.write_at(now, b"abcdefgh\n").unwrap();
        writer.write_at(now, b"ABCDEFGH\n").unwrap();

        let base = dir.path().join("sized.1700000040");
        assert_eq!(fs::read_to_string(&base).unwrap(), "12345678\n");
        assert_eq!(
            fs::read_to_string(dir.path().join("sized.1700000040.1")).unwrap(),
            "abcdefgh\n"
        );
        assert_eq!(
            fs::read_to_string(dir.path().join("sized.1700000040.2")).unwrap(),
            "ABCDEFGH\n"
        );

        // A new period resets the generation.
        writer.write_at(at(1_700_000_100), b"next\n").unwrap();
        assert!(writer.current_path().ends_with("sized.1700000100"));
    }

    #[test]
    fn test_rotation_prunes_expired_files() {
        let dir = TempDir::new().unwrap();
        let stale = dir.path().join("pruned.1600000000");
        let fresh = dir.path().join("pruned.1699999980");
        let unrelated = dir.path().join("other.1600000000");
        for path in [&stale, &fresh, &unrelated] {
            fs::write(path, b"old\n").unwrap();
        }
        let two_days_ago = SystemTime::now() - Duration::from_secs(2 * 24 * 60 * 60);
        for path in [&stale, &unrelated] {
            File::options()
                .write(true)
                .open(path)
                .unwrap()
                .set_times(FileTimes::new().set_modified(two_days_ago))
                .unwrap();
        }

        let pattern = format!("{}/pruned.%s", dir.path().display());
        let writer = RotatingWriter::new(
            RotatingWriterConfig::new(pattern)
                .rotation_period(Duration::from_secs(60))
                .max_age(Duration::from_secs(24 * 60 * 60)),
        )
        .unwrap();
        (&writer).write_all(b"now\n").unwrap();

        assert!(!stale.exists());
        assert!(fresh.exists());
        assert!(unrelated.exists());
        assert!(writer.current_path().exists());
    }

    #[test]
    fn test_cleanup_glob_shape() {
        let glob = cleanup_glob("/var/log/app[1].%Y-%m-%d@%H:00").unwrap();
        assert!(glob.matches("/var/log/app[1].2024-01-02@03:00"));
        assert!(glob.matches("/var/log/app[1].2024-01-02@03:00.2"));
        assert!(!glob.matches("/var/log/app1.2024-01-02@03:00"));
    }

    #[test]
    fn test_creates_missing_directories() {
        let dir = TempDir::new().unwrap();
        let pattern = format!("{}/nested/deeper/app.%Y", dir.path().display());
        let writer = RotatingWriter::new(RotatingWriterConfig::new(pattern)).unwrap();
        assert!(writer.current_path().parent().unwrap().is_dir());
    }
}
