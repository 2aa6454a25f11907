//! Logger facade

use crate::delivery::{AsyncDeliveryCoordinator, AsyncOptions, AsyncSink, DeliveryMode};
use crate::error::{DeliveryError, Result};
use crate::formatter::{Formatter, TextFormatter};
use crate::registry::HookRegistry;
use crate::sink::Sink;
use crate::{CallSite, Fields, Level, Record};
use chrono::Local;
use parking_lot::{Mutex, RwLock};
use serde_json::Value;
use std::fmt;
use std::io::{self, Write};
use std::sync::Arc;
use std::sync::atomic::{AtomicU8, Ordering};

/// State shared by a logger and every handle derived from it with
/// [`Logger::with`].
struct Target {
    registry: HookRegistry,
    level: AtomicU8,
    output: Mutex<Box<dyn Write + Send>>,
    formatter: RwLock<Arc<dyn Formatter>>,
    exit: RwLock<fn(i32)>,
}

fn process_exit(code: i32) {
    std::process::exit(code)
}

/// Leveled logger handle.
///
/// Cloning is cheap. Every record goes to the hook registry first and then,
/// rendered with the logger's own formatter, to its default output.
///
/// ```no_run
/// use hooklog::{Level, Logger};
///
/// let logger = Logger::stdout().with("service", "billing");
/// logger.set_level(Level::Info);
/// logger.info("started");
/// hooklog::warn!(logger, "{} retries left", 2);
/// ```
#[derive(Clone)]
pub struct Logger {
    target: Arc<Target>,
    fields: Arc<Fields>,
    coordinator: Arc<AsyncDeliveryCoordinator>,
}

impl Logger {
    /// Create a logger writing to `output` at level debug with the text
    /// formatter and no hooks.
    pub fn new<W: Write + Send + 'static>(output: W) -> Self {
        Self {
            target: Arc::new(Target {
                registry: HookRegistry::new(),
                level: AtomicU8::new(Level::Debug as u8),
                output: Mutex::new(Box::new(output)),
                formatter: RwLock::new(Arc::new(TextFormatter::new())),
                exit: RwLock::new(process_exit),
            }),
            fields: Arc::default(),
            coordinator: Arc::new(AsyncDeliveryCoordinator::new()),
        }
    }

    /// Logger writing to standard output
    pub fn stdout() -> Self {
        Self::new(io::stdout())
    }

    /// Logger whose default output discards everything. Hooks still fire.
    pub fn nop() -> Self {
        Self::new(io::sink())
    }

    /// Return a handle with one more field. The parent is left unchanged.
    ///
    /// Both handles share the same registry, output and async sinks. A key
    /// that is already present is overwritten in the new handle.
    pub fn with(&self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        let mut fields = (*self.fields).clone();
        fields.insert(key.into(), value.into());
        self.derive(fields)
    }

    /// Like [`Logger::with`] for several fields at once
    pub fn with_fields<I, K, V>(&self, fields: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<Value>,
    {
        let mut merged = (*self.fields).clone();
        merged.extend(fields.into_iter().map(|(k, v)| (k.into(), v.into())));
        self.derive(merged)
    }

    fn derive(&self, fields: Fields) -> Self {
        Self {
            target: Arc::clone(&self.target),
            fields: Arc::new(fields),
            coordinator: Arc::clone(&self.coordinator),
        }
    }

    /// Fields attached to this handle
    pub fn fields(&self) -> &Fields {
        &self.fields
    }

    /// Minimum level that is emitted
    pub fn level(&self) -> Level {
        Level::from_index(self.target.level.load(Ordering::Relaxed) as usize)
            .unwrap_or(Level::Debug)
    }

    /// Change the minimum level for this logger and every handle sharing its
    /// target
    pub fn set_level(&self, level: Level) {
        self.target.level.store(level as u8, Ordering::Relaxed);
    }

    /// Whether a record at `level` would be emitted
    #[inline]
    pub fn is_enabled(&self, level: Level) -> bool {
        level >= self.level()
    }

    /// Redirect the default output
    pub fn set_output<W: Write + Send + 'static>(&self, output: W) {
        *self.target.output.lock() = Box::new(output);
    }

    /// Replace the formatter used for the default output.
    ///
    /// Sinks keep the formatter they were registered with.
    pub fn set_formatter(&self, formatter: Arc<dyn Formatter>) {
        *self.target.formatter.write() = formatter;
    }

    /// Formatter used for the default output
    pub fn formatter(&self) -> Arc<dyn Formatter> {
        self.target.formatter.read().clone()
    }

    /// Replace the function [`Logger::fatal`] calls after logging
    pub fn set_exit_func(&self, exit: fn(i32)) {
        *self.target.exit.write() = exit;
    }

    /// The hook registry records are dispatched to
    pub fn registry(&self) -> &HookRegistry {
        &self.target.registry
    }

    /// Async sinks registered through this logger
    pub fn coordinator(&self) -> &Arc<AsyncDeliveryCoordinator> {
        &self.coordinator
    }

    /// Register a synchronous sink for every level at or above `threshold`
    pub fn register_sink(&self, sink: Arc<dyn Sink>, threshold: Level) {
        self.target.registry.register(sink, threshold);
    }

    /// Wrap `sink` in a background worker and register it.
    ///
    /// The returned handle is also tracked by the logger's coordinator, so
    /// [`Logger::flush`] drains it.
    pub fn register_async_sink(
        &self,
        sink: Arc<dyn Sink>,
        options: AsyncOptions,
        threshold: Level,
    ) -> Result<Arc<AsyncSink>> {
        let async_sink = self.coordinator.spawn(sink, options)?;
        self.target
            .registry
            .register(Arc::clone(&async_sink) as Arc<dyn Sink>, threshold);
        Ok(async_sink)
    }

    /// Register `sink` either directly or behind an async worker.
    ///
    /// Backend crates use this so the same constructor serves both modes.
    pub fn register_with_mode(
        &self,
        sink: Arc<dyn Sink>,
        mode: DeliveryMode,
        threshold: Level,
    ) -> Result<()> {
        match mode {
            DeliveryMode::Sync => self.register_sink(sink, threshold),
            DeliveryMode::Async(options) => {
                self.register_async_sink(sink, options, threshold)?;
            }
        }
        Ok(())
    }

    /// Block until every async sink has handed over its queued records
    pub fn flush(&self) -> std::result::Result<(), DeliveryError> {
        self.coordinator.flush()
    }

    /// Log `message` at `level`.
    ///
    /// Unlike [`Logger::fatal`] and [`Logger::panic`], this only emits the
    /// record, whatever the level.
    #[track_caller]
    pub fn log(&self, level: Level, message: impl fmt::Display) {
        self.log_at(level, message, CallSite::caller());
    }

    /// Log with an explicit call site
    pub fn log_at(&self, level: Level, message: impl fmt::Display, call_site: CallSite) {
        if !self.is_enabled(level) {
            return;
        }

        let record = Record {
            time: Local::now(),
            level,
            message: message.to_string(),
            fields: Arc::clone(&self.fields),
            call_site,
        };

        self.target.registry.dispatch(&record);
        self.write_output(&record);
    }

    fn write_output(&self, record: &Record) {
        let formatter = self.formatter();
        let bytes = match formatter.format(record) {
            Ok(bytes) => bytes,
            Err(err) => {
                eprintln!("hooklog: failed to format {} record: {err}", record.level);
                return;
            }
        };

        let mut output = self.target.output.lock();
        if let Err(err) = output.write_all(&bytes) {
            eprintln!("hooklog: failed to write log output: {err}");
        }
    }

    /// Log at debug level
    #[track_caller]
    pub fn debug(&self, message: impl fmt::Display) {
        self.log_at(Level::Debug, message, CallSite::caller());
    }

    /// Log at info level
    #[track_caller]
    pub fn info(&self, message: impl fmt::Display) {
        self.log_at(Level::Info, message, CallSite::caller());
    }

    /// Log at warn level
    #[track_caller]
    pub fn warn(&self, message: impl fmt::Display) {
        self.log_at(Level::Warn, message, CallSite::caller());
    }

    /// Log at error level
    #[track_caller]
    pub fn error(&self, message: impl fmt::Display) {
        self.log_at(Level::Error, message, CallSite::caller());
    }

    /// Log at fatal level, drain async sinks, then call the exit function
    /// with status 1.
    ///
    /// The exit function is [`std::process::exit`] unless replaced with
    /// [`Logger::set_exit_func`]. It runs even when fatal records are below
    /// the logger's level.
    #[track_caller]
    pub fn fatal(&self, message: impl fmt::Display) {
        self.log_at(Level::Fatal, message, CallSite::caller());
        if let Err(err) = self.coordinator.flush() {
            eprintln!("hooklog: flush before exit failed: {err}");
        }
        let exit = *self.target.exit.read();
        exit(1);
    }

    /// Log at panic level, then panic with the message
    #[track_caller]
    pub fn panic(&self, message: impl fmt::Display) -> ! {
        let message = message.to_string();
        self.log_at(Level::Panic, &message, CallSite::caller());
        panic!("{message}");
    }

    /// An [`io::Write`] adapter that logs every write at error level.
    ///
    /// Useful for components that only accept a writer for their error
    /// output. The call site of every record is where the writer was created.
    #[track_caller]
    pub fn error_writer(&self) -> ErrorLogWriter {
        ErrorLogWriter {
            logger: self.clone(),
            call_site: CallSite::caller(),
        }
    }
}

impl fmt::Debug for Logger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Logger")
            .field("level", &self.level())
            .field("fields", &self.fields)
            .field("registry", &self.target.registry)
            .field("async_sinks", &self.coordinator.len())
            .finish()
    }
}

/// Writer returned by [`Logger::error_writer`]
#[derive(Debug, Clone)]
pub struct ErrorLogWriter {
    logger: Logger,
    call_site: CallSite,
}

impl Write for ErrorLogWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let text = String::from_utf8_lossy(buf);
        let message = text.trim_end_matches(|c| c == '\n' || c == '\r');
        if !message.is_empty() {
            self.logger.log_at(Level::Error, message, self.call_site);
        }
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::formatter::PrefixedFormatter;
    use crate::test_support::{CaptureSink, SharedBuffer};
    use std::sync::atomic::AtomicI32;

    fn buffered() -> (Logger, SharedBuffer) {
        let buffer = SharedBuffer::new();
        let logger = Logger::new(buffer.clone());
        logger.set_formatter(Arc::new(TextFormatter::new().without_timestamp()));
        (logger, buffer)
    }

    #[test]
    fn test_default_output_uses_formatter() {
        let (logger, buffer) = buffered();
        let line = line!() + 1;
        logger.info("ready");
        assert_eq!(
            buffer.contents(),
            format!("level=info msg=ready source=\"logger.rs:{line}\"\n")
        );
    }

    #[test]
    fn test_level_filters_output_and_hooks() {
        let (logger, buffer) = buffered();
        let sink = Arc::new(CaptureSink::new());
        logger.register_sink(sink.clone(), Level::Debug);
        logger.set_level(Level::Warn);

        logger.debug("hidden");
        logger.info("hidden");
        logger.warn("shown");

        assert_eq!(sink.messages(), vec!["shown".to_string()]);
        assert!(!buffer.contents().contains("hidden"));
        assert!(logger.is_enabled(Level::Error));
        assert!(!logger.is_enabled(Level::Info));
    }

    #[test]
    fn test_with_layers_fields_without_touching_parent() {
        let (parent, _buffer) = buffered();
        let sink = Arc::new(CaptureSink::new());
        parent.register_sink(sink.clone(), Level::Debug);

        let child = parent.with("request", "r-1").with("attempt", 1);
        let grandchild = child.with("attempt", 2);

        parent.info("parent");
        child.info("child");
        grandchild.info("grandchild");

        let records = sink.records();
        assert!(records[0].fields.is_empty());
        assert_eq!(records[1].field("request"), Some(&Value::from("r-1")));
        assert_eq!(records[1].field("attempt"), Some(&Value::from(1)));
        assert_eq!(records[2].field("attempt"), Some(&Value::from(2)));
        assert!(parent.fields().is_empty());
    }

    #[test]
    fn test_with_fields_merges() {
        let logger = Logger::nop().with("a", 1);
        let logger = logger.with_fields([("b", Value::from(2)), ("a", Value::from(3))]);
        assert_eq!(logger.fields().get("a"), Some(&Value::from(3)));
        assert_eq!(logger.fields().len(), 2);
    }

    #[test]
    fn test_fatal_calls_exit_func() {
        static CODE: AtomicI32 = AtomicI32::new(0);
        fn record_exit(code: i32) {
            CODE.store(code, Ordering::SeqCst);
        }

        let (logger, buffer) = buffered();
        logger.set_exit_func(record_exit);
        logger.fatal("cannot continue");

        assert_eq!(CODE.load(Ordering::SeqCst), 1);
        assert!(buffer.contents().contains("level=fatal"));
    }

    #[test]
    fn test_panic_logs_then_panics() {
        let (logger, _buffer) = buffered();
        let sink = Arc::new(CaptureSink::new());
        logger.register_sink(sink.clone(), Level::Panic);

        let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            logger.panic("invariant broken");
        }));

        assert!(result.is_err());
        assert_eq!(sink.levels(), vec![Level::Panic]);
    }

    #[test]
    fn test_error_writer_logs_lines() {
        let (logger, _buffer) = buffered();
        let sink = Arc::new(CaptureSink::new());
        logger.register_sink(sink.clone(), Level::Debug);

        let line = line!() + 1;
        let mut writer = logger.error_writer();
        writer.write_all(b"http: TLS handshake error\n").unwrap();
        writer.write_all(b"\n").unwrap();

        let records = sink.records();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].level, Level::Error);
        assert_eq!(records[0].message, "http: TLS handshake error");
        assert_eq!(records[0].call_site, CallSite::new("logger.rs", line));
    }

    #[test]
    fn test_set_formatter_changes_default_output_only() {
        let (logger, buffer) = buffered();
        let sink = Arc::new(CaptureSink::new());
        logger.register_sink(sink.clone(), Level::Debug);
        logger.set_formatter(Arc::new(PrefixedFormatter));

        logger.warn("disk");

        assert!(buffer.contents().contains("[warn]["));
        assert_eq!(sink.len(), 1);
    }

    #[test]
    fn test_set_output_redirects() {
        let (logger, first) = buffered();
        let second = SharedBuffer::new();
        logger.info("one");
        logger.set_output(second.clone());
        logger.info("two");

        assert!(first.contents().contains("msg=one"));
        assert!(!first.contents().contains("msg=two"));
        assert!(second.contents().contains("msg=two"));
    }

    #[test]
    fn test_register_with_mode() {
        let logger = Logger::nop();
        let direct = Arc::new(CaptureSink::new());
        let queued = Arc::new(CaptureSink::new());
        logger
            .register_with_mode(direct.clone(), DeliveryMode::Sync, Level::Info)
            .unwrap();
        logger
            .register_with_mode(
                queued.clone(),
                DeliveryMode::Async(AsyncOptions::default()),
                Level::Error,
            )
            .unwrap();

        logger.info("a");
        logger.error("b");
        logger.flush().unwrap();

        assert_eq!(direct.messages(), vec!["a".to_string(), "b".to_string()]);
        assert_eq!(queued.messages(), vec!["b".to_string()]);
        assert_eq!(logger.coordinator().len(), 1);
    }
}
