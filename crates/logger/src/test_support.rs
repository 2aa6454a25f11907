//! Test support utilities
//!
//! Sinks and writers that capture what a logger produces so tests can assert
//! on it. Only available with the `test-support` feature.

use crate::error::DeliveryError;
use crate::sink::Sink;
use crate::{Level, Record};
use parking_lot::Mutex;
use std::io;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// A sink that keeps every record it receives
#[derive(Debug, Default)]
pub struct CaptureSink {
    records: Mutex<Vec<Record>>,
    failing: AtomicBool,
}

impl CaptureSink {
    /// Create an empty capture sink
    pub fn new() -> Self {
        Self::default()
    }

    /// All captured records, oldest first
    pub fn records(&self) -> Vec<Record> {
        self.records.lock().clone()
    }

    /// Messages of all captured records
    pub fn messages(&self) -> Vec<String> {
        self.records
            .lock()
            .iter()
            .map(|r| r.message.clone())
            .collect()
    }

    /// Levels of all captured records
    pub fn levels(&self) -> Vec<Level> {
        self.records.lock().iter().map(|r| r.level).collect()
    }

    /// Number of captured records
    pub fn len(&self) -> usize {
        self.records.lock().len()
    }

    /// Whether nothing was captured
    pub fn is_empty(&self) -> bool {
        self.records.lock().is_empty()
    }

    /// Forget captured records
    pub fn clear(&self) {
        self.records.lock().clear();
    }

    /// Make subsequent deliveries fail after recording the record
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::Relaxed);
    }
}

impl Sink for CaptureSink {
    fn deliver(&self, record: &Record) -> Result<(), DeliveryError> {
        self.records.lock().push(record.clone());
        if self.failing.load(Ordering::Relaxed) {
            return Err(DeliveryError::Transport("capture sink set to fail".into()));
        }
        Ok(())
    }
}

/// Cloneable in-memory writer for capturing a logger's default output
#[derive(Debug, Clone, Default)]
pub struct SharedBuffer(Arc<Mutex<Vec<u8>>>);

impl SharedBuffer {
    /// Create an empty buffer
    pub fn new() -> Self {
        Self::default()
    }

    /// Everything written so far
    pub fn contents(&self) -> String {
        String::from_utf8_lossy(&self.0.lock()).into_owned()
    }

    /// Captured output split into lines
    pub fn lines(&self) -> Vec<String> {
        self.contents().lines().map(str::to_owned).collect()
    }
}

impl io::Write for SharedBuffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}
