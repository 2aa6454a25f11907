#![allow(dead_code)]

use hooklog::test_support::CaptureSink;
use hooklog::{DeliveryError, Record, Sink};
use std::sync::Arc;
use std::time::Duration;

/// Capture sink that sleeps before every delivery, standing in for a slow
/// transport.
pub struct SlowSink {
    inner: CaptureSink,
    delay: Duration,
}

impl SlowSink {
    pub fn new(delay: Duration) -> Arc<Self> {
        Arc::new(Self {
            inner: CaptureSink::new(),
            delay,
        })
    }

    pub fn messages(&self) -> Vec<String> {
        self.inner.messages()
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }
}

impl Sink for SlowSink {
    fn deliver(&self, record: &Record) -> Result<(), DeliveryError> {
        std::thread::sleep(self.delay);
        self.inner.deliver(record)
    }
}
