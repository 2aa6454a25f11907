//! Asynchronous delivery
//!
//! [`AsyncSink`] wraps any [`Sink`] with a queue and a dedicated worker
//! thread. The logging call only enqueues; the worker delivers records to the
//! wrapped sink one at a time, in emission order.
//!
//! [`AsyncDeliveryCoordinator`] keeps a handle to every async sink a logger
//! registers so that [`AsyncDeliveryCoordinator::flush`] can drain all of them
//! before the process exits.

use crate::Record;
use crate::error::{DeliveryError, Error, Result};
use crate::sink::{Sink, report_delivery_failure};
use flume::{SendTimeoutError, TrySendError};
use parking_lot::Mutex;
use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::thread::JoinHandle;
use std::time::Duration;

/// What to do when a bounded queue is full
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OverflowPolicy {
    /// Discard the record and count it
    #[default]
    Drop,
    /// Wait up to the given duration for space, then discard and count
    Block(Duration),
}

/// Queue settings for an async sink
#[derive(Debug, Clone)]
pub struct AsyncOptions {
    /// Queue capacity; `None` means unbounded
    pub capacity: Option<usize>,
    /// Behaviour when the queue is full
    pub overflow: OverflowPolicy,
    /// Worker thread name
    pub name: String,
}

impl AsyncOptions {
    /// Default queue capacity
    pub const DEFAULT_CAPACITY: usize = 8192;

    /// Set the queue capacity
    #[must_use]
    pub const fn capacity(mut self, capacity: usize) -> Self {
        self.capacity = Some(capacity);
        self
    }

    /// Never drop records for lack of space
    #[must_use]
    pub const fn unbounded(mut self) -> Self {
        self.capacity = None;
        self
    }

    /// Set the overflow policy
    #[must_use]
    pub const fn overflow(mut self, overflow: OverflowPolicy) -> Self {
        self.overflow = overflow;
        self
    }

    /// Set the worker thread name
    #[must_use]
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }
}

impl Default for AsyncOptions {
    fn default() -> Self {
        Self {
            capacity: Some(Self::DEFAULT_CAPACITY),
            overflow: OverflowPolicy::Drop,
            name: "hooklog-async".to_string(),
        }
    }
}

/// Whether a sink delivers on the emitting thread or through a queue
#[derive(Debug, Clone, Default)]
pub enum DeliveryMode {
    /// Block the emitting call until the sink returns
    #[default]
    Sync,
    /// Enqueue and deliver on a background worker
    Async(AsyncOptions),
}

enum Message {
    Deliver(Record),
    Flush(flume::Sender<()>),
}

/// A sink that hands records to a background worker.
pub struct AsyncSink {
    name: String,
    sender: Option<flume::Sender<Message>>,
    worker: Option<JoinHandle<()>>,
    overflow: OverflowPolicy,
    dropped: AtomicU64,
}

impl AsyncSink {
    /// Start a worker thread that delivers to `inner`.
    pub fn spawn(inner: Arc<dyn Sink>, options: AsyncOptions) -> Result<Self> {
        let (sender, receiver) = match options.capacity {
            Some(capacity) => flume::bounded(capacity),
            None => flume::unbounded(),
        };

        let worker = std::thread::Builder::new()
            .name(options.name.clone())
            .spawn(move || worker_loop(inner, receiver))
            .map_err(Error::Spawn)?;

        tracing::debug!(
            name = %options.name,
            capacity = ?options.capacity,
            overflow = ?options.overflow,
            "started async log sink"
        );

        Ok(Self {
            name: options.name,
            sender: Some(sender),
            worker: Some(worker),
            overflow: options.overflow,
            dropped: AtomicU64::new(0),
        })
    }

    /// Worker thread name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Records discarded because the queue was full
    pub fn dropped(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }

    /// Records (and flush requests) waiting in the queue
    pub fn pending(&self) -> usize {
        self.sender.as_ref().map_or(0, flume::Sender::len)
    }

    fn record_drop(&self) {
        let total = self.dropped.fetch_add(1, Ordering::Relaxed) + 1;
        if total == 1 || total % 1000 == 0 {
            tracing::warn!(
                sink = %self.name,
                dropped = total,
                "async log queue full, dropping records"
            );
        }
    }
}

fn worker_loop(inner: Arc<dyn Sink>, receiver: flume::Receiver<Message>) {
    for message in receiver.iter() {
        match message {
            Message::Deliver(record) => {
                if let Err(err) = inner.deliver(&record) {
                    report_delivery_failure(record.level, &err);
                }
            }
            Message::Flush(ack) => {
                if let Err(err) = inner.flush() {
                    eprintln!("hooklog: flush failed: {err}");
                }
                let _ = ack.send(());
            }
        }
    }

    if let Err(err) = inner.flush() {
        eprintln!("hooklog: flush on shutdown failed: {err}");
    }
}

impl Sink for AsyncSink {
    fn deliver(&self, record: &Record) -> std::result::Result<(), DeliveryError> {
        let sender = self.sender.as_ref().ok_or(DeliveryError::Closed)?;
        let message = Message::Deliver(record.clone());

        let full = match self.overflow {
            OverflowPolicy::Drop => match sender.try_send(message) {
                Ok(()) => false,
                Err(TrySendError::Full(_)) => true,
                Err(TrySendError::Disconnected(_)) => return Err(DeliveryError::Closed),
            },
            OverflowPolicy::Block(timeout) => match sender.send_timeout(message, timeout) {
                Ok(()) => false,
                Err(SendTimeoutError::Timeout(_)) => true,
                Err(SendTimeoutError::Disconnected(_)) => return Err(DeliveryError::Closed),
            },
        };

        if full {
            self.record_drop();
        }
        Ok(())
    }

    /// Wait until every record queued before this call has been handed to
    /// the wrapped sink, then flush it.
    fn flush(&self) -> std::result::Result<(), DeliveryError> {
        let sender = self.sender.as_ref().ok_or(DeliveryError::Closed)?;
        let (ack_tx, ack_rx) = flume::bounded(1);
        sender
            .send(Message::Flush(ack_tx))
            .map_err(|_| DeliveryError::Closed)?;
        ack_rx.recv().map_err(|_| DeliveryError::Closed)
    }
}

impl Drop for AsyncSink {
    fn drop(&mut self) {
        // Closing the channel ends the worker loop once the queue is empty.
        self.sender.take();
        if let Some(worker) = self.worker.take() {
            if worker.join().is_err() {
                eprintln!("hooklog: async worker {} panicked", self.name);
            }
        }
    }
}

impl fmt::Debug for AsyncSink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AsyncSink")
            .field("name", &self.name)
            .field("overflow", &self.overflow)
            .field("pending", &self.pending())
            .field("dropped", &self.dropped())
            .finish()
    }
}

/// Tracks the async sinks registered through a logger.
#[derive(Debug, Default)]
pub struct AsyncDeliveryCoordinator {
    sinks: Mutex<Vec<Arc<AsyncSink>>>,
}

impl AsyncDeliveryCoordinator {
    /// Create a coordinator with no sinks
    pub fn new() -> Self {
        Self::default()
    }

    /// Wrap `inner` in an [`AsyncSink`] and track it.
    pub fn spawn(&self, inner: Arc<dyn Sink>, options: AsyncOptions) -> Result<Arc<AsyncSink>> {
        let sink = Arc::new(AsyncSink::spawn(inner, options)?);
        self.track(Arc::clone(&sink));
        Ok(sink)
    }

    /// Track an async sink created elsewhere
    pub fn track(&self, sink: Arc<AsyncSink>) {
        self.sinks.lock().push(sink);
    }

    /// Drain every tracked sink.
    ///
    /// Blocks until all records queued before the call have been handed to
    /// their transports. Every sink is flushed even if an earlier one fails;
    /// the first failure is returned.
    pub fn flush(&self) -> std::result::Result<(), DeliveryError> {
        let sinks = self.sinks.lock().clone();
        let mut first_error = None;
        for sink in &sinks {
            if let Err(err) = sink.flush() {
                tracing::warn!(sink = %sink.name(), error = %err, "failed to flush async log sink");
                first_error.get_or_insert(err);
            }
        }
        first_error.map_or(Ok(()), Err)
    }

    /// Number of tracked sinks
    pub fn len(&self) -> usize {
        self.sinks.lock().len()
    }

    /// Whether no sink is tracked
    pub fn is_empty(&self) -> bool {
        self.sinks.lock().is_empty()
    }

    /// Records dropped across all tracked sinks
    pub fn dropped(&self) -> u64 {
        self.sinks.lock().iter().map(|sink| sink.dropped()).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Level;
    use std::sync::mpsc;

    /// Blocks every delivery until the test releases it.
    struct Gate {
        release: Mutex<mpsc::Receiver<()>>,
        delivered: Mutex<Vec<String>>,
        flushes: AtomicU64,
    }

    impl Gate {
        fn new() -> (Arc<Self>, mpsc::Sender<()>) {
            let (tx, rx) = mpsc::channel();
            let gate = Arc::new(Self {
                release: Mutex::new(rx),
                delivered: Mutex::new(Vec::new()),
                flushes: AtomicU64::new(0),
            });
            (gate, tx)
        }
    }

    impl Sink for Gate {
        fn deliver(&self, record: &Record) -> std::result::Result<(), DeliveryError> {
            let _ = self.release.lock().recv();
            self.delivered.lock().push(record.message.clone());
            Ok(())
        }

        fn flush(&self) -> std::result::Result<(), DeliveryError> {
            self.flushes.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    /// Delivers immediately.
    #[derive(Default)]
    struct Collect {
        delivered: Mutex<Vec<String>>,
    }

    impl Sink for Collect {
        fn deliver(&self, record: &Record) -> std::result::Result<(), DeliveryError> {
            self.delivered.lock().push(record.message.clone());
            Ok(())
        }
    }

    #[test]
    fn test_flush_drains_in_order() {
        let inner = Arc::new(Collect::default());
        let sink = AsyncSink::spawn(inner.clone(), AsyncOptions::default()).unwrap();

        for i in 0..100 {
            sink.deliver(&Record::new(Level::Info, format!("m{i}"))).unwrap();
        }
        sink.flush().unwrap();

        let delivered = inner.delivered.lock().clone();
        let expected: Vec<String> = (0..100).map(|i| format!("m{i}")).collect();
        assert_eq!(delivered, expected);
        assert_eq!(sink.pending(), 0);
    }

    #[test]
    fn test_flush_is_idempotent() {
        let inner = Arc::new(Collect::default());
        let sink = AsyncSink::spawn(inner.clone(), AsyncOptions::default()).unwrap();
        sink.deliver(&Record::new(Level::Warn, "once")).unwrap();

        sink.flush().unwrap();
        sink.flush().unwrap();

        assert_eq!(*inner.delivered.lock(), vec!["once".to_string()]);
    }

    #[test]
    fn test_full_queue_drops_and_counts() {
        let (gate, release) = Gate::new();
        let sink = AsyncSink::spawn(gate.clone(), AsyncOptions::default().capacity(1)).unwrap();

        // The worker takes the first record and blocks on the gate, the
        // second fills the queue, the rest are dropped.
        sink.deliver(&Record::new(Level::Info, "a")).unwrap();
        while sink.pending() > 0 {
            std::thread::yield_now();
        }
        sink.deliver(&Record::new(Level::Info, "b")).unwrap();
        sink.deliver(&Record::new(Level::Info, "c")).unwrap();
        sink.deliver(&Record::new(Level::Info, "d")).unwrap();

        assert_eq!(sink.dropped(), 2);

        release.send(()).unwrap();
        release.send(()).unwrap();
        sink.flush().unwrap();
        assert_eq!(*gate.delivered.lock(), vec!["a".to_string(), "b".to_string()]);
    }

    #[test]
    fn test_block_policy_times_out_and_counts() {
        let (gate, release) = Gate::new();
        let options = AsyncOptions::default()
            .capacity(1)
            .overflow(OverflowPolicy::Block(Duration::from_millis(20)));
        let sink = AsyncSink::spawn(gate.clone(), options).unwrap();

        sink.deliver(&Record::new(Level::Info, "a")).unwrap();
        while sink.pending() > 0 {
            std::thread::yield_now();
        }
        sink.deliver(&Record::new(Level::Info, "b")).unwrap();
        sink.deliver(&Record::new(Level::Info, "c")).unwrap();
        assert_eq!(sink.dropped(), 1);

        release.send(()).unwrap();
        release.send(()).unwrap();
        sink.flush().unwrap();
    }

    #[test]
    fn test_drop_drains_queue() {
        let inner = Arc::new(Collect::default());
        {
            let sink = AsyncSink::spawn(inner.clone(), AsyncOptions::default().unbounded()).unwrap();
            for i in 0..10 {
                sink.deliver(&Record::new(Level::Debug, format!("{i}"))).unwrap();
            }
        }
        assert_eq!(inner.delivered.lock().len(), 10);
    }

    #[test]
    fn test_coordinator_flushes_every_sink() {
        let coordinator = AsyncDeliveryCoordinator::new();
        let first = Arc::new(Collect::default());
        let second = Arc::new(Collect::default());

        let a = coordinator.spawn(first.clone(), AsyncOptions::default()).unwrap();
        let b = coordinator.spawn(second.clone(), AsyncOptions::default()).unwrap();
        assert_eq!(coordinator.len(), 2);

        for i in 0..50 {
            a.deliver(&Record::new(Level::Error, format!("a{i}"))).unwrap();
            b.deliver(&Record::new(Level::Error, format!("b{i}"))).unwrap();
        }
        coordinator.flush().unwrap();

        assert_eq!(first.delivered.lock().len(), 50);
        assert_eq!(second.delivered.lock().len(), 50);
        assert_eq!(coordinator.dropped(), 0);
    }

    #[test]
    fn test_flush_reaches_wrapped_sink() {
        let (gate, _release) = Gate::new();
        let sink = AsyncSink::spawn(gate.clone(), AsyncOptions::default()).unwrap();
        sink.flush().unwrap();
        sink.flush().unwrap();
        assert_eq!(gate.flushes.load(Ordering::SeqCst), 2);
    }
}
