//! Per-level hook registry
//!
//! The registry keeps one ordered list of sinks per level. Registering a
//! sink at a threshold appends it to the list of every level at or above
//! that threshold, so dispatch is a single lookup by the record's level.
//!
//! Dispatch reads an immutable snapshot of the table; registration copies
//! the table and swaps the new one in. Records dispatched concurrently with
//! a registration see either the old or the new table, never a partial one.

use crate::sink::{Sink, report_delivery_failure};
use crate::{Level, Record};
use arc_swap::ArcSwap;
use std::fmt;
use std::sync::Arc;

type Table = [Vec<Arc<dyn Sink>>; Level::COUNT];

/// Level-indexed lists of sinks.
pub struct HookRegistry {
    table: ArcSwap<Table>,
}

impl HookRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self {
            table: ArcSwap::from_pointee(Default::default()),
        }
    }

    /// Register `sink` for every level at or above `threshold`.
    ///
    /// The same sink instance is shared by all of those levels. Sinks are
    /// invoked in registration order.
    pub fn register(&self, sink: Arc<dyn Sink>, threshold: Level) {
        self.table.rcu(|current| {
            let mut next: Table = (**current).clone();
            for level in threshold.expand() {
                next[level.index()].push(Arc::clone(&sink));
            }
            next
        });
        tracing::debug!(%threshold, "registered log sink");
    }

    /// Hand `record` to every sink registered for its level.
    ///
    /// A failing sink is reported on stderr and does not stop delivery to
    /// the sinks after it.
    pub fn dispatch(&self, record: &Record) {
        let table = self.table.load();
        for sink in &table[record.level.index()] {
            if let Err(err) = sink.deliver(record) {
                report_delivery_failure(record.level, &err);
            }
        }
    }

    /// Number of sinks registered for `level`
    pub fn len(&self, level: Level) -> usize {
        self.table.load()[level.index()].len()
    }

    /// Whether no sink is registered at any level
    pub fn is_empty(&self) -> bool {
        self.table.load().iter().all(Vec::is_empty)
    }

    /// Snapshot of the sinks registered for `level`, in order
    pub fn sinks(&self, level: Level) -> Vec<Arc<dyn Sink>> {
        self.table.load()[level.index()].clone()
    }
}

impl Default for HookRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for HookRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let table = self.table.load();
        let mut map = f.debug_map();
        for level in Level::ALL {
            map.entry(&level.as_str(), &table[level.index()].len());
        }
        map.finish()
    }
}
