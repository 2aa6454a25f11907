//! Sink turning records into error-tracker events

use crate::event::SentryEvent;
use crate::transport::ErrorTransport;
use hooklog::{DeliveryError, Record, Sink, local_hostname};
use std::collections::BTreeMap;
use std::sync::Arc;

/// Converts each record into a [`SentryEvent`] and hands it to a transport
pub struct SentrySink {
    transport: Arc<dyn ErrorTransport>,
    tags: BTreeMap<String, String>,
    server_name: String,
}

impl SentrySink {
    /// Create a sink attaching `tags` to every event
    pub fn new(transport: Arc<dyn ErrorTransport>, tags: BTreeMap<String, String>) -> Self {
        Self {
            transport,
            tags,
            server_name: local_hostname(),
        }
    }

    /// Override the reported host name
    #[must_use]
    pub fn with_server_name(mut self, server_name: impl Into<String>) -> Self {
        self.server_name = server_name.into();
        self
    }

    /// Tags attached to every event
    pub fn tags(&self) -> &BTreeMap<String, String> {
        &self.tags
    }

    /// Host name reported with every event
    pub fn server_name(&self) -> &str {
        &self.server_name
    }
}

impl Sink for SentrySink {
    fn deliver(&self, record: &Record) -> Result<(), DeliveryError> {
        let event = SentryEvent::from_record(record, &self.tags, &self.server_name);
        self.transport.send(&event)
    }
}

impl std::fmt::Debug for SentrySink {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SentrySink")
            .field("tags", &self.tags)
            .field("server_name", &self.server_name)
            .finish_non_exhaustive()
    }
}
