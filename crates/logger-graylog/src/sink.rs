//! Sink turning records into GELF messages

use crate::message::GelfMessage;
use crate::transport::AggregatorTransport;
use hooklog::{DeliveryError, Fields, Record, Sink, local_hostname};
use std::sync::Arc;

/// Converts each record into a [`GelfMessage`] and hands it to a transport
pub struct GraylogSink {
    transport: Arc<dyn AggregatorTransport>,
    extra: Fields,
    host: String,
}

impl GraylogSink {
    /// Create a sink merging `extra` into every message
    pub fn new(transport: Arc<dyn AggregatorTransport>, extra: Fields) -> Self {
        Self {
            transport,
            extra,
            host: local_hostname(),
        }
    }

    /// Override the reported host name
    #[must_use]
    pub fn with_host(mut self, host: impl Into<String>) -> Self {
        self.host = host.into();
        self
    }

    /// Host name reported with every message
    pub fn host(&self) -> &str {
        &self.host
    }
}

impl Sink for GraylogSink {
    fn deliver(&self, record: &Record) -> Result<(), DeliveryError> {
        let message = GelfMessage::from_record(record, &self.extra, &self.host);
        self.transport.send(&message)
    }
}

impl std::fmt::Debug for GraylogSink {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GraylogSink")
            .field("extra", &self.extra)
            .field("host", &self.host)
            .finish_non_exhaustive()
    }
}
