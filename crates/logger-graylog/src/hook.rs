//! Log-aggregator hook registration on [`Logger`]

use crate::error::Result;
use crate::sink::GraylogSink;
use crate::transport::{AggregatorTransport, UdpGelfTransport, UdpTransportConfig};
use hooklog::{AsyncOptions, DeliveryError, DeliveryMode, Fields, Level, Logger};
use std::sync::Arc;
use tracing::debug;

/// Log-aggregator hooks for [`Logger`]
pub trait GraylogHookExt {
    /// Register a sink on a custom transport
    fn add_graylog_hook_with_transport(
        &self,
        transport: Arc<dyn AggregatorTransport>,
        extra: Fields,
        mode: DeliveryMode,
        level: Level,
    ) -> Result<()>;

    /// Synchronous sink sending GELF over UDP to `host:port`
    fn add_graylog_hook(&self, host: &str, port: u16, extra: Fields, level: Level) -> Result<()> {
        let transport = UdpGelfTransport::new(host, port, UdpTransportConfig::default())?;
        self.add_graylog_hook_with_transport(Arc::new(transport), extra, DeliveryMode::Sync, level)
    }

    /// Queued sink sending GELF over UDP to `host:port`
    fn add_async_graylog_hook(
        &self,
        host: &str,
        port: u16,
        extra: Fields,
        level: Level,
    ) -> Result<()> {
        let transport = UdpGelfTransport::new(host, port, UdpTransportConfig::default())?;
        let options = AsyncOptions::default().name("hooklog-graylog-async");
        self.add_graylog_hook_with_transport(
            Arc::new(transport),
            extra,
            DeliveryMode::Async(options),
            level,
        )
    }

    /// Drain every queued sink of the logger, aggregator or not
    fn graylog_flush(&self) -> std::result::Result<(), DeliveryError>;
}

impl GraylogHookExt for Logger {
    fn add_graylog_hook_with_transport(
        &self,
        transport: Arc<dyn AggregatorTransport>,
        extra: Fields,
        mode: DeliveryMode,
        level: Level,
    ) -> Result<()> {
        let sink = Arc::new(GraylogSink::new(transport, extra));
        self.register_with_mode(sink, mode, level)?;
        debug!(level = %level, "registered log aggregator hook");
        Ok(())
    }

    fn graylog_flush(&self) -> std::result::Result<(), DeliveryError> {
        self.flush()
    }
}
