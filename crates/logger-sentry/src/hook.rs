//! Error-tracker hook registration on [`Logger`]

use crate::dsn::Dsn;
use crate::error::Result;
use crate::sink::SentrySink;
use crate::transport::{ErrorTransport, HttpTransport, HttpTransportConfig};
use hooklog::{AsyncOptions, DeliveryMode, Level, Logger};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::debug;

/// Error-tracker hooks for [`Logger`]
pub trait SentryHookExt {
    /// Register a sink on a custom transport
    fn add_sentry_hook_with_transport(
        &self,
        transport: Arc<dyn ErrorTransport>,
        tags: BTreeMap<String, String>,
        mode: DeliveryMode,
        level: Level,
    ) -> Result<()>;

    /// Synchronous sink posting to `dsn`
    fn add_sentry_hook(&self, dsn: &str, level: Level) -> Result<()> {
        self.add_sentry_hook_with_tags(dsn, BTreeMap::new(), level)
    }

    /// Synchronous sink posting to `dsn`, attaching `tags` to every event
    fn add_sentry_hook_with_tags(
        &self,
        dsn: &str,
        tags: BTreeMap<String, String>,
        level: Level,
    ) -> Result<()> {
        let transport = http_transport(dsn)?;
        self.add_sentry_hook_with_transport(transport, tags, DeliveryMode::Sync, level)
    }

    /// Queued sink posting to `dsn`
    fn add_async_sentry_hook(&self, dsn: &str, level: Level) -> Result<()> {
        self.add_async_sentry_hook_with_tags(dsn, BTreeMap::new(), level)
    }

    /// Queued sink posting to `dsn`, attaching `tags` to every event
    fn add_async_sentry_hook_with_tags(
        &self,
        dsn: &str,
        tags: BTreeMap<String, String>,
        level: Level,
    ) -> Result<()> {
        let transport = http_transport(dsn)?;
        let options = AsyncOptions::default().name("hooklog-sentry-async");
        self.add_sentry_hook_with_transport(transport, tags, DeliveryMode::Async(options), level)
    }
}

fn http_transport(dsn: &str) -> Result<Arc<dyn ErrorTransport>> {
    let dsn: Dsn = dsn.parse()?;
    Ok(Arc::new(HttpTransport::new(dsn, HttpTransportConfig::default())?))
}

impl SentryHookExt for Logger {
    fn add_sentry_hook_with_transport(
        &self,
        transport: Arc<dyn ErrorTransport>,
        tags: BTreeMap<String, String>,
        mode: DeliveryMode,
        level: Level,
    ) -> Result<()> {
        let sink = Arc::new(SentrySink::new(transport, tags));
        self.register_with_mode(sink, mode, level)?;
        debug!(level = %level, "registered error tracker hook");
        Ok(())
    }
}
