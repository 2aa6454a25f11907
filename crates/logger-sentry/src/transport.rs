//! Event transports

use crate::dsn::{CLIENT_NAME, Dsn};
use crate::error::{Error, Result};
use crate::event::SentryEvent;
use chrono::Utc;
use hooklog::{DeliveryError, FormatError};
use reqwest::Client;
use reqwest::header::{CONTENT_TYPE, USER_AGENT};
use std::fmt;
use std::thread::JoinHandle;
use std::time::Duration;
use tracing::debug;
use url::Url;

/// Sends events to an error tracker
pub trait ErrorTransport: Send + Sync + 'static {
    /// Deliver one event, blocking until the tracker answers or gives up
    fn send(&self, event: &SentryEvent) -> std::result::Result<(), DeliveryError>;
}

/// Settings for [`HttpTransport`]
#[derive(Debug, Clone)]
pub struct HttpTransportConfig {
    /// Per-request timeout
    pub timeout: Duration,
}

impl HttpTransportConfig {
    /// Default request timeout
    pub const DEFAULT_TIMEOUT: Duration = Duration::from_millis(100);

    /// Set the request timeout
    #[must_use]
    pub const fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

impl Default for HttpTransportConfig {
    fn default() -> Self {
        Self {
            timeout: Self::DEFAULT_TIMEOUT,
        }
    }
}

struct Request {
    body: Vec<u8>,
    reply: flume::Sender<std::result::Result<(), DeliveryError>>,
}

/// Posts events as JSON to the store endpoint of a DSN.
///
/// Requests run on a dedicated thread with its own single-threaded Tokio
/// runtime, so `send` works the same from plain threads and from inside
/// another runtime.
pub struct HttpTransport {
    store_url: Url,
    requests: Option<flume::Sender<Request>>,
    worker: Option<JoinHandle<()>>,
}

impl HttpTransport {
    /// Start a transport for `dsn`
    pub fn new(dsn: Dsn, config: HttpTransportConfig) -> Result<Self> {
        let store_url = dsn.store_url()?;
        let client = Client::builder()
            .timeout(config.timeout)
            .build()?;

        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(Error::Runtime)?;

        let (requests, receiver) = flume::unbounded::<Request>();
        let url = store_url.clone();
        let worker = std::thread::Builder::new()
            .name("hooklog-sentry".to_string())
            .spawn(move || {
                runtime.block_on(async move {
                    while let Ok(request) = receiver.recv_async().await {
                        let result = post(&client, &url, &dsn, request.body).await;
                        let _ = request.reply.send(result);
                    }
                });
            })
            .map_err(Error::Spawn)?;

        debug!(url = %store_url, timeout = ?config.timeout, "started error tracker transport");

        Ok(Self {
            store_url,
            requests: Some(requests),
            worker: Some(worker),
        })
    }

    /// Endpoint events are posted to
    pub fn store_url(&self) -> &Url {
        &self.store_url
    }
}

async fn post(
    client: &Client,
    url: &Url,
    dsn: &Dsn,
    body: Vec<u8>,
) -> std::result::Result<(), DeliveryError> {
    let response = client
        .post(url.clone())
        .header("X-Sentry-Auth", dsn.auth_header(Utc::now().timestamp()))
        .header(CONTENT_TYPE, "application/json")
        .header(USER_AGENT, CLIENT_NAME)
        .body(body)
        .send()
        .await
        .map_err(|err| DeliveryError::Transport(err.to_string()))?;

    response
        .error_for_status()
        .map(|_| ())
        .map_err(|err| DeliveryError::Transport(err.to_string()))
}

impl ErrorTransport for HttpTransport {
    fn send(&self, event: &SentryEvent) -> std::result::Result<(), DeliveryError> {
        let body = serde_json::to_vec(event).map_err(FormatError::from)?;
        let requests = self.requests.as_ref().ok_or(DeliveryError::Closed)?;

        let (reply, response) = flume::bounded(1);
        requests
            .send(Request { body, reply })
            .map_err(|_| DeliveryError::Closed)?;
        response.recv().map_err(|_| DeliveryError::Closed)?
    }
}

impl Drop for HttpTransport {
    fn drop(&mut self) {
        self.requests.take();
        if let Some(worker) = self.worker.take() {
            let _ = worker.join();
        }
    }
}

impl fmt::Debug for HttpTransport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HttpTransport")
            .field("store_url", &self.store_url.as_str())
            .finish_non_exhaustive()
    }
}
