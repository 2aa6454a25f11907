//! GELF log-aggregator sinks for hooklog
//!
//! Records at or above a threshold are sent to a Graylog-compatible
//! aggregator as GELF over UDP, compressed and chunked as needed. Delivery is
//! best effort: a datagram that never arrives is not reported.
//!
//! ```no_run
//! use hooklog::{Fields, Level, Logger};
//! use hooklog_graylog::GraylogHookExt;
//!
//! let logger = Logger::stdout();
//! let mut extra = Fields::new();
//! extra.insert("app".into(), "ledger".into());
//! logger.add_async_graylog_hook("graylog.internal", 12201, extra, Level::Info)?;
//! logger.info("ledger started");
//! logger.graylog_flush()?;
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

#![warn(missing_docs, unreachable_pub)]
#![forbid(unsafe_code)]

mod error;
mod hook;
mod message;
mod sink;
mod transport;

pub use error::{Error, Result};
pub use hook::GraylogHookExt;
pub use message::{GELF_VERSION, GelfMessage, gelf_level};
pub use sink::GraylogSink;
pub use transport::{AggregatorTransport, Compression, UdpGelfTransport, UdpTransportConfig};
