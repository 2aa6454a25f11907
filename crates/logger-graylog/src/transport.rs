//! GELF over UDP

use crate::error::{Error, Result};
use crate::message::GelfMessage;
use flate2::write::{GzEncoder, ZlibEncoder};
use hooklog::{DeliveryError, FormatError};
use std::io::{self, Write};
use std::net::{SocketAddr, ToSocketAddrs, UdpSocket};
use tracing::debug;

/// Sends messages to a log aggregator
pub trait AggregatorTransport: Send + Sync + 'static {
    /// Deliver one message
    fn send(&self, message: &GelfMessage) -> std::result::Result<(), DeliveryError>;
}

/// Payload compression
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Compression {
    /// Plain JSON
    None,
    /// gzip
    Gzip,
    /// zlib
    #[default]
    Zlib,
}

const CHUNK_MAGIC: [u8; 2] = [0x1e, 0x0f];
const CHUNK_HEADER_LEN: usize = 12;
const MAX_CHUNKS: usize = 128;

/// Settings for [`UdpGelfTransport`]
#[derive(Debug, Clone)]
pub struct UdpTransportConfig {
    /// Payload compression
    pub compression: Compression,
    /// Largest datagram sent; bigger payloads are chunked. Values too small
    /// to carry a chunk header are treated as the smallest usable size.
    pub chunk_size: usize,
}

impl UdpTransportConfig {
    /// Default datagram size limit
    pub const DEFAULT_CHUNK_SIZE: usize = 1420;

    /// Set the compression
    #[must_use]
    pub const fn compression(mut self, compression: Compression) -> Self {
        self.compression = compression;
        self
    }

    /// Set the datagram size limit. Values too small to carry a chunk header
    /// are raised to the smallest usable size.
    #[must_use]
    pub const fn chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = if chunk_size > CHUNK_HEADER_LEN {
            chunk_size
        } else {
            CHUNK_HEADER_LEN + 1
        };
        self
    }
}

impl Default for UdpTransportConfig {
    fn default() -> Self {
        Self {
            compression: Compression::default(),
            chunk_size: Self::DEFAULT_CHUNK_SIZE,
        }
    }
}

/// Fire-and-forget GELF transport
#[derive(Debug)]
pub struct UdpGelfTransport {
    socket: UdpSocket,
    target: SocketAddr,
    config: UdpTransportConfig,
}

impl UdpGelfTransport {
    /// Resolve `host:port` and open a local socket for it
    pub fn new(host: &str, port: u16, config: UdpTransportConfig) -> Result<Self> {
        let resolve_error = |source| Error::Resolve {
            addr: format!("{host}:{port}"),
            source,
        };
        let target = (host, port)
            .to_socket_addrs()
            .map_err(resolve_error)?
            .next()
            .ok_or_else(|| {
                resolve_error(io::Error::new(io::ErrorKind::NotFound, "no addresses"))
            })?;

        let bind = if target.is_ipv4() { "0.0.0.0:0" } else { "[::]:0" };
        let socket = UdpSocket::bind(bind).map_err(Error::Socket)?;

        debug!(%target, compression = ?config.compression, "opened GELF transport");
        Ok(Self {
            socket,
            target,
            config,
        })
    }

    /// Aggregator address
    pub fn target(&self) -> SocketAddr {
        self.target
    }

    fn encode(&self, message: &GelfMessage) -> std::result::Result<Vec<u8>, DeliveryError> {
        let json = serde_json::to_vec(message).map_err(FormatError::from)?;
        let level = flate2::Compression::default();
        let payload = match self.config.compression {
            Compression::None => json,
            Compression::Gzip => {
                let mut encoder = GzEncoder::new(Vec::new(), level);
                encoder.write_all(&json)?;
                encoder.finish()?
            }
            Compression::Zlib => {
                let mut encoder = ZlibEncoder::new(Vec::new(), level);
                encoder.write_all(&json)?;
                encoder.finish()?
            }
        };
        Ok(payload)
    }
}

impl AggregatorTransport for UdpGelfTransport {
    fn send(&self, message: &GelfMessage) -> std::result::Result<(), DeliveryError> {
        let payload = self.encode(message)?;
        let id: [u8; 8] = rand::random();
        for datagram in chunks(&payload, self.config.chunk_size, id)? {
            self.socket.send_to(&datagram, self.target)?;
        }
        Ok(())
    }
}

/// Split `payload` into datagrams of at most `chunk_size` bytes.
///
/// A payload that fits is sent as is. Otherwise each chunk carries the magic
/// bytes, the message id, its sequence number and the chunk count.
pub(crate) fn chunks(
    payload: &[u8],
    chunk_size: usize,
    id: [u8; 8],
) -> std::result::Result<Vec<Vec<u8>>, DeliveryError> {
    let chunk_size = chunk_size.max(CHUNK_HEADER_LEN + 1);
    if payload.len() <= chunk_size {
        return Ok(vec![payload.to_vec()]);
    }

    let data_len = chunk_size - CHUNK_HEADER_LEN;
    let count = payload.len().div_ceil(data_len);
    if count > MAX_CHUNKS {
        return Err(DeliveryError::Transport(format!(
            "message of {} bytes needs {count} chunks, limit is {MAX_CHUNKS}",
            payload.len()
        )));
    }

    Ok(payload
        .chunks(data_len)
        .enumerate()
        .map(|(seq, data)| {
            let mut datagram = Vec::with_capacity(CHUNK_HEADER_LEN + data.len());
            datagram.extend_from_slice(&CHUNK_MAGIC);
            datagram.extend_from_slice(&id);
            datagram.push(seq as u8);
            datagram.push(count as u8);
            datagram.extend_from_slice(data);
            datagram
        })
        .collect())
}
