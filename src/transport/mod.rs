//! Byte-stream transports.
//!
//! The client talks to the network only through the [`Transport`] trait:
//! a non-blocking socket that can be upgraded to TLS in place. Each
//! [`Transport::receive`] returns a view into one buffer the transport
//! reuses, valid only until the next call.
//!
//! [`NetTransport`] is the real implementation (TCP via `socket2`, TLS via
//! `rustls`); [`MemoryTransport`] is a scripted stand-in for tests.

mod memory;
mod net;
mod tls;

use std::path::PathBuf;

pub use self::memory::{MemoryHandle, MemoryTransport};
pub use self::net::NetTransport;
use crate::error::TransportError;

/// Where to connect.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Endpoint {
    pub host: String,
    pub port: u16,
    /// Negotiate TLS right after the TCP connect.
    pub tls: bool,
    /// Local address to bind before connecting.
    pub bind_address: Option<String>,
    /// Local port to bind before connecting.
    pub bind_port: Option<u16>,
}

impl Endpoint {
    pub fn new(host: &str, port: u16, tls: bool) -> Self {
        Self {
            host: host.to_owned(),
            port,
            tls,
            bind_address: None,
            bind_port: None,
        }
    }
}

/// Client certificate material for TLS.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TlsSettings {
    /// PEM certificate chain.
    pub certificate: Option<PathBuf>,
    /// PEM private key; read from the certificate file when absent.
    pub key: Option<PathBuf>,
}

/// Outcome of one [`Transport::receive`].
#[derive(Debug, PartialEq, Eq)]
pub enum Received<'a> {
    /// Bytes read, borrowed from the transport's buffer.
    Data(&'a [u8]),
    /// Nothing available right now.
    WouldBlock,
    /// The peer closed the connection.
    Closed,
}

pub trait Transport {
    /// Open a connection, performing the TLS handshake when
    /// `endpoint.tls` is set. The socket is non-blocking afterwards.
    fn connect(&mut self, endpoint: &Endpoint, tls: &TlsSettings) -> Result<(), TransportError>;

    /// Upgrade the open plaintext connection to TLS. The handshake runs
    /// in blocking mode; non-blocking mode is restored afterwards.
    fn start_tls(&mut self, server_name: &str, tls: &TlsSettings) -> Result<(), TransportError>;

    /// Queue `data` and write as much as the socket accepts.
    fn send(&mut self, data: &[u8]) -> Result<(), TransportError>;

    /// Read once without blocking.
    fn receive(&mut self) -> Result<Received<'_>, TransportError>;

    /// Close the connection. Never fails.
    fn shutdown(&mut self);

    fn is_connected(&self) -> bool;

    fn is_tls(&self) -> bool;

    /// Our side of the connection, as sent in `USER`.
    fn local_host(&self) -> String;
}
