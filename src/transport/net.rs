use std::io::{self, Read, Write};
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr, Shutdown, SocketAddr, TcpStream, ToSocketAddrs};
use std::time::Duration;

use socket2::{Domain, Protocol, SockRef, Socket, TcpKeepalive, Type};
use tracing::{debug, info, warn};

use super::{tls, Endpoint, Received, TlsSettings, Transport};
use crate::error::TransportError;

const READ_BUFFER_SIZE: usize = 16 * 1024;

enum ReadOutcome {
    Bytes(usize),
    WouldBlock,
    Closed,
}

/// A TCP connection, optionally wrapped in TLS.
pub struct NetTransport {
    stream: Option<TcpStream>,
    tls: Option<rustls::ClientConnection>,
    read_buf: Box<[u8]>,
    /// Plaintext connections only; TLS buffers inside rustls.
    pending: Vec<u8>,
}

impl Default for NetTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl NetTransport {
    pub fn new() -> Self {
        Self {
            stream: None,
            tls: None,
            read_buf: vec![0; READ_BUFFER_SIZE].into_boxed_slice(),
            pending: Vec::new(),
        }
    }

    fn open(endpoint: &Endpoint) -> Result<TcpStream, TransportError> {
        let addrs = (endpoint.host.as_str(), endpoint.port).to_socket_addrs()?;
        let mut last_err = None;

        for addr in addrs {
            match Self::open_one(addr, endpoint) {
                Ok(stream) => return Ok(stream),
                Err(e) => {
                    debug!(%addr, "connect failed: {}", e);
                    last_err = Some(e);
                }
            }
        }

        Err(last_err
            .unwrap_or_else(|| {
                io::Error::new(io::ErrorKind::NotFound, "host resolved to no addresses")
            })
            .into())
    }

    fn open_one(addr: SocketAddr, endpoint: &Endpoint) -> io::Result<TcpStream> {
        let socket = Socket::new(Domain::for_address(addr), Type::STREAM, Some(Protocol::TCP))?;

        if endpoint.bind_address.is_some() || endpoint.bind_port.is_some() {
            let ip = match endpoint.bind_address.as_deref() {
                Some(text) => text.parse::<IpAddr>().map_err(|_| {
                    io::Error::new(io::ErrorKind::InvalidInput, format!("bad bind address {text}"))
                })?,
                None if addr.is_ipv6() => IpAddr::V6(Ipv6Addr::UNSPECIFIED),
                None => IpAddr::V4(Ipv4Addr::UNSPECIFIED),
            };
            let local = SocketAddr::new(ip, endpoint.bind_port.unwrap_or(0));
            socket.bind(&local.into())?;
        }

        socket.connect(&addr.into())?;
        let stream: TcpStream = socket.into();

        if let Err(e) = Self::enable_keepalive(&stream) {
            warn!("failed to enable TCP keepalive: {}", e);
        }
        Ok(stream)
    }

    fn enable_keepalive(stream: &TcpStream) -> io::Result<()> {
        let sock = SockRef::from(stream);
        let keepalive = TcpKeepalive::new()
            .with_time(Duration::from_secs(120))
            .with_interval(Duration::from_secs(30));

        sock.set_tcp_keepalive(&keepalive)
    }

    fn handshake(stream: &mut TcpStream, conn: &mut rustls::ClientConnection) -> io::Result<()> {
        while conn.is_handshaking() {
            conn.complete_io(stream)?;
        }
        while conn.wants_write() {
            conn.write_tls(stream)?;
        }
        Ok(())
    }

    /// Write out whatever is buffered; stop quietly when the socket is full.
    fn flush(&mut self) -> Result<(), TransportError> {
        let Some(stream) = self.stream.as_mut() else {
            return Err(TransportError::NotConnected);
        };

        if let Some(conn) = self.tls.as_mut() {
            while conn.wants_write() {
                match conn.write_tls(stream) {
                    Ok(_) => {}
                    Err(e) if e.kind() == io::ErrorKind::WouldBlock => break,
                    Err(e) => return Err(e.into()),
                }
            }
            return Ok(());
        }

        while !self.pending.is_empty() {
            match stream.write(&self.pending) {
                Ok(0) => return Err(io::Error::from(io::ErrorKind::WriteZero).into()),
                Ok(n) => {
                    self.pending.drain(..n);
                }
                Err(e) if e.kind() == io::ErrorKind::WouldBlock => break,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => {}
                Err(e) => return Err(e.into()),
            }
        }
        Ok(())
    }

    fn read_some(&mut self) -> Result<ReadOutcome, TransportError> {
        let Some(stream) = self.stream.as_mut() else {
            return Err(TransportError::NotConnected);
        };

        let Some(conn) = self.tls.as_mut() else {
            return match stream.read(&mut self.read_buf) {
                Ok(0) => Ok(ReadOutcome::Closed),
                Ok(n) => Ok(ReadOutcome::Bytes(n)),
                Err(e) if is_retry(&e) => Ok(ReadOutcome::WouldBlock),
                Err(e) => Err(e.into()),
            };
        };

        if let Some(outcome) = read_plaintext(conn, &mut self.read_buf)? {
            return Ok(outcome);
        }

        match conn.read_tls(stream) {
            Ok(0) => return Ok(ReadOutcome::Closed),
            Ok(_) => {}
            Err(e) if is_retry(&e) => return Ok(ReadOutcome::WouldBlock),
            Err(e) => return Err(e.into()),
        }

        if let Err(e) = conn.process_new_packets() {
            // Deliver the alert before giving up.
            let _ = conn.write_tls(stream);
            return Err(e.into());
        }

        Ok(read_plaintext(conn, &mut self.read_buf)?.unwrap_or(ReadOutcome::WouldBlock))
    }
}

fn is_retry(e: &io::Error) -> bool {
    matches!(
        e.kind(),
        io::ErrorKind::WouldBlock | io::ErrorKind::Interrupted
    )
}

fn read_plaintext(
    conn: &mut rustls::ClientConnection,
    buf: &mut [u8],
) -> io::Result<Option<ReadOutcome>> {
    match conn.reader().read(buf) {
        Ok(0) => Ok(Some(ReadOutcome::Closed)),
        Ok(n) => Ok(Some(ReadOutcome::Bytes(n))),
        Err(e) if e.kind() == io::ErrorKind::WouldBlock => Ok(None),
        Err(e) if e.kind() == io::ErrorKind::UnexpectedEof => Ok(Some(ReadOutcome::Closed)),
        Err(e) => Err(e),
    }
}

impl Transport for NetTransport {
    fn connect(&mut self, endpoint: &Endpoint, tls: &TlsSettings) -> Result<(), TransportError> {
        self.shutdown();

        info!(host = %endpoint.host, port = endpoint.port, tls = endpoint.tls, "connecting");
        let stream = Self::open(endpoint)?;
        self.stream = Some(stream);

        if endpoint.tls {
            if let Err(e) = self.start_tls(&endpoint.host, tls) {
                self.shutdown();
                return Err(e);
            }
        } else if let Some(stream) = &self.stream {
            stream.set_nonblocking(true)?;
        }
        Ok(())
    }

    fn start_tls(&mut self, server_name: &str, tls: &TlsSettings) -> Result<(), TransportError> {
        let Some(stream) = self.stream.as_mut() else {
            return Err(TransportError::NotConnected);
        };
        let mut conn = tls::client_connection(server_name, tls)?;

        stream.set_nonblocking(false)?;
        let handshake = Self::handshake(stream, &mut conn);
        stream.set_nonblocking(true)?;
        handshake?;

        debug!(
            server = server_name,
            version = ?conn.protocol_version(),
            "TLS established"
        );
        self.pending.clear();
        self.tls = Some(conn);
        Ok(())
    }

    fn send(&mut self, data: &[u8]) -> Result<(), TransportError> {
        match self.tls.as_mut() {
            Some(conn) => conn.writer().write_all(data)?,
            None if self.stream.is_some() => self.pending.extend_from_slice(data),
            None => return Err(TransportError::NotConnected),
        }
        self.flush()
    }

    fn receive(&mut self) -> Result<Received<'_>, TransportError> {
        self.flush()?;
        match self.read_some()? {
            ReadOutcome::Bytes(n) => Ok(Received::Data(&self.read_buf[..n])),
            ReadOutcome::WouldBlock => Ok(Received::WouldBlock),
            ReadOutcome::Closed => Ok(Received::Closed),
        }
    }

    fn shutdown(&mut self) {
        if let Some(mut stream) = self.stream.take() {
            if let Some(mut conn) = self.tls.take() {
                conn.send_close_notify();
                let _ = conn.write_tls(&mut stream);
            }
            let _ = stream.shutdown(Shutdown::Both);
        }
        self.tls = None;
        self.pending.clear();
    }

    fn is_connected(&self) -> bool {
        self.stream.is_some()
    }

    fn is_tls(&self) -> bool {
        self.tls.is_some()
    }

    fn local_host(&self) -> String {
        self.stream
            .as_ref()
            .and_then(|s| s.local_addr().ok())
            .map(|addr| addr.ip().to_string())
            .unwrap_or_else(|| "localhost".to_owned())
    }
}
