use std::cell::RefCell;
use std::collections::VecDeque;
use std::io;
use std::rc::Rc;

use super::{Endpoint, Received, TlsSettings, Transport};
use crate::error::TransportError;

#[derive(Debug, Default)]
struct Script {
    connected: bool,
    tls: bool,
    inbound: VecDeque<Vec<u8>>,
    close_after_inbound: bool,
    reset_next_receive: bool,
    failing_connects: usize,
    fail_tls: bool,
    sent: Vec<u8>,
    connects: Vec<Endpoint>,
    tls_upgrades: usize,
}

/// An in-memory [`Transport`] driven by a [`MemoryHandle`].
///
/// Inbound chunks are delivered exactly as pushed, one per receive, so a
/// test controls where lines are split.
#[derive(Debug)]
pub struct MemoryTransport {
    script: Rc<RefCell<Script>>,
    buf: Vec<u8>,
}

/// The test's side of a [`MemoryTransport`].
#[derive(Debug, Clone)]
pub struct MemoryHandle {
    script: Rc<RefCell<Script>>,
}

impl MemoryTransport {
    pub fn new() -> (Self, MemoryHandle) {
        let script = Rc::new(RefCell::new(Script::default()));
        let handle = MemoryHandle {
            script: Rc::clone(&script),
        };
        (
            Self {
                script,
                buf: Vec::new(),
            },
            handle,
        )
    }
}

impl MemoryHandle {
    /// Queue one inbound chunk.
    pub fn push(&self, chunk: impl AsRef<[u8]>) {
        self.script
            .borrow_mut()
            .inbound
            .push_back(chunk.as_ref().to_vec());
    }

    /// Queue one inbound line, terminated with CRLF.
    pub fn push_line(&self, line: &str) {
        self.push(format!("{line}\r\n"));
    }

    /// Report end-of-stream once the queued chunks are consumed.
    pub fn close(&self) {
        self.script.borrow_mut().close_after_inbound = true;
    }

    /// Fail the next receive with a connection reset.
    pub fn reset(&self) {
        self.script.borrow_mut().reset_next_receive = true;
    }

    /// Refuse the next `count` connection attempts.
    pub fn fail_connects(&self, count: usize) {
        self.script.borrow_mut().failing_connects = count;
    }

    /// Make TLS handshakes fail.
    pub fn fail_tls(&self, fail: bool) {
        self.script.borrow_mut().fail_tls = fail;
    }

    /// Every line sent so far, without terminators.
    pub fn sent_lines(&self) -> Vec<String> {
        split_lines(&self.script.borrow().sent)
    }

    /// Lines sent since the last call.
    pub fn take_sent(&self) -> Vec<String> {
        let sent = std::mem::take(&mut self.script.borrow_mut().sent);
        split_lines(&sent)
    }

    /// Connection attempts made, successful or not.
    pub fn connects(&self) -> Vec<Endpoint> {
        self.script.borrow().connects.clone()
    }

    pub fn tls_upgrades(&self) -> usize {
        self.script.borrow().tls_upgrades
    }

    pub fn is_connected(&self) -> bool {
        self.script.borrow().connected
    }

    pub fn is_tls(&self) -> bool {
        self.script.borrow().tls
    }
}

fn split_lines(bytes: &[u8]) -> Vec<String> {
    String::from_utf8_lossy(bytes)
        .split("\r\n")
        .filter(|line| !line.is_empty())
        .map(str::to_owned)
        .collect()
}

impl Transport for MemoryTransport {
    fn connect(&mut self, endpoint: &Endpoint, _tls: &TlsSettings) -> Result<(), TransportError> {
        let mut script = self.script.borrow_mut();
        script.connects.push(endpoint.clone());

        if script.failing_connects > 0 {
            script.failing_connects -= 1;
            return Err(io::Error::from(io::ErrorKind::ConnectionRefused).into());
        }
        if endpoint.tls && script.fail_tls {
            return Err(io::Error::new(io::ErrorKind::InvalidData, "handshake failed").into());
        }

        script.connected = true;
        script.tls = endpoint.tls;
        script.close_after_inbound = false;
        script.reset_next_receive = false;
        Ok(())
    }

    fn start_tls(&mut self, _server_name: &str, _tls: &TlsSettings) -> Result<(), TransportError> {
        let mut script = self.script.borrow_mut();
        if !script.connected {
            return Err(TransportError::NotConnected);
        }
        script.tls_upgrades += 1;
        if script.fail_tls {
            return Err(io::Error::new(io::ErrorKind::InvalidData, "handshake failed").into());
        }
        script.tls = true;
        Ok(())
    }

    fn send(&mut self, data: &[u8]) -> Result<(), TransportError> {
        let mut script = self.script.borrow_mut();
        if !script.connected {
            return Err(TransportError::NotConnected);
        }
        script.sent.extend_from_slice(data);
        Ok(())
    }

    fn receive(&mut self) -> Result<Received<'_>, TransportError> {
        let mut script = self.script.borrow_mut();
        if !script.connected {
            return Err(TransportError::NotConnected);
        }
        if std::mem::take(&mut script.reset_next_receive) {
            return Err(io::Error::from(io::ErrorKind::ConnectionReset).into());
        }

        match script.inbound.pop_front() {
            Some(chunk) => {
                drop(script);
                self.buf = chunk;
                Ok(Received::Data(&self.buf))
            }
            None if script.close_after_inbound => Ok(Received::Closed),
            None => Ok(Received::WouldBlock),
        }
    }

    fn shutdown(&mut self) {
        let mut script = self.script.borrow_mut();
        script.connected = false;
        script.tls = false;
        script.inbound.clear();
        script.close_after_inbound = false;
    }

    fn is_connected(&self) -> bool {
        self.script.borrow().connected
    }

    fn is_tls(&self) -> bool {
        self.script.borrow().tls
    }

    fn local_host(&self) -> String {
        "localhost".to_owned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scripted_exchange() {
        let (mut transport, handle) = MemoryTransport::new();
        let endpoint = Endpoint::new("irc.example.net", 6667, false);

        handle.fail_connects(1);
        assert!(transport.connect(&endpoint, &TlsSettings::default()).is_err());
        transport.connect(&endpoint, &TlsSettings::default()).unwrap();
        assert_eq!(handle.connects().len(), 2);

        handle.push("PING :a\r\nPI");
        handle.push("NG :b\r\n");
        handle.close();
        assert_eq!(transport.receive().unwrap(), Received::Data(b"PING :a\r\nPI"));
        assert_eq!(transport.receive().unwrap(), Received::Data(b"NG :b\r\n"));
        assert_eq!(transport.receive().unwrap(), Received::Closed);

        transport.send(b"PONG :a\r\nPONG :b\r\n").unwrap();
        assert_eq!(handle.take_sent(), vec!["PONG :a", "PONG :b"]);
        assert!(handle.take_sent().is_empty());
    }

    #[test]
    fn test_reset_and_tls() {
        let (mut transport, handle) = MemoryTransport::new();
        transport
            .connect(&Endpoint::new("h", 1, false), &TlsSettings::default())
            .unwrap();
        transport.start_tls("h", &TlsSettings::default()).unwrap();
        assert!(handle.is_tls());

        handle.reset();
        assert!(matches!(transport.receive(), Err(TransportError::Io(_))));
        assert_eq!(transport.receive().unwrap(), Received::WouldBlock);

        transport.shutdown();
        assert!(!handle.is_connected());
        assert!(transport.send(b"x").is_err());
    }
}
