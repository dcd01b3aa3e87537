//! Reassembly of transport chunks into complete IRC lines.
//!
//! A receive may end in the middle of a line, or carry several lines at
//! once. [`LineBuffer`] copies every chunk into storage it owns, so the
//! transport's read buffer can be reused right away, and hands out a line
//! only once its terminator has arrived.
//!
//! `\r\n`, a lone `\r` and a lone `\n` all terminate a line. Empty lines
//! carry nothing in IRC and are skipped, which also keeps a `\r\n` pair
//! split across two receives from producing a spurious empty line.

use bytes::{Buf, BytesMut};
use tracing::warn;

/// Longest line accepted, terminator excluded.
pub const MAX_IRC_LINE_LEN: usize = 8191;

/// Accumulates raw bytes and yields terminated lines in arrival order.
#[derive(Debug)]
pub struct LineBuffer {
    buffer: BytesMut,
    /// Length of the buffered prefix known to hold no terminator.
    scanned: usize,
    max_line_len: usize,
    discarding: bool,
}

impl Default for LineBuffer {
    fn default() -> Self {
        Self::new()
    }
}

impl LineBuffer {
    /// Create an empty buffer with the default line limit.
    pub fn new() -> Self {
        Self::with_max_line_len(MAX_IRC_LINE_LEN)
    }

    /// Create an empty buffer that drops lines longer than `max_line_len`.
    pub fn with_max_line_len(max_line_len: usize) -> Self {
        Self {
            buffer: BytesMut::with_capacity(4096),
            scanned: 0,
            max_line_len,
            discarding: false,
        }
    }

    /// Append one received chunk.
    pub fn push(&mut self, chunk: &[u8]) {
        self.buffer.extend_from_slice(chunk);

        // An unterminated tail that already exceeds the limit can never
        // become a valid line; stop buffering it.
        if self.find_terminator().is_none() && self.buffer.len() > self.max_line_len {
            warn!(
                len = self.buffer.len(),
                limit = self.max_line_len,
                "discarding overlong line"
            );
            self.buffer.clear();
            self.scanned = 0;
            self.discarding = true;
        }
    }

    /// Position of the first terminator, looking only at bytes not
    /// scanned before.
    fn find_terminator(&mut self) -> Option<usize> {
        match self.buffer[self.scanned..].iter().position(|&b| is_terminator(b)) {
            Some(offset) => Some(self.scanned + offset),
            None => {
                self.scanned = self.buffer.len();
                None
            }
        }
    }

    /// Take the next complete line, without its terminator.
    pub fn next_line(&mut self) -> Option<String> {
        loop {
            let end = self.find_terminator()?;
            let line = self.buffer.split_to(end);
            self.buffer.advance(1);
            self.scanned = 0;

            if std::mem::take(&mut self.discarding) || line.len() > self.max_line_len {
                continue;
            }
            if line.is_empty() {
                continue;
            }

            return Some(String::from_utf8_lossy(&line).into_owned());
        }
    }

    /// Number of buffered bytes not yet returned as a line.
    pub fn pending(&self) -> usize {
        self.buffer.len()
    }

    /// Drop everything buffered, e.g. after the connection was torn down.
    pub fn clear(&mut self) {
        self.buffer.clear();
        self.scanned = 0;
        self.discarding = false;
    }
}

#[inline]
fn is_terminator(b: u8) -> bool {
    b == b'\r' || b == b'\n'
}

#[cfg(test)]
mod tests {
    use super::*;

    fn drain(buffer: &mut LineBuffer) -> Vec<String> {
        std::iter::from_fn(|| buffer.next_line()).collect()
    }

    #[test]
    fn test_several_lines_in_one_chunk() {
        let mut buffer = LineBuffer::new();
        buffer.push(b"PING :a\r\nPING :b\r\n");
        assert_eq!(drain(&mut buffer), vec!["PING :a", "PING :b"]);
        assert_eq!(buffer.pending(), 0);
    }

    #[test]
    fn test_line_spanning_receives() {
        let mut buffer = LineBuffer::new();
        buffer.push(b":srv NOTICE * :hel");
        assert!(buffer.next_line().is_none());
        buffer.push(b"lo\r\n");
        assert_eq!(drain(&mut buffer), vec![":srv NOTICE * :hello"]);
    }

    #[test]
    fn test_all_terminators() {
        let mut buffer = LineBuffer::new();
        buffer.push(b"one\rtwo\nthree\r\nfour");
        assert_eq!(drain(&mut buffer), vec!["one", "two", "three"]);
        assert_eq!(buffer.pending(), 4);
    }

    #[test]
    fn test_split_crlf_has_no_empty_line() {
        let mut buffer = LineBuffer::new();
        buffer.push(b"first\r");
        assert_eq!(drain(&mut buffer), vec!["first"]);
        buffer.push(b"\nsecond\r\n");
        assert_eq!(drain(&mut buffer), vec!["second"]);
    }

    #[test]
    fn test_overlong_line_is_dropped() {
        let mut buffer = LineBuffer::with_max_line_len(8);
        buffer.push(b"0123456789");
        assert!(buffer.next_line().is_none());
        buffer.push(b"abc\r\nok\r\n");
        assert_eq!(drain(&mut buffer), vec!["ok"]);
    }

    #[test]
    fn test_tail_grows_over_many_chunks() {
        let mut buffer = LineBuffer::new();
        for _ in 0..100 {
            buffer.push(b"ab");
            assert!(buffer.next_line().is_none());
        }
        assert_eq!(buffer.pending(), 200);
        buffer.push(b"c\r\nnext");
        assert_eq!(buffer.next_line().unwrap(), "ab".repeat(100) + "c");
        assert!(buffer.next_line().is_none());
        buffer.push(b"\n");
        assert_eq!(buffer.next_line().unwrap(), "next");
    }

    #[test]
    fn test_invalid_utf8_is_lossy() {
        let mut buffer = LineBuffer::new();
        buffer.push(b"PRIVMSG #c :\xff\xfe\r\n");
        let line = buffer.next_line().unwrap();
        assert!(line.starts_with("PRIVMSG #c :"));
    }
}
