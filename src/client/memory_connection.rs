//! In-memory transport
//!
//! Serves a fixed response and records what the client wrote, so framing
//! and parsing can be exercised without a listener.

use std::io::{self, BufRead, Cursor, Read};

use super::transport::{closed_error, ConfigTransport, MAX_READ_PREALLOC};
use crate::cluster::CacheNode;
use crate::utils::ConfigEncoder;

/// Canned-response connection
#[derive(Debug, Default)]
pub struct MemoryConnection {
    reader: Cursor<Vec<u8>>,
    written: Vec<u8>,
    closed: bool,
    close_calls: usize,
}

impl MemoryConnection {
    /// Serve `response` byte for byte
    pub fn new(response: Vec<u8>) -> Self {
        Self {
            reader: Cursor::new(response),
            ..Default::default()
        }
    }

    /// Serve a well-formed response for `version` and `nodes`
    pub fn with_config(version: u64, nodes: &[CacheNode]) -> Self {
        let mut encoder = ConfigEncoder::with_capacity(64 + nodes.len() * 64);
        encoder.encode_response(version, nodes);
        Self::new(encoder.into_bytes())
    }

    /// Bytes written by the client so far
    pub fn written(&self) -> &[u8] {
        &self.written
    }

    /// Response bytes not yet consumed
    pub fn remaining(&self) -> &[u8] {
        let pos = (self.reader.position() as usize).min(self.reader.get_ref().len());
        &self.reader.get_ref()[pos..]
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    /// How many times `close` was called
    pub fn close_calls(&self) -> usize {
        self.close_calls
    }
}

impl ConfigTransport for MemoryConnection {
    fn write_line(&mut self, line: &[u8]) -> io::Result<()> {
        if self.closed {
            return Err(closed_error());
        }
        self.written.extend_from_slice(line);
        Ok(())
    }

    fn read_line(&mut self, buf: &mut Vec<u8>, max_len: usize) -> io::Result<usize> {
        if self.closed {
            return Err(closed_error());
        }
        (&mut self.reader).take(max_len as u64).read_until(b'\n', buf)
    }

    fn read_bytes(&mut self, n: usize) -> io::Result<Vec<u8>> {
        if self.closed {
            return Err(closed_error());
        }
        let mut buf = Vec::with_capacity(n.min(MAX_READ_PREALLOC));
        (&mut self.reader).take(n as u64).read_to_end(&mut buf)?;
        Ok(buf)
    }

    fn close(&mut self) {
        self.close_calls += 1;
        self.closed = true;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reads_and_records() {
        let mut conn = MemoryConnection::new(b"line one\nrest".to_vec());
        conn.write_line(b"hello\r\n").unwrap();
        assert_eq!(conn.written(), b"hello\r\n");

        let mut line = Vec::new();
        assert_eq!(conn.read_line(&mut line, 64).unwrap(), 9);
        assert_eq!(line, b"line one\n");

        assert_eq!(conn.read_bytes(10).unwrap(), b"rest");
        assert!(conn.remaining().is_empty());
    }

    #[test]
    fn test_close_is_idempotent() {
        let mut conn = MemoryConnection::new(b"data\n".to_vec());
        conn.close();
        conn.close();
        assert!(conn.is_closed());
        assert_eq!(conn.close_calls(), 2);

        let mut line = Vec::new();
        assert_eq!(
            conn.read_line(&mut line, 64).unwrap_err().kind(),
            io::ErrorKind::NotConnected
        );
        assert!(conn.write_line(b"x").is_err());
    }

    #[test]
    fn test_read_line_stops_at_max_len() {
        let mut conn = MemoryConnection::new(b"abcdefgh\nnext\n".to_vec());
        let mut line = Vec::new();
        assert_eq!(conn.read_line(&mut line, 4).unwrap(), 4);
        assert_eq!(line, b"abcd");
        assert_eq!(conn.remaining(), b"efgh\nnext\n");
    }

    #[test]
    fn test_read_bytes_huge_request_returns_what_is_there() {
        let mut conn = MemoryConnection::new(b"tiny".to_vec());
        assert_eq!(conn.read_bytes(usize::MAX).unwrap(), b"tiny");
    }
}
