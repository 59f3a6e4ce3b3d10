//! Transport trait for the discovery exchange
//!
//! The framer and parser only need four capabilities from a connection.
//! Implementations:
//! - `RawConnection`: TCP socket bounded by a single call deadline
//! - `MemoryConnection`: canned bytes, for deterministic tests

use std::io;

/// Connection capabilities used by one discovery call
pub trait ConfigTransport {
    /// Write a complete command line and flush it
    fn write_line(&mut self, line: &[u8]) -> io::Result<()>;

    /// Read up to and including the next `\n`, at most `max_len` bytes
    ///
    /// Appends to `buf` and returns the number of bytes read. Returns 0 at
    /// end of stream, and a line without `\n` if the stream ends mid-line or
    /// `max_len` bytes arrive first.
    fn read_line(&mut self, buf: &mut Vec<u8>, max_len: usize) -> io::Result<usize>;

    /// Read `n` bytes
    ///
    /// Returns fewer than `n` bytes only if the stream ends first; the caller
    /// decides whether a short read is an error.
    fn read_bytes(&mut self, n: usize) -> io::Result<Vec<u8>>;

    /// Release the connection
    ///
    /// Safe to call more than once. Later reads and writes fail.
    fn close(&mut self);
}

/// Upper bound on the buffer preallocated for `read_bytes`; larger reads grow
/// as data arrives
pub(crate) const MAX_READ_PREALLOC: usize = 64 * 1024;

pub(crate) fn closed_error() -> io::Error {
    io::Error::new(io::ErrorKind::NotConnected, "Connection closed")
}
