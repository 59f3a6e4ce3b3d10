//! Raw TCP connection to a configuration endpoint
//!
//! One connection serves one discovery call. A single deadline, fixed when
//! the connection is established, bounds every write and read that follows;
//! it is never extended between steps.

use std::io::{self, BufRead, BufReader, BufWriter, Read, Write};
use std::net::{Shutdown, TcpStream, ToSocketAddrs};
use std::time::{Duration, Instant};

use tracing::trace;

use super::transport::{closed_error, ConfigTransport, MAX_READ_PREALLOC};
use crate::utils::DiscoveryError;

/// Socket half that re-arms its timeout from the remaining deadline budget
/// before every read or write syscall.
#[derive(Debug)]
struct DeadlineStream {
    stream: TcpStream,
    deadline: Instant,
}

impl DeadlineStream {
    fn remaining(&self) -> io::Result<Duration> {
        let remaining = self.deadline.saturating_duration_since(Instant::now());
        if remaining.is_zero() {
            return Err(io::Error::new(io::ErrorKind::TimedOut, "Discovery deadline exceeded"));
        }
        Ok(remaining)
    }
}

/// Unix reports an expired socket timeout as `WouldBlock`
fn normalize_timeout(e: io::Error) -> io::Error {
    if e.kind() == io::ErrorKind::WouldBlock {
        io::Error::new(io::ErrorKind::TimedOut, "Discovery deadline exceeded")
    } else {
        e
    }
}

impl Read for DeadlineStream {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let remaining = self.remaining()?;
        self.stream.set_read_timeout(Some(remaining))?;
        self.stream.read(buf).map_err(normalize_timeout)
    }
}

impl Write for DeadlineStream {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let remaining = self.remaining()?;
        self.stream.set_write_timeout(Some(remaining))?;
        self.stream.write(buf).map_err(normalize_timeout)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.stream.flush()
    }
}

/// TCP connection split into buffered reader and writer halves
#[derive(Debug)]
pub struct RawConnection {
    writer: BufWriter<DeadlineStream>,
    reader: BufReader<DeadlineStream>,
    endpoint: String,
    closed: bool,
}

impl RawConnection {
    /// Resolve and dial `endpoint` (`host:port`)
    ///
    /// `connect_timeout` bounds the dial. Once connected, `io_timeout` sets the
    /// deadline for everything else done on this connection.
    pub fn connect(
        endpoint: &str,
        connect_timeout: Duration,
        io_timeout: Duration,
    ) -> Result<Self, DiscoveryError> {
        let addr = endpoint
            .to_socket_addrs()
            .map_err(|e| DiscoveryError::Resolve {
                endpoint: endpoint.to_string(),
                source: e,
            })?
            .next()
            .ok_or_else(|| DiscoveryError::Resolve {
                endpoint: endpoint.to_string(),
                source: io::Error::new(io::ErrorKind::NotFound, "No addresses found"),
            })?;

        let stream = TcpStream::connect_timeout(&addr, connect_timeout).map_err(|e| {
            if e.kind() == io::ErrorKind::TimedOut {
                DiscoveryError::ConnectTimeout {
                    endpoint: endpoint.to_string(),
                }
            } else {
                DiscoveryError::ConnectFailed {
                    endpoint: endpoint.to_string(),
                    source: e,
                }
            }
        })?;
        trace!("Connected to {} ({})", endpoint, addr);

        stream.set_nodelay(true).ok();
        let deadline = Instant::now() + io_timeout;

        let write_half = stream
            .try_clone()
            .map_err(|e| DiscoveryError::ConnectFailed {
                endpoint: endpoint.to_string(),
                source: e,
            })?;

        Ok(RawConnection {
            writer: BufWriter::with_capacity(
                64,
                DeadlineStream {
                    stream: write_half,
                    deadline,
                },
            ),
            reader: BufReader::with_capacity(8192, DeadlineStream { stream, deadline }),
            endpoint: endpoint.to_string(),
            closed: false,
        })
    }

    /// Endpoint this connection was dialed with
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    /// Time left before the call deadline
    pub fn time_remaining(&self) -> Duration {
        self.reader
            .get_ref()
            .deadline
            .saturating_duration_since(Instant::now())
    }
}

impl ConfigTransport for RawConnection {
    fn write_line(&mut self, line: &[u8]) -> io::Result<()> {
        if self.closed {
            return Err(closed_error());
        }
        self.writer.write_all(line)?;
        self.writer.flush()
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
        if self.closed {
            return;
        }
        self.closed = true;
        // Both halves share one socket; the peer may already have hung up
        self.reader.get_ref().stream.shutdown(Shutdown::Both).ok();
        trace!("Closed connection to {}", self.endpoint);
    }
}

impl Drop for RawConnection {
    fn drop(&mut self) {
        self.close();
    }
}
