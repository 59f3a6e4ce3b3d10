//! `config get cluster` wire protocol
//!
//! Request:
//! ```text
//! config get cluster\r\n
//! ```
//!
//! Response:
//! ```text
//! CONFIG cluster 0 <size>\r\n
//! <version>\n<hostname>|<address>|<port> <hostname>|<address>|<port> ...\n
//! \r\n
//! END\r\n
//! ```
//!
//! `<size>` counts the payload bytes between the header and the trailing `\r\n`.

use tracing::trace;

use super::error::{ProtocolError, Result};
use crate::client::ConfigTransport;
use crate::cluster::topology::encode_server_list;
use crate::cluster::CacheNode;

/// The only command this client sends
pub const DISCOVERY_COMMAND: &[u8] = b"config get cluster\r\n";

/// Framing header up to the declared size
pub const HEADER_PREFIX: &str = "CONFIG cluster 0 ";

/// Terminator line sent after the payload (not read by the client)
pub const END_LINE: &[u8] = b"END\r\n";

/// Longest framing header line accepted
pub const MAX_HEADER_LEN: usize = 64;

const CRLF: &[u8] = b"\r\n";

/// Write the discovery command and flush
pub fn send_discovery_command<T: ConfigTransport + ?Sized>(conn: &mut T) -> Result<()> {
    conn.write_line(DISCOVERY_COMMAND)?;
    Ok(())
}

/// Parse the declared payload length out of the framing header
///
/// The line must be exactly `CONFIG cluster 0 <size>\r\n`.
pub fn scan_config_data_length(line: &[u8]) -> std::result::Result<usize, ProtocolError> {
    let malformed = || ProtocolError::MalformedHeader {
        line: String::from_utf8_lossy(line).into_owned(),
    };

    let size = line
        .strip_suffix(CRLF)
        .and_then(|l| l.strip_prefix(HEADER_PREFIX.as_bytes()))
        .ok_or_else(malformed)?;

    if size.is_empty() || !size.iter().all(u8::is_ascii_digit) {
        return Err(malformed());
    }

    // Digits only, so this is valid UTF-8; parse still fails on overflow
    std::str::from_utf8(size)
        .ok()
        .and_then(|s| s.parse().ok())
        .ok_or_else(malformed)
}

/// Read the framing header and return the declared payload size
pub fn read_config_header<T: ConfigTransport + ?Sized>(
    conn: &mut T,
    max_payload_bytes: usize,
) -> Result<usize> {
    let mut line = Vec::with_capacity(MAX_HEADER_LEN);
    let n = conn.read_line(&mut line, MAX_HEADER_LEN)?;
    if n >= MAX_HEADER_LEN && !line.ends_with(b"\n") {
        return Err(ProtocolError::MalformedHeader {
            line: String::from_utf8_lossy(&line).into_owned(),
        }
        .into());
    }
    if n == 0 || !line.ends_with(b"\n") {
        return Err(std::io::Error::new(
            std::io::ErrorKind::UnexpectedEof,
            "Connection closed before config header",
        )
        .into());
    }

    let size = scan_config_data_length(&line)?;
    if size > max_payload_bytes {
        return Err(ProtocolError::PayloadTooLarge {
            declared: size,
            limit: max_payload_bytes,
        }
        .into());
    }
    trace!("Config header declares {} payload bytes", size);
    Ok(size)
}

/// Read exactly `size` payload bytes plus the trailing `\r\n`
///
/// Returns the payload without its trailing `\r\n`. The `END\r\n` line that
/// follows is left unread.
pub fn read_config_payload<T: ConfigTransport + ?Sized>(
    conn: &mut T,
    size: usize,
) -> Result<Vec<u8>> {
    let expected = size
        .checked_add(CRLF.len())
        .ok_or(ProtocolError::PayloadTooLarge {
            declared: size,
            limit: usize::MAX - CRLF.len(),
        })?;
    let mut value = conn.read_bytes(expected)?;
    if value.len() < expected {
        return Err(ProtocolError::CorruptPayload(format!(
            "short read: got {} of {} bytes",
            value.len(),
            expected
        ))
        .into());
    }
    if !value.ends_with(CRLF) {
        return Err(ProtocolError::CorruptPayload("missing trailing CRLF".to_string()).into());
    }

    value.truncate(size);
    Ok(value)
}

/// Read the framing header and exactly the declared number of payload bytes
pub fn read_framed_payload<T: ConfigTransport + ?Sized>(
    conn: &mut T,
    max_payload_bytes: usize,
) -> Result<Vec<u8>> {
    let size = read_config_header(conn, max_payload_bytes)?;
    read_config_payload(conn, size)
}

/// Split a payload into its version and raw server list
///
/// The payload must be exactly `<version>\n<server list>\n`.
pub fn parse_config(payload: &[u8]) -> std::result::Result<(u64, &str), ProtocolError> {
    let malformed = || ProtocolError::MalformedConfig {
        payload: String::from_utf8_lossy(payload).into_owned(),
    };

    let text = std::str::from_utf8(payload).map_err(|_| malformed())?;
    let body = text.strip_suffix('\n').ok_or_else(malformed)?;
    let (version, server_list) = body.split_once('\n').ok_or_else(malformed)?;

    if server_list.contains('\n')
        || version.is_empty()
        || !version.bytes().all(|b| b.is_ascii_digit())
    {
        return Err(malformed());
    }

    let version: u64 = version.parse().map_err(|_| malformed())?;
    Ok((version, server_list))
}

/// Encoder for config responses, the server side of the exchange
///
/// Used to build canned responses for [`crate::client::MemoryConnection`]
/// and for local test servers.
pub struct ConfigEncoder {
    buf: Vec<u8>,
}

impl ConfigEncoder {
    /// Create new encoder with specified capacity
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            buf: Vec::with_capacity(capacity),
        }
    }

    /// Clear buffer for reuse
    pub fn clear(&mut self) {
        self.buf.clear();
    }

    /// Get encoded bytes
    pub fn as_bytes(&self) -> &[u8] {
        &self.buf
    }

    /// Take ownership of buffer
    pub fn into_bytes(self) -> Vec<u8> {
        self.buf
    }

    /// Encode a full response: header, payload, CRLF and END line
    pub fn encode_response(&mut self, version: u64, nodes: &[CacheNode]) {
        let payload = encode_payload(version, nodes);
        self.encode_raw_payload(&payload);
    }

    /// Frame an arbitrary payload with a correct header
    pub fn encode_raw_payload(&mut self, payload: &[u8]) {
        self.buf.extend_from_slice(HEADER_PREFIX.as_bytes());
        self.write_int(payload.len() as u64);
        self.buf.extend_from_slice(CRLF);
        self.buf.extend_from_slice(payload);
        self.buf.extend_from_slice(CRLF);
        self.buf.extend_from_slice(END_LINE);
    }

    #[inline]
    fn write_int(&mut self, value: u64) {
        let mut buffer = itoa::Buffer::new();
        self.buf.extend_from_slice(buffer.format(value).as_bytes());
    }
}

/// Encode the payload `<version>\n<server list>\n`
pub fn encode_payload(version: u64, nodes: &[CacheNode]) -> Vec<u8> {
    let mut payload = Vec::with_capacity(16 + nodes.len() * 64);
    payload.extend_from_slice(itoa::Buffer::new().format(version).as_bytes());
    payload.push(b'\n');
    payload.extend_from_slice(encode_server_list(nodes).as_bytes());
    payload.push(b'\n');
    payload
}
