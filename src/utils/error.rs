//! Error types for elasticache-discovery

use std::io;
use thiserror::Error;

/// Top-level error for a discovery call
#[derive(Error, Debug)]
pub enum DiscoveryError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Cannot resolve endpoint {endpoint}: {source}")]
    Resolve { endpoint: String, source: io::Error },

    #[error("Connect timeout to {endpoint}")]
    ConnectTimeout { endpoint: String },

    #[error("Failed to connect to {endpoint}: {source}")]
    ConnectFailed { endpoint: String, source: io::Error },

    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("Protocol error: {0}")]
    Protocol(#[from] ProtocolError),
}

impl DiscoveryError {
    /// True for a connect timeout or an I/O operation that ran past the call deadline
    pub fn is_timeout(&self) -> bool {
        match self {
            DiscoveryError::ConnectTimeout { .. } => true,
            DiscoveryError::Io(e) => {
                matches!(e.kind(), io::ErrorKind::TimedOut | io::ErrorKind::WouldBlock)
            }
            _ => false,
        }
    }

    /// Get the protocol error, if this failure was caused by a malformed response
    pub fn as_protocol(&self) -> Option<&ProtocolError> {
        match self {
            DiscoveryError::Protocol(e) => Some(e),
            _ => None,
        }
    }
}

/// Malformed or corrupt `config get cluster` responses
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProtocolError {
    #[error("Unexpected line in config response: {line:?}")]
    MalformedHeader { line: String },

    #[error("Declared config size {declared} exceeds limit of {limit} bytes")]
    PayloadTooLarge { declared: usize, limit: usize },

    #[error("Corrupt config result read: {0}")]
    CorruptPayload(String),

    #[error("Malformed config data: {payload:?}")]
    MalformedConfig { payload: String },

    #[error("Insufficient elements returned for server {token:?}")]
    MalformedServerEntry { token: String },

    #[error("Invalid port {port:?} for server {token:?}")]
    InvalidPort { token: String, port: String },
}

pub type Result<T> = std::result::Result<T, DiscoveryError>;
