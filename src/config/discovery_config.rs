//! Discovery client configuration

use std::time::Duration;

use super::cli::CliArgs;

/// Default connect timeout, and default deadline for the exchange after connecting
pub const DEFAULT_TIMEOUT: Duration = Duration::from_millis(100);

/// Largest config payload the client will agree to read
pub const DEFAULT_MAX_PAYLOAD_BYTES: usize = 1024 * 1024;

/// Per-client settings; never shared between clients
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiscoveryConfig {
    /// Configuration endpoint, `host:port`
    pub endpoint: String,
    /// Bound on the TCP dial
    pub connect_timeout: Duration,
    /// Deadline for write + header read + payload read, counted from connect
    pub io_timeout: Duration,
    /// Declared payload sizes above this are rejected before reading
    pub max_payload_bytes: usize,
}

impl DiscoveryConfig {
    /// Config for `endpoint` with default timeouts
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            connect_timeout: DEFAULT_TIMEOUT,
            io_timeout: DEFAULT_TIMEOUT,
            max_payload_bytes: DEFAULT_MAX_PAYLOAD_BYTES,
        }
    }

    /// Set both the connect timeout and the exchange deadline
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self.io_timeout = timeout;
        self
    }

    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    pub fn with_io_timeout(mut self, timeout: Duration) -> Self {
        self.io_timeout = timeout;
        self
    }

    pub fn with_max_payload_bytes(mut self, max: usize) -> Self {
        self.max_payload_bytes = max;
        self
    }

    /// Check the endpoint shape and limits
    pub fn validate(&self) -> Result<(), String> {
        let (host, port) = self
            .endpoint
            .rsplit_once(':')
            .ok_or_else(|| format!("endpoint '{}' must be host:port", self.endpoint))?;

        if host.is_empty() {
            return Err(format!("endpoint '{}' has an empty host", self.endpoint));
        }
        if port.parse::<u16>().is_err() {
            return Err(format!(
                "endpoint '{}' has an invalid port '{}'",
                self.endpoint, port
            ));
        }

        if self.connect_timeout.is_zero() {
            return Err("connect timeout must be greater than zero".to_string());
        }
        if self.io_timeout.is_zero() {
            return Err("I/O timeout must be greater than zero".to_string());
        }
        if self.max_payload_bytes == 0 {
            return Err("max payload size must be at least 1 byte".to_string());
        }

        Ok(())
    }

    /// Create configuration from CLI arguments
    pub fn from_cli(args: &CliArgs) -> Result<Self, String> {
        args.validate()?;

        let config = Self::new(args.endpoint.clone())
            .with_connect_timeout(Duration::from_millis(args.connect_timeout_ms))
            .with_io_timeout(Duration::from_millis(args.timeout_ms))
            .with_max_payload_bytes(args.max_payload_bytes);

        config.validate()?;
        Ok(config)
    }
}
