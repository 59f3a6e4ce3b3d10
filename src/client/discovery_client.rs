//! Discovery client
//!
//! One call of [`DiscoveryClient::get_cluster_config`] opens a connection,
//! sends `config get cluster`, reads and parses the reply, and closes the
//! connection on every exit path. Nothing is retried, cached or kept between
//! calls; the client holds only its configuration and can be shared freely
//! across threads.
//!
//! Callers are expected to poll about once a minute and swap their node list
//! only when the version goes up (see [`crate::cluster::ConfigWatcher`]).

use tracing::debug;

use super::raw_connection::RawConnection;
use super::transport::ConfigTransport;
use crate::cluster::topology::decode_server_list;
use crate::cluster::ClusterConfig;
use crate::config::DiscoveryConfig;
use crate::utils::{
    parse_config, read_config_header, read_config_payload, send_discovery_command,
    DiscoveryError, Result,
};

/// Progress of a single discovery call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CallStage {
    Connecting,
    CommandSent,
    HeaderRead,
    PayloadRead,
    Parsed,
    Decoded,
}

/// Anything that can produce a cluster config on demand
pub trait ConfigSource {
    fn get_cluster_config(&self) -> Result<ClusterConfig>;
}

/// ElastiCache auto discovery client
#[derive(Debug, Clone)]
pub struct DiscoveryClient {
    config: DiscoveryConfig,
}

impl DiscoveryClient {
    /// Create a client from a validated config
    pub fn new(config: DiscoveryConfig) -> Result<Self> {
        config.validate().map_err(DiscoveryError::Config)?;
        Ok(Self { config })
    }

    /// Create a client for `endpoint` (e.g. `foo.cfg.use1.cache.amazonaws.com:11211`)
    /// with default timeouts
    pub fn with_endpoint(endpoint: impl Into<String>) -> Result<Self> {
        Self::new(DiscoveryConfig::new(endpoint))
    }

    pub fn endpoint(&self) -> &str {
        &self.config.endpoint
    }

    pub fn config(&self) -> &DiscoveryConfig {
        &self.config
    }

    /// Fetch the current cluster version and node list
    pub fn get_cluster_config(&self) -> Result<ClusterConfig> {
        debug!(endpoint = %self.config.endpoint, stage = ?CallStage::Connecting, "Discovery call");
        let mut conn = RawConnection::connect(
            &self.config.endpoint,
            self.config.connect_timeout,
            self.config.io_timeout,
        )
        .map_err(|e| {
            debug!(endpoint = %self.config.endpoint, "Discovery call failed while connecting: {}", e);
            e
        })?;

        self.get_cluster_config_from(&mut conn)
    }

    /// Run the exchange over an already established transport
    ///
    /// The transport is closed before returning, whatever the outcome.
    pub fn get_cluster_config_from<T: ConfigTransport + ?Sized>(
        &self,
        conn: &mut T,
    ) -> Result<ClusterConfig> {
        let mut stage = CallStage::Connecting;
        let result = self.exchange(conn, &mut stage);
        conn.close();

        match &result {
            Ok(config) => debug!(
                endpoint = %self.config.endpoint,
                version = config.version,
                nodes = config.num_nodes(),
                "Discovery call done"
            ),
            Err(e) => debug!(
                endpoint = %self.config.endpoint,
                last_stage = ?stage,
                "Discovery call failed: {}",
                e
            ),
        }
        result
    }

    fn exchange<T: ConfigTransport + ?Sized>(
        &self,
        conn: &mut T,
        stage: &mut CallStage,
    ) -> Result<ClusterConfig> {
        send_discovery_command(conn)?;
        self.advance(stage, CallStage::CommandSent);

        let size = read_config_header(conn, self.config.max_payload_bytes)?;
        self.advance(stage, CallStage::HeaderRead);

        let payload = read_config_payload(conn, size)?;
        self.advance(stage, CallStage::PayloadRead);

        let (version, server_list) = parse_config(&payload)?;
        self.advance(stage, CallStage::Parsed);

        let nodes = decode_server_list(server_list)?;
        self.advance(stage, CallStage::Decoded);

        Ok(ClusterConfig::new(version, nodes))
    }

    #[inline]
    fn advance(&self, stage: &mut CallStage, next: CallStage) {
        *stage = next;
        debug!(endpoint = %self.config.endpoint, stage = ?next, "Discovery call");
    }
}

impl ConfigSource for DiscoveryClient {
    fn get_cluster_config(&self) -> Result<ClusterConfig> {
        DiscoveryClient::get_cluster_config(self)
    }
}
