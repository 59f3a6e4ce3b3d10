//! elasticache-discovery library
//!
//! Client for the ElastiCache cluster configuration endpoint. A single
//! `config get cluster` exchange returns the cluster's configuration version
//! and the hostname, address and port of every cache node.
//!
//! ```no_run
//! use elasticache_discovery::DiscoveryClient;
//!
//! let client = DiscoveryClient::with_endpoint("mycluster.fnjyzo.cfg.use1.cache.amazonaws.com:11211")?;
//! let config = client.get_cluster_config()?;
//! for node in &config.nodes {
//!     println!("{} {}", config.version, node.endpoint());
//! }
//! # Ok::<(), elasticache_discovery::DiscoveryError>(())
//! ```

pub mod client;
pub mod cluster;
pub mod config;
pub mod utils;

pub use client::{
    ConfigSource, ConfigTransport, DiscoveryClient, MemoryConnection, RawConnection,
};
pub use cluster::{CacheNode, ClusterConfig, ConfigWatcher};
pub use config::DiscoveryConfig;
pub use utils::{DiscoveryError, ProtocolError, Result};
