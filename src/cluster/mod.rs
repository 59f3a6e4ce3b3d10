//! Cluster configuration and node management
//!
//! This module provides:
//! - Node descriptors parsed from the server list
//! - The versioned cluster config returned by a discovery call
//! - A poller that tracks version changes across calls

pub mod config_watcher;
pub mod node;
pub mod topology;

pub use config_watcher::{ConfigWatcher, DEFAULT_POLL_INTERVAL};
pub use node::{parse_node_token, CacheNode};
pub use topology::{decode_server_list, encode_server_list, ClusterConfig};
