//! Cluster configuration snapshot

use std::fmt::Write;

use serde::Serialize;

use super::node::{parse_node_token, CacheNode};
use crate::utils::ProtocolError;

/// Separator between node tokens in the server list
pub const NODE_SEPARATOR: char = ' ';

/// One `config get cluster` result: the server-assigned version and the node list
///
/// Node order is the order the server listed them in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ClusterConfig {
    pub version: u64,
    pub nodes: Vec<CacheNode>,
}

impl ClusterConfig {
    pub fn new(version: u64, nodes: Vec<CacheNode>) -> Self {
        Self { version, nodes }
    }

    /// Build from a version and a raw server list
    pub fn from_server_list(version: u64, server_list: &str) -> Result<Self, ProtocolError> {
        Ok(Self {
            version,
            nodes: decode_server_list(server_list)?,
        })
    }

    /// Number of nodes in the cluster
    pub fn num_nodes(&self) -> usize {
        self.nodes.len()
    }

    /// `hostname:port` of every node, in server order
    pub fn endpoints(&self) -> Vec<String> {
        self.nodes.iter().map(CacheNode::endpoint).collect()
    }

    /// Whether `self` is a newer topology than `other`
    pub fn is_newer_than(&self, other: &ClusterConfig) -> bool {
        self.version > other.version
    }
}

/// Split a server list into node descriptors
///
/// Format: `<token> <token> ...` with each token `hostname|address|port`.
/// Any bad token fails the whole list.
pub fn decode_server_list(server_list: &str) -> Result<Vec<CacheNode>, ProtocolError> {
    server_list
        .split(NODE_SEPARATOR)
        .map(parse_node_token)
        .collect()
}

/// Join node descriptors into the server list wire form
pub fn encode_server_list(nodes: &[CacheNode]) -> String {
    let mut out = String::with_capacity(nodes.len() * 64);
    for (i, node) in nodes.iter().enumerate() {
        if i > 0 {
            out.push(NODE_SEPARATOR);
        }
        // Writing to a String cannot fail
        let _ = write!(out, "{}", node);
    }
    out
}
