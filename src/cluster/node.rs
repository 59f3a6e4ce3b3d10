//! Cache node representation

use std::fmt;

use serde::Serialize;

use crate::utils::ProtocolError;

/// Field separator inside a node descriptor
pub const FIELD_SEPARATOR: char = '|';

/// Cache node information
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct CacheNode {
    /// DNS name of the node
    pub hostname: String,
    /// IP address of the node
    pub address: String,
    /// Port
    pub port: u16,
}

impl CacheNode {
    pub fn new(hostname: impl Into<String>, address: impl Into<String>, port: u16) -> Self {
        Self {
            hostname: hostname.into(),
            address: address.into(),
            port,
        }
    }

    /// Get `hostname:port`, the form cache clients dial
    pub fn endpoint(&self) -> String {
        format!("{}:{}", self.hostname, self.port)
    }

    /// Get `address:port`, bypassing DNS
    pub fn socket_address(&self) -> String {
        format!("{}:{}", self.address, self.port)
    }
}

/// Wire form: `hostname|address|port`
impl fmt::Display for CacheNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}{sep}{}{sep}{}",
            self.hostname,
            self.address,
            self.port,
            sep = FIELD_SEPARATOR
        )
    }
}

/// Parse a single node token from the server list
///
/// Format: `<hostname>|<address>|<port>`
///
/// Example:
/// ```text
/// mycluster.fnjyzo.cfg.0001.use1.cache.amazonaws.com|10.0.1.5|11211
/// ```
pub fn parse_node_token(token: &str) -> Result<CacheNode, ProtocolError> {
    let fields: Vec<&str> = token.split(FIELD_SEPARATOR).collect();
    if fields.len() != 3 || fields[0].is_empty() || fields[1].is_empty() {
        return Err(ProtocolError::MalformedServerEntry {
            token: token.to_string(),
        });
    }

    let port: u16 = fields[2].parse().map_err(|_| ProtocolError::InvalidPort {
        token: token.to_string(),
        port: fields[2].to_string(),
    })?;

    Ok(CacheNode {
        hostname: fields[0].to_string(),
        address: fields[1].to_string(),
        port,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_node_token() {
        let node =
            parse_node_token("test.uq0fwm.0001.use1.cache.amazonaws.com|192.0.2.1|11211").unwrap();

        assert_eq!(node.hostname, "test.uq0fwm.0001.use1.cache.amazonaws.com");
        assert_eq!(node.address, "192.0.2.1");
        assert_eq!(node.port, 11211);
        assert_eq!(node.endpoint(), "test.uq0fwm.0001.use1.cache.amazonaws.com:11211");
        assert_eq!(node.socket_address(), "192.0.2.1:11211");
    }

    #[test]
    fn test_parse_wrong_field_count() {
        for token in ["hostA|192.0.2.1", "hostA|192.0.2.1|11211|extra", "hostA", ""] {
            assert_eq!(
                parse_node_token(token),
                Err(ProtocolError::MalformedServerEntry {
                    token: token.to_string()
                })
            );
        }
    }

    #[test]
    fn test_parse_empty_fields() {
        assert!(matches!(
            parse_node_token("|192.0.2.1|11211"),
            Err(ProtocolError::MalformedServerEntry { .. })
        ));
        assert!(matches!(
            parse_node_token("hostA||11211"),
            Err(ProtocolError::MalformedServerEntry { .. })
        ));
    }

    #[test]
    fn test_parse_invalid_port() {
        let err = parse_node_token("hostA|192.0.2.1|eleven").unwrap_err();
        assert_eq!(
            err,
            ProtocolError::InvalidPort {
                token: "hostA|192.0.2.1|eleven".to_string(),
                port: "eleven".to_string(),
            }
        );

        assert!(parse_node_token("hostA|192.0.2.1|70000").is_err());
        assert!(parse_node_token("hostA|192.0.2.1|-1").is_err());
        assert!(parse_node_token("hostA|192.0.2.1|").is_err());
    }

    #[test]
    fn test_display_is_wire_form() {
        let node = CacheNode::new("hostA", "192.0.2.1", 11211);
        assert_eq!(node.to_string(), "hostA|192.0.2.1|11211");
        assert_eq!(parse_node_token(&node.to_string()).unwrap(), node);
    }
}
