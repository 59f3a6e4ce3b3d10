//! Utility modules

pub mod error;
pub mod wire;

pub use error::{DiscoveryError, ProtocolError, Result};
pub use wire::{
    parse_config, read_config_header, read_config_payload, read_framed_payload,
    scan_config_data_length, send_discovery_command, ConfigEncoder, DISCOVERY_COMMAND,
    MAX_HEADER_LEN,
};
