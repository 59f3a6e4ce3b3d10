//! Configuration module

pub mod cli;
pub mod discovery_config;

pub use cli::{CliArgs, OutputFormat};
pub use discovery_config::{DiscoveryConfig, DEFAULT_MAX_PAYLOAD_BYTES, DEFAULT_TIMEOUT};
