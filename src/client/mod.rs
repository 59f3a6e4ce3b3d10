//! Client connection layer

pub mod discovery_client;
pub mod memory_connection;
pub mod raw_connection;
pub mod transport;

pub use discovery_client::{ConfigSource, DiscoveryClient};
pub use memory_connection::MemoryConnection;
pub use raw_connection::RawConnection;
pub use transport::ConfigTransport;
