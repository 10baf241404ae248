//! Configuration for cmdwire
//!
//! Client and server settings with sensible defaults.

use crate::protocol::MAX_PAYLOAD_SIZE;

/// Default server address shared by client and server
pub const DEFAULT_ADDR: &str = "127.0.0.1:8090";

// =============================================================================
// Client Configuration
// =============================================================================

/// Settings for a [`Client`](crate::network::Client)
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Server address (host:port)
    pub server_addr: String,

    /// Read timeout (milliseconds, 0 = none)
    pub read_timeout_ms: u64,

    /// Write timeout (milliseconds, 0 = none)
    pub write_timeout_ms: u64,

    /// Largest reply payload accepted
    pub max_payload_size: u32,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            server_addr: DEFAULT_ADDR.to_string(),
            read_timeout_ms: 5000,
            write_timeout_ms: 5000,
            max_payload_size: MAX_PAYLOAD_SIZE,
        }
    }
}

impl ClientConfig {
    /// Create a new config builder
    pub fn builder() -> ClientConfigBuilder {
        ClientConfigBuilder::default()
    }
}

/// Builder for ClientConfig
#[derive(Default)]
pub struct ClientConfigBuilder {
    config: ClientConfig,
}

impl ClientConfigBuilder {
    /// Set the server address
    pub fn server_addr(mut self, addr: impl Into<String>) -> Self {
        self.config.server_addr = addr.into();
        self
    }

    /// Set the read timeout (in milliseconds)
    pub fn read_timeout_ms(mut self, ms: u64) -> Self {
        self.config.read_timeout_ms = ms;
        self
    }

    /// Set the write timeout (in milliseconds)
    pub fn write_timeout_ms(mut self, ms: u64) -> Self {
        self.config.write_timeout_ms = ms;
        self
    }

    /// Set the largest accepted reply payload (in bytes)
    pub fn max_payload_size(mut self, size: u32) -> Self {
        self.config.max_payload_size = size;
        self
    }

    pub fn build(self) -> ClientConfig {
        self.config
    }
}

// =============================================================================
// Server Configuration
// =============================================================================

/// Settings for a [`Server`](crate::network::Server)
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// TCP listen address
    pub listen_addr: String,

    /// Number of connection worker threads
    pub workers: usize,

    /// Accepted connections waiting for a worker before accept blocks
    pub backlog: usize,

    /// Connection read timeout (milliseconds, 0 = none)
    pub read_timeout_ms: u64,

    /// Connection write timeout (milliseconds, 0 = none)
    pub write_timeout_ms: u64,

    /// Largest request body accepted
    pub max_payload_size: u32,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen_addr: DEFAULT_ADDR.to_string(),
            workers: 4,
            backlog: 64,
            read_timeout_ms: 30_000,
            write_timeout_ms: 5000,
            max_payload_size: MAX_PAYLOAD_SIZE,
        }
    }
}

impl ServerConfig {
    /// Create a new config builder
    pub fn builder() -> ServerConfigBuilder {
        ServerConfigBuilder::default()
    }
}

/// Builder for ServerConfig
#[derive(Default)]
pub struct ServerConfigBuilder {
    config: ServerConfig,
}

impl ServerConfigBuilder {
    /// Set the TCP listen address
    pub fn listen_addr(mut self, addr: impl Into<String>) -> Self {
        self.config.listen_addr = addr.into();
        self
    }

    /// Set the number of worker threads
    pub fn workers(mut self, count: usize) -> Self {
        self.config.workers = count;
        self
    }

    /// Set the pending connection backlog
    pub fn backlog(mut self, count: usize) -> Self {
        self.config.backlog = count;
        self
    }

    /// Set the read timeout (in milliseconds)
    pub fn read_timeout_ms(mut self, ms: u64) -> Self {
        self.config.read_timeout_ms = ms;
        self
    }

    /// Set the write timeout (in milliseconds)
    pub fn write_timeout_ms(mut self, ms: u64) -> Self {
        self.config.write_timeout_ms = ms;
        self
    }

    /// Set the largest accepted request body (in bytes)
    pub fn max_payload_size(mut self, size: u32) -> Self {
        self.config.max_payload_size = size;
        self
    }

    pub fn build(self) -> ServerConfig {
        self.config
    }
}
