//! Worker transport layer.
//!
//! This module owns the persistent, binary-safe connection to a GPU worker.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────┐                              ┌─────────────────┐
//! │  VizionClient    │                              │  GPU worker     │
//! │                  │      WebSocket (ws/wss)      │                 │
//! │  Connector       │◄────────────────────────────►│  segment/depth  │
//! │  → Connection    │      one reply per request   │  server         │
//! │                  │                              │                 │
//! └──────────────────┘                              └─────────────────┘
//! ```
//!
//! # Connection Lifecycle
//!
//! 1. [`Connector::open`] - Dial the worker address returned by provisioning
//! 2. [`Transport::send`] - Write one request message
//! 3. [`Transport::receive`] - Wait for its reply
//! 4. [`Transport::close`] - Close the socket (idempotent)
//!
//! The traits are the seam the session controller talks through, so tests
//! and alternative transports can stand in for the WebSocket default.
//!
//! # Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | `connection` | WebSocket connection and event loop |

// ============================================================================
// Imports
// ============================================================================

use std::time::Duration;

use async_trait::async_trait;

use crate::error::Result;
use crate::protocol::Outbound;

// ============================================================================
// Submodules
// ============================================================================

/// WebSocket connection and event loop.
pub mod connection;

// ============================================================================
// Re-exports
// ============================================================================

pub use connection::{Connection, ShutdownHandle, WsConnector};

// ============================================================================
// Constants
// ============================================================================

/// Default maximum inbound message size (10 MiB).
pub const DEFAULT_MAX_MESSAGE_SIZE: usize = 10 * 1024 * 1024;

/// Default timeout for establishing the worker connection.
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(30);

// ============================================================================
// TransportConfig
// ============================================================================

/// Settings applied when opening a worker connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransportConfig {
    /// Largest message accepted from the worker.
    pub max_message_size: usize,
    /// Time allowed for the connection handshake.
    pub connect_timeout: Duration,
    /// Per-call limit on waiting for a reply; `None` waits indefinitely.
    pub receive_timeout: Option<Duration>,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            max_message_size: DEFAULT_MAX_MESSAGE_SIZE,
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
            receive_timeout: None,
        }
    }
}

// ============================================================================
// Traits
// ============================================================================

/// A persistent request/response channel to one worker.
///
/// Exactly one [`receive`](Transport::receive) is expected per request
/// [`send`](Transport::send); the shutdown command has no reply.
#[async_trait]
pub trait Transport: Send {
    /// Writes one message verbatim.
    async fn send(&mut self, message: Outbound) -> Result<()>;

    /// Waits for the next inbound message.
    async fn receive(&mut self) -> Result<Vec<u8>>;

    /// Closes the connection. Must succeed when already closed.
    async fn close(&mut self) -> Result<()>;

    /// Returns a handle that can close the connection from another task.
    fn shutdown_handle(&self) -> Option<ShutdownHandle> {
        None
    }
}

/// Opens [`Transport`]s to worker addresses.
#[async_trait]
pub trait Connector: Send + Sync {
    /// Connects to `address` (a `ws://` or `wss://` URL).
    async fn open(&self, address: &str, config: &TransportConfig) -> Result<Box<dyn Transport>>;
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = TransportConfig::default();
        assert_eq!(config.max_message_size, 10 * 1024 * 1024);
        assert_eq!(config.connect_timeout.as_secs(), 30);
        assert!(config.receive_timeout.is_none());
    }
}
