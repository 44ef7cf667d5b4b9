//! Error types for the Vizion client.
//!
//! This module defines all error types used throughout the crate.
//!
//! # Usage
//!
//! All fallible operations return [`Result<T>`] which uses [`Error`]:
//!
//! ```ignore
//! use vizion::{Error, Result, VizionClient};
//!
//! async fn example(client: &mut VizionClient, jpeg: Vec<u8>) -> Result<()> {
//!     client.connect().await?;
//!     let result = client.segment(jpeg, ["person"]).await?;
//!     println!("{} detections", result.results.len());
//!     Ok(())
//! }
//! ```
//!
//! # Error Categories
//!
//! | Category | Variants |
//! |----------|----------|
//! | Provisioning | [`Error::Authentication`], [`Error::Quota`], [`Error::InvalidRequest`], [`Error::ProvisioningTimeout`] |
//! | Transport | [`Error::Http`], [`Error::Connection`], [`Error::ConnectionClosed`], [`Error::Timeout`], [`Error::WebSocket`], [`Error::Request`] |
//! | Protocol | [`Error::Protocol`] |
//! | Usage | [`Error::Usage`] |
//! | Configuration | [`Error::Config`] |
//! | External | [`Error::Json`] |

// ============================================================================
// Imports
// ============================================================================

use std::result::Result as StdResult;

use reqwest::StatusCode;
use thiserror::Error;
use tokio_tungstenite::tungstenite::Error as WsError;

// ============================================================================
// Result Alias
// ============================================================================

/// Result type alias using crate [`enum@Error`].
///
/// All fallible operations in this crate return this type.
pub type Result<T> = StdResult<T, Error>;

// ============================================================================
// Error Enum
// ============================================================================

/// Main error type for the crate.
///
/// Provisioning variants carry the message forwarded by the server when
/// one was provided.
#[derive(Error, Debug)]
pub enum Error {
    // ========================================================================
    // Provisioning Errors
    // ========================================================================
    /// Invalid credentials (HTTP 401).
    #[error("Authentication failed: {message}")]
    Authentication {
        /// Server-provided or default message.
        message: String,
    },

    /// Insufficient balance or quota (HTTP 402).
    #[error("Insufficient balance: {message}")]
    Quota {
        /// Server-provided or default message.
        message: String,
    },

    /// Malformed parameters or unknown model (HTTP 400).
    #[error("Invalid request: {message}")]
    InvalidRequest {
        /// Server-provided or default message.
        message: String,
    },

    /// Worker did not become ready in time (HTTP 504 or client timeout).
    #[error("Provisioning timed out: {message}")]
    ProvisioningTimeout {
        /// Server-provided or default message.
        message: String,
    },

    // ========================================================================
    // Transport Errors
    // ========================================================================
    /// Non-success HTTP response not covered by a dedicated variant.
    #[error("HTTP {status}: {message}")]
    Http {
        /// Response status code.
        status: StatusCode,
        /// Server-provided message or status reason.
        message: String,
    },

    /// Worker connection could not be established or failed while in use.
    #[error("Connection failed: {message}")]
    Connection {
        /// Description of the connection error.
        message: String,
    },

    /// Worker connection closed while a reply was expected.
    #[error("Connection closed")]
    ConnectionClosed,

    /// Operation timeout.
    #[error("Timeout after {timeout_ms}ms: {operation}")]
    Timeout {
        /// Description of the operation that timed out.
        operation: String,
        /// Milliseconds waited before timeout.
        timeout_ms: u64,
    },

    /// WebSocket error.
    #[error("WebSocket error: {0}")]
    WebSocket(#[from] WsError),

    /// HTTP client error.
    #[error("HTTP request error: {0}")]
    Request(#[from] reqwest::Error),

    // ========================================================================
    // Protocol Errors
    // ========================================================================
    /// Message failed to parse or decoded data violates an invariant.
    #[error("Protocol error: {message}")]
    Protocol {
        /// Description of the protocol violation.
        message: String,
    },

    // ========================================================================
    // Usage Errors
    // ========================================================================
    /// Call made in the wrong lifecycle state.
    #[error("Usage error: {message}")]
    Usage {
        /// Description of the misuse.
        message: String,
    },

    // ========================================================================
    // Configuration Errors
    // ========================================================================
    /// Configuration error.
    ///
    /// Returned when client configuration is invalid.
    #[error("Configuration error: {message}")]
    Config {
        /// Description of the configuration error.
        message: String,
    },

    // ========================================================================
    // External Errors
    // ========================================================================
    /// JSON serialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

// ============================================================================
// Error Constructors
// ============================================================================

impl Error {
    /// Creates an authentication error.
    #[inline]
    pub fn authentication(message: impl Into<String>) -> Self {
        Self::Authentication {
            message: message.into(),
        }
    }

    /// Creates a quota error.
    #[inline]
    pub fn quota(message: impl Into<String>) -> Self {
        Self::Quota {
            message: message.into(),
        }
    }

    /// Creates an invalid request error.
    #[inline]
    pub fn invalid_request(message: impl Into<String>) -> Self {
        Self::InvalidRequest {
            message: message.into(),
        }
    }

    /// Creates a provisioning timeout error.
    #[inline]
    pub fn provisioning_timeout(message: impl Into<String>) -> Self {
        Self::ProvisioningTimeout {
            message: message.into(),
        }
    }

    /// Creates an HTTP status error.
    #[inline]
    pub fn http(status: StatusCode, message: impl Into<String>) -> Self {
        Self::Http {
            status,
            message: message.into(),
        }
    }

    /// Creates a connection error.
    #[inline]
    pub fn connection(message: impl Into<String>) -> Self {
        Self::Connection {
            message: message.into(),
        }
    }

    /// Creates a timeout error.
    #[inline]
    pub fn timeout(operation: impl Into<String>, timeout_ms: u64) -> Self {
        Self::Timeout {
            operation: operation.into(),
            timeout_ms,
        }
    }

    /// Creates a protocol error.
    #[inline]
    pub fn protocol(message: impl Into<String>) -> Self {
        Self::Protocol {
            message: message.into(),
        }
    }

    /// Creates a usage error.
    #[inline]
    pub fn usage(message: impl Into<String>) -> Self {
        Self::Usage {
            message: message.into(),
        }
    }

    /// Creates a configuration error.
    #[inline]
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }
}

// ============================================================================
// Error Predicates
// ============================================================================

impl Error {
    /// Returns `true` if this error came from the provisioning handshake.
    #[inline]
    #[must_use]
    pub fn is_provisioning_error(&self) -> bool {
        matches!(
            self,
            Self::Authentication { .. }
                | Self::Quota { .. }
                | Self::InvalidRequest { .. }
                | Self::ProvisioningTimeout { .. }
        )
    }

    /// Returns `true` if this is a transport-level failure.
    #[inline]
    #[must_use]
    pub fn is_transport_error(&self) -> bool {
        matches!(
            self,
            Self::Http { .. }
                | Self::Connection { .. }
                | Self::ConnectionClosed
                | Self::Timeout { .. }
                | Self::WebSocket(_)
                | Self::Request(_)
        )
    }

    /// Returns `true` if this is a protocol error.
    #[inline]
    #[must_use]
    pub fn is_protocol_error(&self) -> bool {
        matches!(self, Self::Protocol { .. } | Self::Json(_))
    }

    /// Returns `true` if this is a lifecycle misuse.
    #[inline]
    #[must_use]
    pub fn is_usage_error(&self) -> bool {
        matches!(self, Self::Usage { .. })
    }

    /// Returns `true` if this is a timeout error.
    #[inline]
    #[must_use]
    pub fn is_timeout(&self) -> bool {
        matches!(
            self,
            Self::ProvisioningTimeout { .. } | Self::Timeout { .. }
        )
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::connection("failed to connect");
        assert_eq!(err.to_string(), "Connection failed: failed to connect");
    }

    #[test]
    fn test_provisioning_display_forwards_message() {
        let err = Error::authentication("Invalid API key");
        assert_eq!(err.to_string(), "Authentication failed: Invalid API key");

        let err = Error::http(StatusCode::INTERNAL_SERVER_ERROR, "boom");
        assert_eq!(err.to_string(), "HTTP 500 Internal Server Error: boom");
    }

    #[test]
    fn test_is_provisioning_error() {
        assert!(Error::quota("x").is_provisioning_error());
        assert!(Error::invalid_request("x").is_provisioning_error());
        assert!(Error::provisioning_timeout("x").is_provisioning_error());
        assert!(!Error::protocol("x").is_provisioning_error());
    }

    #[test]
    fn test_is_transport_error() {
        assert!(Error::connection("x").is_transport_error());
        assert!(Error::ConnectionClosed.is_transport_error());
        assert!(Error::timeout("receive", 10).is_transport_error());
        assert!(Error::http(StatusCode::BAD_GATEWAY, "x").is_transport_error());
        assert!(!Error::usage("x").is_transport_error());
    }

    #[test]
    fn test_is_timeout() {
        assert!(Error::provisioning_timeout("x").is_timeout());
        assert!(Error::timeout("receive", 1000).is_timeout());
        assert!(!Error::ConnectionClosed.is_timeout());
    }

    #[test]
    fn test_from_json_error() {
        let json_err = serde_json::from_str::<String>("invalid").unwrap_err();
        let err: Error = json_err.into();
        assert!(matches!(err, Error::Json(_)));
        assert!(err.is_protocol_error());
    }
}
