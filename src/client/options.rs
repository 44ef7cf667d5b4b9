//! Client configuration.
//!
//! # Example
//!
//! ```
//! use std::time::Duration;
//! use vizion::ClientOptions;
//!
//! let options = ClientOptions::new()
//!     .with_model("depth-anything-3")
//!     .with_provision_timeout(Duration::from_secs(60))
//!     .with_request_timeout(Duration::from_secs(5));
//!
//! assert_eq!(options.model.as_str(), "depth-anything-3");
//! ```

// ============================================================================
// Imports
// ============================================================================

use std::time::Duration;

use crate::error::{Error, Result};
use crate::identifiers::ModelId;
use crate::transport::{DEFAULT_CONNECT_TIMEOUT, DEFAULT_MAX_MESSAGE_SIZE, TransportConfig};

// ============================================================================
// Constants
// ============================================================================

/// Default base address of the Vizion API.
pub const DEFAULT_API_URL: &str = "https://www.vizion.fast";

/// Default time to wait for a worker to be provisioned.
pub const DEFAULT_PROVISION_TIMEOUT: Duration = Duration::from_secs(180);

// ============================================================================
// ClientOptions
// ============================================================================

/// Session configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientOptions {
    /// Base API address; trailing slashes are ignored.
    pub api_url: String,

    /// Model the worker is provisioned with.
    pub model: ModelId,

    /// Maximum wait for a worker to be provisioned.
    pub provision_timeout: Duration,

    /// Time allowed for the worker connection handshake.
    pub connect_timeout: Duration,

    /// Largest reply accepted from the worker, in bytes.
    pub max_message_size: usize,

    /// Per-call reply timeout for `segment`/`depth`; `None` waits forever.
    pub request_timeout: Option<Duration>,
}

impl Default for ClientOptions {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// Constructors
// ============================================================================

impl ClientOptions {
    /// Creates options with the service defaults.
    #[must_use]
    pub fn new() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            model: ModelId::default(),
            provision_timeout: DEFAULT_PROVISION_TIMEOUT,
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
            max_message_size: DEFAULT_MAX_MESSAGE_SIZE,
            request_timeout: None,
        }
    }
}

// ============================================================================
// Builder Methods
// ============================================================================

impl ClientOptions {
    /// Overrides the base API address.
    #[inline]
    #[must_use]
    pub fn with_api_url(mut self, api_url: impl Into<String>) -> Self {
        self.api_url = api_url.into();
        self
    }

    /// Selects the model.
    #[inline]
    #[must_use]
    pub fn with_model(mut self, model: impl Into<ModelId>) -> Self {
        self.model = model.into();
        self
    }

    /// Sets the provisioning timeout.
    #[inline]
    #[must_use]
    pub fn with_provision_timeout(mut self, timeout: Duration) -> Self {
        self.provision_timeout = timeout;
        self
    }

    /// Sets the worker connection timeout.
    #[inline]
    #[must_use]
    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    /// Sets the maximum inbound message size.
    #[inline]
    #[must_use]
    pub fn with_max_message_size(mut self, bytes: usize) -> Self {
        self.max_message_size = bytes;
        self
    }

    /// Bounds how long `segment`/`depth` wait for a reply.
    #[inline]
    #[must_use]
    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = Some(timeout);
        self
    }
}

// ============================================================================
// Derived Settings
// ============================================================================

impl ClientOptions {
    /// Returns the settings handed to the transport connector.
    #[must_use]
    pub fn transport_config(&self) -> TransportConfig {
        TransportConfig {
            max_message_size: self.max_message_size,
            connect_timeout: self.connect_timeout,
            receive_timeout: self.request_timeout,
        }
    }

    /// Checks value ranges.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] for zero timeouts or a zero message size.
    pub fn validate(&self) -> Result<()> {
        if self.provision_timeout.is_zero() {
            return Err(Error::config("provision_timeout must be positive"));
        }
        if self.connect_timeout.is_zero() {
            return Err(Error::config("connect_timeout must be positive"));
        }
        if self.max_message_size == 0 {
            return Err(Error::config("max_message_size must be positive"));
        }
        if self.request_timeout.is_some_and(|t| t.is_zero()) {
            return Err(Error::config("request_timeout must be positive"));
        }
        Ok(())
    }
}

// ============================================================================
// Tests
// ============================================================================
