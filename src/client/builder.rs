//! Builder pattern for client configuration.
//!
//! Provides a fluent API for configuring and creating [`VizionClient`]
//! instances.
//!
//! # Example
//!
//! ```
//! use vizion::VizionClient;
//!
//! # fn example() -> vizion::Result<()> {
//! let client = VizionClient::builder()
//!     .api_key("vz_live_your_api_key")
//!     .model("depth-anything-3")
//!     .build()?;
//! # Ok(())
//! # }
//! ```

// ============================================================================
// Imports
// ============================================================================

use std::sync::Arc;
use std::time::Duration;

use crate::error::{Error, Result};
use crate::identifiers::ModelId;
use crate::provisioning::{ProgressObserver, ProvisioningClient};
use crate::transport::{Connector, WsConnector};

use super::core::VizionClient;
use super::options::ClientOptions;

// ============================================================================
// ClientBuilder
// ============================================================================

/// Builder for configuring a [`VizionClient`].
///
/// Use [`VizionClient::builder()`] to create a new builder.
#[derive(Default, Clone)]
pub struct ClientBuilder {
    /// Account API key.
    api_key: Option<String>,
    /// Session options.
    options: ClientOptions,
    /// Worker transport factory.
    connector: Option<Arc<dyn Connector>>,
    /// Provisioning progress observer.
    observer: Option<Arc<dyn ProgressObserver>>,
    /// Shared HTTP client.
    http: Option<reqwest::Client>,
}

impl std::fmt::Debug for ClientBuilder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClientBuilder")
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("options", &self.options)
            .field("custom_connector", &self.connector.is_some())
            .field("observer", &self.observer.is_some())
            .finish_non_exhaustive()
    }
}

// ============================================================================
// ClientBuilder Implementation
// ============================================================================

impl ClientBuilder {
    /// Creates a new builder with default options.
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the account API key.
    #[inline]
    #[must_use]
    pub fn api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    /// Overrides the base API address.
    #[inline]
    #[must_use]
    pub fn api_url(mut self, api_url: impl Into<String>) -> Self {
        self.options.api_url = api_url.into();
        self
    }

    /// Selects the model the worker is provisioned with.
    #[inline]
    #[must_use]
    pub fn model(mut self, model: impl Into<ModelId>) -> Self {
        self.options.model = model.into();
        self
    }

    /// Sets the maximum wait for a worker to be provisioned.
    #[inline]
    #[must_use]
    pub fn provision_timeout(mut self, timeout: Duration) -> Self {
        self.options.provision_timeout = timeout;
        self
    }

    /// Bounds how long `segment`/`depth` wait for a reply.
    #[inline]
    #[must_use]
    pub fn request_timeout(mut self, timeout: Duration) -> Self {
        self.options.request_timeout = Some(timeout);
        self
    }

    /// Replaces all options at once.
    #[inline]
    #[must_use]
    pub fn options(mut self, options: ClientOptions) -> Self {
        self.options = options;
        self
    }

    /// Uses a custom worker transport instead of WebSocket.
    #[inline]
    #[must_use]
    pub fn connector(mut self, connector: impl Connector + 'static) -> Self {
        self.connector = Some(Arc::new(connector));
        self
    }

    /// Reports provisioning progress to `observer`.
    #[inline]
    #[must_use]
    pub fn on_progress(mut self, observer: impl ProgressObserver + 'static) -> Self {
        self.observer = Some(Arc::new(observer));
        self
    }

    /// Reuses an existing HTTP client for provisioning calls.
    #[inline]
    #[must_use]
    pub fn http_client(mut self, http: reqwest::Client) -> Self {
        self.http = Some(http);
        self
    }

    /// Builds the client with validation.
    ///
    /// No network activity happens until [`VizionClient::connect`].
    ///
    /// # Errors
    ///
    /// - [`Error::Config`] if the API key is missing or empty
    /// - [`Error::Config`] if the API URL or an option is invalid
    pub fn build(self) -> Result<VizionClient> {
        let api_key = self.validate_api_key()?;
        self.options.validate()?;

        let provisioning = match self.http {
            Some(http) => ProvisioningClient::with_http_client(http, &self.options.api_url)?,
            None => ProvisioningClient::new(&self.options.api_url)?,
        };
        let connector = self.connector.unwrap_or_else(|| Arc::new(WsConnector));

        Ok(VizionClient::new_with_parts(
            api_key,
            self.options,
            provisioning,
            connector,
            self.observer,
        ))
    }
}

// ============================================================================
// Validation
// ============================================================================

impl ClientBuilder {
    /// Validates the API key configuration.
    fn validate_api_key(&self) -> Result<String> {
        let api_key = self.api_key.clone().ok_or_else(|| {
            Error::config(
                "API key is required. Use .api_key() to set it.\n\
                 Example: VizionClient::builder().api_key(\"vz_live_...\")",
            )
        })?;

        if api_key.trim().is_empty() {
            return Err(Error::config("API key must not be empty"));
        }

        Ok(api_key)
    }
}

// ============================================================================
// Tests
// ============================================================================
