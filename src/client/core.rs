//! Session lifecycle controller.
//!
//! The [`VizionClient`] owns one logical GPU session and enforces call
//! ordering:
//!
//! ```text
//!   Unconnected ──connect()──► Connected ──close()──► Closed
//!        │                                              ▲
//!        └──────────────────close()─────────────────────┘
//! ```
//!
//! `segment()` and `depth()` are valid only while connected. A closed
//! client cannot reconnect; build a new one for a new session.
//!
//! # Example
//!
//! ```no_run
//! use vizion::VizionClient;
//!
//! # async fn example(jpeg: Vec<u8>) -> vizion::Result<()> {
//! let client = VizionClient::new("vz_live_your_api_key")?;
//!
//! let result = client
//!     .scoped(async |client: &mut VizionClient| {
//!         client.connect().await?;
//!         client.segment(jpeg, ["person", "car"]).await
//!     })
//!     .await?;
//!
//! for detection in &result.results {
//!     println!("{}: {} instance(s)", detection.prompt, detection.instances.len());
//! }
//! # Ok(())
//! # }
//! ```

// ============================================================================
// Imports
// ============================================================================

use std::fmt;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use futures_util::FutureExt;
use tracing::{debug, info, warn};

use crate::error::{Error, Result};
use crate::identifiers::{ModelId, SessionId};
use crate::protocol::{
    DepthResponse, Outbound, SegmentationRequest, SegmentationResponse, encode_depth,
    encode_segment, parse_depth_response, parse_segment_response,
};
use crate::provisioning::{ModelsResponse, ProgressObserver, ProvisioningClient, SessionRecord};
use crate::transport::{Connector, ShutdownHandle, Transport};

use super::builder::ClientBuilder;
use super::options::ClientOptions;

// ============================================================================
// SessionState
// ============================================================================

/// Lifecycle state of a [`VizionClient`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// Initial state; no worker provisioned.
    Unconnected,
    /// Worker provisioned and connection open.
    Connected,
    /// Terminal state after [`VizionClient::close`].
    Closed,
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Unconnected => "unconnected",
            Self::Connected => "connected",
            Self::Closed => "closed",
        })
    }
}

// ============================================================================
// VizionClient
// ============================================================================

/// Client for one Vizion GPU session.
///
/// Methods that talk to the worker take `&mut self`: a session serves one
/// caller at a time and the protocol has no request pipelining. To cancel
/// a call from another task, use [`shutdown_handle`](Self::shutdown_handle).
pub struct VizionClient {
    /// Account API key.
    api_key: String,
    /// Session options.
    options: ClientOptions,
    /// HTTP provisioning client.
    provisioning: ProvisioningClient,
    /// Worker transport factory.
    connector: Arc<dyn Connector>,
    /// Provisioning progress observer.
    observer: Option<Arc<dyn ProgressObserver>>,
    /// Current lifecycle state.
    state: SessionState,
    /// Server-issued session id, set by `connect`.
    session_id: Option<SessionId>,
    /// Open worker connection while connected.
    transport: Option<Box<dyn Transport>>,
}

// ============================================================================
// VizionClient - Display
// ============================================================================

impl fmt::Debug for VizionClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("VizionClient")
            .field("api_url", &self.provisioning.api_url())
            .field("model", &self.options.model)
            .field("state", &self.state)
            .field("session_id", &self.session_id)
            .finish_non_exhaustive()
    }
}

// ============================================================================
// VizionClient - Construction
// ============================================================================

impl VizionClient {
    /// Creates a client with default options.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if `api_key` is empty.
    pub fn new(api_key: impl Into<String>) -> Result<Self> {
        Self::builder().api_key(api_key).build()
    }

    /// Creates a configuration builder.
    #[inline]
    #[must_use]
    pub fn builder() -> ClientBuilder {
        ClientBuilder::new()
    }

    pub(crate) fn new_with_parts(
        api_key: String,
        options: ClientOptions,
        provisioning: ProvisioningClient,
        connector: Arc<dyn Connector>,
        observer: Option<Arc<dyn ProgressObserver>>,
    ) -> Self {
        Self {
            api_key,
            options,
            provisioning,
            connector,
            observer,
            state: SessionState::Unconnected,
            session_id: None,
            transport: None,
        }
    }
}

// ============================================================================
// VizionClient - Accessors
// ============================================================================

impl VizionClient {
    /// Returns the current lifecycle state.
    #[inline]
    #[must_use]
    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Returns `true` while a worker connection is open.
    #[inline]
    #[must_use]
    pub fn is_connected(&self) -> bool {
        self.state == SessionState::Connected
    }

    /// Returns the session id once connected.
    ///
    /// Kept after [`close`](Self::close) for reference.
    #[inline]
    #[must_use]
    pub fn session_id(&self) -> Option<&SessionId> {
        self.session_id.as_ref()
    }

    /// Returns the selected model.
    #[inline]
    #[must_use]
    pub fn model(&self) -> &ModelId {
        &self.options.model
    }

    /// Returns the client options.
    #[inline]
    #[must_use]
    pub fn options(&self) -> &ClientOptions {
        &self.options
    }

    /// Returns a handle that closes the worker connection from another
    /// task, unblocking a pending call with [`Error::ConnectionClosed`].
    ///
    /// `None` unless connected over a transport that supports it.
    #[must_use]
    pub fn shutdown_handle(&self) -> Option<ShutdownHandle> {
        self.transport.as_ref().and_then(|t| t.shutdown_handle())
    }
}

// ============================================================================
// VizionClient - Session Lifecycle
// ============================================================================

impl VizionClient {
    /// Provisions a GPU worker and opens the connection to it.
    ///
    /// On failure the client stays [`SessionState::Unconnected`] and may
    /// be connected again.
    ///
    /// # Errors
    ///
    /// - [`Error::Usage`] if not [`SessionState::Unconnected`]
    /// - Provisioning errors ([`Error::Authentication`], [`Error::Quota`],
    ///   [`Error::InvalidRequest`], [`Error::ProvisioningTimeout`])
    /// - Transport errors if the worker cannot be reached
    pub async fn connect(&mut self) -> Result<()> {
        match self.state {
            SessionState::Unconnected => {}
            SessionState::Connected => {
                return Err(Error::usage("connect() called on a connected session"));
            }
            SessionState::Closed => {
                return Err(Error::usage(
                    "connect() called after close(); create a new client for a new session",
                ));
            }
        }

        let grant = self
            .provisioning
            .acquire_session(
                &self.api_key,
                &self.options.model,
                self.options.provision_timeout,
                self.observer.clone(),
            )
            .await?;

        debug!(session_id = %grant.session_id, ws_url = %grant.ws_url, "Connecting to worker");

        let transport = match self
            .connector
            .open(&grant.ws_url, &self.options.transport_config())
            .await
        {
            Ok(transport) => transport,
            Err(e) => {
                warn!(session_id = %grant.session_id, error = %e, "Worker connection failed");
                return Err(e);
            }
        };

        info!(session_id = %grant.session_id, model = %self.options.model, "Connected");

        self.session_id = Some(grant.session_id);
        self.transport = Some(transport);
        self.state = SessionState::Connected;
        Ok(())
    }

    /// Shuts down the worker and closes the connection.
    ///
    /// Sends the shutdown command so billing stops immediately. Failures
    /// are logged and otherwise ignored; the client always ends up
    /// [`SessionState::Closed`]. Safe to call multiple times.
    pub async fn close(&mut self) {
        if self.state == SessionState::Closed {
            return;
        }

        if let Some(mut transport) = self.transport.take() {
            if let Err(e) = transport.send(Outbound::shutdown()).await {
                debug!(error = %e, "Shutdown command not delivered");
            }
            if let Err(e) = transport.close().await {
                debug!(error = %e, "Error closing worker connection");
            }
            if let Some(session_id) = &self.session_id {
                info!(%session_id, "Session closed");
            }
        }

        self.state = SessionState::Closed;
    }

    /// Runs `f` with this client and closes it afterwards, whether `f`
    /// succeeds, fails or panics.
    ///
    /// A panic in `f` is re-raised after the worker has been shut down.
    /// With `panic = "abort"` nothing unwinds and the worker is released
    /// by the server once the connection drops.
    ///
    /// # Errors
    ///
    /// Returns whatever `f` returns.
    pub async fn scoped<T, F>(mut self, f: F) -> Result<T>
    where
        F: AsyncFnOnce(&mut VizionClient) -> Result<T>,
    {
        let outcome = AssertUnwindSafe(f(&mut self)).catch_unwind().await;
        self.close().await;

        match outcome {
            Ok(result) => result,
            Err(panic) => std::panic::resume_unwind(panic),
        }
    }
}

// ============================================================================
// VizionClient - Inference
// ============================================================================

impl VizionClient {
    /// Segments `prompts` in a JPEG frame with default thresholds.
    ///
    /// # Errors
    ///
    /// See [`segment_with`](Self::segment_with).
    pub async fn segment(
        &mut self,
        jpeg: Vec<u8>,
        prompts: impl IntoIterator<Item = impl Into<String>>,
    ) -> Result<SegmentationResponse> {
        self.segment_with(SegmentationRequest::new(jpeg, prompts)).await
    }

    /// Sends a segmentation request and waits for the result.
    ///
    /// # Errors
    ///
    /// - [`Error::Usage`] if not connected
    /// - [`Error::InvalidRequest`] if thresholds are out of range
    /// - Transport errors if the connection fails or times out; a timeout
    ///   also closes the session
    /// - [`Error::Protocol`] if the reply is malformed
    pub async fn segment_with(
        &mut self,
        request: SegmentationRequest,
    ) -> Result<SegmentationResponse> {
        let transport = self.connected_transport("segment")?;
        let message = encode_segment(&request)?;

        debug!(
            prompts = request.prompts.len(),
            bytes = message.len(),
            "Sending segment request"
        );

        let reply = match exchange(transport, message).await {
            Ok(reply) => reply,
            Err(e) => return Err(self.after_failed_exchange(e).await),
        };
        let response = parse_segment_response(&reply)?;

        if response.results.len() != request.prompts.len() {
            warn!(
                prompts = request.prompts.len(),
                results = response.results.len(),
                "Worker returned a different number of detections than prompts"
            );
        }

        debug!(
            instances = response.instance_count(),
            server_ms = response.total_ms(),
            "Segment response received"
        );

        Ok(response)
    }

    /// Estimates metric depth for a JPEG frame.
    ///
    /// # Errors
    ///
    /// - [`Error::Usage`] if not connected
    /// - Transport errors if the connection fails or times out; a timeout
    ///   also closes the session
    /// - [`Error::Protocol`] if the reply is malformed
    pub async fn depth(&mut self, jpeg: Vec<u8>) -> Result<DepthResponse> {
        let transport = self.connected_transport("depth")?;
        if jpeg.is_empty() {
            return Err(Error::invalid_request("image bytes are empty"));
        }

        debug!(bytes = jpeg.len(), "Sending depth request");

        let reply = match exchange(transport, encode_depth(jpeg)).await {
            Ok(reply) => reply,
            Err(e) => return Err(self.after_failed_exchange(e).await),
        };
        let response = parse_depth_response(&reply)?;

        debug!(
            width = response.width,
            height = response.height,
            server_ms = response.total_ms(),
            "Depth response received"
        );

        Ok(response)
    }

    /// Returns the open transport, or a usage error naming `operation`.
    fn connected_transport(&mut self, operation: &str) -> Result<&mut (dyn Transport + 'static)> {
        match (self.state, self.transport.as_deref_mut()) {
            (SessionState::Connected, Some(transport)) => Ok(transport),
            (SessionState::Closed, _) => Err(Error::usage(format!(
                "{operation}() called after close()"
            ))),
            _ => Err(Error::usage(format!(
                "{operation}() called before connect()"
            ))),
        }
    }
}

impl VizionClient {
    /// Closes the session when `error` left the connection out of step
    /// with the worker, then hands the error back.
    ///
    /// After a reply timeout the late reply would be read as the answer to
    /// the next request, so the worker is shut down instead.
    async fn after_failed_exchange(&mut self, error: Error) -> Error {
        if error.is_timeout() {
            warn!(
                session_id = ?self.session_id,
                error = %error,
                "Worker reply timed out, closing session"
            );
            self.close().await;
        }
        error
    }
}

/// Sends one request and waits for its reply.
async fn exchange(transport: &mut dyn Transport, message: Outbound) -> Result<Vec<u8>> {
    transport.send(message).await?;
    transport.receive().await
}

// ============================================================================
// VizionClient - Catalog
// ============================================================================

impl VizionClient {
    /// Lists available models and pricing. Valid in any state.
    ///
    /// # Errors
    ///
    /// Returns a transport or protocol error if the call fails.
    pub async fn models(&self) -> Result<ModelsResponse> {
        self.provisioning.list_models().await
    }

    /// Lists recent sessions for this API key. Valid in any state.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Authentication`] for a rejected key, or a
    /// transport or protocol error if the call fails.
    pub async fn sessions(&self) -> Result<Vec<SessionRecord>> {
        self.provisioning.list_sessions(&self.api_key).await
    }
}

impl Drop for VizionClient {
    fn drop(&mut self) {
        if self.state == SessionState::Connected {
            warn!(
                session_id = ?self.session_id,
                "VizionClient dropped while connected; call close() to stop the worker"
            );
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
