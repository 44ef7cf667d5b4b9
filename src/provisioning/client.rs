//! HTTP client for the provisioning API.
//!
//! # Endpoints
//!
//! | Call | Method | Path | Auth |
//! |------|--------|------|------|
//! | [`ProvisioningClient::acquire_session`] | `POST` | `/api/v1/connect` | Bearer |
//! | [`ProvisioningClient::list_models`] | `GET` | `/api/v1/models` | none |
//! | [`ProvisioningClient::list_sessions`] | `GET` | `/api/v1/sessions` | Bearer |
//!
//! Every call is a single round trip: no retries, no caching.

// ============================================================================
// Imports
// ============================================================================

use std::sync::Arc;
use std::time::Duration;

use reqwest::{Client, Response, StatusCode};
use serde::de::DeserializeOwned;
use tracing::{debug, info, warn};
use url::Url;

use crate::error::{Error, Result};
use crate::identifiers::ModelId;

use super::progress::{PROGRESS_INTERVAL, ProgressObserver, Ticker};
use super::types::{
    ConnectRequest, ErrorBody, ModelsResponse, SessionGrant, SessionRecord, SessionsResponse,
};

// ============================================================================
// Constants
// ============================================================================

/// Timeout for catalog and history calls.
const LISTING_TIMEOUT: Duration = Duration::from_secs(10);

// ============================================================================
// ProvisioningClient
// ============================================================================

/// Client for the session provisioning and catalog endpoints.
#[derive(Debug, Clone)]
pub struct ProvisioningClient {
    http: Client,
    api_url: String,
}

impl ProvisioningClient {
    /// Creates a client for the API at `api_url`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if `api_url` is not an `http(s)` URL.
    pub fn new(api_url: &str) -> Result<Self> {
        Self::with_http_client(Client::new(), api_url)
    }

    /// Creates a client reusing an existing [`reqwest::Client`].
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if `api_url` is not an `http(s)` URL.
    pub fn with_http_client(http: Client, api_url: &str) -> Result<Self> {
        let api_url = normalize_api_url(api_url)?;
        Ok(Self { http, api_url })
    }

    /// Returns the base API URL, without trailing slash.
    #[inline]
    #[must_use]
    pub fn api_url(&self) -> &str {
        &self.api_url
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}{path}", self.api_url)
    }

    /// Provisions a worker for `model` and returns its session grant.
    ///
    /// Blocks until the server answers or `wait` elapses. When an observer
    /// is given it is ticked every couple of seconds meanwhile, and is
    /// stopped before this returns.
    ///
    /// # Errors
    ///
    /// - [`Error::Authentication`] on HTTP 401 or an empty API key
    /// - [`Error::Quota`] on HTTP 402
    /// - [`Error::InvalidRequest`] on HTTP 400
    /// - [`Error::ProvisioningTimeout`] on HTTP 504 or when `wait` elapses
    /// - [`Error::Http`] on any other non-success status
    /// - [`Error::Protocol`] if the grant is malformed
    /// - [`Error::Config`] if `wait` is zero
    pub async fn acquire_session(
        &self,
        api_key: &str,
        model: &ModelId,
        wait: Duration,
        observer: Option<Arc<dyn ProgressObserver>>,
    ) -> Result<SessionGrant> {
        if api_key.is_empty() {
            return Err(Error::authentication("API key is empty"));
        }
        if wait.is_zero() {
            return Err(Error::config("provisioning timeout must be positive"));
        }

        info!(%model, "Starting session");

        let ticker = observer.map(|observer| Ticker::start(observer, PROGRESS_INTERVAL));

        let result = self
            .http
            .post(self.endpoint("/api/v1/connect"))
            .bearer_auth(api_key)
            .json(&ConnectRequest { model })
            .timeout(wait)
            .send()
            .await;

        if let Some(ticker) = ticker {
            ticker.stop().await;
        }

        let response = result.map_err(|e| {
            if e.is_timeout() {
                Error::provisioning_timeout(format!(
                    "no worker ready within {}s",
                    wait.as_secs_f32()
                ))
            } else {
                Error::from(e)
            }
        })?;

        let grant: SessionGrant = parse_body(check_status(response).await?, "session grant").await?;
        validate_ws_url(&grant.ws_url)?;

        info!(session_id = %grant.session_id, "Session ready");
        Ok(grant)
    }

    /// Lists available models and pricing. No authentication required.
    ///
    /// # Errors
    ///
    /// Returns a transport error on failure or [`Error::Protocol`] if the
    /// catalog is malformed.
    pub async fn list_models(&self) -> Result<ModelsResponse> {
        let response = self
            .http
            .get(self.endpoint("/api/v1/models"))
            .timeout(LISTING_TIMEOUT)
            .send()
            .await?;

        let models: ModelsResponse = parse_body(check_status(response).await?, "model catalog").await?;
        debug!(count = models.models.len(), "Fetched model catalog");
        Ok(models)
    }

    /// Lists recent sessions for the account behind `api_key`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Authentication`] on HTTP 401, another transport
    /// error on failure, or [`Error::Protocol`] if the reply is malformed.
    pub async fn list_sessions(&self, api_key: &str) -> Result<Vec<SessionRecord>> {
        let response = self
            .http
            .get(self.endpoint("/api/v1/sessions"))
            .bearer_auth(api_key)
            .timeout(LISTING_TIMEOUT)
            .send()
            .await?;

        let body: SessionsResponse = parse_body(check_status(response).await?, "session list").await?;
        debug!(count = body.sessions.len(), "Fetched session history");
        Ok(body.sessions)
    }
}

// ============================================================================
// Helpers
// ============================================================================

/// Validates the base URL and strips trailing slashes.
fn normalize_api_url(api_url: &str) -> Result<String> {
    let trimmed = api_url.trim_end_matches('/');
    let parsed = Url::parse(trimmed)
        .map_err(|e| Error::config(format!("invalid API URL {api_url:?}: {e}")))?;

    if !matches!(parsed.scheme(), "http" | "https") {
        return Err(Error::config(format!(
            "API URL must use http or https, got {:?}",
            parsed.scheme()
        )));
    }

    Ok(trimmed.to_string())
}

/// Checks that a worker address is a WebSocket URL.
fn validate_ws_url(ws_url: &str) -> Result<()> {
    let parsed = Url::parse(ws_url)
        .map_err(|e| Error::protocol(format!("invalid worker URL {ws_url:?}: {e}")))?;

    if matches!(parsed.scheme(), "ws" | "wss") {
        Ok(())
    } else {
        Err(Error::protocol(format!(
            "worker URL must use ws or wss, got {ws_url:?}"
        )))
    }
}

/// Passes success responses through and maps the rest onto the error taxonomy.
async fn check_status(response: Response) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.bytes().await.unwrap_or_default();
    let message = serde_json::from_slice::<ErrorBody>(&body)
        .ok()
        .and_then(|b| b.error);

    warn!(%status, message = message.as_deref().unwrap_or(""), "Provisioning API error");
    Err(status_error(status, message))
}

/// Maps a non-success status to its error variant.
fn status_error(status: StatusCode, message: Option<String>) -> Error {
    match status {
        StatusCode::UNAUTHORIZED => {
            Error::authentication(message.unwrap_or_else(|| "Invalid API key".into()))
        }
        StatusCode::PAYMENT_REQUIRED => {
            Error::quota(message.unwrap_or_else(|| "Insufficient balance".into()))
        }
        StatusCode::BAD_REQUEST => {
            Error::invalid_request(message.unwrap_or_else(|| "Bad request".into()))
        }
        StatusCode::GATEWAY_TIMEOUT => {
            Error::provisioning_timeout(message.unwrap_or_else(|| "Session startup timed out".into()))
        }
        _ => Error::http(
            status,
            message.unwrap_or_else(|| status.canonical_reason().unwrap_or("request failed").into()),
        ),
    }
}

/// Reads and strictly parses a JSON body.
async fn parse_body<T: DeserializeOwned>(response: Response, what: &str) -> Result<T> {
    let body = response.bytes().await?;
    serde_json::from_slice(&body).map_err(|e| Error::protocol(format!("invalid {what}: {e}")))
}

// ============================================================================
// Tests
// ============================================================================
