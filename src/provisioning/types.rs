//! Provisioning API wire types.

// ============================================================================
// Imports
// ============================================================================

use serde::{Deserialize, Serialize};

use crate::identifiers::{ModelId, SessionId};

// ============================================================================
// Connect
// ============================================================================

/// Body of `POST /api/v1/connect`.
#[derive(Debug, Clone, Serialize)]
pub(crate) struct ConnectRequest<'a> {
    pub model: &'a ModelId,
}

/// A provisioned worker session.
///
/// # Format
///
/// ```json
/// {"session_id": "sess_abc", "ws_url": "wss://worker-7.vizion.fast/ws"}
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SessionGrant {
    /// Server-issued session identifier.
    pub session_id: SessionId,
    /// Worker address to open the persistent connection to.
    pub ws_url: String,
}

// ============================================================================
// Catalog
// ============================================================================

/// A model offered by the service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelInfo {
    /// Catalog identifier, passed as the session model.
    pub id: ModelId,
    /// Display name.
    pub name: String,
    pub description: String,
}

/// Reply of `GET /api/v1/models`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelsResponse {
    /// Price of worker time, in cents per second.
    pub cost_per_second_cents: f64,
    pub models: Vec<ModelInfo>,
}

impl ModelsResponse {
    /// Returns the catalog entry for `id`.
    #[must_use]
    pub fn find(&self, id: &str) -> Option<&ModelInfo> {
        self.models.iter().find(|m| m.id.as_str() == id)
    }
}

// ============================================================================
// Session History
// ============================================================================

/// Historical session summary from `GET /api/v1/sessions`.
///
/// Timestamps are passed through as the server formats them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionRecord {
    pub id: SessionId,
    pub model: String,
    /// Server-defined status, e.g. `active` or `ended`.
    pub status: String,
    pub started_at: String,
    /// Absent while the session is still running.
    #[serde(default)]
    pub ended_at: Option<String>,
    #[serde(default)]
    pub duration_seconds: Option<f64>,
    #[serde(default)]
    pub credits_used: Option<i64>,
}

/// Envelope of the session history reply.
#[derive(Debug, Deserialize)]
pub(crate) struct SessionsResponse {
    pub sessions: Vec<SessionRecord>,
}

// ============================================================================
// Errors
// ============================================================================

/// Error body returned with non-success statuses.
#[derive(Debug, Default, Deserialize)]
pub(crate) struct ErrorBody {
    #[serde(default)]
    pub error: Option<String>,
}

// ============================================================================
// Tests
// ============================================================================
