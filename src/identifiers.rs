//! Type-safe identifiers.
//!
//! Newtype wrappers keep session ids and model ids from being mixed up
//! with each other or with arbitrary strings.

// ============================================================================
// Imports
// ============================================================================

use std::fmt;

use serde::{Deserialize, Serialize};

// ============================================================================
// SessionId
// ============================================================================

/// Server-issued identifier of a billable worker session.
///
/// Opaque to the client; only compared and displayed.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionId(String);

impl SessionId {
    /// Wraps a raw session identifier.
    #[inline]
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the identifier as a string slice.
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// ============================================================================
// ModelId
// ============================================================================

/// Catalog identifier of an inference model (e.g. `sam3`).
///
/// Not validated locally; the server is authoritative.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ModelId(String);

impl ModelId {
    /// Text-prompted segmentation model, the default selection.
    pub const SEGMENTATION: &'static str = "sam3";

    /// Monocular metric depth model.
    pub const DEPTH: &'static str = "depth-anything-3";

    /// Wraps a raw model identifier.
    #[inline]
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the identifier as a string slice.
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for ModelId {
    fn default() -> Self {
        Self::new(Self::SEGMENTATION)
    }
}

impl fmt::Display for ModelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ModelId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl From<String> for ModelId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_session_id_display() {
        let id = SessionId::new("sess_123");
        assert_eq!(id.to_string(), "sess_123");
        assert_eq!(id.as_str(), "sess_123");
    }

    #[test]
    fn test_session_id_is_transparent_in_json() {
        let id: SessionId = serde_json::from_str("\"abc\"").expect("parse");
        assert_eq!(id, SessionId::new("abc"));
        assert_eq!(serde_json::to_string(&id).expect("serialize"), "\"abc\"");
    }

    #[test]
    fn test_model_id_default_is_segmentation() {
        assert_eq!(ModelId::default().as_str(), "sam3");
    }

    #[test]
    fn test_model_id_from_str() {
        let id: ModelId = "depth-anything-3".into();
        assert_eq!(id.as_str(), ModelId::DEPTH);
    }
}
