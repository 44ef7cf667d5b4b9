//! Session provisioning over HTTP.
//!
//! Before a worker connection can be opened, the service must allocate a
//! GPU worker for the account. This module performs that one-shot
//! authenticated exchange and exposes the read-only catalog calls.
//!
//! # Provisioning Flow
//!
//! 1. `POST /api/v1/connect` with `Authorization: Bearer <key>`
//! 2. Server starts a worker (may take minutes; progress is optional)
//! 3. Reply carries `session_id` and the worker `ws_url`
//!
//! # Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | `client` | HTTP calls and status mapping |
//! | `progress` | Optional progress observer |
//! | `types` | Request/response bodies |

// ============================================================================
// Submodules
// ============================================================================

/// HTTP calls and status mapping.
pub mod client;

/// Optional progress observer.
pub mod progress;

/// Request/response bodies.
pub mod types;

// ============================================================================
// Re-exports
// ============================================================================

pub use client::ProvisioningClient;
pub use progress::{PROGRESS_INTERVAL, ProgressObserver, ProvisioningProgress};
pub use types::{ModelInfo, ModelsResponse, SessionGrant, SessionRecord};
