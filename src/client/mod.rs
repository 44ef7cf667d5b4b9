//! Session client module.
//!
//! This module provides the main entry point for running inference.
//!
//! # Components
//!
//! | Type | Description |
//! |------|-------------|
//! | [`VizionClient`] | Session lifecycle and inference calls |
//! | [`ClientBuilder`] | Fluent configuration builder |
//! | [`ClientOptions`] | Endpoint, model and timeout settings |
//! | [`SessionState`] | Lifecycle state |
//!
//! # Example
//!
//! ```no_run
//! use vizion::{Result, VizionClient};
//!
//! # async fn example(jpeg: Vec<u8>) -> Result<()> {
//! let mut client = VizionClient::builder()
//!     .api_key("vz_live_your_api_key")
//!     .build()?;
//!
//! client.connect().await?;
//! let result = client.segment(jpeg, ["person"]).await;
//! client.close().await;
//!
//! println!("{} instance(s)", result?.instance_count());
//! # Ok(())
//! # }
//! ```

// ============================================================================
// Submodules
// ============================================================================

/// Fluent builder pattern for client configuration.
pub mod builder;

/// Session lifecycle controller.
pub mod core;

/// Client options and defaults.
pub mod options;

// ============================================================================
// Re-exports
// ============================================================================

pub use builder::ClientBuilder;
pub use core::{SessionState, VizionClient};
pub use options::{ClientOptions, DEFAULT_API_URL, DEFAULT_PROVISION_TIMEOUT};
