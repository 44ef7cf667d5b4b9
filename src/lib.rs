//! Vizion - Real-time GPU segmentation and depth estimation client.
//!
//! This library connects to the Vizion.fast service, provisions a dedicated
//! GPU worker, and streams JPEG frames to it for open-vocabulary instance
//! segmentation or metric depth estimation.
//!
//! # Architecture
//!
//! A session goes through two network phases:
//!
//! - **Provisioning (HTTP)**: one authenticated call allocates a worker and
//!   returns its WebSocket address
//! - **Inference (WebSocket)**: a persistent connection carries one binary
//!   request and one JSON reply per call
//!
//! Key design principles:
//!
//! - Each [`VizionClient`] owns one session and one connection
//! - Call ordering is enforced by [`SessionState`]
//! - Billing runs while connected; [`VizionClient::close`] stops the worker
//! - Decoding masks and depth maps is opt-in and local
//!
//! # Quick Start
//!
//! ```no_run
//! use vizion::{Result, VizionClient};
//!
//! #[tokio::main]
//! async fn main() -> Result<()> {
//!     let jpeg = std::fs::read("frame.jpg").expect("frame");
//!
//!     let client = VizionClient::builder()
//!         .api_key("vz_live_your_api_key")
//!         .build()?;
//!
//!     let result = client
//!         .scoped(async |client: &mut VizionClient| {
//!             client.connect().await?;
//!             client.segment(jpeg, ["person", "car"]).await
//!         })
//!         .await?;
//!
//!     for detection in &result.results {
//!         for instance in &detection.instances {
//!             println!("{} {:.2} {:?}", detection.prompt, instance.confidence, instance.bbox());
//!         }
//!     }
//!     Ok(())
//! }
//! ```
//!
//! # Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`client`] | [`VizionClient`], builder and options |
//! | `decode` | RLE mask and depth PNG decoding (feature `decode`) |
//! | [`error`] | Error types and [`Result`] alias |
//! | [`identifiers`] | Session and model ids |
//! | [`protocol`] | Request framing and response types |
//! | [`provisioning`] | HTTP session provisioning |
//! | [`transport`] | Worker connection layer |
//!
//! # Features
//!
//! - `decode` (default): [`decode::decode_mask`] and [`decode::decode_depth`]

// ============================================================================
// Modules
// ============================================================================

/// Session client and configuration.
///
/// Use [`VizionClient::builder()`] to create a configured client.
pub mod client;

/// Mask and depth decoding.
#[cfg(feature = "decode")]
pub mod decode;

/// Error types and result aliases.
///
/// All fallible operations return [`Result<T>`] which uses [`Error`].
pub mod error;

/// Session and model identifiers.
pub mod identifiers;

/// Worker message framing and response types.
pub mod protocol;

/// HTTP session provisioning.
pub mod provisioning;

/// Worker connection layer.
///
/// [`WsConnector`] is the default; implement [`Connector`] for tests or
/// alternative transports.
pub mod transport;

// ============================================================================
// Re-exports
// ============================================================================

// Client types
pub use client::{ClientBuilder, ClientOptions, SessionState, VizionClient};

// Error types
pub use error::{Error, Result};

// Identifier types
pub use identifiers::{ModelId, SessionId};

// Protocol types
pub use protocol::{
    DepthResponse, Detection, Instance, SegmentationRequest, SegmentationResponse,
};

// Provisioning types
pub use provisioning::{
    ModelInfo, ModelsResponse, ProgressObserver, ProvisioningProgress, SessionRecord,
};

// Transport types
pub use transport::{Connector, ShutdownHandle, Transport, TransportConfig, WsConnector};
