//! Worker message framing.
//!
//! This module defines the wire format exchanged with a GPU worker over
//! the persistent connection.
//!
//! # Protocol Overview
//!
//! | Message | Direction | Layout |
//! |---------|-----------|--------|
//! | Segment request | Local → Worker | `u32 LE header length` + JSON header + JPEG bytes |
//! | Depth request | Local → Worker | JPEG bytes only |
//! | Shutdown | Local → Worker | text `"shutdown"`, no reply |
//! | Segment response | Worker → Local | JSON [`SegmentationResponse`] |
//! | Depth response | Worker → Local | JSON [`DepthResponse`] |
//!
//! The protocol is strictly request/response: every request except
//! shutdown is answered by exactly one message.
//!
//! # Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | `request` | Outbound message encoding |
//! | `response` | Inbound message types and parsing |

// ============================================================================
// Submodules
// ============================================================================

/// Outbound message encoding.
pub mod request;

/// Inbound message types and parsing.
pub mod response;

// ============================================================================
// Re-exports
// ============================================================================

pub use request::{
    DEFAULT_MASK_THRESHOLD, DEFAULT_SCORE_THRESHOLD, Outbound, SHUTDOWN_COMMAND, SegmentHeader,
    SegmentationRequest, decode_segment_frame, encode_depth, encode_segment,
};
pub use response::{
    DepthResponse, Detection, Instance, SegmentationResponse, parse_depth_response,
    parse_segment_response,
};
