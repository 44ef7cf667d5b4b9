//! Inbound message types and parsing.
//!
//! Worker replies are single JSON documents. Every field listed here is
//! required; a reply with a missing or mistyped field is rejected with
//! [`Error::Protocol`] rather than filled with defaults.

// ============================================================================
// Imports
// ============================================================================

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

// ============================================================================
// Segmentation
// ============================================================================

/// Full reply to a segment request.
///
/// # Format
///
/// ```json
/// {
///   "results": [{"prompt": "person", "instances": [...]}],
///   "decode_ms": 1.2,
///   "vision_encode_ms": 8.4,
///   "text_encode_ms": 0.9,
///   "decode_segment_ms": 3.1
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SegmentationResponse {
    /// One detection per prompt, in request order.
    pub results: Vec<Detection>,
    /// Server-side JPEG decode time.
    pub decode_ms: f64,
    /// Server-side vision encoder time.
    pub vision_encode_ms: f64,
    /// Server-side text encoder time.
    pub text_encode_ms: f64,
    /// Server-side mask decoder time.
    pub decode_segment_ms: f64,
}

impl SegmentationResponse {
    /// Returns the detection for `prompt`, if the worker echoed it.
    #[must_use]
    pub fn detection(&self, prompt: &str) -> Option<&Detection> {
        self.results.iter().find(|d| d.prompt == prompt)
    }

    /// Returns the number of instances across all prompts.
    #[must_use]
    pub fn instance_count(&self) -> usize {
        self.results.iter().map(|d| d.instances.len()).sum()
    }

    /// Returns the summed server-side latency.
    #[inline]
    #[must_use]
    pub fn total_ms(&self) -> f64 {
        self.decode_ms + self.vision_encode_ms + self.text_encode_ms + self.decode_segment_ms
    }
}

/// Results for a single text prompt.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Detection {
    /// The prompt as sent.
    pub prompt: String,
    /// Matching instances, possibly none.
    pub instances: Vec<Instance>,
}

/// A detected object with bounding box and RLE mask.
///
/// Box coordinates are in source-image pixels. The mask is run-length
/// encoded in column-major order, starting with a background run; the run
/// lengths sum to `mask_height * mask_width`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Instance {
    pub x1: f32,
    pub y1: f32,
    pub x2: f32,
    pub y2: f32,
    /// Detection confidence in `[0, 1]`.
    pub confidence: f32,
    /// Alternating background/foreground run lengths.
    pub mask_rle: Vec<u32>,
    pub mask_height: u32,
    pub mask_width: u32,
}

impl Instance {
    /// Returns the bounding box as `(x1, y1, x2, y2)`.
    #[inline]
    #[must_use]
    pub fn bbox(&self) -> (f32, f32, f32, f32) {
        (self.x1, self.y1, self.x2, self.y2)
    }

    /// Returns the bounding box area in square pixels.
    #[inline]
    #[must_use]
    pub fn area(&self) -> f32 {
        (self.x2 - self.x1).max(0.0) * (self.y2 - self.y1).max(0.0)
    }
}

// ============================================================================
// Depth
// ============================================================================

/// Full reply to a depth request.
///
/// The depth map is a base64-encoded 16-bit grayscale PNG normalised to
/// `[depth_min, depth_max]` metres.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DepthResponse {
    pub depth_png_b64: String,
    /// Depth represented by pixel value 0, in metres.
    pub depth_min: f64,
    /// Depth represented by pixel value 65535, in metres.
    pub depth_max: f64,
    pub height: u32,
    pub width: u32,
    /// Server-side JPEG decode time.
    pub decode_ms: f64,
    /// Server-side model inference time.
    pub inference_ms: f64,
    /// Server-side PNG encode time.
    pub encode_ms: f64,
}

impl DepthResponse {
    /// Returns the summed server-side latency.
    #[inline]
    #[must_use]
    pub fn total_ms(&self) -> f64 {
        self.decode_ms + self.inference_ms + self.encode_ms
    }
}

// ============================================================================
// Parsing
// ============================================================================

/// Parses a worker reply to a segment request.
///
/// # Errors
///
/// Returns [`Error::Protocol`] if the message is not a valid
/// [`SegmentationResponse`].
pub fn parse_segment_response(message: &[u8]) -> Result<SegmentationResponse> {
    parse_json(message, "segmentation")
}

/// Parses a worker reply to a depth request.
///
/// # Errors
///
/// Returns [`Error::Protocol`] if the message is not a valid
/// [`DepthResponse`].
pub fn parse_depth_response(message: &[u8]) -> Result<DepthResponse> {
    parse_json(message, "depth")
}

fn parse_json<T: DeserializeOwned>(message: &[u8], shape: &str) -> Result<T> {
    serde_json::from_slice(message).map_err(|e| {
        Error::protocol(format!(
            "invalid {shape} response ({} bytes): {e}",
            message.len()
        ))
    })
}

// ============================================================================
// Tests
// ============================================================================
