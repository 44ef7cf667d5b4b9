//! Outbound message encoding.
//!
//! Segment requests pack per-call parameters and the image into a single
//! binary message so the worker answers in one round trip:
//!
//! ```text
//! ┌──────────────┬──────────────────────────┬─────────────────────┐
//! │ header_len   │ JSON header              │ JPEG bytes          │
//! │ u32 LE (4 B) │ header_len bytes, UTF-8  │ rest of the message │
//! └──────────────┴──────────────────────────┴─────────────────────┘
//! ```
//!
//! Depth requests carry no parameters and are sent as raw JPEG bytes.

// ============================================================================
// Imports
// ============================================================================

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

// ============================================================================
// Constants
// ============================================================================

/// Text command that stops the worker and its billing.
pub const SHUTDOWN_COMMAND: &str = "shutdown";

/// Default minimum confidence for a detection to be kept.
pub const DEFAULT_SCORE_THRESHOLD: f32 = 0.5;

/// Default threshold for binarising mask logits.
pub const DEFAULT_MASK_THRESHOLD: f32 = 0.5;

/// Size of the header length prefix.
const LENGTH_PREFIX_SIZE: usize = 4;

// ============================================================================
// Outbound
// ============================================================================

/// A message ready to be written to the worker connection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outbound {
    /// Binary message, sent verbatim.
    Binary(Vec<u8>),
    /// Text message (only used for control commands).
    Text(String),
}

impl Outbound {
    /// Creates the shutdown command message.
    #[inline]
    #[must_use]
    pub fn shutdown() -> Self {
        Self::Text(SHUTDOWN_COMMAND.to_string())
    }

    /// Returns `true` if this is the shutdown command.
    #[inline]
    #[must_use]
    pub fn is_shutdown(&self) -> bool {
        matches!(self, Self::Text(text) if text == SHUTDOWN_COMMAND)
    }

    /// Returns the payload size in bytes.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        match self {
            Self::Binary(bytes) => bytes.len(),
            Self::Text(text) => text.len(),
        }
    }

    /// Returns `true` if the payload is empty.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

// ============================================================================
// SegmentHeader
// ============================================================================

/// JSON metadata preceding the image in a segment request.
///
/// # Format
///
/// ```json
/// {
///   "prompts": ["person", "car"],
///   "score_threshold": 0.5,
///   "mask_threshold": 0.5
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SegmentHeader {
    /// Text prompts, one detection per prompt in the response.
    pub prompts: Vec<String>,
    /// Minimum confidence to keep a detection.
    pub score_threshold: f32,
    /// Threshold for binarising the mask.
    pub mask_threshold: f32,
}

// ============================================================================
// SegmentationRequest
// ============================================================================

/// Parameters and image for one segmentation call.
///
/// # Example
///
/// ```
/// use vizion::SegmentationRequest;
///
/// let request = SegmentationRequest::new(vec![0xFF, 0xD8, 0xFF], ["person", "car"])
///     .with_score_threshold(0.3);
/// assert_eq!(request.prompts, vec!["person", "car"]);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct SegmentationRequest {
    /// Text prompts; response order matches this order.
    pub prompts: Vec<String>,
    /// Minimum confidence in `[0, 1]`.
    pub score_threshold: f32,
    /// Mask binarisation threshold in `[0, 1]`.
    pub mask_threshold: f32,
    /// JPEG-encoded image bytes.
    pub image: Vec<u8>,
}

impl SegmentationRequest {
    /// Creates a request with default thresholds.
    #[must_use]
    pub fn new(image: Vec<u8>, prompts: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self {
            prompts: prompts.into_iter().map(Into::into).collect(),
            score_threshold: DEFAULT_SCORE_THRESHOLD,
            mask_threshold: DEFAULT_MASK_THRESHOLD,
            image,
        }
    }

    /// Sets the minimum detection confidence.
    #[inline]
    #[must_use]
    pub fn with_score_threshold(mut self, threshold: f32) -> Self {
        self.score_threshold = threshold;
        self
    }

    /// Sets the mask binarisation threshold.
    #[inline]
    #[must_use]
    pub fn with_mask_threshold(mut self, threshold: f32) -> Self {
        self.mask_threshold = threshold;
        self
    }

    /// Checks the locally verifiable constraints.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidRequest`] if a threshold is outside `[0, 1]`
    /// or the image is empty.
    pub fn validate(&self) -> Result<()> {
        check_threshold("score_threshold", self.score_threshold)?;
        check_threshold("mask_threshold", self.mask_threshold)?;

        if self.image.is_empty() {
            return Err(Error::invalid_request("image bytes are empty"));
        }

        Ok(())
    }

    /// Returns the JSON header for this request.
    #[must_use]
    pub fn header(&self) -> SegmentHeader {
        SegmentHeader {
            prompts: self.prompts.clone(),
            score_threshold: self.score_threshold,
            mask_threshold: self.mask_threshold,
        }
    }
}

/// Rejects thresholds outside `[0, 1]`, including NaN.
fn check_threshold(name: &str, value: f32) -> Result<()> {
    if (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(Error::invalid_request(format!(
            "{name} must be within [0, 1], got {value}"
        )))
    }
}

// ============================================================================
// Encoding
// ============================================================================

/// Encodes a segmentation request into a single binary message.
///
/// # Errors
///
/// - [`Error::InvalidRequest`] if the request fails validation
/// - [`Error::Protocol`] if the header exceeds `u32::MAX` bytes
pub fn encode_segment(request: &SegmentationRequest) -> Result<Outbound> {
    request.validate()?;

    let header = serde_json::to_vec(&request.header())?;
    let header_len = u32::try_from(header.len())
        .map_err(|_| Error::protocol(format!("header too large: {} bytes", header.len())))?;

    let mut message = Vec::with_capacity(LENGTH_PREFIX_SIZE + header.len() + request.image.len());
    message.extend_from_slice(&header_len.to_le_bytes());
    message.extend_from_slice(&header);
    message.extend_from_slice(&request.image);

    Ok(Outbound::Binary(message))
}

/// Encodes a depth request: the image bytes, unframed.
#[inline]
#[must_use]
pub fn encode_depth(image: Vec<u8>) -> Outbound {
    Outbound::Binary(image)
}

/// Splits a segment request message into its header and image bytes.
///
/// This is the worker-side view of [`encode_segment`].
///
/// # Errors
///
/// Returns [`Error::Protocol`] if the message is shorter than its length
/// prefix claims or the header is not valid JSON.
pub fn decode_segment_frame(message: &[u8]) -> Result<(SegmentHeader, &[u8])> {
    let Some((prefix, rest)) = message.split_first_chunk::<LENGTH_PREFIX_SIZE>() else {
        return Err(Error::protocol(format!(
            "segment frame too short: {} bytes",
            message.len()
        )));
    };

    let header_len = u32::from_le_bytes(*prefix) as usize;
    if rest.len() < header_len {
        return Err(Error::protocol(format!(
            "segment header truncated: expected {header_len} bytes, got {}",
            rest.len()
        )));
    }

    let (header, image) = rest.split_at(header_len);
    let header = serde_json::from_slice(header)
        .map_err(|e| Error::protocol(format!("invalid segment header: {e}")))?;

    Ok((header, image))
}

// ============================================================================
// Tests
// ============================================================================
