//! Result decoders.
//!
//! Pure functions that expand the compact encodings carried in worker
//! replies into dense grids:
//!
//! | Function | Input | Output |
//! |----------|-------|--------|
//! | [`decode_mask`] | column-major RLE + dimensions | [`Grid<bool>`] |
//! | [`decode_depth`] | base64 16-bit PNG + depth range | [`Grid<f32>`] in metres |
//!
//! This module is compiled only with the `decode` feature (enabled by
//! default). Without it, responses still carry the raw `mask_rle` and
//! `depth_png_b64` fields for callers that forward them elsewhere.

// ============================================================================
// Submodules
// ============================================================================

mod depth;
mod grid;
mod mask;

// ============================================================================
// Re-exports
// ============================================================================

pub use depth::decode_depth;
pub use grid::Grid;
pub use mask::{decode_mask, encode_mask};
