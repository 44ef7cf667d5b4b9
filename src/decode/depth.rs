//! Depth map decoding.
//!
//! The worker normalises metric depth into the full `u16` range and ships
//! it as a base64 PNG, alongside the `[depth_min, depth_max]` range needed
//! to undo the normalisation.

// ============================================================================
// Imports
// ============================================================================

use base64::Engine;
use base64::engine::general_purpose::STANDARD as Base64Standard;
use image::{ColorType, ImageFormat};
use tracing::trace;

use crate::error::{Error, Result};
use crate::protocol::DepthResponse;

use super::Grid;

// ============================================================================
// Constants
// ============================================================================

/// Largest normalised pixel value.
const U16_MAX: f64 = u16::MAX as f64;

// ============================================================================
// Decoding
// ============================================================================

/// Decodes a base64 16-bit PNG into a metric depth grid.
///
/// Each pixel `v` maps to `v / 65535 * (depth_max - depth_min) + depth_min`,
/// computed in `f64` and narrowed to `f32` per pixel.
///
/// # Errors
///
/// Returns [`Error::Protocol`] if the range is invalid, the base64 or PNG
/// payload is malformed, or the image is not single-channel.
pub fn decode_depth(png_b64: &str, depth_min: f64, depth_max: f64) -> Result<Grid<f32>> {
    if !depth_min.is_finite() || !depth_max.is_finite() || depth_min > depth_max {
        return Err(Error::protocol(format!(
            "invalid depth range [{depth_min}, {depth_max}]"
        )));
    }

    let png = Base64Standard
        .decode(png_b64)
        .map_err(|e| Error::protocol(format!("Failed to decode base64 depth map: {e}")))?;

    let image = image::load_from_memory_with_format(&png, ImageFormat::Png)
        .map_err(|e| Error::protocol(format!("Failed to decode depth PNG: {e}")))?;

    let color = image.color();
    if !matches!(color, ColorType::L16 | ColorType::L8) {
        return Err(Error::protocol(format!(
            "depth map must be single-channel, got {color:?}"
        )));
    }

    let luma = image.into_luma16();
    let (width, height) = luma.dimensions();
    trace!(width, height, png_bytes = png.len(), "Decoded depth PNG");

    let span = depth_max - depth_min;
    let data = luma
        .into_raw()
        .into_iter()
        .map(|v| (f64::from(v) / U16_MAX * span + depth_min).clamp(depth_min, depth_max) as f32)
        .collect();

    Grid::from_row_major(height as usize, width as usize, data)
}

// ============================================================================
// DepthResponse - Depth
// ============================================================================

impl DepthResponse {
    /// Decodes the depth map into a `height × width` grid of metres.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Protocol`] if decoding fails or the PNG size does
    /// not match the advertised `height` and `width`.
    pub fn decode_depth(&self) -> Result<Grid<f32>> {
        let grid = decode_depth(&self.depth_png_b64, self.depth_min, self.depth_max)?;

        let advertised = (self.height as usize, self.width as usize);
        if grid.shape() != advertised {
            return Err(Error::protocol(format!(
                "depth map is {}×{}, response advertises {}×{}",
                grid.height(),
                grid.width(),
                advertised.0,
                advertised.1
            )));
        }

        Ok(grid)
    }
}

// ============================================================================
// Tests
// ============================================================================
