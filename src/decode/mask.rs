//! Run-length mask decoding.
//!
//! Masks are flattened in column-major (Fortran) order, so flat index `i`
//! maps to `row = i % height`, `col = i / height`. Runs alternate
//! background/foreground and always start with background; a mask whose
//! first pixel is foreground begins with a zero-length run.

// ============================================================================
// Imports
// ============================================================================

use crate::error::{Error, Result};
use crate::protocol::Instance;

use super::Grid;

// ============================================================================
// Decoding
// ============================================================================

/// Decodes a column-major RLE mask into a `height × width` grid.
///
/// # Errors
///
/// Returns [`Error::Protocol`] if either dimension is zero or the run
/// lengths do not sum to exactly `height * width`.
///
/// # Example
///
/// ```
/// use vizion::decode::decode_mask;
///
/// // 2×3 mask: one background pixel, two foreground, three background.
/// let mask = decode_mask(&[1, 2, 3], 2, 3)?;
/// assert_eq!(mask.get(1, 0), Some(&true));
/// assert_eq!(mask.get(0, 1), Some(&true));
/// assert_eq!(mask.count_true(), 2);
/// # Ok::<(), vizion::Error>(())
/// ```
pub fn decode_mask(mask_rle: &[u32], height: u32, width: u32) -> Result<Grid<bool>> {
    let (height, width) = (height as usize, width as usize);
    if height == 0 || width == 0 {
        return Err(Error::protocol(format!(
            "mask dimensions must be positive, got {height}×{width}"
        )));
    }

    let expected = (height as u64) * (width as u64);
    let total: u64 = mask_rle.iter().map(|&run| u64::from(run)).sum();
    if total != expected {
        return Err(Error::protocol(format!(
            "RLE length sum {total} does not match height×width {height}×{width} = {expected}"
        )));
    }

    let mut data = vec![false; height * width];
    let mut pos = 0usize;

    for (i, &run) in mask_rle.iter().enumerate() {
        let run = run as usize;
        if i % 2 == 1 {
            for flat in pos..pos + run {
                let (row, col) = (flat % height, flat / height);
                data[row * width + col] = true;
            }
        }
        pos += run;
    }

    Grid::from_row_major(height, width, data)
}

/// Encodes a mask grid into column-major RLE.
///
/// Inverse of [`decode_mask`].
#[must_use]
pub fn encode_mask(mask: &Grid<bool>) -> Vec<u32> {
    let (height, width) = mask.shape();
    let mut runs = Vec::new();
    let mut current = false;
    let mut length = 0u32;

    for col in 0..width {
        for row in 0..height {
            let cell = mask.as_slice()[row * width + col];
            if cell != current {
                runs.push(length);
                current = cell;
                length = 0;
            }
            length += 1;
        }
    }

    runs.push(length);
    runs
}

// ============================================================================
// Instance - Mask
// ============================================================================

impl Instance {
    /// Decodes this instance's mask into a `mask_height × mask_width` grid.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Protocol`] if the RLE violates its invariants.
    pub fn decode_mask(&self) -> Result<Grid<bool>> {
        decode_mask(&self.mask_rle, self.mask_height, self.mask_width)
    }
}

// ============================================================================
// Tests
// ============================================================================
