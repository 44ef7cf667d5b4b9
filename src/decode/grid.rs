//! Dense two-dimensional buffer.

// ============================================================================
// Imports
// ============================================================================

use crate::error::{Error, Result};

// ============================================================================
// Grid
// ============================================================================

/// A `height × width` grid stored row-major.
#[derive(Debug, Clone, PartialEq)]
pub struct Grid<T> {
    height: usize,
    width: usize,
    data: Vec<T>,
}

impl<T> Grid<T> {
    /// Builds a grid from row-major data.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Protocol`] if `data.len() != height * width`.
    pub fn from_row_major(height: usize, width: usize, data: Vec<T>) -> Result<Self> {
        if height.checked_mul(width) != Some(data.len()) {
            return Err(Error::protocol(format!(
                "grid data length {} does not match {height}×{width}",
                data.len()
            )));
        }

        Ok(Self {
            height,
            width,
            data,
        })
    }

    /// Number of rows.
    #[inline]
    #[must_use]
    pub fn height(&self) -> usize {
        self.height
    }

    /// Number of columns.
    #[inline]
    #[must_use]
    pub fn width(&self) -> usize {
        self.width
    }

    /// Returns `(height, width)`.
    #[inline]
    #[must_use]
    pub fn shape(&self) -> (usize, usize) {
        (self.height, self.width)
    }

    /// Returns the cell at `(row, col)`, or `None` when out of bounds.
    #[inline]
    #[must_use]
    pub fn get(&self, row: usize, col: usize) -> Option<&T> {
        if row < self.height && col < self.width {
            self.data.get(row * self.width + col)
        } else {
            None
        }
    }

    /// Iterates over rows.
    pub fn rows(&self) -> impl Iterator<Item = &[T]> {
        self.data.chunks_exact(self.width.max(1))
    }

    /// Returns the row-major backing slice.
    #[inline]
    #[must_use]
    pub fn as_slice(&self) -> &[T] {
        &self.data
    }

    /// Consumes the grid and returns its row-major data.
    #[inline]
    #[must_use]
    pub fn into_vec(self) -> Vec<T> {
        self.data
    }
}

impl<T: Clone> Grid<T> {
    /// Creates a grid with every cell set to `value`.
    #[must_use]
    pub fn filled(height: usize, width: usize, value: T) -> Self {
        Self {
            height,
            width,
            data: vec![value; height * width],
        }
    }
}

impl Grid<bool> {
    /// Counts `true` cells.
    #[must_use]
    pub fn count_true(&self) -> usize {
        self.data.iter().filter(|&&cell| cell).count()
    }
}

// ============================================================================
// Tests
// ============================================================================
