//! Per-pixel overlay opacity derived from a reference logo capture.

use crate::error::{Error, Result};
use crate::png;

/// Normalized opacity values for a logo-sized region, row-major.
#[derive(Debug, Clone, PartialEq)]
pub struct AlphaMask {
    width: u32,
    height: u32,
    values: Vec<f32>,
}

impl AlphaMask {
    /// Build a mask from a PNG capture of the logo rendered on black.
    ///
    /// The alpha at each pixel is derived as `max(R, G, B) / 255`.
    ///
    /// # Errors
    ///
    /// Returns any decode error for `png_bytes`.
    pub fn from_png(png_bytes: &[u8]) -> Result<Self> {
        let img = png::decode(png_bytes)?;
        let values = img
            .pixels()
            .chunks_exact(4)
            .map(|px| f32::from(px[0].max(px[1]).max(px[2])) / 255.0)
            .collect();
        Ok(Self {
            width: img.width(),
            height: img.height(),
            values,
        })
    }

    /// Wrap precomputed opacity values.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidDimensions`] if `values` does not hold exactly
    /// `width * height` entries.
    pub fn from_values(width: u32, height: u32, values: Vec<f32>) -> Result<Self> {
        if width as usize * height as usize != values.len() {
            return Err(Error::InvalidDimensions {
                width,
                height,
                len: values.len(),
            });
        }
        Ok(Self {
            width,
            height,
            values,
        })
    }

    /// Mask width.
    #[must_use]
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Mask height.
    #[must_use]
    pub fn height(&self) -> u32 {
        self.height
    }

    /// All values, row-major.
    #[must_use]
    pub fn values(&self) -> &[f32] {
        &self.values
    }

    /// Opacity at `(x, y)`, or `0.0` outside the mask.
    #[must_use]
    pub fn get(&self, x: u32, y: u32) -> f32 {
        if x >= self.width || y >= self.height {
            return 0.0;
        }
        self.values[y as usize * self.width as usize + x as usize]
    }
}
