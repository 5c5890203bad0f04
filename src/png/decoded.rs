use image::RgbaImage;

use crate::error::{Error, Result};

/// A dense RGBA8 pixel buffer, row-major, top-to-bottom, left-to-right.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedImage {
    width: u32,
    height: u32,
    pixels: Vec<u8>,
}

/// Byte length of a `width` x `height` RGBA buffer, if addressable.
pub(crate) fn rgba_len(width: u32, height: u32) -> Option<usize> {
    usize::try_from(width)
        .ok()?
        .checked_mul(usize::try_from(height).ok()?)?
        .checked_mul(4)
}

impl DecodedImage {
    /// Wrap an RGBA buffer.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidDimensions`] if either dimension is zero or
    /// `pixels` is not exactly `width * height * 4` bytes long.
    pub fn new(width: u32, height: u32, pixels: Vec<u8>) -> Result<Self> {
        match rgba_len(width, height) {
            Some(len) if width > 0 && height > 0 && len == pixels.len() => Ok(Self {
                width,
                height,
                pixels,
            }),
            _ => Err(Error::InvalidDimensions {
                width,
                height,
                len: pixels.len(),
            }),
        }
    }

    /// A `width` x `height` image filled with one RGBA value.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidDimensions`] for zero or unaddressable dimensions.
    pub fn filled(width: u32, height: u32, rgba: [u8; 4]) -> Result<Self> {
        let len = rgba_len(width, height).ok_or(Error::InvalidDimensions {
            width,
            height,
            len: 0,
        })?;
        Self::new(width, height, rgba.repeat(len / 4))
    }

    /// Image width in pixels.
    #[must_use]
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Image height in pixels.
    #[must_use]
    pub fn height(&self) -> u32 {
        self.height
    }

    /// The raw RGBA bytes.
    #[must_use]
    pub fn pixels(&self) -> &[u8] {
        &self.pixels
    }

    /// Mutable access to the raw RGBA bytes.
    pub fn pixels_mut(&mut self) -> &mut [u8] {
        &mut self.pixels
    }

    /// Give up the wrapper and keep the bytes.
    #[must_use]
    pub fn into_pixels(self) -> Vec<u8> {
        self.pixels
    }

    fn offset(&self, x: u32, y: u32) -> usize {
        assert!(
            x < self.width && y < self.height,
            "pixel ({x}, {y}) outside {}x{} image",
            self.width,
            self.height
        );
        (y as usize * self.width as usize + x as usize) * 4
    }

    /// The RGBA value at `(x, y)`.
    ///
    /// # Panics
    ///
    /// Panics if the coordinates are outside the image.
    #[must_use]
    pub fn pixel(&self, x: u32, y: u32) -> [u8; 4] {
        let i = self.offset(x, y);
        [
            self.pixels[i],
            self.pixels[i + 1],
            self.pixels[i + 2],
            self.pixels[i + 3],
        ]
    }

    /// Mutable RGBA bytes at `(x, y)`.
    ///
    /// # Panics
    ///
    /// Panics if the coordinates are outside the image.
    pub fn pixel_mut(&mut self, x: u32, y: u32) -> &mut [u8] {
        let i = self.offset(x, y);
        &mut self.pixels[i..i + 4]
    }

    /// One row of RGBA bytes.
    pub(crate) fn row(&self, y: u32) -> &[u8] {
        let stride = self.width as usize * 4;
        let start = y as usize * stride;
        &self.pixels[start..start + stride]
    }
}

impl From<DecodedImage> for RgbaImage {
    fn from(img: DecodedImage) -> Self {
        // Buffer length is guaranteed by `DecodedImage::new`.
        RgbaImage::from_raw(img.width, img.height, img.pixels)
            .unwrap_or_else(|| RgbaImage::new(0, 0))
    }
}

impl TryFrom<RgbaImage> for DecodedImage {
    type Error = Error;

    fn try_from(img: RgbaImage) -> Result<Self> {
        let (width, height) = img.dimensions();
        Self::new(width, height, img.into_raw())
    }
}
