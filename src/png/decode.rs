use log::{debug, trace};

use crate::error::{Error, FormatError, Result};
use crate::png::chunk::{ChunkRef, Chunks, IDAT, IEND, IHDR};
use crate::png::decoded::{rgba_len, DecodedImage};
use crate::png::filter::unfilter_scanline;
use crate::png::zlib::{Compressor, Zlib};
use crate::png::SIGNATURE;

/// Color types this codec can read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColorType {
    /// One gray sample per pixel (type 0).
    Grayscale,
    /// Red, green, blue (type 2).
    Rgb,
    /// Gray and alpha (type 4).
    GrayscaleAlpha,
    /// Red, green, blue, alpha (type 6).
    Rgba,
}

impl ColorType {
    /// Parse the IHDR color type byte; palette and unknown values yield `None`.
    #[must_use]
    pub fn from_byte(value: u8) -> Option<Self> {
        match value {
            0 => Some(Self::Grayscale),
            2 => Some(Self::Rgb),
            4 => Some(Self::GrayscaleAlpha),
            6 => Some(Self::Rgba),
            _ => None,
        }
    }

    /// Samples per pixel.
    #[must_use]
    pub fn channels(self) -> usize {
        match self {
            Self::Grayscale => 1,
            Self::GrayscaleAlpha => 2,
            Self::Rgb => 3,
            Self::Rgba => 4,
        }
    }
}

/// Fields of the `IHDR` chunk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Header {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
    /// Bits per sample.
    pub bit_depth: u8,
    /// Raw color type byte.
    pub color_type: u8,
    /// Compression method (0 = zlib).
    pub compression: u8,
    /// Filter method (0 = adaptive).
    pub filter: u8,
    /// Interlace method (0 = none).
    pub interlace: u8,
}

impl Header {
    fn parse(chunk: &ChunkRef<'_>) -> std::result::Result<Self, FormatError> {
        let d = chunk.data;
        if d.len() < 13 {
            return Err(FormatError::InvalidHeader(d.len()));
        }
        Ok(Self {
            width: u32::from_be_bytes([d[0], d[1], d[2], d[3]]),
            height: u32::from_be_bytes([d[4], d[5], d[6], d[7]]),
            bit_depth: d[8],
            color_type: d[9],
            compression: d[10],
            filter: d[11],
            interlace: d[12],
        })
    }

    /// Check the header against the supported subset and resolve the color type.
    fn validate(&self) -> std::result::Result<ColorType, FormatError> {
        if self.width == 0 || self.height == 0 || rgba_len(self.width, self.height).is_none() {
            return Err(FormatError::Dimensions {
                width: self.width,
                height: self.height,
            });
        }
        let unsupported = |field, value| FormatError::Unsupported { field, value };
        if self.bit_depth != 8 {
            return Err(unsupported("bit depth", self.bit_depth));
        }
        if self.compression != 0 {
            return Err(unsupported("compression method", self.compression));
        }
        if self.filter != 0 {
            return Err(unsupported("filter method", self.filter));
        }
        if self.interlace != 0 {
            return Err(unsupported("interlace method", self.interlace));
        }
        ColorType::from_byte(self.color_type)
            .ok_or_else(|| unsupported("color type", self.color_type))
    }
}

/// Decode a PNG stream into RGBA8 using the zlib backend.
///
/// # Errors
///
/// Returns [`Error::Format`] for streams outside the supported subset and
/// [`Error::Decompression`] if the image data cannot be inflated.
pub fn decode(bytes: &[u8]) -> Result<DecodedImage> {
    decode_with(bytes, &Zlib)
}

/// Decode a PNG stream into RGBA8 with a caller-supplied decompressor.
///
/// # Errors
///
/// See [`decode`].
pub fn decode_with(bytes: &[u8], compressor: &dyn Compressor) -> Result<DecodedImage> {
    if bytes.len() < SIGNATURE.len() || bytes[..SIGNATURE.len()] != SIGNATURE {
        return Err(FormatError::Signature.into());
    }

    let mut header: Option<Header> = None;
    let mut idat = Vec::new();
    let mut seen_idat = false;

    for chunk in Chunks::new(bytes, SIGNATURE.len()) {
        let chunk = chunk?;
        match chunk.kind {
            IHDR => header = Some(Header::parse(&chunk)?),
            IDAT => {
                if header.is_none() {
                    return Err(FormatError::MissingHeader.into());
                }
                seen_idat = true;
                idat.extend_from_slice(chunk.data);
            }
            IEND => break,
            other => trace!(
                "skipping {} chunk ({} bytes) at offset {}",
                String::from_utf8_lossy(&other),
                chunk.data.len(),
                chunk.offset
            ),
        }
    }

    let header = header.ok_or(FormatError::MissingHeader)?;
    let color_type = header.validate()?;
    if !seen_idat {
        return Err(FormatError::MissingImageData.into());
    }
    debug!(
        "decoding {}x{} PNG, {:?}, {} compressed bytes",
        header.width,
        header.height,
        color_type,
        idat.len()
    );

    // Anything past the last scanline is ignored, so never inflate more.
    let expected = filtered_len(&header, color_type)?;
    let raw = compressor
        .inflate_limited(&idat, expected)
        .map_err(Error::Decompression)?;
    let pixels = reconstruct(&header, color_type, &raw)?;
    DecodedImage::new(header.width, header.height, pixels)
}

/// Length of the filtered scanline stream: one filter byte plus pixel bytes per row.
fn filtered_len(header: &Header, color_type: ColorType) -> Result<usize> {
    let stride = header.width as usize * color_type.channels() + 1;
    let len = stride
        .checked_mul(header.height as usize)
        .ok_or(FormatError::Dimensions {
            width: header.width,
            height: header.height,
        })?;
    Ok(len)
}

/// Undo scanline filtering and expand every row to RGBA.
fn reconstruct(header: &Header, color_type: ColorType, raw: &[u8]) -> Result<Vec<u8>> {
    let width = header.width as usize;
    let height = header.height as usize;
    let bpp = color_type.channels();
    let row_bytes = width * bpp;
    let stride = row_bytes + 1;

    let expected = filtered_len(header, color_type)?;
    if raw.len() < expected {
        return Err(FormatError::ImageDataLength {
            expected,
            actual: raw.len(),
        }
        .into());
    }

    let mut out = Vec::with_capacity(width * height * 4);
    let mut prev = vec![0u8; row_bytes];
    let mut cur = vec![0u8; row_bytes];

    for (y, line) in raw[..expected].chunks_exact(stride).enumerate() {
        cur.copy_from_slice(&line[1..]);
        let above = (y > 0).then_some(prev.as_slice());
        unfilter_scanline(line[0], bpp, above, &mut cur)?;
        expand_row(color_type, &cur, &mut out);
        std::mem::swap(&mut prev, &mut cur);
    }

    Ok(out)
}

fn expand_row(color_type: ColorType, row: &[u8], out: &mut Vec<u8>) {
    match color_type {
        ColorType::Rgba => out.extend_from_slice(row),
        ColorType::Rgb => {
            for px in row.chunks_exact(3) {
                out.extend_from_slice(&[px[0], px[1], px[2], 255]);
            }
        }
        ColorType::GrayscaleAlpha => {
            for px in row.chunks_exact(2) {
                out.extend_from_slice(&[px[0], px[0], px[0], px[1]]);
            }
        }
        ColorType::Grayscale => {
            for &g in row {
                out.extend_from_slice(&[g, g, g, 255]);
            }
        }
    }
}
