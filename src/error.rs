//! Error types for the gemini-watermark-png crate.

use std::io;

use crate::config::WatermarkSize;

/// Reasons a byte buffer is rejected as a PNG stream.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FormatError {
    /// The first eight bytes are not the PNG signature.
    #[error("missing PNG signature")]
    Signature,

    /// No `IHDR` chunk was seen before the first `IDAT` chunk.
    #[error("no IHDR chunk before image data")]
    MissingHeader,

    /// The `IHDR` chunk is shorter than 13 bytes.
    #[error("IHDR chunk has {0} bytes, expected 13")]
    InvalidHeader(usize),

    /// A chunk header or body runs past the end of the buffer.
    #[error("chunk stream truncated at byte offset {offset}")]
    Truncated {
        /// Offset of the chunk that could not be read completely.
        offset: usize,
    },

    /// The stream ended without any `IDAT` chunk.
    #[error("no IDAT chunk in stream")]
    MissingImageData,

    /// Width or height is zero, or the RGBA buffer would not be addressable.
    #[error("unusable image dimensions {width}x{height}")]
    Dimensions {
        /// Declared width.
        width: u32,
        /// Declared height.
        height: u32,
    },

    /// A header field outside the supported subset (8-bit, non-palette, non-interlaced).
    #[error("unsupported PNG {field} {value}")]
    Unsupported {
        /// Name of the IHDR field.
        field: &'static str,
        /// The value found in the stream.
        value: u8,
    },

    /// The inflated scanline stream is shorter than the header requires.
    #[error("image data has {actual} bytes, expected {expected}")]
    ImageDataLength {
        /// Bytes required by width, height and pixel layout.
        expected: usize,
        /// Bytes produced by decompression.
        actual: usize,
    },

    /// A scanline starts with a filter byte outside `0..=4`.
    #[error("invalid scanline filter type {0}")]
    FilterType(u8),
}

/// Errors that can occur while decoding, encoding or cleaning an image.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The input is not a PNG stream this codec accepts.
    #[error("malformed PNG: {0}")]
    Format(#[from] FormatError),

    /// The concatenated `IDAT` payload was rejected by the decompressor.
    #[error("failed to inflate image data: {0}")]
    Decompression(#[source] io::Error),

    /// The compressor failed while encoding scanlines.
    #[error("failed to deflate image data: {0}")]
    Compression(#[source] io::Error),

    /// A pixel buffer does not match the dimensions it was paired with.
    #[error("pixel buffer of {len} bytes does not fit a {width}x{height} RGBA image")]
    InvalidDimensions {
        /// Image width in pixels.
        width: u32,
        /// Image height in pixels.
        height: u32,
        /// Length of the supplied buffer.
        len: usize,
    },

    /// A reference mask asset could not be read.
    #[error("failed to load {}px alpha mask: {source}", .size.logo_size())]
    MaskAsset {
        /// Tier whose asset failed.
        size: WatermarkSize,
        /// Underlying I/O error.
        #[source]
        source: io::Error,
    },

    /// A reference mask asset decoded to the wrong dimensions.
    #[error("alpha mask is {width}x{height}, expected {expected}x{expected}")]
    MaskDimensions {
        /// Logo size of the requested tier.
        expected: u32,
        /// Decoded width.
        width: u32,
        /// Decoded height.
        height: u32,
    },

    /// An I/O error occurred while reading or writing files.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

/// A specialized `Result` type for this crate.
pub type Result<T> = std::result::Result<T, Error>;
