//! A small PNG codec for 8-bit images.
//!
//! Decoding accepts 8-bit grayscale, gray+alpha, RGB and RGBA, non-interlaced.
//! Encoding always writes 8-bit RGBA with filter type 0 and no ancillary chunks.
//! Everything else is rejected with a [`FormatError`](crate::error::FormatError).

pub mod chunk;
pub mod crc;
mod decode;
mod decoded;
mod encode;
pub mod filter;
mod zlib;

pub use decode::{decode, decode_with, ColorType, Header};
pub use decoded::DecodedImage;
pub use encode::{encode, encode_with};
pub use zlib::{Compressor, Zlib, DEFAULT_COMPRESSION_LEVEL, MAX_COMPRESSION_LEVEL};

/// The eight bytes every PNG stream starts with.
pub const SIGNATURE: [u8; 8] = [0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A];
