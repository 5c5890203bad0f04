use log::debug;

use crate::error::{Error, Result};
use crate::png::chunk::{write_chunk, IDAT, IEND, IHDR, MAX_CHUNK_LEN};
use crate::png::decoded::DecodedImage;
use crate::png::filter::kind;
use crate::png::zlib::{Compressor, Zlib, DEFAULT_COMPRESSION_LEVEL};
use crate::png::SIGNATURE;

/// Encode an RGBA image as an 8-bit truecolor-with-alpha PNG.
///
/// # Errors
///
/// Returns [`Error::Compression`] only if the compressor fails, which the
/// in-memory zlib backend does not do.
pub fn encode(image: &DecodedImage) -> Result<Vec<u8>> {
    encode_with(image, &Zlib, DEFAULT_COMPRESSION_LEVEL)
}

/// Encode with a caller-supplied compressor and level.
///
/// Every scanline uses filter type 0. The output holds `IHDR`, the image
/// data and `IEND`, nothing else.
///
/// # Errors
///
/// See [`encode`].
pub fn encode_with(
    image: &DecodedImage,
    compressor: &dyn Compressor,
    level: u32,
) -> Result<Vec<u8>> {
    let row_bytes = image.width() as usize * 4;
    let mut scanlines = Vec::with_capacity((row_bytes + 1) * image.height() as usize);
    for y in 0..image.height() {
        scanlines.push(kind::NONE);
        scanlines.extend_from_slice(image.row(y));
    }

    let compressed = compressor
        .deflate(&scanlines, level)
        .map_err(Error::Compression)?;
    debug!(
        "encoded {}x{} image: {} raw bytes -> {} compressed",
        image.width(),
        image.height(),
        scanlines.len(),
        compressed.len()
    );

    let mut ihdr = [0u8; 13];
    ihdr[0..4].copy_from_slice(&image.width().to_be_bytes());
    ihdr[4..8].copy_from_slice(&image.height().to_be_bytes());
    ihdr[8] = 8; // bit depth
    ihdr[9] = 6; // truecolor with alpha
    // compression, filter method and interlace stay 0

    let mut out = Vec::with_capacity(SIGNATURE.len() + compressed.len() + 57);
    out.extend_from_slice(&SIGNATURE);
    write_chunk(&mut out, IHDR, &ihdr);
    for part in compressed.chunks(MAX_CHUNK_LEN) {
        write_chunk(&mut out, IDAT, part);
    }
    write_chunk(&mut out, IEND, &[]);
    Ok(out)
}
