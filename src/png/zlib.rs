//! The compression transform behind `IDAT` payloads.
//!
//! Any RFC 1950 zlib implementation can stand in for [`Zlib`] by
//! implementing [`Compressor`].

use std::io::{self, Read, Write};

use flate2::read::ZlibDecoder;
use flate2::write::ZlibEncoder;
use flate2::Compression;

/// Compression level used when the caller does not pick one.
pub const DEFAULT_COMPRESSION_LEVEL: u32 = 6;

/// Highest level accepted by zlib.
pub const MAX_COMPRESSION_LEVEL: u32 = 9;

/// A zlib stream codec.
pub trait Compressor: Send + Sync {
    /// Decompress a complete zlib stream.
    ///
    /// # Errors
    ///
    /// Returns an error if the stream is corrupt or truncated.
    fn inflate(&self, data: &[u8]) -> io::Result<Vec<u8>>;

    /// Decompress at most `limit` bytes of a zlib stream.
    ///
    /// Output beyond `limit` is not produced. The default implementation
    /// inflates everything and truncates; backends that stream should stop
    /// early instead.
    ///
    /// # Errors
    ///
    /// Returns an error if the stream is corrupt or truncated.
    fn inflate_limited(&self, data: &[u8], limit: usize) -> io::Result<Vec<u8>> {
        let mut raw = self.inflate(data)?;
        raw.truncate(limit);
        Ok(raw)
    }

    /// Compress `data` into a zlib stream at `level` (0-9).
    ///
    /// # Errors
    ///
    /// Returns an error if the backend fails to produce a stream.
    fn deflate(&self, data: &[u8], level: u32) -> io::Result<Vec<u8>>;
}

/// [`Compressor`] backed by `flate2`.
#[derive(Debug, Clone, Copy, Default)]
pub struct Zlib;

impl Compressor for Zlib {
    fn inflate(&self, data: &[u8]) -> io::Result<Vec<u8>> {
        let mut decoder = ZlibDecoder::new(data);
        let mut raw = Vec::new();
        decoder.read_to_end(&mut raw)?;
        Ok(raw)
    }

    fn inflate_limited(&self, data: &[u8], limit: usize) -> io::Result<Vec<u8>> {
        let limit = u64::try_from(limit).unwrap_or(u64::MAX);
        let mut decoder = ZlibDecoder::new(data).take(limit);
        let mut raw = Vec::new();
        decoder.read_to_end(&mut raw)?;
        Ok(raw)
    }

    fn deflate(&self, data: &[u8], level: u32) -> io::Result<Vec<u8>> {
        let level = Compression::new(level.min(MAX_COMPRESSION_LEVEL));
        let mut encoder = ZlibEncoder::new(Vec::with_capacity(data.len() / 2), level);
        encoder.write_all(data)?;
        encoder.finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn inflate_reverses_deflate_at_every_level() {
        let data: Vec<u8> = (0..4096u32).map(|i| (i % 251) as u8).collect();
        for level in 0..=MAX_COMPRESSION_LEVEL {
            let packed = Zlib.deflate(&data, level).unwrap();
            assert_eq!(Zlib.inflate(&packed).unwrap(), data, "level {level}");
        }
    }

    #[test]
    fn out_of_range_level_is_clamped() {
        let packed = Zlib.deflate(b"hello", 42).unwrap();
        assert_eq!(Zlib.inflate(&packed).unwrap(), b"hello");
    }

    #[test]
    fn inflate_limited_stops_at_limit() {
        let packed = Zlib.deflate(&vec![0u8; 1 << 20], 9).unwrap();
        assert_eq!(Zlib.inflate_limited(&packed, 100).unwrap().len(), 100);
        let short = Zlib.deflate(b"short", 6).unwrap();
        assert_eq!(Zlib.inflate_limited(&short, 100).unwrap(), b"short");
    }

    #[test]
    fn inflate_rejects_garbage() {
        assert!(Zlib.inflate(&[0x12, 0x34, 0x56, 0x78]).is_err());
    }
}
