//! Chunk framing: `length (u32 BE) | type (4 bytes) | data | crc (u32 BE)`.

use crate::error::FormatError;
use crate::png::crc::Crc32;

/// `IHDR` tag.
pub const IHDR: [u8; 4] = *b"IHDR";
/// `IDAT` tag.
pub const IDAT: [u8; 4] = *b"IDAT";
/// `IEND` tag.
pub const IEND: [u8; 4] = *b"IEND";

/// Length, type and CRC fields around each chunk's data.
const FRAME_LEN: usize = 12;

/// Largest payload a single chunk may carry (2^31 - 1).
pub const MAX_CHUNK_LEN: usize = 0x7FFF_FFFF;

/// A chunk borrowed from the input buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChunkRef<'a> {
    /// Offset of the chunk's length field in the whole stream.
    pub offset: usize,
    /// Four-byte ASCII type tag.
    pub kind: [u8; 4],
    /// Chunk payload.
    pub data: &'a [u8],
    /// Stored CRC, not verified.
    pub crc: u32,
}

/// Walks the chunks that follow the signature.
///
/// Yields `Err` once and then stops if a chunk does not fit in the buffer;
/// ends cleanly at the end of the buffer.
#[derive(Debug, Clone)]
pub struct Chunks<'a> {
    bytes: &'a [u8],
    pos: usize,
    done: bool,
}

impl<'a> Chunks<'a> {
    /// Iterate over `bytes`, where chunk framing starts at `start`.
    #[must_use]
    pub fn new(bytes: &'a [u8], start: usize) -> Self {
        Self {
            bytes,
            pos: start,
            done: false,
        }
    }
}

fn be_u32(bytes: &[u8], at: usize) -> u32 {
    u32::from_be_bytes([bytes[at], bytes[at + 1], bytes[at + 2], bytes[at + 3]])
}

impl<'a> Iterator for Chunks<'a> {
    type Item = Result<ChunkRef<'a>, FormatError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done || self.pos >= self.bytes.len() {
            return None;
        }

        let offset = self.pos;
        let rest = &self.bytes[offset..];
        let total = (rest.len() >= 8)
            .then(|| be_u32(rest, 0) as usize)
            .and_then(|len| len.checked_add(FRAME_LEN).map(|total| (len, total)))
            .filter(|&(_, total)| total <= rest.len());

        let Some((len, total)) = total else {
            self.done = true;
            return Some(Err(FormatError::Truncated { offset }));
        };

        self.pos += total;
        Some(Ok(ChunkRef {
            offset,
            kind: [rest[4], rest[5], rest[6], rest[7]],
            data: &rest[8..8 + len],
            crc: be_u32(rest, 8 + len),
        }))
    }
}

/// Append a framed chunk to `out`, computing its CRC over type and data.
///
/// `data` must not exceed [`MAX_CHUNK_LEN`] bytes.
pub fn write_chunk(out: &mut Vec<u8>, kind: [u8; 4], data: &[u8]) {
    debug_assert!(data.len() <= MAX_CHUNK_LEN);
    #[allow(clippy::cast_possible_truncation)]
    let len = data.len() as u32;
    let mut crc = Crc32::new();
    crc.update(&kind);
    crc.update(data);

    out.reserve(FRAME_LEN + data.len());
    out.extend_from_slice(&len.to_be_bytes());
    out.extend_from_slice(&kind);
    out.extend_from_slice(data);
    out.extend_from_slice(&crc.finalize().to_be_bytes());
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_iend_chunk_has_fixed_bytes() {
        let mut out = Vec::new();
        write_chunk(&mut out, IEND, &[]);
        assert_eq!(
            out,
            [0, 0, 0, 0, b'I', b'E', b'N', b'D', 0xAE, 0x42, 0x60, 0x82]
        );
    }

    #[test]
    fn walks_written_chunks() {
        let mut out = Vec::new();
        write_chunk(&mut out, *b"tEXt", b"hello");
        write_chunk(&mut out, IEND, &[]);

        let chunks: Vec<_> = Chunks::new(&out, 0).collect::<Result<_, _>>().unwrap();
        assert_eq!(chunks.len(), 2);
        assert_eq!(chunks[0].kind, *b"tEXt");
        assert_eq!(chunks[0].data, b"hello");
        assert_eq!(chunks[1].offset, 17);
        assert_eq!(chunks[1].crc, 0xAE42_6082);
    }

    #[test]
    fn truncated_body_is_reported_once() {
        let mut out = Vec::new();
        write_chunk(&mut out, *b"tEXt", b"hello");
        out.truncate(out.len() - 1);

        let mut chunks = Chunks::new(&out, 0);
        assert_eq!(chunks.next(), Some(Err(FormatError::Truncated { offset: 0 })));
        assert_eq!(chunks.next(), None);
    }

    #[test]
    fn partial_header_is_truncation() {
        let bytes = [0, 0, 0];
        let mut chunks = Chunks::new(&bytes, 0);
        assert_eq!(chunks.next(), Some(Err(FormatError::Truncated { offset: 0 })));
    }

    #[test]
    fn oversized_length_does_not_overflow() {
        let bytes = [0xFF, 0xFF, 0xFF, 0xFF, b'I', b'D', b'A', b'T'];
        let mut chunks = Chunks::new(&bytes, 0);
        assert_eq!(chunks.next(), Some(Err(FormatError::Truncated { offset: 0 })));
    }
}
