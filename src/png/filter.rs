//! Scanline filter reconstruction.
//!
//! See <https://www.w3.org/TR/png-3/#9Filters>. Each function here works only
//! on the rows it is handed.

use crate::error::FormatError;

/// Filter type byte values.
pub mod kind {
    /// Recon(x) = Filt(x)
    pub const NONE: u8 = 0;
    /// Recon(x) = Filt(x) + Recon(a)
    pub const SUB: u8 = 1;
    /// Recon(x) = Filt(x) + Recon(b)
    pub const UP: u8 = 2;
    /// Recon(x) = Filt(x) + floor((Recon(a) + Recon(b)) / 2)
    pub const AVERAGE: u8 = 3;
    /// Recon(x) = Filt(x) + PaethPredictor(Recon(a), Recon(b), Recon(c))
    pub const PAETH: u8 = 4;
}

/// Reconstruct one scanline in place.
///
/// `row` holds the filtered bytes on entry and the reconstructed bytes on
/// return. `prev` is the already reconstructed row above, or `None` for the
/// first row (treated as all zeros). `bpp` is the byte distance to the left
/// neighbour.
///
/// # Errors
///
/// Returns [`FormatError::FilterType`] for filter bytes above 4 and
/// [`FormatError::ImageDataLength`] if `prev` is shorter than `row`.
pub fn unfilter_scanline(
    filter_type: u8,
    bpp: usize,
    prev: Option<&[u8]>,
    row: &mut [u8],
) -> Result<(), FormatError> {
    if let Some(p) = prev.filter(|p| p.len() < row.len()) {
        return Err(FormatError::ImageDataLength {
            expected: row.len(),
            actual: p.len(),
        });
    }
    let bpp = bpp.max(1);
    let up = |i: usize| prev.map_or(0, |p| p[i]);
    let up_left = |i: usize| {
        if i >= bpp {
            prev.map_or(0, |p| p[i - bpp])
        } else {
            0
        }
    };

    match filter_type {
        kind::NONE => {}
        kind::SUB => {
            for i in bpp..row.len() {
                row[i] = row[i].wrapping_add(row[i - bpp]);
            }
        }
        kind::UP => {
            if let Some(prev) = prev {
                for (cur, &above) in row.iter_mut().zip(prev) {
                    *cur = cur.wrapping_add(above);
                }
            }
        }
        kind::AVERAGE => {
            for i in 0..row.len() {
                let left = if i >= bpp { row[i - bpp] } else { 0 };
                #[allow(clippy::cast_possible_truncation)]
                let avg = ((u16::from(left) + u16::from(up(i))) / 2) as u8;
                row[i] = row[i].wrapping_add(avg);
            }
        }
        kind::PAETH => {
            for i in 0..row.len() {
                let left = if i >= bpp { row[i - bpp] } else { 0 };
                row[i] = row[i].wrapping_add(paeth_predictor(left, up(i), up_left(i)));
            }
        }
        other => return Err(FormatError::FilterType(other)),
    }

    Ok(())
}

/// Pick whichever of left (`a`), up (`b`) and up-left (`c`) is closest to
/// `a + b - c`, preferring `a`, then `b`, on ties.
#[must_use]
pub fn paeth_predictor(a: u8, b: u8, c: u8) -> u8 {
    let (ia, ib, ic) = (i16::from(a), i16::from(b), i16::from(c));
    let p = ia + ib - ic;
    let pa = (p - ia).abs();
    let pb = (p - ib).abs();
    let pc = (p - ic).abs();

    if pa <= pb && pa <= pc {
        a
    } else if pb <= pc {
        b
    } else {
        c
    }
}
