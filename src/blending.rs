//! Alpha blending math for watermark removal.
//!
//! Gemini applies watermarks via forward alpha blending:
//! `watermarked = alpha * logo + (1 - alpha) * original`
//!
//! This module provides the reverse operation to recover original pixels.
//!
//! Running the reverse operation a second time on an already cleaned image is
//! not a no-op: every masked pixel is pushed further away from the logo color.
//! The drift is largest where the mask is strongest and negligible near the
//! threshold.

use crate::alpha_mask::AlphaMask;
use crate::config::WatermarkPosition;
use crate::png::DecodedImage;

/// Alpha threshold: ignore pixels with negligible watermark effect (noise).
pub const ALPHA_THRESHOLD: f32 = 0.002;

/// Maximum alpha: clamp to avoid division by near-zero in reverse blending.
pub const MAX_ALPHA: f32 = 0.99;

/// The logo color value (pure white).
pub const LOGO_VALUE: f32 = 255.0;

/// Recover one channel value.
///
/// Applies `original = (watermarked - alpha * logo_value) / (1 - alpha)` with
/// `alpha` capped at [`MAX_ALPHA`], then clamps to `[0, 255]` and rounds.
#[must_use]
pub fn unblend_channel(watermarked: u8, alpha: f32, logo_value: f32) -> u8 {
    let alpha = alpha.min(MAX_ALPHA);
    let original = (f32::from(watermarked) - alpha * logo_value) / (1.0 - alpha);
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    {
        original.clamp(0.0, 255.0).round() as u8
    }
}

/// Remove watermark from an image using reverse alpha blending.
///
/// Operates in-place on the box at `pos`, clipped to the image bounds. The
/// mask is indexed from the box's top-left corner. Pixels with alpha below
/// [`ALPHA_THRESHOLD`] are left unchanged, and the alpha channel is never
/// modified.
pub fn remove_watermark_alpha_blend(
    image: &mut DecodedImage,
    alpha_map: &AlphaMask,
    pos: WatermarkPosition,
    logo_value: f32,
) {
    // Clip to image bounds
    let x2 = pos.x.saturating_add(pos.width).min(image.width());
    let y2 = pos.y.saturating_add(pos.height).min(image.height());

    if pos.x >= x2 || pos.y >= y2 {
        return;
    }

    for dy in 0..(y2 - pos.y) {
        for dx in 0..(x2 - pos.x) {
            let alpha = alpha_map.get(dx, dy);

            // Skip pixels with negligible watermark effect
            if alpha < ALPHA_THRESHOLD {
                continue;
            }

            let px = image.pixel_mut(pos.x + dx, pos.y + dy);
            for ch in &mut px[..3] {
                *ch = unblend_channel(*ch, alpha, logo_value);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn forward_blend(original: u8, alpha: f32) -> u8 {
        let result = alpha * LOGO_VALUE + (1.0 - alpha) * f32::from(original);
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        {
            result.clamp(0.0, 255.0).round() as u8
        }
    }

    #[test]
    fn half_alpha_white_stays_white() {
        assert_eq!(unblend_channel(255, 0.5, LOGO_VALUE), 255);
    }

    #[test]
    fn half_alpha_black_clamps_to_zero() {
        // (0 - 127.5) / 0.5 = -255
        assert_eq!(unblend_channel(0, 0.5, LOGO_VALUE), 0);
    }

    #[test]
    fn alpha_is_capped_below_one() {
        // alpha 1.0 acts as 0.99: (255 - 252.45) / 0.01 = 255
        assert_eq!(unblend_channel(255, 1.0, LOGO_VALUE), 255);
        assert_eq!(unblend_channel(254, 1.0, LOGO_VALUE), 155);
    }

    #[test]
    fn rounds_to_nearest() {
        // (100 - 0.2 * 255) / 0.8 = 61.25
        assert_eq!(unblend_channel(100, 0.2, LOGO_VALUE), 61);
        // (110 - 0.2 * 255) / 0.8 = 73.75
        assert_eq!(unblend_channel(110, 0.2, LOGO_VALUE), 74);
    }

    #[test]
    fn reverse_blend_recovers_original_within_tolerance() {
        let mut image = DecodedImage::filled(100, 100, [128, 64, 200, 255]).unwrap();
        let original_copy = image.clone();

        let size = 10u32;
        #[allow(clippy::cast_precision_loss)]
        let values: Vec<f32> = (0..size * size)
            .map(|i| (i as f32) / (size * size) as f32 * 0.5)
            .collect();
        let mask = AlphaMask::from_values(size, size, values).unwrap();

        let pos = WatermarkPosition {
            x: 50,
            y: 50,
            width: size,
            height: size,
        };

        // Apply forward blend
        for dy in 0..size {
            for dx in 0..size {
                let alpha = mask.get(dx, dy);
                if alpha < ALPHA_THRESHOLD {
                    continue;
                }
                let px = image.pixel_mut(pos.x + dx, pos.y + dy);
                for ch in &mut px[..3] {
                    *ch = forward_blend(*ch, alpha);
                }
            }
        }

        remove_watermark_alpha_blend(&mut image, &mask, pos, LOGO_VALUE);

        // Verify within tolerance (+/- 2 due to double u8 rounding)
        for dy in 0..size {
            for dx in 0..size {
                let restored = image.pixel(pos.x + dx, pos.y + dy);
                let orig = original_copy.pixel(pos.x + dx, pos.y + dy);
                for ch in 0..4 {
                    let diff = (i32::from(restored[ch]) - i32::from(orig[ch])).abs();
                    assert!(
                        diff <= 2,
                        "Pixel ({dx},{dy}) ch {ch} diff {diff} (restored={}, orig={})",
                        restored[ch],
                        orig[ch]
                    );
                }
            }
        }
    }

    #[test]
    fn pixels_outside_box_and_below_threshold_are_untouched() {
        let mut image = DecodedImage::filled(8, 8, [200, 150, 100, 77]).unwrap();
        let mask = AlphaMask::from_values(2, 1, vec![0.001, 0.5]).unwrap();
        let pos = WatermarkPosition {
            x: 3,
            y: 3,
            width: 2,
            height: 1,
        };
        let before = image.clone();
        remove_watermark_alpha_blend(&mut image, &mask, pos, LOGO_VALUE);

        for y in 0..8 {
            for x in 0..8 {
                if (x, y) == (4, 3) {
                    // (200 - 127.5) / 0.5 = 145, (150 - 127.5) / 0.5 = 45, 100 -> 0
                    assert_eq!(image.pixel(x, y), [145, 45, 0, 77]);
                } else {
                    assert_eq!(image.pixel(x, y), before.pixel(x, y), "({x},{y})");
                }
            }
        }
    }

    #[test]
    fn box_is_clipped_to_image() {
        let mut image = DecodedImage::filled(4, 4, [255, 255, 255, 255]).unwrap();
        let mask = AlphaMask::from_values(8, 8, vec![0.5; 64]).unwrap();
        let pos = WatermarkPosition {
            x: 2,
            y: 2,
            width: 8,
            height: 8,
        };
        remove_watermark_alpha_blend(&mut image, &mask, pos, LOGO_VALUE);
        assert_eq!(image.pixel(3, 3), [255, 255, 255, 255]);

        let far = WatermarkPosition { x: 10, ..pos };
        remove_watermark_alpha_blend(&mut image, &mask, far, LOGO_VALUE);
    }

    #[test]
    fn second_pass_drift_is_bounded_near_threshold() {
        let mut image = DecodedImage::filled(4, 4, [120, 120, 120, 255]).unwrap();
        let mask = AlphaMask::from_values(4, 4, vec![0.003; 16]).unwrap();
        let pos = WatermarkPosition {
            x: 0,
            y: 0,
            width: 4,
            height: 4,
        };
        remove_watermark_alpha_blend(&mut image, &mask, pos, LOGO_VALUE);
        let once = image.clone();
        remove_watermark_alpha_blend(&mut image, &mask, pos, LOGO_VALUE);

        for (a, b) in once.pixels().iter().zip(image.pixels()) {
            assert!((i32::from(*a) - i32::from(*b)).abs() <= 1);
        }
    }
}
