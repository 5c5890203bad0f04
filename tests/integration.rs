use std::io::Cursor;

use gemini_watermark_png::png::{self, DecodedImage};
use gemini_watermark_png::{
    detect_watermark_config, has_watermark_area, DirMaskSource, Error, MemoryMaskSource,
    ProcessOptions, WatermarkRemover, WatermarkSize,
};
use image::{DynamicImage, ImageFormat, Rgba, RgbaImage};
use proptest::prelude::*;

/// A four-pointed sparkle: bright in the center, fading along the axes.
fn sparkle_value(size: u32, x: u32, y: u32) -> u8 {
    let c = (size as f32 - 1.0) / 2.0;
    let dx = (x as f32 - c).abs() / c;
    let dy = (y as f32 - c).abs() / c;
    let v = (1.0 - (dx.sqrt() + dy.sqrt())).max(0.0);
    (v * 180.0).round() as u8
}

fn sparkle_png(size: u32) -> Vec<u8> {
    let mut img = DecodedImage::filled(size, size, [0, 0, 0, 255]).unwrap();
    for y in 0..size {
        for x in 0..size {
            let v = sparkle_value(size, x, y);
            img.pixel_mut(x, y).copy_from_slice(&[v, v, v, 255]);
        }
    }
    png::encode(&img).unwrap()
}

fn sparkle_source() -> MemoryMaskSource {
    MemoryMaskSource::new(sparkle_png(48), sparkle_png(96))
}

fn textured(width: u32, height: u32) -> RgbaImage {
    RgbaImage::from_fn(width, height, |x, y| {
        Rgba([
            (40 + (x * 3 + y) % 150) as u8,
            (90 + (x + y * 2) % 120) as u8,
            (20 + (x * y) % 180) as u8,
            255,
        ])
    })
}

/// Composite the sparkle onto the image the way the generator does.
fn apply_watermark(img: &mut RgbaImage, size: WatermarkSize) {
    let config = size.config();
    let pos = config.position(img.width(), img.height());
    for dy in 0..pos.height {
        for dx in 0..pos.width {
            let alpha = f32::from(sparkle_value(pos.width, dx, dy)) / 255.0;
            let px = img.get_pixel_mut(pos.x + dx, pos.y + dy);
            for ch in 0..3 {
                let blended = alpha * 255.0 + (1.0 - alpha) * f32::from(px[ch]);
                px[ch] = blended.round().clamp(0.0, 255.0) as u8;
            }
        }
    }
}

fn to_png(img: &RgbaImage) -> Vec<u8> {
    let mut bytes = Vec::new();
    DynamicImage::ImageRgba8(img.clone())
        .write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)
        .unwrap();
    bytes
}

fn assert_recovered(original: &RgbaImage, cleaned: &DecodedImage, tolerance: i32) {
    assert_eq!((cleaned.width(), cleaned.height()), original.dimensions());
    for (x, y, px) in original.enumerate_pixels() {
        let got = cleaned.pixel(x, y);
        for ch in 0..4 {
            let diff = (i32::from(got[ch]) - i32::from(px[ch])).abs();
            assert!(
                diff <= tolerance,
                "({x},{y}) ch {ch}: got {}, want {}",
                got[ch],
                px[ch]
            );
        }
    }
}

#[test]
fn removes_small_watermark() {
    let original = textured(640, 480);
    let mut marked = original.clone();
    apply_watermark(&mut marked, WatermarkSize::Small);
    assert_ne!(marked, original);

    let remover = WatermarkRemover::new(sparkle_source());
    let cleaned = remover.remove_watermark(&to_png(&marked)).unwrap();
    assert_recovered(&original, &png::decode(&cleaned).unwrap(), 3);
}

#[test]
fn removes_large_watermark() {
    let original = textured(1280, 1100);
    let mut marked = original.clone();
    apply_watermark(&mut marked, WatermarkSize::Large);

    let remover = WatermarkRemover::new(sparkle_source());
    let cleaned = remover.remove_watermark(&to_png(&marked)).unwrap();
    assert_recovered(&original, &png::decode(&cleaned).unwrap(), 3);
}

#[test]
fn output_is_readable_by_image_crate() {
    let remover = WatermarkRemover::new(sparkle_source());
    let cleaned = remover.remove_watermark(&to_png(&textured(200, 120))).unwrap();
    let reread = image::load_from_memory_with_format(&cleaned, ImageFormat::Png).unwrap();
    assert_eq!((reread.width(), reread.height()), (200, 120));
}

#[test]
fn blank_image_without_mask_signal_is_unchanged() {
    let remover = WatermarkRemover::new(MemoryMaskSource::new(
        png::encode(&DecodedImage::filled(48, 48, [0, 0, 0, 255]).unwrap()).unwrap(),
        png::encode(&DecodedImage::filled(96, 96, [0, 0, 0, 255]).unwrap()).unwrap(),
    ));
    let img = textured(300, 300);
    let cleaned = remover.remove_watermark(&to_png(&img)).unwrap();
    assert_eq!(png::decode(&cleaned).unwrap().pixels(), img.as_raw().as_slice());
}

#[test]
fn second_pass_only_drifts_inside_the_box() {
    let remover = WatermarkRemover::new(sparkle_source());
    let once = remover.remove_watermark(&to_png(&textured(300, 200))).unwrap();
    let twice = remover.remove_watermark(&once).unwrap();

    let a = png::decode(&once).unwrap();
    let b = png::decode(&twice).unwrap();
    let pos = detect_watermark_config(300, 200).position(300, 200);
    for y in 0..200 {
        for x in 0..300 {
            let inside = (pos.x..pos.x + pos.width).contains(&x)
                && (pos.y..pos.y + pos.height).contains(&y);
            if !inside {
                assert_eq!(a.pixel(x, y), b.pixel(x, y));
            }
        }
    }
}

#[test]
fn decode_encode_decode_is_lossless() {
    let source = to_png(&textured(77, 41));
    let first = png::decode(&source).unwrap();
    let second = png::decode(&png::encode(&first).unwrap()).unwrap();
    assert_eq!(first, second);
}

#[test]
fn malformed_input_is_rejected() {
    let remover = WatermarkRemover::new(sparkle_source());
    let mut bytes = to_png(&textured(100, 100));
    bytes[0] = 0;
    assert!(matches!(remover.remove_watermark(&bytes), Err(Error::Format(_))));
}

#[test]
fn missing_assets_surface_as_mask_error() {
    let remover = WatermarkRemover::new(DirMaskSource::new("/nonexistent/gemini-assets"));
    let result = remover.remove_watermark(&to_png(&textured(100, 100)));
    assert!(matches!(
        result,
        Err(Error::MaskAsset {
            size: WatermarkSize::Small,
            ..
        })
    ));
}

#[test]
fn watermark_area_predicate() {
    assert!(!has_watermark_area(40, 40));
    assert!(has_watermark_area(100, 100));
    assert!(!has_watermark_area(1100, 150));
    assert!(has_watermark_area(1100, 1100));
}

#[test]
fn process_directory_cleans_and_skips() {
    let root = std::env::temp_dir().join(format!("gwm-integration-{}", std::process::id()));
    let input = root.join("in");
    let output = root.join("out");
    let assets = root.join("assets");
    for dir in [&input, &assets] {
        std::fs::create_dir_all(dir).unwrap();
    }
    std::fs::write(assets.join("bg_48.png"), sparkle_png(48)).unwrap();
    std::fs::write(assets.join("bg_96.png"), sparkle_png(96)).unwrap();

    let original = textured(320, 240);
    let mut marked = original.clone();
    apply_watermark(&mut marked, WatermarkSize::Small);
    std::fs::write(input.join("marked.png"), to_png(&marked)).unwrap();
    std::fs::write(input.join("tiny.png"), to_png(&textured(40, 40))).unwrap();
    std::fs::write(input.join("notes.txt"), b"ignored").unwrap();
    std::fs::write(input.join("broken.png"), b"\x89PNG but not really").unwrap();

    let remover = WatermarkRemover::new(DirMaskSource::new(&assets));
    let results = remover.process_directory(&input, &output, &ProcessOptions::default());

    assert_eq!(results.len(), 3);
    let by_name = |name: &str| {
        results
            .iter()
            .find(|r| r.path.file_name().unwrap() == name)
            .unwrap()
    };
    assert!(!by_name("broken.png").success);
    assert!(by_name("tiny.png").skipped);
    assert!(by_name("marked.png").success);

    let cleaned = png::decode(&std::fs::read(output.join("marked.png")).unwrap()).unwrap();
    assert_recovered(&original, &cleaned, 3);
    assert!(!output.join("tiny.png").exists());

    std::fs::remove_dir_all(&root).unwrap();
}

#[test]
fn undecodable_small_files_fail_instead_of_skipping() {
    let root = std::env::temp_dir().join(format!("gwm-small-broken-{}", std::process::id()));
    std::fs::create_dir_all(&root).unwrap();

    // Header claims 0x0; CRC is left stale.
    let mut zero = to_png(&textured(4, 4));
    zero[16..24].fill(0);
    // Valid 40x40 header, image data cut off mid-stream.
    let mut cut = to_png(&textured(40, 40));
    cut.truncate(cut.len() / 2);

    let remover = WatermarkRemover::new(sparkle_source());
    for (name, bytes) in [("zero.png", zero), ("cut.png", cut)] {
        let input = root.join(name);
        std::fs::write(&input, bytes).unwrap();
        let output = root.join("out.png");
        let result = remover.process_file(&input, &output, &ProcessOptions::default());
        assert!(!result.success, "{name}: {}", result.message);
        assert!(!result.skipped, "{name}");
    }
    assert!(!root.join("out.png").exists());

    std::fs::remove_dir_all(&root).unwrap();
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    #[test]
    fn round_trip_through_image_crate_encoder(
        width in 1u32..24,
        height in 1u32..24,
        seed in any::<u32>(),
    ) {
        let img = RgbaImage::from_fn(width, height, |x, y| {
            let v = seed.wrapping_mul(2_654_435_761).wrapping_add(x * 7919 + y * 104_729);
            Rgba(v.to_le_bytes())
        });
        let decoded = png::decode(&to_png(&img)).unwrap();
        prop_assert_eq!(decoded.pixels(), img.as_raw().as_slice());

        let again = png::decode(&png::encode(&decoded).unwrap()).unwrap();
        prop_assert_eq!(again, decoded);
    }
}
