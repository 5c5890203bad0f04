//! Remove visible Gemini AI watermarks from PNG images via reverse alpha blending.
//!
//! Gemini AI overlays a semi-transparent white star/sparkle logo on generated
//! images. This crate decodes the PNG with its own small codec, reverses the
//! alpha-blending equation inside the logo's bounding box using calibrated
//! 48x48 and 96x96 alpha masks, and re-encodes a minimal PNG.
//!
//! # Quick Start
//!
//! ```no_run
//! use gemini_watermark_png::{DirMaskSource, WatermarkRemover};
//!
//! let remover = WatermarkRemover::new(DirMaskSource::new("assets"));
//! let input = std::fs::read("photo.png").unwrap();
//! let cleaned = remover.remove_watermark(&input).unwrap();
//! std::fs::write("cleaned.png", cleaned).unwrap();
//! ```
//!
//! # Codec
//!
//! The [`png`] module can be used on its own:
//!
//! ```
//! use gemini_watermark_png::png::{self, DecodedImage};
//!
//! let img = DecodedImage::filled(4, 4, [255, 0, 0, 255]).unwrap();
//! let bytes = png::encode(&img).unwrap();
//! assert_eq!(png::decode(&bytes).unwrap(), img);
//! ```

#![deny(missing_docs)]

pub mod alpha_mask;
pub mod blending;
pub mod config;
mod engine;
pub mod error;
pub mod mask_cache;
pub mod png;

pub use alpha_mask::AlphaMask;
pub use config::{
    detect_watermark_config, has_watermark_area, WatermarkConfig, WatermarkPosition,
    WatermarkSize,
};
pub use engine::{
    default_output_path, is_supported_image, ProcessOptions, ProcessResult, WatermarkRemover,
};
pub use error::{Error, FormatError, Result};
pub use mask_cache::{DirMaskSource, MaskCache, MaskSource, MemoryMaskSource};
pub use png::DecodedImage;
