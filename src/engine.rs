//! Core watermark removal engine.

use std::path::{Path, PathBuf};

use log::{debug, info};

use crate::alpha_mask::AlphaMask;
use crate::blending::{self, LOGO_VALUE};
use crate::config::{self, WatermarkPosition, WatermarkSize};
use crate::error::Result;
use crate::mask_cache::{DirMaskSource, MaskCache, MaskSource};
use crate::png::{self, Compressor, DecodedImage, Zlib, DEFAULT_COMPRESSION_LEVEL};

/// Options controlling watermark processing behavior.
#[derive(Debug, Clone)]
pub struct ProcessOptions {
    /// Force a specific watermark size instead of auto-detecting.
    pub force_size: Option<WatermarkSize>,
    /// Skip images too small to contain the watermark of their tier.
    pub skip_small: bool,
    /// zlib level (0-9) for the re-encoded output.
    pub compression_level: u32,
}

impl Default for ProcessOptions {
    fn default() -> Self {
        Self {
            force_size: None,
            skip_small: true,
            compression_level: DEFAULT_COMPRESSION_LEVEL,
        }
    }
}

/// Result of processing a single image file.
#[derive(Debug)]
pub struct ProcessResult {
    /// Path of the processed file.
    pub path: PathBuf,
    /// Whether processing succeeded.
    pub success: bool,
    /// Whether the file was skipped (no watermark area).
    pub skipped: bool,
    /// Human-readable status message.
    pub message: String,
}

impl ProcessResult {
    fn new(path: &Path) -> Self {
        Self {
            path: path.to_path_buf(),
            success: false,
            skipped: false,
            message: String::new(),
        }
    }
}

/// Removes the visible watermark from PNG images.
///
/// Create once and reuse for multiple images. Alpha masks are decoded from
/// the [`MaskSource`] on first use of each tier and kept for the lifetime of
/// the remover.
pub struct WatermarkRemover<S = DirMaskSource> {
    source: S,
    cache: MaskCache,
    compressor: Box<dyn Compressor>,
    compression_level: u32,
    logo_value: f32,
}

impl<S: MaskSource> WatermarkRemover<S> {
    /// Create a remover that reads its reference masks from `source`.
    pub fn new(source: S) -> Self {
        Self {
            source,
            cache: MaskCache::new(),
            compressor: Box::new(Zlib),
            compression_level: DEFAULT_COMPRESSION_LEVEL,
            logo_value: LOGO_VALUE,
        }
    }

    /// Replace the zlib backend used for decoding and encoding.
    #[must_use]
    pub fn with_compressor(mut self, compressor: impl Compressor + 'static) -> Self {
        self.compressor = Box::new(compressor);
        self
    }

    /// zlib level used by [`remove_watermark`](Self::remove_watermark).
    #[must_use]
    pub fn with_compression_level(mut self, level: u32) -> Self {
        self.compression_level = level.min(png::MAX_COMPRESSION_LEVEL);
        self
    }

    /// Determine watermark size based on image dimensions.
    #[must_use]
    #[allow(clippy::unused_self)] // method on `self` for API consistency
    pub fn watermark_size_for(&self, width: u32, height: u32) -> WatermarkSize {
        WatermarkSize::for_dimensions(width, height)
    }

    /// Whether an image of this size can contain the watermark at all.
    #[must_use]
    #[allow(clippy::unused_self)]
    pub fn has_watermark_area(&self, width: u32, height: u32) -> bool {
        config::has_watermark_area(width, height)
    }

    /// The alpha mask for a tier, loading it on first use.
    ///
    /// # Errors
    ///
    /// Returns an error if the reference asset cannot be read or decoded.
    pub fn mask(&self, size: WatermarkSize) -> Result<&AlphaMask> {
        self.cache.get_or_load(size, &self.source)
    }

    /// Remove the watermark from a decoded image in place.
    ///
    /// The `force_size` parameter overrides automatic size detection.
    /// Returns the box that was processed.
    ///
    /// # Errors
    ///
    /// Returns an error if the alpha mask for the tier cannot be loaded.
    pub fn remove(
        &self,
        image: &mut DecodedImage,
        force_size: Option<WatermarkSize>,
    ) -> Result<WatermarkPosition> {
        let size =
            force_size.unwrap_or_else(|| self.watermark_size_for(image.width(), image.height()));
        let pos = size.config().position(image.width(), image.height());
        let mask = self.mask(size)?;

        debug!(
            "reversing {0}x{0} watermark at ({1}, {2}) in {3}x{4} image",
            pos.width,
            pos.x,
            pos.y,
            image.width(),
            image.height()
        );
        blending::remove_watermark_alpha_blend(image, mask, pos, self.logo_value);
        Ok(pos)
    }

    /// Decode a PNG, remove the watermark and re-encode it.
    ///
    /// # Errors
    ///
    /// Any decode error aborts the whole operation; no partial output is
    /// produced. Mask loading errors are propagated as well.
    pub fn remove_watermark(&self, png_bytes: &[u8]) -> Result<Vec<u8>> {
        self.remove_watermark_with(png_bytes, None, self.compression_level)
    }

    fn remove_watermark_with(
        &self,
        png_bytes: &[u8],
        force_size: Option<WatermarkSize>,
        level: u32,
    ) -> Result<Vec<u8>> {
        let mut image = png::decode_with(png_bytes, self.compressor.as_ref())?;
        self.remove(&mut image, force_size)?;
        png::encode_with(&image, self.compressor.as_ref(), level)
    }

    /// Process a single image file: load, remove, save.
    ///
    /// Returns a [`ProcessResult`] indicating success, skip, or failure.
    #[must_use]
    pub fn process_file(
        &self,
        input: &Path,
        output: &Path,
        opts: &ProcessOptions,
    ) -> ProcessResult {
        let mut result = ProcessResult::new(input);

        let bytes = match std::fs::read(input) {
            Ok(bytes) => bytes,
            Err(e) => {
                result.message = format!("Failed to load: {e}");
                return result;
            }
        };

        // Only a stream that decodes cleanly can be skipped as too small.
        let mut image = match png::decode_with(&bytes, self.compressor.as_ref()) {
            Ok(image) => image,
            Err(e) => {
                result.message = format!("Failed to process: {e}");
                return result;
            }
        };

        let (w, h) = (image.width(), image.height());
        let size = opts
            .force_size
            .unwrap_or_else(|| self.watermark_size_for(w, h));
        if opts.skip_small && !size.config().fits(w, h) {
            let wm = size.logo_size();
            result.skipped = true;
            result.success = true;
            result.message = format!("Image too small ({w}x{h}) for {wm}x{wm} watermark");
            info!("{}: {}", input.display(), result.message);
            return result;
        }

        let cleaned = self.remove(&mut image, Some(size)).and_then(|_| {
            png::encode_with(&image, self.compressor.as_ref(), opts.compression_level)
        });
        let cleaned = match cleaned {
            Ok(cleaned) => cleaned,
            Err(e) => {
                result.message = format!("Failed to process: {e}");
                return result;
            }
        };

        // Save output
        if let Some(parent) = output.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                if let Err(e) = std::fs::create_dir_all(parent) {
                    result.message = format!("Failed to create output directory: {e}");
                    return result;
                }
            }
        }

        match std::fs::write(output, cleaned) {
            Ok(()) => {
                result.success = true;
                result.message = "Watermark removed".to_string();
                info!("{} -> {}", input.display(), output.display());
            }
            Err(e) => {
                result.message = format!("Failed to save: {e}");
            }
        }

        result
    }

    /// Process all supported images in a directory.
    ///
    /// Uses parallel iteration when the `cli` feature is enabled (via rayon).
    /// Returns a [`ProcessResult`] for each image found.
    #[must_use]
    pub fn process_directory(
        &self,
        input_dir: &Path,
        output_dir: &Path,
        opts: &ProcessOptions,
    ) -> Vec<ProcessResult> {
        let entries: Vec<PathBuf> = match std::fs::read_dir(input_dir) {
            Ok(rd) => rd
                .filter_map(std::result::Result::ok)
                .filter(|e| e.file_type().map(|ft| ft.is_file()).unwrap_or(false))
                .map(|e| e.path())
                .filter(|p| is_supported_image(p))
                .collect(),
            Err(e) => {
                let mut result = ProcessResult::new(input_dir);
                result.message = format!("Failed to read directory: {e}");
                return vec![result];
            }
        };

        // Create output directory
        if !output_dir.exists() {
            if let Err(e) = std::fs::create_dir_all(output_dir) {
                let mut result = ProcessResult::new(output_dir);
                result.message = format!("Failed to create output directory: {e}");
                return vec![result];
            }
        }

        let process = |input_path: &PathBuf| {
            // Entries come from `read_dir`, so they always have a file name.
            let output_path = output_dir.join(input_path.file_name().unwrap_or_default());
            self.process_file(input_path, &output_path, opts)
        };

        #[cfg(feature = "cli")]
        {
            use rayon::prelude::*;
            entries.par_iter().map(process).collect()
        }

        #[cfg(not(feature = "cli"))]
        {
            entries.iter().map(process).collect()
        }
    }
}

/// Check if a file has a supported image extension.
#[must_use]
pub fn is_supported_image(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("png"))
}

/// Generate a default output path from an input path.
///
/// Example: `"photo.png"` becomes `"photo_cleaned.png"`.
#[must_use]
pub fn default_output_path(input: &Path) -> PathBuf {
    let stem = input.file_stem().unwrap_or_default().to_string_lossy();
    let ext = input.extension().unwrap_or_default().to_string_lossy();
    let parent = input.parent().unwrap_or(Path::new("."));
    parent.join(format!("{stem}_cleaned.{ext}"))
}
