//! Watermark geometry: size tiers, margins and the logo bounding box.
//!
//! Gemini renders its logo at one of two fixed sizes, anchored to the
//! bottom-right corner with a fixed margin. The tier depends only on the
//! image dimensions.

/// Images must exceed this size in both dimensions to get the large logo.
const LARGE_TIER_MIN_EXCLUSIVE: u32 = 1024;

/// Watermark size classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WatermarkSize {
    /// 48x48 watermark, 32px margin (images where either dimension <= 1024).
    Small,
    /// 96x96 watermark, 64px margin (images where both dimensions > 1024).
    Large,
}

impl WatermarkSize {
    /// Determine watermark size based on image dimensions.
    ///
    /// - **Large** (96x96, 64px margin): both width AND height > 1024
    /// - **Small** (48x48, 32px margin): otherwise (including 1024x1024)
    #[must_use]
    pub fn for_dimensions(width: u32, height: u32) -> Self {
        if width > LARGE_TIER_MIN_EXCLUSIVE && height > LARGE_TIER_MIN_EXCLUSIVE {
            Self::Large
        } else {
            Self::Small
        }
    }

    /// Geometry of this tier.
    #[must_use]
    pub fn config(self) -> WatermarkConfig {
        match self {
            Self::Small => WatermarkConfig::SMALL,
            Self::Large => WatermarkConfig::LARGE,
        }
    }

    /// Edge length of the square logo in pixels.
    #[must_use]
    pub fn logo_size(self) -> u32 {
        self.config().logo_size
    }
}

/// Size and placement of the logo for one tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WatermarkConfig {
    /// Edge length of the square logo.
    pub logo_size: u32,
    /// Gap between the logo and the right edge of the image.
    pub margin_right: u32,
    /// Gap between the logo and the bottom edge of the image.
    pub margin_bottom: u32,
}

impl WatermarkConfig {
    /// The 48px tier.
    pub const SMALL: Self = Self {
        logo_size: 48,
        margin_right: 32,
        margin_bottom: 32,
    };

    /// The 96px tier.
    pub const LARGE: Self = Self {
        logo_size: 96,
        margin_right: 64,
        margin_bottom: 64,
    };

    /// Bounding box of the logo in an image of the given size.
    ///
    /// Coordinates saturate at zero for images smaller than the tier's area;
    /// callers clip the box against the image bounds.
    #[must_use]
    pub fn position(&self, width: u32, height: u32) -> WatermarkPosition {
        WatermarkPosition {
            x: width.saturating_sub(self.margin_right + self.logo_size),
            y: height.saturating_sub(self.margin_bottom + self.logo_size),
            width: self.logo_size,
            height: self.logo_size,
        }
    }

    /// Whether an image of the given size can hold the whole logo and its margins.
    #[must_use]
    pub fn fits(&self, width: u32, height: u32) -> bool {
        width >= self.logo_size + self.margin_right && height >= self.logo_size + self.margin_bottom
    }
}

/// The logo's bounding box in image-pixel coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WatermarkPosition {
    /// Left edge.
    pub x: u32,
    /// Top edge.
    pub y: u32,
    /// Box width.
    pub width: u32,
    /// Box height.
    pub height: u32,
}

/// Select the watermark geometry for an image of the given size.
#[must_use]
pub fn detect_watermark_config(width: u32, height: u32) -> WatermarkConfig {
    WatermarkSize::for_dimensions(width, height).config()
}

/// Whether an image is large enough to contain the overlay of its own tier.
#[must_use]
pub fn has_watermark_area(width: u32, height: u32) -> bool {
    detect_watermark_config(width, height).fits(width, height)
}
