//! Reference mask assets and the per-remover mask cache.

use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, OnceLock, PoisonError};
use std::time::Duration;

use log::{debug, warn};

use crate::alpha_mask::AlphaMask;
use crate::config::WatermarkSize;
use crate::error::{Error, Result};

/// How many times [`DirMaskSource`] reads an asset before giving up on
/// transient errors.
pub const DEFAULT_READ_ATTEMPTS: u32 = 3;

/// Supplies the PNG bytes of the reference logo capture for a tier.
pub trait MaskSource: Send + Sync {
    /// Read the reference PNG for `size`.
    ///
    /// # Errors
    ///
    /// Returns the underlying I/O error if the asset is unavailable.
    fn load(&self, size: WatermarkSize) -> io::Result<Vec<u8>>;
}

/// File name of the reference capture for a tier.
#[must_use]
pub fn asset_file_name(size: WatermarkSize) -> &'static str {
    match size {
        WatermarkSize::Small => "bg_48.png",
        WatermarkSize::Large => "bg_96.png",
    }
}

/// Reads `bg_48.png` and `bg_96.png` from a directory.
#[derive(Debug, Clone)]
pub struct DirMaskSource {
    dir: PathBuf,
    attempts: u32,
}

impl DirMaskSource {
    /// Read assets from `dir`.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            attempts: DEFAULT_READ_ATTEMPTS,
        }
    }

    /// Read assets from the `assets` directory next to the running executable.
    ///
    /// # Errors
    ///
    /// Returns an error if the executable path cannot be determined.
    pub fn beside_executable() -> io::Result<Self> {
        let exe = std::env::current_exe()?;
        let dir = exe.parent().unwrap_or(Path::new(".")).join("assets");
        Ok(Self::new(dir))
    }

    /// Override how many reads are attempted on transient errors (at least one).
    #[must_use]
    pub fn with_attempts(mut self, attempts: u32) -> Self {
        self.attempts = attempts.max(1);
        self
    }

    /// Directory the assets are read from.
    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

fn is_transient(err: &io::Error) -> bool {
    matches!(
        err.kind(),
        io::ErrorKind::Interrupted | io::ErrorKind::WouldBlock | io::ErrorKind::TimedOut
    )
}

/// Delay before the second read attempt; doubled after each further failure.
const INITIAL_RETRY_DELAY: Duration = Duration::from_millis(10);

/// Run `read` up to `attempts` times, sleeping between attempts while it
/// fails with a transient error. Other errors are returned at once.
fn read_with_retry<T>(
    what: &Path,
    attempts: u32,
    initial_delay: Duration,
    mut read: impl FnMut() -> io::Result<T>,
) -> io::Result<T> {
    let attempts = attempts.max(1);
    let mut delay = initial_delay;
    let mut attempt = 1;
    loop {
        match read() {
            Ok(value) => {
                if attempt > 1 {
                    debug!("read {} on attempt {attempt}", what.display());
                }
                return Ok(value);
            }
            Err(e) if is_transient(&e) && attempt < attempts => {
                warn!(
                    "reading {} failed (attempt {attempt}/{attempts}): {e}",
                    what.display()
                );
                std::thread::sleep(delay);
                delay *= 2;
                attempt += 1;
            }
            Err(e) => return Err(e),
        }
    }
}

impl MaskSource for DirMaskSource {
    fn load(&self, size: WatermarkSize) -> io::Result<Vec<u8>> {
        let path = self.dir.join(asset_file_name(size));
        read_with_retry(&path, self.attempts, INITIAL_RETRY_DELAY, || std::fs::read(&path))
    }
}

/// Reference captures held in memory, e.g. from `include_bytes!`.
#[derive(Debug, Clone)]
pub struct MemoryMaskSource {
    small: Vec<u8>,
    large: Vec<u8>,
}

impl MemoryMaskSource {
    /// Use the given PNG bytes for the 48px and 96px tiers.
    pub fn new(small: impl Into<Vec<u8>>, large: impl Into<Vec<u8>>) -> Self {
        Self {
            small: small.into(),
            large: large.into(),
        }
    }
}

impl MaskSource for MemoryMaskSource {
    fn load(&self, size: WatermarkSize) -> io::Result<Vec<u8>> {
        Ok(match size {
            WatermarkSize::Small => self.small.clone(),
            WatermarkSize::Large => self.large.clone(),
        })
    }
}

#[derive(Debug, Default)]
struct Slot {
    mask: OnceLock<AlphaMask>,
    init: Mutex<()>,
}

/// Lazily built alpha masks, one per tier.
///
/// Reads of a populated slot take no lock. First population is serialized
/// per tier, so each asset is decoded once even under concurrent first use.
/// A failed load leaves the slot empty.
#[derive(Debug, Default)]
pub struct MaskCache {
    small: Slot,
    large: Slot,
}

impl MaskCache {
    /// An empty cache.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn slot(&self, size: WatermarkSize) -> &Slot {
        match size {
            WatermarkSize::Small => &self.small,
            WatermarkSize::Large => &self.large,
        }
    }

    /// The cached mask for `size`, if it has been built.
    #[must_use]
    pub fn get(&self, size: WatermarkSize) -> Option<&AlphaMask> {
        self.slot(size).mask.get()
    }

    /// The mask for `size`, built from `source` on first use.
    ///
    /// # Errors
    ///
    /// Returns [`Error::MaskAsset`] if the source fails, a decode error if the
    /// asset is not a readable PNG, or [`Error::MaskDimensions`] if it is not
    /// logo-sized.
    pub fn get_or_load(&self, size: WatermarkSize, source: &dyn MaskSource) -> Result<&AlphaMask> {
        let slot = self.slot(size);
        if let Some(mask) = slot.mask.get() {
            return Ok(mask);
        }

        // The guard protects no data, so a poisoned lock is still usable.
        let _guard = slot.init.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(mask) = slot.mask.get() {
            return Ok(mask);
        }

        let bytes = source
            .load(size)
            .map_err(|source| Error::MaskAsset { size, source })?;
        let mask = AlphaMask::from_png(&bytes)?;
        let expected = size.logo_size();
        if mask.width() != expected || mask.height() != expected {
            return Err(Error::MaskDimensions {
                expected,
                width: mask.width(),
                height: mask.height(),
            });
        }
        debug!("built {expected}x{expected} alpha mask from {} bytes", bytes.len());

        Ok(slot.mask.get_or_init(|| mask))
    }
}
