use crate::error::{PipelineError, Result};
use image::{GrayImage, Luma, RgbImage};
use std::fmt;

/// Captured color frame, 3 channels of 8 bits
pub type Frame = RgbImage;

/// Binary classification per pixel: `FOREGROUND` for moving content, `BACKGROUND` otherwise
/// Dimensions match the frame it was computed from
pub type ForegroundMask = GrayImage;

pub const FOREGROUND: u8 = 255;
pub const BACKGROUND: u8 = 0;

/// Available background model variants
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, clap::ValueEnum)]
pub enum ModelKind {
    /// Per-pixel mixture of Gaussians
    #[value(name = "mog2")]
    Mixture,
    /// Per-pixel history of samples with a nearest-neighbor density test
    #[value(name = "knn")]
    Neighbor,
}

impl fmt::Display for ModelKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ModelKind::Mixture => f.write_str("mog2"),
            ModelKind::Neighbor => f.write_str("knn"),
        }
    }
}

/// Trait for background models
/// Each implementation owns its per-pixel state, so models never interfere with each other
pub trait BackgroundModel {
    fn kind(&self) -> ModelKind;

    /// Dimensions the per-pixel state was built for, `None` before the first frame
    fn dimensions(&self) -> Option<(u32, u32)>;

    /// Discard any state and seed it from `frame`
    fn initialize(&mut self, frame: &Frame);

    /// Classify `frame` against the learned background and learn from it
    ///
    /// Only called when `frame` matches `dimensions()`.
    fn classify(&mut self, frame: &Frame) -> ForegroundMask;

    /// Forget everything learned so far
    ///
    /// The next frame is treated as a cold start.
    fn reset_state(&mut self);

    /// Check that `frame` fits the current state
    fn check_dimensions(&self, frame: &Frame) -> Result<()> {
        match self.dimensions() {
            Some(expected) if expected != frame.dimensions() => {
                Err(PipelineError::DimensionMismatch {
                    expected,
                    actual: frame.dimensions(),
                })
            }
            _ => Ok(()),
        }
    }

    /// Update the model with `frame` and return its foreground mask
    ///
    /// A cold start or a size change seeds fresh state from the frame and
    /// reports an empty scene for that frame.
    fn apply(&mut self, frame: &Frame) -> ForegroundMask {
        let (width, height) = frame.dimensions();

        if let Err(err) = self.check_dimensions(frame) {
            tracing::warn!(model = %self.kind(), "{}; reinitializing background state", err);
            self.initialize(frame);
            return empty_mask(width, height);
        }

        if self.dimensions().is_none() {
            tracing::debug!(model = %self.kind(), "Seeding background state at {}x{}", width, height);
            self.initialize(frame);
            return empty_mask(width, height);
        }

        self.classify(frame)
    }
}

pub fn empty_mask(width: u32, height: u32) -> ForegroundMask {
    GrayImage::from_pixel(width, height, Luma([BACKGROUND]))
}

/// Number of foreground pixels in a mask
pub fn foreground_count(mask: &ForegroundMask) -> usize {
    mask.pixels().filter(|p| p[0] != BACKGROUND).count()
}

/// Squared euclidean distance between two RGB samples
#[inline]
pub(crate) fn distance2(a: [f32; 3], b: [f32; 3]) -> f32 {
    let d0 = a[0] - b[0];
    let d1 = a[1] - b[1];
    let d2 = a[2] - b[2];
    d0 * d0 + d1 * d1 + d2 * d2
}

#[inline]
pub(crate) fn to_sample(pixel: &image::Rgb<u8>) -> [f32; 3] {
    [pixel[0] as f32, pixel[1] as f32, pixel[2] as f32]
}
