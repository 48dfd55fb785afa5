use super::types::{
    distance2, BackgroundModel, ForegroundMask, Frame, ModelKind, BACKGROUND, FOREGROUND,
};
use crate::error::{PipelineError, Result};
use image::GrayImage;

/// Fraction of the history each memory tier should still remember
/// Short, mid and long term
const TIER_RETENTION: [f64; 3] = [0.7, 0.4, 0.1];
const TIERS: usize = TIER_RETENTION.len();

/// Tuning for the nearest-neighbor model
#[derive(Debug, Clone, PartialEq)]
pub struct NeighborConfig {
    /// Number of frames the long-term memory spans
    pub history: u32,
    /// Samples stored per memory tier
    pub samples_per_tier: usize,
    /// Squared RGB distance under which a stored sample counts as a neighbor
    pub dist2_threshold: f32,
    /// Neighbors needed to call a pixel background
    pub knn: usize,
}

impl Default for NeighborConfig {
    fn default() -> Self {
        Self {
            history: 500,
            samples_per_tier: 7,
            dist2_threshold: 400.0,
            knn: 2,
        }
    }
}

impl NeighborConfig {
    pub fn validate(&self) -> Result<()> {
        if self.history == 0 {
            return Err(PipelineError::Config("neighbor history must be at least 1".into()));
        }
        if self.samples_per_tier == 0 {
            return Err(PipelineError::Config(
                "neighbor model needs at least one sample per tier".into(),
            ));
        }
        if self.knn == 0 || self.knn > self.samples_per_tier * TIERS {
            return Err(PipelineError::Config(format!(
                "knn must be within 1..={}, got {}",
                self.samples_per_tier * TIERS,
                self.knn
            )));
        }
        Ok(())
    }

    /// Frames between two writes into each memory tier
    pub fn tier_periods(&self) -> [u64; TIERS] {
        let decay = (1.0 - 1.0 / self.history.max(2) as f64).ln();
        let mut covered = 0.0;
        let mut periods = [1u64; TIERS];

        for (period, retention) in periods.iter_mut().zip(TIER_RETENTION) {
            let span = (retention.ln() / decay - covered).max(1.0);
            covered += span;
            *period = ((span / self.samples_per_tier as f64) as u64).max(1);
        }

        periods
    }
}

/// Non-parametric background model
///
/// Each pixel keeps a bounded history of raw samples split into short, mid
/// and long term tiers that are refreshed at increasing intervals. A pixel is
/// background when at least `knn` stored samples lie within the distance
/// threshold of the current value.
pub struct NeighborModel {
    config: NeighborConfig,
    periods: [u64; TIERS],
    dims: Option<(u32, u32)>,
    samples: Vec<[u8; 3]>,
    frames_seen: u64,
}

impl NeighborModel {
    pub fn new(config: NeighborConfig) -> Self {
        let periods = config.tier_periods();
        tracing::debug!("Neighbor model tier periods: {:?}", periods);

        Self {
            config,
            periods,
            dims: None,
            samples: Vec::new(),
            frames_seen: 0,
        }
    }

    pub fn config(&self) -> &NeighborConfig {
        &self.config
    }

    fn samples_per_pixel(&self) -> usize {
        self.config.samples_per_tier * TIERS
    }

    /// Slots written by the current frame, one per tier at most
    fn slots_due(&self) -> [Option<usize>; TIERS] {
        let n = self.config.samples_per_tier;
        let mut slots = [None; TIERS];
        for (tier, (slot, period)) in slots.iter_mut().zip(self.periods).enumerate() {
            if self.frames_seen % period == 0 {
                *slot = Some(tier * n + (self.frames_seen / period) as usize % n);
            }
        }
        slots
    }
}

fn is_background(history: &[[u8; 3]], sample: [f32; 3], config: &NeighborConfig) -> bool {
    let mut neighbors = 0;
    for stored in history {
        let stored = [stored[0] as f32, stored[1] as f32, stored[2] as f32];
        if distance2(stored, sample) < config.dist2_threshold {
            neighbors += 1;
            if neighbors >= config.knn {
                return true;
            }
        }
    }
    false
}

impl BackgroundModel for NeighborModel {
    fn kind(&self) -> ModelKind {
        ModelKind::Neighbor
    }

    fn dimensions(&self) -> Option<(u32, u32)> {
        self.dims
    }

    fn initialize(&mut self, frame: &Frame) {
        let per_pixel = self.samples_per_pixel();
        self.samples.clear();
        self.samples
            .reserve(frame.width() as usize * frame.height() as usize * per_pixel);
        for pixel in frame.pixels() {
            self.samples
                .extend(std::iter::repeat(pixel.0).take(per_pixel));
        }

        self.dims = Some(frame.dimensions());
        self.frames_seen = 1;
    }

    fn classify(&mut self, frame: &Frame) -> ForegroundMask {
        let _span = tracing::debug_span!("knn_apply").entered();

        self.frames_seen += 1;
        let slots = self.slots_due();
        let per_pixel = self.samples_per_pixel();
        let (width, height) = frame.dimensions();
        let mut mask = GrayImage::new(width, height);

        let histories = self.samples.chunks_exact_mut(per_pixel);
        for ((pixel, out), history) in frame.pixels().zip(mask.pixels_mut()).zip(histories) {
            let sample = [pixel[0] as f32, pixel[1] as f32, pixel[2] as f32];
            let background = is_background(history, sample, &self.config);
            out[0] = if background { BACKGROUND } else { FOREGROUND };

            for slot in slots.iter().flatten() {
                history[*slot] = pixel.0;
            }
        }

        mask
    }

    fn reset_state(&mut self) {
        tracing::info!("Resetting neighbor background state");
        self.dims = None;
        self.samples.clear();
        self.frames_seen = 0;
    }
}
