use crate::background::{MixtureConfig, ModelKind, NeighborConfig};
use crate::contours::DEFAULT_PALETTE_SEED;
use crate::error::Result;
use crate::params::Parameters;
use std::time::Duration;

/// Everything needed to build a pipeline
#[derive(Debug, Clone, PartialEq)]
pub struct PipelineConfig {
    pub mixture: MixtureConfig,
    pub neighbor: NeighborConfig,
    /// Initial tuning values
    pub parameters: Parameters,
    /// Model whose mask is cleaned and fed to contour extraction
    pub contour_model: ModelKind,
    pub palette_seed: u64,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            mixture: MixtureConfig::default(),
            neighbor: NeighborConfig::default(),
            parameters: Parameters::default(),
            contour_model: ModelKind::Neighbor,
            palette_seed: DEFAULT_PALETTE_SEED,
        }
    }
}

impl PipelineConfig {
    pub fn validate(&self) -> Result<()> {
        self.mixture.validate()?;
        self.neighbor.validate()?;
        Ok(())
    }
}

/// Frame loop pacing and limits
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoopConfig {
    /// Bounded wait for control input after each frame
    pub wait: Duration,
    /// Stop normally after this many frames
    pub max_frames: Option<u64>,
    /// Frames between two timing reports
    pub stats_interval: u64,
}

impl Default for LoopConfig {
    fn default() -> Self {
        Self {
            wait: Duration::from_millis(30),
            max_frames: None,
            stats_interval: 30,
        }
    }
}
