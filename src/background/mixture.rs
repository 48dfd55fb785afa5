use super::types::{
    distance2, to_sample, BackgroundModel, ForegroundMask, Frame, ModelKind, BACKGROUND,
    FOREGROUND,
};
use crate::error::{PipelineError, Result};
use image::GrayImage;

/// Per-pixel component counts are stored as `u8`
const MAX_COMPONENTS: usize = u8::MAX as usize;

/// Tuning for the Gaussian mixture model
#[derive(Debug, Clone, PartialEq)]
pub struct MixtureConfig {
    /// Number of frames that shape the learning rate
    pub history: u32,
    /// Maximum Gaussian components per pixel
    pub max_components: usize,
    /// Squared Mahalanobis distance for a sample to be explained by a background component
    pub var_threshold: f32,
    /// Squared Mahalanobis distance for a sample to update an existing component
    pub var_threshold_gen: f32,
    /// Cumulative weight fraction that counts as background
    pub background_ratio: f32,
    /// Variance of a freshly created component
    pub var_init: f32,
    pub var_min: f32,
    pub var_max: f32,
    /// Weight decay that prunes rarely used components
    pub complexity_reduction: f32,
}

impl Default for MixtureConfig {
    fn default() -> Self {
        Self {
            history: 500,
            max_components: 5,
            var_threshold: 16.0,
            var_threshold_gen: 9.0,
            background_ratio: 0.9,
            var_init: 15.0,
            var_min: 4.0,
            var_max: 75.0,
            complexity_reduction: 0.05,
        }
    }
}

impl MixtureConfig {
    pub fn validate(&self) -> Result<()> {
        if self.history == 0 {
            return Err(PipelineError::Config("mixture history must be at least 1".into()));
        }
        if self.max_components == 0 || self.max_components > MAX_COMPONENTS {
            return Err(PipelineError::Config(format!(
                "mixture components must be within 1..={}, got {}",
                MAX_COMPONENTS, self.max_components
            )));
        }
        if !(self.var_min > 0.0 && self.var_min <= self.var_init && self.var_init <= self.var_max)
        {
            return Err(PipelineError::Config(format!(
                "mixture variances must satisfy 0 < min <= init <= max, got {} / {} / {}",
                self.var_min, self.var_init, self.var_max
            )));
        }
        if !(0.0..=1.0).contains(&self.background_ratio) {
            return Err(PipelineError::Config(format!(
                "background ratio {} outside [0, 1]",
                self.background_ratio
            )));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, Default)]
struct Component {
    weight: f32,
    variance: f32,
    mean: [f32; 3],
}

/// Adaptive mixture-of-Gaussians background model
///
/// Every pixel keeps up to `max_components` isotropic Gaussians over RGB,
/// sorted by descending weight. The leading components whose weights sum up
/// to `background_ratio` describe the background.
pub struct MixtureModel {
    config: MixtureConfig,
    dims: Option<(u32, u32)>,
    components: Vec<Component>,
    used: Vec<u8>,
    frames_seen: u64,
}

impl MixtureModel {
    pub fn new(config: MixtureConfig) -> Self {
        Self {
            config,
            dims: None,
            components: Vec::new(),
            used: Vec::new(),
            frames_seen: 0,
        }
    }

    pub fn config(&self) -> &MixtureConfig {
        &self.config
    }

    /// Learning rate ramps from fast adaptation to 1/history
    fn learning_rate(&self) -> f32 {
        let span = (2 * self.frames_seen).min(self.config.history as u64).max(1);
        1.0 / span as f32
    }
}

/// Update the components of one pixel with `sample`
///
/// Returns true when the sample is explained by the background.
fn update_pixel(
    components: &mut [Component],
    used: &mut u8,
    sample: [f32; 3],
    alpha: f32,
    config: &MixtureConfig,
) -> bool {
    let decay = 1.0 - alpha;
    let prune = alpha * config.complexity_reduction;
    let mut count = *used as usize;
    let mut matched = false;
    let mut background = false;
    let mut cumulative = 0.0f32;

    for component in components[..count].iter_mut() {
        component.weight = decay * component.weight - prune;

        if !matched {
            let dist2 = distance2(component.mean, sample);
            if cumulative < config.background_ratio
                && dist2 < config.var_threshold * component.variance
            {
                background = true;
            }

            if dist2 < config.var_threshold_gen * component.variance {
                matched = true;
                component.weight += alpha;
                let k = alpha / component.weight;
                for (mean, value) in component.mean.iter_mut().zip(sample) {
                    *mean += k * (value - *mean);
                }
                component.variance = (component.variance + k * (dist2 - component.variance))
                    .clamp(config.var_min, config.var_max);
            }
        }

        cumulative += component.weight;
    }

    // Drop components whose weight decayed away
    let mut kept = 0;
    for idx in 0..count {
        if components[idx].weight >= prune {
            components[kept] = components[idx];
            kept += 1;
        }
    }
    count = kept;

    if !matched {
        let slot = if count == components.len() {
            count - 1
        } else {
            count += 1;
            count - 1
        };
        components[slot] = Component {
            weight: if count == 1 { 1.0 } else { alpha },
            variance: config.var_init,
            mean: sample,
        };
    }

    // Insertion sort by descending weight, at most a handful of entries
    for i in 1..count {
        let mut j = i;
        while j > 0 && components[j].weight > components[j - 1].weight {
            components.swap(j, j - 1);
            j -= 1;
        }
    }

    let total: f32 = components[..count].iter().map(|c| c.weight).sum();
    if total > 0.0 {
        for component in components[..count].iter_mut() {
            component.weight /= total;
        }
    }

    *used = count as u8;
    background
}

impl BackgroundModel for MixtureModel {
    fn kind(&self) -> ModelKind {
        ModelKind::Mixture
    }

    fn dimensions(&self) -> Option<(u32, u32)> {
        self.dims
    }

    fn initialize(&mut self, frame: &Frame) {
        let k = self.config.max_components;
        let pixel_count = frame.width() as usize * frame.height() as usize;

        self.components.clear();
        self.components.resize(pixel_count * k, Component::default());
        self.used.clear();
        self.used.resize(pixel_count, 1);

        for (idx, pixel) in frame.pixels().enumerate() {
            self.components[idx * k] = Component {
                weight: 1.0,
                variance: self.config.var_init,
                mean: to_sample(pixel),
            };
        }

        self.dims = Some(frame.dimensions());
        self.frames_seen = 1;
    }

    fn classify(&mut self, frame: &Frame) -> ForegroundMask {
        let _span = tracing::debug_span!("mog2_apply").entered();

        self.frames_seen += 1;
        let alpha = self.learning_rate();
        let k = self.config.max_components;
        let (width, height) = frame.dimensions();
        let mut mask = GrayImage::new(width, height);

        let components = self.components.chunks_exact_mut(k);
        let used = self.used.iter_mut();
        for (((pixel, out), components), used) in
            frame.pixels().zip(mask.pixels_mut()).zip(components).zip(used)
        {
            let background = update_pixel(components, used, to_sample(pixel), alpha, &self.config);
            out[0] = if background { BACKGROUND } else { FOREGROUND };
        }

        mask
    }

    fn reset_state(&mut self) {
        tracing::info!("Resetting mixture background state");
        self.dims = None;
        self.components.clear();
        self.used.clear();
        self.frames_seen = 0;
    }
}
