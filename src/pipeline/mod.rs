mod frame_loop;

pub use frame_loop::{FrameLoop, LoopState, RunSummary};

use crate::background::{create_model, BackgroundModel, ForegroundMask, Frame, ModelKind};
use crate::cleaning::MaskCleaner;
use crate::config::PipelineConfig;
use crate::contours::{render_contours, ContourExtractor, ContourHierarchy, ContourPalette};
use crate::error::Result;
use crate::params::{ParameterStore, Parameters};
use image::{Rgb, RgbImage};
use std::time::{Duration, Instant};

/// Time spent in each stage of one frame
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct StageTimings {
    pub model: Duration,
    pub clean: Duration,
    pub extract: Duration,
    pub render: Duration,
}

impl std::ops::AddAssign for StageTimings {
    fn add_assign(&mut self, rhs: Self) {
        self.model += rhs.model;
        self.clean += rhs.clean;
        self.extract += rhs.extract;
        self.render += rhs.render;
    }
}

/// Everything one frame produced
pub struct FrameOutputs {
    /// Raw masks of every model, in update order
    pub masks: Vec<(ModelKind, ForegroundMask)>,
    /// Closed mask of the contour model
    pub cleaned: ForegroundMask,
    pub contours: ContourHierarchy,
    pub colors: Vec<Rgb<u8>>,
    /// Contours drawn on a black canvas
    pub overlay: RgbImage,
    /// Parameters this frame was processed with
    pub parameters: Parameters,
    pub timings: StageTimings,
}

impl FrameOutputs {
    pub fn mask(&self, kind: ModelKind) -> Option<&ForegroundMask> {
        self.masks
            .iter()
            .find(|(k, _)| *k == kind)
            .map(|(_, mask)| mask)
    }
}

/// State that lives across frames
///
/// Both background models, the tuning parameters, the cached structuring
/// element and the palette generator. Only the frame loop mutates it, one
/// frame at a time.
pub struct PipelineContext {
    parameters: ParameterStore,
    models: Vec<Box<dyn BackgroundModel>>,
    contour_model: ModelKind,
    cleaner: MaskCleaner,
    extractor: ContourExtractor,
    palette: ContourPalette,
    frames_processed: u64,
}

impl PipelineContext {
    pub fn new(config: &PipelineConfig) -> Result<Self> {
        config.validate()?;

        let models = [ModelKind::Mixture, ModelKind::Neighbor]
            .into_iter()
            .map(|kind| create_model(kind, &config.mixture, &config.neighbor))
            .collect();

        tracing::info!(
            "Pipeline ready: contour model={}, edge_threshold={}, kernel_size={}",
            config.contour_model,
            config.parameters.edge_threshold,
            config.parameters.kernel_size
        );

        Ok(Self {
            parameters: ParameterStore::new(config.parameters),
            models,
            contour_model: config.contour_model,
            cleaner: MaskCleaner::new(),
            extractor: ContourExtractor::default(),
            palette: ContourPalette::new(config.palette_seed),
            frames_processed: 0,
        })
    }

    pub fn parameters(&self) -> &ParameterStore {
        &self.parameters
    }

    pub fn parameters_mut(&mut self) -> &mut ParameterStore {
        &mut self.parameters
    }

    pub fn contour_model(&self) -> ModelKind {
        self.contour_model
    }

    pub fn frames_processed(&self) -> u64 {
        self.frames_processed
    }

    /// Forget the learned background of every model
    pub fn reset_models(&mut self) {
        for model in &mut self.models {
            model.reset_state();
        }
    }

    /// Run one frame through update, clean, extract and render, in that order
    ///
    /// Parameter changes staged before the call take effect here.
    pub fn process(&mut self, frame: &Frame) -> FrameOutputs {
        let _span = tracing::debug_span!("frame", index = self.frames_processed + 1).entered();

        self.parameters.commit();
        let parameters = self.parameters.current();
        let mut timings = StageTimings::default();

        let model_start = Instant::now();
        let masks: Vec<(ModelKind, ForegroundMask)> = self
            .models
            .iter_mut()
            .map(|model| (model.kind(), model.apply(frame)))
            .collect();
        timings.model = model_start.elapsed();

        let clean_start = Instant::now();
        let (width, height) = frame.dimensions();
        let mut cleaned = masks
            .iter()
            .find(|(kind, _)| *kind == self.contour_model)
            .map(|(_, mask)| mask.clone())
            .unwrap_or_else(|| crate::background::empty_mask(width, height));
        self.cleaner
            .clean(&mut cleaned, parameters.kernel_size as i32);
        timings.clean = clean_start.elapsed();

        let extract_start = Instant::now();
        let contours = self.extractor.extract(&cleaned, parameters.edge_threshold);
        timings.extract = extract_start.elapsed();

        let render_start = Instant::now();
        let colors = self.palette.assign(&contours);
        let overlay = render_contours(&contours, &colors, width, height);
        timings.render = render_start.elapsed();

        self.frames_processed += 1;

        FrameOutputs {
            masks,
            cleaned,
            contours,
            colors,
            overlay,
            parameters,
            timings,
        }
    }
}
