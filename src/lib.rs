pub mod background;
pub mod capture;
pub mod cleaning;
pub mod config;
pub mod contours;
pub mod control;
pub mod error;
pub mod output;
pub mod params;
pub mod pipeline;

pub use background::{BackgroundModel, ForegroundMask, Frame, ModelKind};
pub use cleaning::{MaskCleaner, StructuringElement};
pub use config::{LoopConfig, PipelineConfig};
pub use contours::{Contour, ContourExtractor, ContourHierarchy, ContourPalette};
pub use error::{PipelineError, Result};
pub use params::{ParameterStore, Parameters};
pub use pipeline::{FrameLoop, FrameOutputs, LoopState, PipelineContext, RunSummary};
