use thiserror::Error;

/// Errors raised by the motion-detection pipeline and its collaborators
#[derive(Debug, Error)]
pub enum PipelineError {
    /// Invalid command line or configuration values
    #[error("invalid configuration: {0}")]
    Config(String),

    /// The capture source could not be opened
    #[error("capture source {source_name} unavailable: {reason}")]
    SourceUnavailable { source_name: String, reason: String },

    /// A frame could not be read from an open source
    #[error("failed to read frame {frame}: {reason}")]
    FrameRead { frame: u64, reason: String },

    /// The source ran out of frames
    #[error("capture stream ended after {frame} frames")]
    EndOfStream { frame: u64 },

    /// Frame size differs from the size the background state was built for
    #[error("frame is {}x{} but background state is {}x{}", .actual.0, .actual.1, .expected.0, .expected.1)]
    DimensionMismatch {
        expected: (u32, u32),
        actual: (u32, u32),
    },

    /// A display sink rejected an image
    #[error("failed to show {window}: {reason}")]
    Display { window: String, reason: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Image(#[from] image::ImageError),
}

impl PipelineError {
    /// Whether the pipeline can continue after this error
    pub fn is_recoverable(&self) -> bool {
        matches!(self, PipelineError::DimensionMismatch { .. })
    }
}

pub type Result<T> = std::result::Result<T, PipelineError>;
