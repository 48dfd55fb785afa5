mod sequence;
#[cfg(feature = "camera")]
mod v4l_capture;

pub use sequence::ImageSequenceSource;
#[cfg(feature = "camera")]
pub use v4l_capture::WebcamCapture;

use crate::background::Frame;
use crate::error::Result;
use std::ops::{Deref, DerefMut};
use std::path::PathBuf;

/// Trait for frame sources
pub trait CaptureSource {
    /// Read the next frame, `None` once the stream is exhausted
    fn read_frame(&mut self) -> Result<Option<Frame>>;

    /// Release the underlying device or files
    ///
    /// Must be safe to call more than once.
    fn release(&mut self);

    /// Human readable name for logs
    fn describe(&self) -> String;
}

impl<C: CaptureSource + ?Sized> CaptureSource for Box<C> {
    fn read_frame(&mut self) -> Result<Option<Frame>> {
        (**self).read_frame()
    }

    fn release(&mut self) {
        (**self).release()
    }

    fn describe(&self) -> String {
        (**self).describe()
    }
}

/// Where frames come from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceSpec {
    /// Live camera by device index
    Camera(u32),
    /// Still frames on disk
    File(PathBuf),
}

/// Open the requested frame source
pub fn open_source(source: &SourceSpec) -> Result<Box<dyn CaptureSource>> {
    match source {
        SourceSpec::File(path) => Ok(Box::new(ImageSequenceSource::open(path)?)),
        #[cfg(feature = "camera")]
        SourceSpec::Camera(index) => Ok(Box::new(WebcamCapture::new(*index)?)),
        #[cfg(not(feature = "camera"))]
        SourceSpec::Camera(index) => Err(crate::error::PipelineError::SourceUnavailable {
            source_name: format!("camera {}", index),
            reason: "built without the `camera` feature".into(),
        }),
    }
}

/// Owns a capture source and releases it when dropped
///
/// Release happens on every exit path of the frame loop, including errors.
pub struct ScopedCapture<C: CaptureSource> {
    source: C,
    released: bool,
}

impl<C: CaptureSource> ScopedCapture<C> {
    pub fn new(source: C) -> Self {
        Self {
            source,
            released: false,
        }
    }

    /// Release the source now instead of on drop
    pub fn release(&mut self) {
        if !self.released {
            tracing::debug!("Releasing capture source {}", self.source.describe());
            self.source.release();
            self.released = true;
        }
    }
}

impl<C: CaptureSource> Deref for ScopedCapture<C> {
    type Target = C;

    fn deref(&self) -> &C {
        &self.source
    }
}

impl<C: CaptureSource> DerefMut for ScopedCapture<C> {
    fn deref_mut(&mut self) -> &mut C {
        &mut self.source
    }
}

impl<C: CaptureSource> Drop for ScopedCapture<C> {
    fn drop(&mut self) {
        self.release();
    }
}
