mod label;
mod loopback;
mod snapshot;

pub use label::stamp_frame_number;
pub use loopback::LoopbackSink;
pub use snapshot::SnapshotSink;

use crate::error::Result;
use image::{GrayImage, Rgb, RgbImage};
use std::fmt;

/// Views the pipeline publishes every frame
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, clap::ValueEnum)]
pub enum Window {
    /// Captured frame
    Source,
    /// Cleaned foreground mask
    CleanedMask,
    /// Contour overlay
    Contours,
}

impl Window {
    pub const ALL: [Window; 3] = [Window::Source, Window::CleanedMask, Window::Contours];

    pub fn title(&self) -> &'static str {
        match self {
            Window::Source => "Source",
            Window::CleanedMask => "FG Mask",
            Window::Contours => "Contours",
        }
    }

    /// Filesystem friendly name
    pub fn slug(&self) -> &'static str {
        match self {
            Window::Source => "source",
            Window::CleanedMask => "mask",
            Window::Contours => "contours",
        }
    }
}

impl fmt::Display for Window {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.title())
    }
}

/// Trait for display destinations
pub trait DisplaySink {
    /// Present `image` in `window` for frame number `frame`
    fn show(&mut self, window: Window, frame: u64, image: &RgbImage) -> Result<()>;
}

impl<S: DisplaySink + ?Sized> DisplaySink for Box<S> {
    fn show(&mut self, window: Window, frame: u64, image: &RgbImage) -> Result<()> {
        (**self).show(window, frame, image)
    }
}

/// Discards everything
#[derive(Debug, Default, Clone, Copy)]
pub struct NullSink;

impl DisplaySink for NullSink {
    fn show(&mut self, _window: Window, _frame: u64, _image: &RgbImage) -> Result<()> {
        Ok(())
    }
}

/// Forwards every image to each contained sink in order
#[derive(Default)]
pub struct SinkSet {
    sinks: Vec<Box<dyn DisplaySink>>,
}

impl SinkSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push<S: DisplaySink + 'static>(&mut self, sink: S) {
        self.sinks.push(Box::new(sink));
    }

    pub fn len(&self) -> usize {
        self.sinks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sinks.is_empty()
    }
}

impl DisplaySink for SinkSet {
    fn show(&mut self, window: Window, frame: u64, image: &RgbImage) -> Result<()> {
        for sink in &mut self.sinks {
            sink.show(window, frame, image)?;
        }
        Ok(())
    }
}

/// Convert a mask to a grayscale RGB image for display
pub fn mask_to_rgb(mask: &GrayImage) -> RgbImage {
    RgbImage::from_fn(mask.width(), mask.height(), |x, y| {
        let value = mask.get_pixel(x, y)[0];
        Rgb([value, value, value])
    })
}
