#![allow(dead_code)]

use image::{Rgb, RgbImage};
use motdet::capture::CaptureSource;
use motdet::output::{DisplaySink, Window};
use motdet::{PipelineError, Result};
use std::cell::Cell;
use std::collections::VecDeque;
use std::rc::Rc;

pub const BACKGROUND_COLOR: Rgb<u8> = Rgb([40, 40, 40]);
pub const OBJECT_COLOR: Rgb<u8> = Rgb([220, 200, 180]);

/// Axis-aligned rectangle as (x, y, width, height)
pub type Shape = (u32, u32, u32, u32);

/// Uniform background with the given rectangles painted on top
pub fn scene(width: u32, height: u32, shapes: &[Shape]) -> RgbImage {
    RgbImage::from_fn(width, height, |x, y| {
        let inside = shapes
            .iter()
            .any(|&(x0, y0, w, h)| x >= x0 && x < x0 + w && y >= y0 && y < y0 + h);
        if inside {
            OBJECT_COLOR
        } else {
            BACKGROUND_COLOR
        }
    })
}

/// Static scene with a deterministic texture
pub fn textured_scene(width: u32, height: u32) -> RgbImage {
    RgbImage::from_fn(width, height, |x, y| {
        let v = ((x * 37 + y * 91) % 160) as u8 + 40;
        Rgb([v, v / 2 + 20, 255 - v])
    })
}

/// Two rectangles moving towards each other, `step` frames after they appeared
pub fn moving_shapes(step: u32) -> Vec<Shape> {
    vec![(8 + 6 * step, 10, 16, 12), (90 - 6 * step, 60, 16, 12)]
}

enum Scripted {
    Frame(RgbImage),
    Fail,
}

/// In-memory capture source that records whether it was released
pub struct ScriptedSource {
    items: VecDeque<Scripted>,
    read: u64,
    released: Rc<Cell<bool>>,
}

impl ScriptedSource {
    pub fn new(frames: Vec<RgbImage>) -> Self {
        Self {
            items: frames.into_iter().map(Scripted::Frame).collect(),
            read: 0,
            released: Rc::new(Cell::new(false)),
        }
    }

    /// Append a read failure after the scripted frames
    pub fn failing_after(mut self) -> Self {
        self.items.push_back(Scripted::Fail);
        self
    }

    pub fn released_flag(&self) -> Rc<Cell<bool>> {
        Rc::clone(&self.released)
    }
}

impl CaptureSource for ScriptedSource {
    fn read_frame(&mut self) -> Result<Option<RgbImage>> {
        assert!(!self.released.get(), "read after release");
        match self.items.pop_front() {
            Some(Scripted::Frame(frame)) => {
                self.read += 1;
                Ok(Some(frame))
            }
            Some(Scripted::Fail) => Err(PipelineError::FrameRead {
                frame: self.read,
                reason: "device unplugged".into(),
            }),
            None => Ok(None),
        }
    }

    fn release(&mut self) {
        self.released.set(true);
    }

    fn describe(&self) -> String {
        "scripted".into()
    }
}

/// Sink that keeps every image it was shown
#[derive(Default)]
pub struct RecordingSink {
    pub shown: Vec<(Window, u64, RgbImage)>,
}

impl RecordingSink {
    pub fn window(&self, window: Window) -> Vec<&RgbImage> {
        self.shown
            .iter()
            .filter(|(w, _, _)| *w == window)
            .map(|(_, _, image)| image)
            .collect()
    }
}

impl DisplaySink for RecordingSink {
    fn show(&mut self, window: Window, frame: u64, image: &RgbImage) -> Result<()> {
        self.shown.push((window, frame, image.clone()));
        Ok(())
    }
}
