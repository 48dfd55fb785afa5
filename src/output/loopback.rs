use super::{DisplaySink, Window};
use crate::error::{PipelineError, Result};
use image::RgbImage;
use std::fs::File;
use std::io::Write;
use std::path::Path;

/// Streams one window to a v4l2loopback device as raw YUYV frames
///
/// The device dictates the frame size; images of another size are resized.
pub struct LoopbackSink {
    file: File,
    window: Window,
    width: u32,
    height: u32,
}

impl LoopbackSink {
    pub fn new<P: AsRef<Path>>(device_path: P, window: Window, width: u32, height: u32) -> Result<Self> {
        let path = device_path.as_ref();
        tracing::info!(
            "Opening v4l2loopback device at {} for {} ({}x{})",
            path.display(),
            window,
            width,
            height
        );

        // v4l2loopback accepts raw frame data written to the device file
        let file = File::options()
            .write(true)
            .open(path)
            .map_err(|e| PipelineError::Display {
                window: window.to_string(),
                reason: format!("cannot open {}: {}", path.display(), e),
            })?;

        Ok(Self {
            file,
            window,
            width,
            height,
        })
    }
}

/// Pack RGB pixels as YUV 4:2:2, two pixels per Y0 U Y1 V quad
///
/// An odd last pixel of a row is paired with itself.
pub fn rgb_to_yuyv(rgb_image: &RgbImage) -> Vec<u8> {
    let stride = rgb_image.width() as usize * 3;
    if stride == 0 {
        return Vec::new();
    }

    rgb_image
        .as_raw()
        .chunks_exact(stride)
        .flat_map(|row| row.chunks(6))
        .flat_map(|pair| {
            let left = Yuv::from_rgb(&pair[..3]);
            let right = pair.get(3..6).map_or(left, Yuv::from_rgb);
            [left.y, average(left.u, right.u), right.y, average(left.v, right.v)]
        })
        .collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Yuv {
    y: u8,
    u: u8,
    v: u8,
}

impl Yuv {
    /// Analog BT.601 weights, chroma offset to 128
    fn from_rgb(rgb: &[u8]) -> Self {
        let [r, g, b] = [rgb[0], rgb[1], rgb[2]].map(f32::from);
        let channel = |value: f32| value.clamp(0.0, 255.0) as u8;

        Self {
            y: channel(0.299 * r + 0.587 * g + 0.114 * b),
            u: channel(-0.147 * r - 0.289 * g + 0.436 * b + 128.0),
            v: channel(0.615 * r - 0.515 * g - 0.100 * b + 128.0),
        }
    }
}

fn average(a: u8, b: u8) -> u8 {
    ((a as u16 + b as u16) / 2) as u8
}

impl DisplaySink for LoopbackSink {
    fn show(&mut self, window: Window, _frame: u64, image: &RgbImage) -> Result<()> {
        if window != self.window {
            return Ok(());
        }

        let yuyv = if image.dimensions() != (self.width, self.height) {
            let resized = image::imageops::resize(
                image,
                self.width,
                self.height,
                image::imageops::FilterType::Triangle,
            );
            rgb_to_yuyv(&resized)
        } else {
            rgb_to_yuyv(image)
        };

        self.file
            .write_all(&yuyv)
            .map_err(|e| PipelineError::Display {
                window: window.to_string(),
                reason: e.to_string(),
            })
    }
}
