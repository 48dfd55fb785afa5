use super::CaptureSource;
use crate::background::Frame;
use crate::error::{PipelineError, Result};
use image::imageops::{self, FilterType};
use nokhwa::pixel_format::RgbFormat;
use nokhwa::utils::{CameraIndex, RequestedFormat, RequestedFormatType};
use nokhwa::Camera;

/// Live camera source
///
/// Cameras deliver high resolution frames, so every frame is halved in both
/// dimensions before it enters the pipeline.
pub struct WebcamCapture {
    camera: Camera,
    index: u32,
    frames_read: u64,
    released: bool,
}

impl WebcamCapture {
    pub fn new(device_index: u32) -> Result<Self> {
        tracing::info!("Initializing webcam {}", device_index);

        let unavailable = |reason: String| PipelineError::SourceUnavailable {
            source_name: format!("camera {}", device_index),
            reason,
        };

        let index = CameraIndex::Index(device_index);
        let requested =
            RequestedFormat::new::<RgbFormat>(RequestedFormatType::AbsoluteHighestResolution);

        let mut camera = Camera::new(index, requested).map_err(|e| unavailable(e.to_string()))?;
        camera
            .open_stream()
            .map_err(|e| unavailable(e.to_string()))?;

        tracing::info!("Webcam initialized successfully");

        Ok(Self {
            camera,
            index: device_index,
            frames_read: 0,
            released: false,
        })
    }
}

impl CaptureSource for WebcamCapture {
    fn read_frame(&mut self) -> Result<Option<Frame>> {
        let read_error = |reason: String| PipelineError::FrameRead {
            frame: self.frames_read,
            reason,
        };

        let buffer = self
            .camera
            .frame()
            .map_err(|e| read_error(e.to_string()))?;
        let decoded = buffer
            .decode_image::<RgbFormat>()
            .map_err(|e| read_error(e.to_string()))?;

        // Rebuild from raw bytes so the camera crate's image version does not leak in
        let (width, height) = (decoded.width(), decoded.height());
        let frame = Frame::from_raw(width, height, decoded.into_raw())
            .ok_or_else(|| read_error("frame buffer smaller than its dimensions".into()))?;

        self.frames_read += 1;
        let halved = imageops::resize(
            &frame,
            (width / 2).max(1),
            (height / 2).max(1),
            FilterType::Triangle,
        );

        Ok(Some(halved))
    }

    fn release(&mut self) {
        if self.released {
            return;
        }
        tracing::info!("Releasing webcam {}", self.index);
        if let Err(e) = self.camera.stop_stream() {
            tracing::warn!("Failed to stop camera stream: {}", e);
        }
        self.released = true;
    }

    fn describe(&self) -> String {
        format!("camera {}", self.index)
    }
}
