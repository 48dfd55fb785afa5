use super::{DisplaySink, Window};
use crate::error::{PipelineError, Result};
use image::RgbImage;
use std::path::{Path, PathBuf};

/// Writes every `every`-th frame of each window as PNG under `<root>/<window>/`
pub struct SnapshotSink {
    root: PathBuf,
    every: u64,
}

impl SnapshotSink {
    pub fn new<P: AsRef<Path>>(root: P, every: u64) -> Result<Self> {
        let root = root.as_ref().to_path_buf();
        if every == 0 {
            return Err(PipelineError::Config("snapshot interval must be at least 1".into()));
        }

        for window in Window::ALL {
            std::fs::create_dir_all(root.join(window.slug()))?;
        }
        tracing::info!("Writing snapshots every {} frames to {}", every, root.display());

        Ok(Self { root, every })
    }

    pub fn path_for(&self, window: Window, frame: u64) -> PathBuf {
        self.root
            .join(window.slug())
            .join(format!("{:06}.png", frame))
    }
}

impl DisplaySink for SnapshotSink {
    fn show(&mut self, window: Window, frame: u64, image: &RgbImage) -> Result<()> {
        if frame % self.every != 0 {
            return Ok(());
        }

        let path = self.path_for(window, frame);
        image.save(&path).map_err(|e| PipelineError::Display {
            window: window.to_string(),
            reason: format!("{}: {}", path.display(), e),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgb;

    #[test]
    fn writes_only_selected_frames() {
        let dir = tempfile::tempdir().unwrap();
        let mut sink = SnapshotSink::new(dir.path(), 2).unwrap();
        let image = RgbImage::from_pixel(4, 4, Rgb([10, 20, 30]));

        for frame in 1..=4 {
            sink.show(Window::Contours, frame, &image).unwrap();
        }

        assert!(!sink.path_for(Window::Contours, 1).exists());
        assert!(sink.path_for(Window::Contours, 2).exists());
        assert!(sink.path_for(Window::Contours, 4).exists());

        let reloaded = image::open(sink.path_for(Window::Contours, 4)).unwrap().to_rgb8();
        assert_eq!(reloaded, image);
    }

    #[test]
    fn zero_interval_is_a_config_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(
            SnapshotSink::new(dir.path(), 0),
            Err(PipelineError::Config(_))
        ));
    }
}
