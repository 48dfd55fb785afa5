use super::CaptureSource;
use crate::background::Frame;
use crate::error::{PipelineError, Result};
use std::path::{Path, PathBuf};

const FRAME_EXTENSIONS: [&str; 8] = ["png", "jpg", "jpeg", "bmp", "ppm", "pgm", "tif", "tiff"];

/// Plays back still frames from disk
///
/// `path` is either a directory, whose image files are played in lexical
/// order, or a single image played as a one-frame stream.
pub struct ImageSequenceSource {
    root: PathBuf,
    frames: Vec<PathBuf>,
    position: usize,
    released: bool,
}

fn is_frame_file(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| FRAME_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str()))
        .unwrap_or(false)
}

impl ImageSequenceSource {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let root = path.as_ref().to_path_buf();
        let unavailable = |reason: String| PipelineError::SourceUnavailable {
            source_name: root.display().to_string(),
            reason,
        };

        tracing::info!("Opening frame sequence at {}", root.display());

        let frames = if root.is_dir() {
            let entries = std::fs::read_dir(&root).map_err(|e| unavailable(e.to_string()))?;
            let mut frames = Vec::new();
            for entry in entries {
                let path = entry.map_err(|e| unavailable(e.to_string()))?.path();
                if path.is_file() && is_frame_file(&path) {
                    frames.push(path);
                }
            }
            frames.sort();
            frames
        } else if root.is_file() {
            vec![root.clone()]
        } else {
            return Err(unavailable("no such file or directory".into()));
        };

        if frames.is_empty() {
            return Err(unavailable("directory holds no image frames".into()));
        }

        tracing::info!("Frame sequence opened with {} frames", frames.len());

        Ok(Self {
            root,
            frames,
            position: 0,
            released: false,
        })
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }
}

impl CaptureSource for ImageSequenceSource {
    fn read_frame(&mut self) -> Result<Option<Frame>> {
        if self.released {
            return Err(PipelineError::FrameRead {
                frame: self.position as u64,
                reason: "source already released".into(),
            });
        }

        let Some(path) = self.frames.get(self.position) else {
            return Ok(None);
        };

        let frame = image::open(path).map_err(|e| PipelineError::FrameRead {
            frame: self.position as u64,
            reason: format!("{}: {}", path.display(), e),
        })?;
        self.position += 1;

        Ok(Some(frame.to_rgb8()))
    }

    fn release(&mut self) {
        if !self.released {
            tracing::info!("Releasing frame sequence {}", self.root.display());
            self.released = true;
        }
    }

    fn describe(&self) -> String {
        format!("sequence {}", self.root.display())
    }
}
