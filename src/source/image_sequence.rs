/// Image-directory frame source
///
/// Replays a recorded session stored as one image per frame. Files are
/// ordered by name and decoded lazily, one per poll.
use std::fs;
use std::path::{Path, PathBuf};

use super::{FramePoll, FrameSource};
use crate::error::SourceError;
use crate::frame::Frame;

const FRAME_EXTENSIONS: [&str; 3] = ["png", "jpg", "jpeg"];

pub struct ImageSequenceSource {
    files: Vec<PathBuf>,
    cursor: usize,
    fps: f64,
    name: String,
}

impl ImageSequenceSource {
    /// Index every frame image in `dir`
    ///
    /// `fps` is the capture rate used to derive each frame's playback clock.
    pub fn open(dir: impl AsRef<Path>, fps: f64) -> Result<Self, SourceError> {
        let dir = dir.as_ref();
        let entries = fs::read_dir(dir).map_err(|source| SourceError::OpenFailed {
            path: dir.display().to_string(),
            source,
        })?;

        let mut files: Vec<PathBuf> = entries
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|path| path.is_file() && is_frame_image(path))
            .collect();
        files.sort();

        if files.is_empty() {
            return Err(SourceError::Empty(dir.display().to_string()));
        }

        let name = dir
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| dir.display().to_string());

        tracing::info!(
            "Image sequence {}: {} frames at {:.1} fps",
            dir.display(),
            files.len(),
            fps
        );

        Ok(Self {
            files,
            cursor: 0,
            fps: if fps > 0.0 { fps } else { 30.0 },
            name,
        })
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }
}

fn is_frame_image(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| FRAME_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str()))
        .unwrap_or(false)
}

impl FrameSource for ImageSequenceSource {
    fn next_frame(&mut self) -> Result<FramePoll, SourceError> {
        let Some(path) = self.files.get(self.cursor) else {
            return Ok(FramePoll::Ended);
        };

        let image = image::open(path)
            .map_err(|source| SourceError::DecodeFailed {
                path: path.display().to_string(),
                source,
            })?
            .to_rgb8();

        let sequence = self.cursor as u64;
        let msec = sequence as f64 * 1000.0 / self.fps;
        self.cursor += 1;

        Ok(FramePoll::Ready(Frame::new(image, sequence).with_msec(msec)))
    }

    fn source_name(&self) -> Option<String> {
        Some(self.name.clone())
    }
}
