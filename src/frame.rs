/// Captured frame type
///
/// Frames are fixed-layout RGB rasters. The pixel buffer is shared behind an
/// `Arc` so the engine can hold on to a frame while matchers read it without
/// copying pixels.
use std::sync::Arc;

use image::{Rgb, RgbImage};

#[derive(Clone)]
pub struct Frame {
    image: Arc<RgbImage>,
    /// Position of this frame in the source's capture order
    pub sequence: u64,
    /// Playback position in milliseconds, if the source knows it
    pub msec: Option<f64>,
}

impl std::fmt::Debug for Frame {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Frame")
            .field("sequence", &self.sequence)
            .field("msec", &self.msec)
            .field("size", &self.image.dimensions())
            .finish()
    }
}

impl Frame {
    pub fn new(image: RgbImage, sequence: u64) -> Self {
        Self {
            image: Arc::new(image),
            sequence,
            msec: None,
        }
    }

    /// Uniformly colored frame, handy for synthetic sources
    pub fn solid(width: u32, height: u32, color: [u8; 3], sequence: u64) -> Self {
        Self::new(RgbImage::from_pixel(width, height, Rgb(color)), sequence)
    }

    pub fn with_msec(mut self, msec: f64) -> Self {
        self.msec = Some(msec);
        self
    }

    pub fn image(&self) -> &RgbImage {
        &self.image
    }

    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }

    pub fn dimensions(&self) -> (u32, u32) {
        self.image.dimensions()
    }
}
