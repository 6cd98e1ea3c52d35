/// Color probes
///
/// A probe averages the pixels of a normalized frame region and compares
/// the mean with an expected color. Regions are fractions of the frame so
/// one layout works at any capture resolution.
use image::RgbImage;
use serde::{Deserialize, Serialize};

use crate::error::MatcherError;

/// Frame region as fractions (0.0-1.0) of width and height
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Region {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Region {
    pub const fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Non-empty and inside the unit square
    pub fn is_valid(&self) -> bool {
        self.width > 0.0
            && self.height > 0.0
            && self.x >= 0.0
            && self.y >= 0.0
            && self.x + self.width <= 1.0 + f32::EPSILON
            && self.y + self.height <= 1.0 + f32::EPSILON
    }

    /// Pixel rectangle `(x, y, width, height)` for a frame of the given size
    ///
    /// Always at least one pixel wide and high when the region is valid.
    pub fn to_pixels(&self, frame_width: u32, frame_height: u32) -> Option<(u32, u32, u32, u32)> {
        if !self.is_valid() || frame_width == 0 || frame_height == 0 {
            return None;
        }

        let x = ((self.x * frame_width as f32) as u32).min(frame_width - 1);
        let y = ((self.y * frame_height as f32) as u32).min(frame_height - 1);
        let width = ((self.width * frame_width as f32).round() as u32)
            .clamp(1, frame_width - x);
        let height = ((self.height * frame_height as f32).round() as u32)
            .clamp(1, frame_height - y);

        Some((x, y, width, height))
    }
}

/// Expected color inside a region
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColorProbe {
    pub region: Region,
    pub color: [u8; 3],
    /// Maximum Euclidean RGB distance between mean and expected color
    pub tolerance: f32,
}

impl ColorProbe {
    pub fn new(region: Region, color: [u8; 3], tolerance: f32) -> Self {
        Self {
            region,
            color,
            tolerance,
        }
    }

    /// Mean RGB of the probed region
    pub fn mean_color(&self, image: &RgbImage, matcher: &'static str) -> Result<[f32; 3], MatcherError> {
        let (x, y, width, height) = self
            .region
            .to_pixels(image.width(), image.height())
            .ok_or_else(|| MatcherError::Region {
                matcher,
                reason: format!("{:?} does not fit a {:?} frame", self.region, image.dimensions()),
            })?;

        let mut sum = [0u64; 3];
        for py in y..y + height {
            for px in x..x + width {
                let pixel = image.get_pixel(px, py);
                for (acc, value) in sum.iter_mut().zip(pixel.0) {
                    *acc += value as u64;
                }
            }
        }

        let count = (width as u64 * height as u64) as f32;
        Ok([
            sum[0] as f32 / count,
            sum[1] as f32 / count,
            sum[2] as f32 / count,
        ])
    }

    /// Distance between the region's mean color and the expected color
    pub fn distance(&self, image: &RgbImage, matcher: &'static str) -> Result<f32, MatcherError> {
        let mean = self.mean_color(image, matcher)?;
        Ok(color_distance(mean, self.color))
    }

    pub fn matches(&self, image: &RgbImage, matcher: &'static str) -> Result<bool, MatcherError> {
        Ok(self.distance(image, matcher)? <= self.tolerance)
    }
}

pub fn color_distance(mean: [f32; 3], expected: [u8; 3]) -> f32 {
    mean.iter()
        .zip(expected)
        .map(|(m, e)| (m - e as f32).powi(2))
        .sum::<f32>()
        .sqrt()
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgb;

    fn half_red_image() -> RgbImage {
        // Left half red, right half blue
        RgbImage::from_fn(10, 10, |x, _| {
            if x < 5 {
                Rgb([255, 0, 0])
            } else {
                Rgb([0, 0, 255])
            }
        })
    }

    #[test]
    fn test_region_to_pixels() {
        let region = Region::new(0.5, 0.0, 0.5, 1.0);
        assert_eq!(region.to_pixels(10, 10), Some((5, 0, 5, 10)));

        // Tiny regions still cover one pixel
        let region = Region::new(0.0, 0.0, 0.01, 0.01);
        assert_eq!(region.to_pixels(10, 10), Some((0, 0, 1, 1)));

        assert_eq!(Region::new(0.8, 0.0, 0.5, 0.5).to_pixels(10, 10), None);
        assert_eq!(Region::new(0.0, 0.0, 0.0, 0.5).to_pixels(10, 10), None);
    }

    #[test]
    fn test_probe_matches_region_color() {
        let image = half_red_image();
        let red = ColorProbe::new(Region::new(0.0, 0.0, 0.5, 1.0), [255, 0, 0], 20.0);
        let blue = ColorProbe::new(Region::new(0.5, 0.0, 0.5, 1.0), [255, 0, 0], 20.0);

        assert!(red.matches(&image, "test").unwrap());
        assert!(!blue.matches(&image, "test").unwrap());
    }

    #[test]
    fn test_mean_color_of_mixed_region() {
        let image = half_red_image();
        let probe = ColorProbe::new(Region::new(0.0, 0.0, 1.0, 1.0), [0, 0, 0], 0.0);
        let mean = probe.mean_color(&image, "test").unwrap();
        assert_eq!(mean, [127.5, 0.0, 127.5]);
    }

    #[test]
    fn test_invalid_region_is_an_error() {
        let image = half_red_image();
        let probe = ColorProbe::new(Region::new(0.9, 0.9, 0.5, 0.5), [0, 0, 0], 10.0);
        assert!(matches!(
            probe.matches(&image, "test"),
            Err(MatcherError::Region { .. })
        ));
    }
}
