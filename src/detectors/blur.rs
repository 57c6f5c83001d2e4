//! Laplacian sharpness detector.
//!
//! Computes the variance of a 4-neighbor Laplacian over the cropped
//! document region; low variance means few edges survived, i.e. the crop
//! is blurry.

use super::luminance_plane;
use crate::errors::ScannerError;
use crate::types::{BoundingBox, CameraFrame, LaplacianBlurOutput};

pub struct LaplacianBlurDetector {
    variance_threshold: f32,
}

impl LaplacianBlurDetector {
    pub fn new(variance_threshold: f32) -> Self {
        Self { variance_threshold }
    }

    /// Scan the document region of one frame.
    pub fn scan(
        &self,
        frame: &CameraFrame,
        region: &BoundingBox,
    ) -> Result<LaplacianBlurOutput, ScannerError> {
        let crop = frame.crop(region)?;
        let variance = laplacian_variance(&crop);
        Ok(LaplacianBlurOutput {
            is_blurry: variance < self.variance_threshold,
            variance,
        })
    }
}

impl Default for LaplacianBlurDetector {
    fn default() -> Self {
        Self::new(120.0)
    }
}

/// Variance of the 4-neighbor Laplacian over the interior pixels.
/// Crops too small to have an interior score 0.0.
fn laplacian_variance(frame: &CameraFrame) -> f32 {
    let width = frame.width as usize;
    let height = frame.height as usize;
    if width < 3 || height < 3 {
        return 0.0;
    }

    let plane = luminance_plane(frame);
    let mut values = Vec::with_capacity((width - 2) * (height - 2));

    for y in 1..height - 1 {
        for x in 1..width - 1 {
            let center = plane[y * width + x];
            let neighbors = plane[(y - 1) * width + x]
                + plane[(y + 1) * width + x]
                + plane[y * width + x - 1]
                + plane[y * width + x + 1];
            values.push(4.0 * center - neighbors);
        }
    }

    let count = values.len() as f64;
    let mean = values.iter().map(|v| *v as f64).sum::<f64>() / count;
    let variance = values
        .iter()
        .map(|v| {
            let d = *v as f64 - mean;
            d * d
        })
        .sum::<f64>()
        / count;
    variance as f32
}
