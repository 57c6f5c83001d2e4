//! Frame quality detectors.
//!
//! Each detector analyzes one frame at a time through a synchronous
//! `scan` contract and keeps no shared mutable state beyond an explicit
//! `reset()` for rolling history (side flip or manual retry).

pub mod barcode;
pub mod blur;
pub mod document;
pub mod motion_blur;

pub use barcode::BarcodeDetector;
pub use blur::LaplacianBlurDetector;
pub use document::{
    ClassScores, ContrastModel, DetectionModel, DocumentDetector, DocumentDetectorConfig,
    RawDetection,
};
pub use motion_blur::MotionBlurDetector;

use crate::types::CameraFrame;

/// Rec. 601 luminance of one RGB pixel.
pub(crate) fn luminance(rgb: &[u8]) -> f32 {
    0.299 * rgb[0] as f32 + 0.587 * rgb[1] as f32 + 0.114 * rgb[2] as f32
}

/// Full-frame luminance plane, one f32 per pixel in 0-255 range.
pub(crate) fn luminance_plane(frame: &CameraFrame) -> Vec<f32> {
    let pixels = (frame.width * frame.height) as usize;
    let mut plane = Vec::with_capacity(pixels);
    for idx in 0..pixels {
        plane.push(luminance(&frame.data[idx * 3..idx * 3 + 3]));
    }
    plane
}
