//! Core types for the document scanning pipeline.
//!
//! Frames are transient RGB24 buffers produced by a camera session outside
//! this crate; everything downstream of them is a value type compared by
//! equality so the verification flow can cache and diff scanner output.

use crate::engine::{CaptureFeedback, EngineResult};
use crate::errors::ScannerError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use uuid::Uuid;

/// Which side of the document the session is currently scanning.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DocumentSide {
    Front,
    Back,
}

impl DocumentSide {
    pub fn as_str(&self) -> &'static str {
        match self {
            DocumentSide::Front => "front",
            DocumentSide::Back => "back",
        }
    }
}

/// Document classification produced by the detection model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Classification {
    IdCardFront,
    IdCardBack,
    Passport,
    Invalid,
}

impl Classification {
    /// Whether this classification satisfies the requested document side.
    /// Passports are single-sided and count as a front capture.
    pub fn matches(&self, side: DocumentSide) -> bool {
        match self {
            Classification::IdCardFront | Classification::Passport => side == DocumentSide::Front,
            Classification::IdCardBack => side == DocumentSide::Back,
            Classification::Invalid => false,
        }
    }
}

/// Axis-aligned bounding box in normalized image coordinates (0.0-1.0).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl BoundingBox {
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Fraction of the frame covered by this box.
    pub fn area(&self) -> f32 {
        self.width.max(0.0) * self.height.max(0.0)
    }

    /// Intersection-over-union with another box. Returns 0.0 when the
    /// boxes are disjoint or either is degenerate.
    pub fn iou(&self, other: &BoundingBox) -> f32 {
        let x1 = self.x.max(other.x);
        let y1 = self.y.max(other.y);
        let x2 = (self.x + self.width).min(other.x + other.width);
        let y2 = (self.y + self.height).min(other.y + other.height);

        if x2 <= x1 || y2 <= y1 {
            return 0.0;
        }

        let intersection = (x2 - x1) * (y2 - y1);
        let union = self.area() + other.area() - intersection;
        if union <= 0.0 {
            return 0.0;
        }
        intersection / union
    }

    /// True when the box lies within the unit square with positive extent.
    pub fn is_normalized(&self) -> bool {
        self.x >= 0.0
            && self.y >= 0.0
            && self.width > 0.0
            && self.height > 0.0
            && self.x + self.width <= 1.0 + f32::EPSILON
            && self.y + self.height <= 1.0 + f32::EPSILON
    }
}

/// Zoom verdict derived from bounding-box size.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ZoomLevel {
    Ok,
    TooClose,
    TooFar,
}

/// Device focus/exposure state sampled alongside the frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct CameraProperties {
    pub is_adjusting_focus: bool,
    pub is_adjusting_exposure: bool,
}

/// Optional EXIF-style metadata attached to a picked candidate.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ExifMetadata {
    pub captured_at: Option<DateTime<Utc>>,
    pub lens_model: Option<String>,
    pub focal_length: Option<f32>,
    pub brightness_value: Option<f32>,
}

/// One captured camera frame: RGB24 pixel buffer plus device metadata.
///
/// Frames are produced by the camera session, consumed synchronously by the
/// detectors, and never persisted by this crate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CameraFrame {
    pub id: String,
    pub data: Vec<u8>,
    pub width: u32,
    pub height: u32,
    pub size_bytes: usize,
    pub device_id: String,
    pub timestamp: DateTime<Utc>,
    pub camera_properties: Option<CameraProperties>,
}

impl CameraFrame {
    pub fn new(data: Vec<u8>, width: u32, height: u32, device_id: String) -> Self {
        let size_bytes = data.len();
        Self {
            id: Uuid::new_v4().to_string(),
            data,
            width,
            height,
            size_bytes,
            device_id,
            timestamp: Utc::now(),
            camera_properties: None,
        }
    }

    pub fn with_properties(mut self, properties: CameraProperties) -> Self {
        self.camera_properties = Some(properties);
        self
    }

    pub fn aspect_ratio(&self) -> f32 {
        if self.height == 0 {
            return 0.0;
        }
        self.width as f32 / self.height as f32
    }

    /// A frame is valid when it has non-zero dimensions and a full RGB24
    /// buffer for them.
    pub fn is_valid(&self) -> bool {
        self.width > 0
            && self.height > 0
            && self.data.len() == (self.width * self.height * 3) as usize
    }

    /// Crop the region covered by a normalized bounding box into a new frame.
    pub fn crop(&self, region: &BoundingBox) -> Result<CameraFrame, ScannerError> {
        if !self.is_valid() {
            return Err(ScannerError::InvalidFrame(format!(
                "{}x{} with {} bytes",
                self.width,
                self.height,
                self.data.len()
            )));
        }
        if !region.is_normalized() {
            return Err(ScannerError::CropError(format!(
                "region outside unit square: {:?}",
                region
            )));
        }

        let x0 = (region.x * self.width as f32).floor() as u32;
        let y0 = (region.y * self.height as f32).floor() as u32;
        let w = ((region.width * self.width as f32).ceil() as u32)
            .max(1)
            .min(self.width - x0);
        let h = ((region.height * self.height as f32).ceil() as u32)
            .max(1)
            .min(self.height - y0);

        let mut data = Vec::with_capacity((w * h * 3) as usize);
        for row in y0..y0 + h {
            let start = ((row * self.width + x0) * 3) as usize;
            let end = start + (w * 3) as usize;
            data.extend_from_slice(&self.data[start..end]);
        }

        let mut cropped = CameraFrame::new(data, w, h, self.device_id.clone());
        cropped.timestamp = self.timestamp;
        cropped.camera_properties = self.camera_properties;
        Ok(cropped)
    }

    /// Convert to an owned `image::RgbImage` for downstream consumers.
    pub fn to_rgb_image(&self) -> Result<image::RgbImage, ScannerError> {
        image::RgbImage::from_raw(self.width, self.height, self.data.clone()).ok_or_else(|| {
            ScannerError::InvalidFrame(format!(
                "buffer of {} bytes does not match {}x{}",
                self.data.len(),
                self.width,
                self.height
            ))
        })
    }
}

/// Output of the document/ID detector for one frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IdDetectorOutput {
    pub classification: Classification,
    pub score: f32,
    pub bounding_box: BoundingBox,
    pub zoom_level: ZoomLevel,
}

/// Output of the barcode detector for one frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BarcodeOutput {
    pub has_barcode: bool,
    pub symbology: Option<String>,
    /// Set once the per-session decode timeout has elapsed without a
    /// readable barcode; "no barcode" is then terminal rather than retried.
    pub timed_out: bool,
}

impl BarcodeOutput {
    /// Decoding finished for this session: either a barcode was read or the
    /// timeout made the absence final.
    pub fn is_terminal(&self) -> bool {
        self.has_barcode || self.timed_out
    }
}

/// Output of the motion-blur detector for one frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MotionBlurOutput {
    pub has_motion_blur: bool,
    /// IOU against the previous frame's bounding box, if one existed.
    pub iou: Option<f32>,
    /// How long the box has held steady above the IOU threshold.
    pub stable_for: Duration,
}

/// Output of the Laplacian sharpness detector for one frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LaplacianBlurOutput {
    pub is_blurry: bool,
    pub variance: f32,
}

/// Aggregated scanner output for one frame.
///
/// `Legacy` carries the per-detector pipeline results; `Engine` carries the
/// capture engine's verdict alongside the always-run document detector.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum DocumentScannerOutput {
    Legacy {
        id_detector: IdDetectorOutput,
        barcode: Option<BarcodeOutput>,
        motion_blur: MotionBlurOutput,
        camera_properties: Option<CameraProperties>,
        blur: LaplacianBlurOutput,
    },
    Engine {
        id_detector: IdDetectorOutput,
        result: EngineResult,
    },
}

impl DocumentScannerOutput {
    pub fn id_detector(&self) -> &IdDetectorOutput {
        match self {
            DocumentScannerOutput::Legacy { id_detector, .. } => id_detector,
            DocumentScannerOutput::Engine { id_detector, .. } => id_detector,
        }
    }

    /// Whether this frame is good enough to submit for the requested side.
    ///
    /// On the legacy path a readable barcode with an ok zoom level is
    /// sufficient on its own: a decodable barcode short-circuits the
    /// motion-blur and sharpness checks. Otherwise the classification must
    /// match the side, the camera must not be hunting focus, and the frame
    /// must be steady, sharp, and at an ok zoom level.
    pub fn is_high_quality(&self, side: DocumentSide) -> bool {
        match self {
            DocumentScannerOutput::Legacy {
                id_detector,
                barcode,
                motion_blur,
                camera_properties,
                blur,
            } => {
                let zoom_ok = id_detector.zoom_level == ZoomLevel::Ok;
                let barcode_readable = barcode.as_ref().map_or(false, |b| b.has_barcode);
                if barcode_readable && zoom_ok {
                    return true;
                }

                let focusing = camera_properties.map_or(false, |p| p.is_adjusting_focus);
                id_detector.classification.matches(side)
                    && !focusing
                    && !motion_blur.has_motion_blur
                    && !blur.is_blurry
                    && zoom_ok
            }
            DocumentScannerOutput::Engine { result, .. } => match result {
                EngineResult::Captured { side: captured, .. } => *captured == side,
                EngineResult::Capturing(_) => false,
            },
        }
    }

    /// Ranking score used by the best-frame picker. Detector confidence,
    /// halved for each blur verdict; a readable barcode floors the score
    /// high since it is sufficient evidence of quality on its own.
    pub fn quality_score(&self) -> f32 {
        match self {
            DocumentScannerOutput::Legacy {
                id_detector,
                barcode,
                motion_blur,
                blur,
                ..
            } => {
                let mut score = id_detector.score;
                if motion_blur.has_motion_blur {
                    score *= 0.5;
                }
                if blur.is_blurry {
                    score *= 0.5;
                }
                if barcode.as_ref().map_or(false, |b| b.has_barcode) {
                    score = score.max(0.9);
                }
                score
            }
            DocumentScannerOutput::Engine { id_detector, result } => match result {
                EngineResult::Captured { .. } => 1.0,
                EngineResult::Capturing(_) => id_detector.score * 0.5,
            },
        }
    }

    /// In-progress guidance for the UI layer, when the engine produced any.
    pub fn feedback(&self) -> Option<CaptureFeedback> {
        match self {
            DocumentScannerOutput::Engine {
                result: EngineResult::Capturing(feedback),
                ..
            } => Some(*feedback),
            _ => None,
        }
    }
}
