//! Document/ID detector.
//!
//! Consumes raw per-frame detections from a [`DetectionModel`] (the ML
//! model is an external collaborator behind this seam), applies score
//! filtering and IOU-based non-max suppression, and derives a zoom verdict
//! from the winning bounding box.

use super::luminance_plane;
use crate::errors::ScannerError;
use crate::types::{BoundingBox, CameraFrame, Classification, IdDetectorOutput, ZoomLevel};

/// Per-class confidence scores for one raw detection.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ClassScores {
    pub id_card_front: f32,
    pub id_card_back: f32,
    pub passport: f32,
    pub invalid: f32,
}

impl ClassScores {
    /// Winning class and its confidence.
    pub fn best(&self) -> (Classification, f32) {
        let candidates = [
            (Classification::IdCardFront, self.id_card_front),
            (Classification::IdCardBack, self.id_card_back),
            (Classification::Passport, self.passport),
            (Classification::Invalid, self.invalid),
        ];
        candidates
            .into_iter()
            .fold((Classification::Invalid, f32::MIN), |acc, item| {
                if item.1 > acc.1 {
                    item
                } else {
                    acc
                }
            })
    }
}

/// One raw detection as produced by the upstream model, before NMS.
#[derive(Debug, Clone, PartialEq)]
pub struct RawDetection {
    pub bounding_box: BoundingBox,
    pub scores: ClassScores,
}

/// Seam to the per-frame ML detection model.
pub trait DetectionModel: Send {
    fn predict(&mut self, frame: &CameraFrame) -> Result<Vec<RawDetection>, ScannerError>;
}

#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct DocumentDetectorConfig {
    /// Detections below this winning-class score are discarded.
    pub score_threshold: f32,
    /// IOU at or above which a lower-scoring detection is suppressed.
    pub nms_iou_threshold: f32,
    /// Box area fraction below which the document is too far away.
    pub min_box_area: f32,
    /// Box area fraction above which the document is too close.
    pub max_box_area: f32,
}

impl Default for DocumentDetectorConfig {
    fn default() -> Self {
        Self {
            score_threshold: 0.4,
            nms_iou_threshold: 0.5,
            min_box_area: 0.15,
            max_box_area: 0.8,
        }
    }
}

/// Document/ID detector: classification, bounding box, and zoom verdict.
pub struct DocumentDetector {
    model: Box<dyn DetectionModel>,
    config: DocumentDetectorConfig,
}

impl DocumentDetector {
    pub fn new(model: Box<dyn DetectionModel>, config: DocumentDetectorConfig) -> Self {
        Self { model, config }
    }

    /// Detector backed by the built-in contrast heuristic, for running
    /// without an external model.
    pub fn with_contrast_model(expected: Classification, config: DocumentDetectorConfig) -> Self {
        Self::new(Box::new(ContrastModel::new(expected)), config)
    }

    /// Scan one frame. Returns `None` when no document-like detection
    /// survives filtering; this is the orchestrator's cheap rejection path.
    pub fn scan(&mut self, frame: &CameraFrame) -> Result<Option<IdDetectorOutput>, ScannerError> {
        if !frame.is_valid() {
            return Err(ScannerError::InvalidFrame(format!(
                "{}x{} with {} bytes",
                frame.width,
                frame.height,
                frame.data.len()
            )));
        }

        let mut detections = self.model.predict(frame)?;
        detections.retain(|d| d.scores.best().1 >= self.config.score_threshold);
        if detections.is_empty() {
            return Ok(None);
        }

        let kept = non_max_suppression(detections, self.config.nms_iou_threshold);
        let top = &kept[0];
        let (classification, score) = top.scores.best();
        let zoom_level = self.zoom_level(&top.bounding_box);

        log::debug!(
            "Document detector: {:?} score={:.3} area={:.3} zoom={:?}",
            classification,
            score,
            top.bounding_box.area(),
            zoom_level
        );

        Ok(Some(IdDetectorOutput {
            classification,
            score,
            bounding_box: top.bounding_box,
            zoom_level,
        }))
    }

    fn zoom_level(&self, bounding_box: &BoundingBox) -> ZoomLevel {
        let area = bounding_box.area();
        if area < self.config.min_box_area {
            ZoomLevel::TooFar
        } else if area > self.config.max_box_area {
            ZoomLevel::TooClose
        } else {
            ZoomLevel::Ok
        }
    }
}

/// Greedy IOU-based non-max suppression. Input order does not matter;
/// output is sorted by descending winning-class score.
fn non_max_suppression(mut detections: Vec<RawDetection>, iou_threshold: f32) -> Vec<RawDetection> {
    detections.sort_by(|a, b| {
        b.scores
            .best()
            .1
            .partial_cmp(&a.scores.best().1)
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    let mut kept: Vec<RawDetection> = Vec::new();
    for detection in detections {
        if kept
            .iter()
            .all(|k| k.bounding_box.iou(&detection.bounding_box) < iou_threshold)
        {
            kept.push(detection);
        }
    }
    kept
}

/// Built-in side-agnostic detection heuristic.
///
/// Divides the luminance plane into a grid, marks cells whose local
/// standard deviation indicates printed structure, and reports the
/// bounding rectangle of the marked cells as a detection of the expected
/// class. Good enough to drive the pipeline standalone and in tests; real
/// deployments supply their ML model through [`DetectionModel`].
pub struct ContrastModel {
    expected: Classification,
    grid: u32,
    cell_std_threshold: f32,
}

impl ContrastModel {
    pub fn new(expected: Classification) -> Self {
        Self {
            expected,
            grid: 8,
            cell_std_threshold: 18.0,
        }
    }
}

impl DetectionModel for ContrastModel {
    fn predict(&mut self, frame: &CameraFrame) -> Result<Vec<RawDetection>, ScannerError> {
        let plane = luminance_plane(frame);
        let (width, height) = (frame.width as usize, frame.height as usize);
        let grid = self.grid as usize;
        let cell_w = (width / grid).max(1);
        let cell_h = (height / grid).max(1);

        let mut marked: Vec<(usize, usize)> = Vec::new();
        for gy in 0..grid {
            for gx in 0..grid {
                let x0 = gx * cell_w;
                let y0 = gy * cell_h;
                if x0 >= width || y0 >= height {
                    continue;
                }
                let x1 = (x0 + cell_w).min(width);
                let y1 = (y0 + cell_h).min(height);

                let mut sum = 0.0f64;
                let mut sum_sq = 0.0f64;
                let mut count = 0.0f64;
                for y in y0..y1 {
                    for x in x0..x1 {
                        let v = plane[y * width + x] as f64;
                        sum += v;
                        sum_sq += v * v;
                        count += 1.0;
                    }
                }
                let mean = sum / count;
                let variance = (sum_sq / count - mean * mean).max(0.0);
                if variance.sqrt() as f32 >= self.cell_std_threshold {
                    marked.push((gx, gy));
                }
            }
        }

        if marked.len() < 2 {
            return Ok(Vec::new());
        }

        let gx_min = marked.iter().map(|c| c.0).min().unwrap_or(0);
        let gx_max = marked.iter().map(|c| c.0).max().unwrap_or(0);
        let gy_min = marked.iter().map(|c| c.1).min().unwrap_or(0);
        let gy_max = marked.iter().map(|c| c.1).max().unwrap_or(0);

        let bounding_box = BoundingBox::new(
            gx_min as f32 / grid as f32,
            gy_min as f32 / grid as f32,
            ((gx_max - gx_min + 1) as f32 / grid as f32).min(1.0 - gx_min as f32 / grid as f32),
            ((gy_max - gy_min + 1) as f32 / grid as f32).min(1.0 - gy_min as f32 / grid as f32),
        );

        // Confidence: how densely the marked rectangle is filled.
        let rect_cells = (gx_max - gx_min + 1) * (gy_max - gy_min + 1);
        let confidence = (marked.len() as f32 / rect_cells as f32).clamp(0.0, 1.0);

        let mut scores = ClassScores {
            invalid: 1.0 - confidence,
            ..Default::default()
        };
        match self.expected {
            Classification::IdCardFront => scores.id_card_front = confidence,
            Classification::IdCardBack => scores.id_card_back = confidence,
            Classification::Passport => scores.passport = confidence,
            Classification::Invalid => scores.invalid = 1.0,
        }

        Ok(vec![RawDetection {
            bounding_box,
            scores,
        }])
    }
}
