//! Scriptable collaborators: a detection model with fixed outputs and a
//! capture-engine backend that plays back a scripted response sequence.

use crate::detectors::{ClassScores, DetectionModel, RawDetection};
use crate::engine::{AnalyzerBackend, EngineError, EngineResult, LicenseError};
use crate::errors::ScannerError;
use crate::types::{BoundingBox, CameraFrame, Classification, DocumentSide};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{mpsc, Arc};
use tokio::sync::oneshot;

/// Detection model that returns the same detections for every frame.
pub struct StaticModel {
    detections: Vec<RawDetection>,
}

impl StaticModel {
    pub fn new(detections: Vec<RawDetection>) -> Self {
        Self { detections }
    }

    /// Single detection of the given class with an ok-zoom bounding box.
    pub fn single(classification: Classification, score: f32) -> Self {
        let mut scores = ClassScores::default();
        match classification {
            Classification::IdCardFront => scores.id_card_front = score,
            Classification::IdCardBack => scores.id_card_back = score,
            Classification::Passport => scores.passport = score,
            Classification::Invalid => scores.invalid = score,
        }
        Self::new(vec![RawDetection {
            bounding_box: BoundingBox::new(0.125, 0.125, 0.75, 0.75),
            scores,
        }])
    }

    /// Model that never detects anything.
    pub fn empty() -> Self {
        Self::new(Vec::new())
    }
}

impl DetectionModel for StaticModel {
    fn predict(&mut self, _frame: &CameraFrame) -> Result<Vec<RawDetection>, ScannerError> {
        Ok(self.detections.clone())
    }
}

/// Detection model whose inference always fails, for error-path tests.
pub struct FailingModel;

impl DetectionModel for FailingModel {
    fn predict(&mut self, _frame: &CameraFrame) -> Result<Vec<RawDetection>, ScannerError> {
        Err(ScannerError::ModelError(
            "inference backend unavailable".to_string(),
        ))
    }
}

/// Shared counter of `analyze` submissions, for asserting how often the
/// engine was invoked after the backend has been boxed away.
pub type AnalyzeCalls = Arc<AtomicUsize>;

/// Capture-engine backend that plays back a scripted response sequence.
///
/// Responds to license setup immediately with the configured result, and
/// answers each submitted frame with the next scripted response (repeating
/// the last one once the script is exhausted). Honors the one-terminal-
/// callback contract by construction.
pub struct ScriptedBackend {
    license: Result<(), LicenseError>,
    script: VecDeque<Result<EngineResult, EngineError>>,
    calls: AnalyzeCalls,
}

impl ScriptedBackend {
    pub fn new(
        license: Result<(), LicenseError>,
        script: Vec<Result<EngineResult, EngineError>>,
    ) -> (Self, AnalyzeCalls) {
        let calls = Arc::new(AtomicUsize::new(0));
        (
            Self {
                license,
                script: script.into(),
                calls: calls.clone(),
            },
            calls,
        )
    }

    /// Licensed backend that always reports the same in-progress feedback.
    pub fn licensed_with(script: Vec<Result<EngineResult, EngineError>>) -> (Self, AnalyzeCalls) {
        Self::new(Ok(()), script)
    }
}

impl AnalyzerBackend for ScriptedBackend {
    fn request_license(&mut self, _key: &str, done: mpsc::Sender<Result<(), LicenseError>>) {
        let _ = done.send(self.license);
    }

    fn submit(
        &mut self,
        _frame: CameraFrame,
        done: oneshot::Sender<Result<EngineResult, EngineError>>,
    ) {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let response = if self.script.len() > 1 {
            self.script.pop_front().expect("non-empty")
        } else {
            self.script
                .front()
                .cloned()
                .unwrap_or_else(|| Err(EngineError::Unknown("script exhausted".to_string())))
        };
        let _ = done.send(response);
    }
}

/// Build a terminal engine capture for a frame: the original plus a
/// center-cropped "transformed" document image.
pub fn engine_capture(frame: &CameraFrame, side: DocumentSide) -> EngineResult {
    let transformed = match frame.to_rgb_image() {
        Ok(rgb) => {
            let crop_w = (frame.width * 3 / 4).max(1);
            let crop_h = (frame.height * 3 / 4).max(1);
            let cropped = image::imageops::crop_imm(
                &rgb,
                (frame.width - crop_w) / 2,
                (frame.height - crop_h) / 2,
                crop_w,
                crop_h,
            )
            .to_image();
            CameraFrame::new(
                cropped.into_raw(),
                crop_w,
                crop_h,
                frame.device_id.clone(),
            )
        }
        Err(_) => frame.clone(),
    };

    EngineResult::Captured {
        original: frame.clone(),
        transformed,
        side,
    }
}
