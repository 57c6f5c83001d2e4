//! Document scanner orchestrator.
//!
//! Per-frame entry point for a capture session. Always runs the document
//! detector first; beyond that it arbitrates between the capture engine
//! and the legacy per-detector pipeline, degrading one-way to legacy for
//! the rest of the session after the first engine runner error.

use crate::assert_invariant;
use crate::detectors::{
    BarcodeDetector, DocumentDetector, LaplacianBlurDetector, MotionBlurDetector,
};
use crate::engine::CaptureEngine;
use crate::errors::ScannerError;
use crate::types::{CameraFrame, DocumentScannerOutput, DocumentSide, IdDetectorOutput};

pub struct DocumentScanner {
    document_detector: DocumentDetector,
    motion_blur: MotionBlurDetector,
    barcode: BarcodeDetector,
    blur: LaplacianBlurDetector,
    engine: Option<CaptureEngine>,
    engine_runner_failed: bool,
}

impl DocumentScanner {
    /// Scanner with default legacy detectors. Pass `None` for the engine
    /// when license setup failed at init; the session then always runs the
    /// legacy pipeline.
    pub fn new(document_detector: DocumentDetector, engine: Option<CaptureEngine>) -> Self {
        Self::with_detectors(
            document_detector,
            MotionBlurDetector::default(),
            BarcodeDetector::default(),
            LaplacianBlurDetector::default(),
            engine,
        )
    }

    pub fn with_detectors(
        document_detector: DocumentDetector,
        motion_blur: MotionBlurDetector,
        barcode: BarcodeDetector,
        blur: LaplacianBlurDetector,
        engine: Option<CaptureEngine>,
    ) -> Self {
        if engine.is_none() {
            log::info!("Document scanner running without capture engine");
        }
        Self {
            document_detector,
            motion_blur,
            barcode,
            blur,
            engine,
            engine_runner_failed: false,
        }
    }

    /// Scan one frame for the requested side.
    ///
    /// Exactly one result per call; callers must await it before submitting
    /// the next frame and must not pipeline frames. Returns `Ok(None)` when
    /// no document-like region was detected (cheap rejection).
    ///
    /// Fallback contract: the first engine runner error latches the session
    /// onto the legacy pipeline permanently; that frame is still served by
    /// the legacy detectors. Non-runner engine errors propagate without
    /// touching the latch and the frame is dropped by the caller.
    pub async fn scan_frame(
        &mut self,
        frame: &CameraFrame,
        side: DocumentSide,
    ) -> Result<Option<DocumentScannerOutput>, ScannerError> {
        let id_detector = match self.document_detector.scan(frame)? {
            Some(output) => output,
            None => return Ok(None),
        };

        if self.engine_runner_failed {
            return self.scan_legacy(frame, side, id_detector).map(Some);
        }

        if let Some(engine) = self.engine.as_mut() {
            // Checked at the invocation site so every engine call proves
            // the latch was clear when it was made.
            assert_invariant!(
                !self.engine_runner_failed,
                "engine is never invoked after a runner error",
                "scanner::scan_frame"
            );
            let analyzed = engine.analyze(frame).await;
            match analyzed {
                Ok(result) => Ok(Some(DocumentScannerOutput::Engine {
                    id_detector,
                    result,
                })),
                Err(err) if err.is_runner_error() => {
                    log::warn!(
                        "Capture engine runner error, degrading to legacy pipeline for the rest of the session: {}",
                        err
                    );
                    self.engine_runner_failed = true;
                    self.scan_legacy(frame, side, id_detector).map(Some)
                }
                Err(err) => {
                    log::info!("Capture engine frame dropped: {}", err);
                    Err(err.into())
                }
            }
        } else {
            self.scan_legacy(frame, side, id_detector).map(Some)
        }
    }

    fn scan_legacy(
        &mut self,
        frame: &CameraFrame,
        side: DocumentSide,
        id_detector: IdDetectorOutput,
    ) -> Result<DocumentScannerOutput, ScannerError> {
        let motion_blur = self.motion_blur.scan(&id_detector.bounding_box);
        let barcode = match side {
            DocumentSide::Back => Some(self.barcode.scan(frame, &id_detector.bounding_box)?),
            DocumentSide::Front => None,
        };
        let blur = self.blur.scan(frame, &id_detector.bounding_box)?;

        Ok(DocumentScannerOutput::Legacy {
            id_detector,
            barcode,
            motion_blur,
            camera_properties: frame.camera_properties,
            blur,
        })
    }

    /// Clear detector rolling history for a side flip or manual retry.
    ///
    /// The runner-error latch is session-scoped on purpose and survives
    /// reset; only a new scanner re-enables the engine.
    pub fn reset(&mut self) {
        self.motion_blur.reset();
        self.barcode.reset();
        log::debug!("Document scanner rolling state reset");
    }

    /// Whether the session has latched onto the legacy pipeline.
    pub fn engine_bypassed(&self) -> bool {
        self.engine_runner_failed
    }

    /// Whether an engine was configured for this session at all.
    pub fn has_engine(&self) -> bool {
        self.engine.is_some()
    }
}
