//! Document Scanner Orchestrator Testing
//!
//! Verifies the per-frame arbitration contract: cheap rejection with no
//! detection, engine delegation, the one-way runner-error latch, and
//! non-runner error propagation.

use idscan::detectors::{DocumentDetector, DocumentDetectorConfig};
use idscan::engine::{
    CaptureEngine, CaptureFeedback, EngineError, EngineResult, LicenseError,
};
use idscan::invariant_ppt::{clear_invariant_log, contract_test};
use idscan::scanner::DocumentScanner;
use idscan::testing::{
    engine_capture, synthetic_document_frame, FailingModel, ScriptedBackend, StaticModel,
};
use idscan::types::{Classification, DocumentScannerOutput, DocumentSide};
use std::sync::atomic::Ordering;

fn front_detector() -> DocumentDetector {
    DocumentDetector::new(
        Box::new(StaticModel::single(Classification::IdCardFront, 0.9)),
        DocumentDetectorConfig::default(),
    )
}

fn engine_with(
    script: Vec<Result<EngineResult, EngineError>>,
) -> (CaptureEngine, idscan::testing::AnalyzeCalls) {
    let (backend, calls) = ScriptedBackend::licensed_with(script);
    let engine = CaptureEngine::new(Box::new(backend), "test-key").expect("license accepted");
    (engine, calls)
}

#[tokio::test]
async fn test_no_detection_is_cheap_rejection() {
    let detector = DocumentDetector::new(
        Box::new(StaticModel::empty()),
        DocumentDetectorConfig::default(),
    );
    let (engine, calls) = engine_with(vec![Ok(EngineResult::Capturing(
        CaptureFeedback::DocumentNotFound,
    ))]);
    let mut scanner = DocumentScanner::new(detector, Some(engine));

    let frame = synthetic_document_frame(64, 48);
    let output = scanner.scan_frame(&frame, DocumentSide::Front).await.unwrap();

    assert_eq!(output, None);
    // The engine is never consulted when nothing was detected.
    assert_eq!(calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_model_failure_propagates_before_the_engine() {
    let detector = DocumentDetector::new(
        Box::new(FailingModel),
        DocumentDetectorConfig::default(),
    );
    let (engine, calls) = engine_with(vec![Ok(EngineResult::Capturing(
        CaptureFeedback::DocumentNotFound,
    ))]);
    let mut scanner = DocumentScanner::new(detector, Some(engine));

    let frame = synthetic_document_frame(64, 48);
    let err = scanner
        .scan_frame(&frame, DocumentSide::Front)
        .await
        .unwrap_err();
    assert!(matches!(err, idscan::ScannerError::ModelError(_)));
    assert_eq!(calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_engine_results_pass_through() {
    let frame = synthetic_document_frame(64, 48);
    let captured = engine_capture(&frame, DocumentSide::Front);
    let (engine, _calls) = engine_with(vec![Ok(captured.clone())]);
    let mut scanner = DocumentScanner::new(front_detector(), Some(engine));

    let output = scanner
        .scan_frame(&frame, DocumentSide::Front)
        .await
        .unwrap()
        .unwrap();

    assert!(output.is_high_quality(DocumentSide::Front));
    match output {
        DocumentScannerOutput::Engine { result, .. } => assert_eq!(result, captured),
        other => panic!("expected engine output, got {:?}", other),
    }
}

/// A runner error on frame 3 of 10: the adapter is invoked for frames
/// 1-3 only, frames 3-10 are all served by the legacy pipeline, and the
/// engine is never touched again.
#[tokio::test]
async fn test_runner_error_latches_legacy_for_session() {
    clear_invariant_log();

    let (engine, calls) = engine_with(vec![
        Ok(EngineResult::Capturing(CaptureFeedback::TooFar)),
        Ok(EngineResult::Capturing(CaptureFeedback::Blurry)),
        Err(EngineError::runner(-3, "native analyzer fault")),
    ]);
    let mut scanner = DocumentScanner::new(front_detector(), Some(engine));
    let frame = synthetic_document_frame(64, 48);

    for frame_number in 1..=10 {
        let output = scanner
            .scan_frame(&frame, DocumentSide::Front)
            .await
            .unwrap()
            .unwrap();

        match (frame_number, &output) {
            (1..=2, DocumentScannerOutput::Engine { .. }) => {}
            // The erroring frame itself is served legacy, as is the rest.
            (3..=10, DocumentScannerOutput::Legacy { .. }) => {}
            (n, other) => panic!("frame {}: unexpected output {:?}", n, other),
        }
    }

    assert!(scanner.engine_bypassed());
    assert_eq!(calls.load(Ordering::SeqCst), 3);

    contract_test(
        "one-way engine latch",
        &["engine is never invoked after a runner error"],
    );
}

#[tokio::test]
async fn test_non_runner_errors_propagate_without_latching() {
    let (engine, calls) = engine_with(vec![
        Err(EngineError::no_valid_result()),
        Err(EngineError::wrong_side(DocumentSide::Front, DocumentSide::Back)),
        Ok(EngineResult::Capturing(CaptureFeedback::Glare)),
    ]);
    let mut scanner = DocumentScanner::new(front_detector(), Some(engine));
    let frame = synthetic_document_frame(64, 48);

    // Frames with expected errors are dropped, not latched.
    let err = scanner
        .scan_frame(&frame, DocumentSide::Front)
        .await
        .unwrap_err();
    assert!(err.to_string().contains("no valid result"));
    assert!(!scanner.engine_bypassed());

    let err = scanner
        .scan_frame(&frame, DocumentSide::Front)
        .await
        .unwrap_err();
    assert!(err.to_string().contains("captured back"));
    assert!(!scanner.engine_bypassed());

    // The engine stays in use afterwards.
    let output = scanner
        .scan_frame(&frame, DocumentSide::Front)
        .await
        .unwrap()
        .unwrap();
    assert!(matches!(output, DocumentScannerOutput::Engine { .. }));
    assert_eq!(calls.load(Ordering::SeqCst), 3);
}

#[tokio::test]
async fn test_no_engine_always_runs_legacy() {
    let mut scanner = DocumentScanner::new(front_detector(), None);
    assert!(!scanner.has_engine());

    let frame = synthetic_document_frame(64, 48);
    for _ in 0..3 {
        let output = scanner
            .scan_frame(&frame, DocumentSide::Front)
            .await
            .unwrap()
            .unwrap();
        assert!(matches!(output, DocumentScannerOutput::Legacy { .. }));
    }
}

#[tokio::test]
async fn test_license_failure_means_no_engine() {
    let (backend, calls) = ScriptedBackend::new(Err(LicenseError::Invalid), Vec::new());
    let result = CaptureEngine::new(Box::new(backend), "bad-key");
    assert!(matches!(
        result,
        Err(EngineError::License(LicenseError::Invalid))
    ));

    // The session then runs without an engine, exactly like configuring none.
    let mut scanner = DocumentScanner::new(front_detector(), None);
    let frame = synthetic_document_frame(64, 48);
    let output = scanner
        .scan_frame(&frame, DocumentSide::Front)
        .await
        .unwrap()
        .unwrap();
    assert!(matches!(output, DocumentScannerOutput::Legacy { .. }));
    assert_eq!(calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_barcode_runs_only_for_back_side() {
    let detector = DocumentDetector::new(
        Box::new(StaticModel::single(Classification::IdCardBack, 0.9)),
        DocumentDetectorConfig::default(),
    );
    let mut scanner = DocumentScanner::new(detector, None);
    let frame = synthetic_document_frame(64, 48);

    let output = scanner
        .scan_frame(&frame, DocumentSide::Back)
        .await
        .unwrap()
        .unwrap();
    match &output {
        DocumentScannerOutput::Legacy { barcode, .. } => assert!(barcode.is_some()),
        other => panic!("expected legacy output, got {:?}", other),
    }

    let mut front_scanner = DocumentScanner::new(front_detector(), None);
    let output = front_scanner
        .scan_frame(&frame, DocumentSide::Front)
        .await
        .unwrap()
        .unwrap();
    match &output {
        DocumentScannerOutput::Legacy { barcode, .. } => assert!(barcode.is_none()),
        other => panic!("expected legacy output, got {:?}", other),
    }
}

#[tokio::test]
async fn test_barcode_timeout_is_terminal_for_the_session() {
    // Zero timeout: the first back-side frame without a readable strip
    // makes no-barcode terminal immediately.
    let mut scanner = DocumentScanner::with_detectors(
        DocumentDetector::new(
            Box::new(StaticModel::single(Classification::IdCardBack, 0.9)),
            DocumentDetectorConfig::default(),
        ),
        idscan::detectors::MotionBlurDetector::default(),
        idscan::detectors::BarcodeDetector::new(std::time::Duration::ZERO, 0.08, 0.35),
        idscan::detectors::LaplacianBlurDetector::default(),
        None,
    );

    let output = scanner
        .scan_frame(&synthetic_document_frame(160, 120), DocumentSide::Back)
        .await
        .unwrap()
        .unwrap();
    match &output {
        DocumentScannerOutput::Legacy { barcode, .. } => {
            let barcode = barcode.as_ref().unwrap();
            assert!(!barcode.has_barcode);
            assert!(barcode.timed_out);
        }
        other => panic!("expected legacy output, got {:?}", other),
    }

    // A decodable strip on a later frame does not reverse the verdict.
    let output = scanner
        .scan_frame(&idscan::testing::synthetic_barcode_frame(160, 120), DocumentSide::Back)
        .await
        .unwrap()
        .unwrap();
    match &output {
        DocumentScannerOutput::Legacy { barcode, .. } => {
            let barcode = barcode.as_ref().unwrap();
            assert!(!barcode.has_barcode);
            assert!(barcode.timed_out);
            assert!(barcode.is_terminal());
        }
        other => panic!("expected legacy output, got {:?}", other),
    }

    // reset() reopens barcode decoding for a fresh attempt.
    scanner.reset();
    let output = scanner
        .scan_frame(&idscan::testing::synthetic_barcode_frame(160, 120), DocumentSide::Back)
        .await
        .unwrap()
        .unwrap();
    match &output {
        DocumentScannerOutput::Legacy { barcode, .. } => {
            assert!(barcode.as_ref().unwrap().has_barcode)
        }
        other => panic!("expected legacy output, got {:?}", other),
    }
}

#[tokio::test]
async fn test_readable_barcode_short_circuits_quality_checks() {
    let detector = DocumentDetector::new(
        Box::new(StaticModel::single(Classification::IdCardBack, 0.9)),
        DocumentDetectorConfig::default(),
    );
    let mut scanner = DocumentScanner::new(detector, None);
    let frame = idscan::testing::synthetic_barcode_frame(160, 120);

    // Even the very first frame qualifies: a decodable barcode strip makes
    // the stability and sharpness verdicts irrelevant.
    let output = scanner
        .scan_frame(&frame, DocumentSide::Back)
        .await
        .unwrap()
        .unwrap();
    match &output {
        DocumentScannerOutput::Legacy {
            barcode,
            motion_blur,
            ..
        } => {
            assert!(barcode.as_ref().is_some_and(|b| b.has_barcode));
            assert!(motion_blur.has_motion_blur);
        }
        other => panic!("expected legacy output, got {:?}", other),
    }
    assert!(output.is_high_quality(DocumentSide::Back));
}

#[tokio::test]
async fn test_focus_hunting_disqualifies_frame() {
    // Stability clears instantly so focus hunting is the only defect left.
    let mut scanner = DocumentScanner::with_detectors(
        front_detector(),
        idscan::detectors::MotionBlurDetector::new(0.9, std::time::Duration::ZERO),
        idscan::detectors::BarcodeDetector::default(),
        idscan::detectors::LaplacianBlurDetector::new(1.0),
        None,
    );
    let frame = synthetic_document_frame(64, 48).with_properties(idscan::types::CameraProperties {
        is_adjusting_focus: true,
        is_adjusting_exposure: false,
    });

    scanner.scan_frame(&frame, DocumentSide::Front).await.unwrap();
    let output = scanner
        .scan_frame(&frame, DocumentSide::Front)
        .await
        .unwrap()
        .unwrap();
    assert!(!output.is_high_quality(DocumentSide::Front));

    // The same steady frame without the focus flag qualifies.
    let mut steady = scanner;
    steady.reset();
    let calm = synthetic_document_frame(64, 48);
    steady.scan_frame(&calm, DocumentSide::Front).await.unwrap();
    let output = steady
        .scan_frame(&calm, DocumentSide::Front)
        .await
        .unwrap()
        .unwrap();
    assert!(output.is_high_quality(DocumentSide::Front));
}

#[tokio::test]
async fn test_reset_preserves_latch() {
    let (engine, calls) = engine_with(vec![Err(EngineError::runner(-1, "fault"))]);
    let mut scanner = DocumentScanner::new(front_detector(), Some(engine));
    let frame = synthetic_document_frame(64, 48);

    scanner
        .scan_frame(&frame, DocumentSide::Front)
        .await
        .unwrap();
    assert!(scanner.engine_bypassed());

    scanner.reset();
    assert!(scanner.engine_bypassed());

    scanner
        .scan_frame(&frame, DocumentSide::Front)
        .await
        .unwrap();
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}
