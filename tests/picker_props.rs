//! Property-Based Tests for the Best-Frame Picker
//!
//! Verifies the fixed-window selection invariants with proptest-generated
//! score sequences and arrival times.

use idscan::picker::{BestFramePicker, Candidate, PickerState};
use idscan::testing::synthetic_document_frame;
use idscan::types::{
    BoundingBox, Classification, DocumentScannerOutput, IdDetectorOutput, LaplacianBlurOutput,
    MotionBlurOutput, ZoomLevel,
};
use proptest::prelude::*;
use std::time::{Duration, Instant};

fn candidate(score: f32) -> Candidate {
    let frame = synthetic_document_frame(16, 12);
    Candidate {
        image: frame.to_rgb_image().unwrap(),
        output: DocumentScannerOutput::Legacy {
            id_detector: IdDetectorOutput {
                classification: Classification::IdCardFront,
                score,
                bounding_box: BoundingBox::new(0.125, 0.125, 0.75, 0.75),
                zoom_level: ZoomLevel::Ok,
            },
            barcode: None,
            motion_blur: MotionBlurOutput {
                has_motion_blur: false,
                iou: Some(1.0),
                stable_for: Duration::from_secs(1),
            },
            camera_properties: None,
            blur: LaplacianBlurOutput {
                is_blurry: false,
                variance: 400.0,
            },
        },
        exif: None,
        score,
    }
}

proptest! {
    /// INVARIANT: the picked candidate's score equals the maximum score
    /// observed within the window. Holds for any score sequence, not just
    /// monotone ones; arrival times stay strictly inside the window.
    #[test]
    fn picked_score_is_window_maximum(
        scores in prop::collection::vec(0.0f32..1.0, 1..20),
    ) {
        let window = Duration::from_secs(1);
        let mut picker = BestFramePicker::new(window);
        let t0 = Instant::now();

        // Spread arrivals inside the window regardless of count.
        let step = Duration::from_millis(900 / scores.len() as u64);
        for (i, score) in scores.iter().enumerate() {
            let state = picker.consider_at(candidate(*score), t0 + step * i as u32);
            prop_assert!(
                matches!(state, PickerState::Holding { .. }),
                "expected holding state"
            );
        }

        let max = scores.iter().cloned().fold(f32::MIN, f32::max);
        match picker.poll_at(t0 + window) {
            PickerState::Picked(best) => prop_assert!((best.score - max).abs() < 1e-6),
            other => prop_assert!(false, "expected picked, got {:?}", other),
        }
    }

    /// INVARIANT: while the window is open, remaining time never grows
    /// between calls made at non-decreasing instants.
    #[test]
    fn remaining_time_is_monotone(
        offsets_ms in prop::collection::vec(0u64..900, 2..10),
    ) {
        let mut offsets = offsets_ms.clone();
        offsets.sort_unstable();

        let mut picker = BestFramePicker::new(Duration::from_secs(1));
        let t0 = Instant::now();
        let mut previous = Duration::MAX;

        for (i, offset) in offsets.iter().enumerate() {
            let at = t0 + Duration::from_millis(*offset);
            let state = picker.consider_at(candidate(0.1 + i as f32 * 0.01), at);
            match state {
                PickerState::Holding { remaining, .. } => {
                    prop_assert!(remaining <= previous);
                    previous = remaining;
                }
                other => prop_assert!(false, "expected holding, got {:?}", other),
            }
        }
    }

    /// INVARIANT: reset always returns the picker to idle, whatever came
    /// before.
    #[test]
    fn reset_always_reaches_idle(
        scores in prop::collection::vec(0.0f32..1.0, 0..10),
        poll_after_ms in 0u64..3000,
    ) {
        let mut picker = BestFramePicker::new(Duration::from_secs(1));
        let t0 = Instant::now();
        for (i, score) in scores.iter().enumerate() {
            picker.consider_at(candidate(*score), t0 + Duration::from_millis(i as u64 * 50));
        }

        picker.reset();
        let state = picker.poll_at(t0 + Duration::from_millis(poll_after_ms));
        prop_assert_eq!(state, PickerState::Idle);
    }
}
