//! Scan session driver.
//!
//! Ties the scanner and the best-frame picker together the way the
//! verification flow consumes them: one frame in, one event out, all on
//! the frame-delivery context. The session owns no locks; the scanner
//! latch and the picker state are confined to this single context.

use crate::engine::CaptureFeedback;
use crate::errors::ScannerError;
use crate::picker::{BestFramePicker, Candidate, PickerState};
use crate::scanner::DocumentScanner;
use crate::types::{
    CameraFrame, Classification, DocumentScannerOutput, DocumentSide, ExifMetadata, ZoomLevel,
};
use std::time::Duration;

/// What the verification flow should do after one processed frame.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionEvent {
    /// No document-like region in the frame.
    NoDocument,
    /// A document was seen but the frame does not qualify; show guidance.
    Feedback(CaptureFeedback),
    /// A qualifying frame is being held while the picker window runs.
    Holding { remaining: Duration, best_score: f32 },
    /// The picker window elapsed; submit this candidate.
    Picked(Candidate),
}

pub struct ScanSession {
    scanner: DocumentScanner,
    picker: BestFramePicker,
    side: DocumentSide,
}

impl ScanSession {
    pub fn new(scanner: DocumentScanner, picker: BestFramePicker, side: DocumentSide) -> Self {
        log::info!("Scan session started for {} side", side.as_str());
        Self {
            scanner,
            picker,
            side,
        }
    }

    pub fn side(&self) -> DocumentSide {
        self.side
    }

    /// Process one captured frame.
    ///
    /// Must be called from the single frame-delivery context, one frame at
    /// a time; the await resolves before the next frame may be submitted.
    pub async fn process_frame(&mut self, frame: &CameraFrame) -> Result<SessionEvent, ScannerError> {
        // Window expiry is checked before scanning so a hold that already
        // elapsed emits its pick even if this frame turns out useless.
        if let PickerState::Picked(best) = self.picker.poll() {
            return Ok(SessionEvent::Picked(best));
        }

        let output = match self.scanner.scan_frame(frame, self.side).await? {
            Some(output) => output,
            None => return Ok(SessionEvent::NoDocument),
        };

        if !output.is_high_quality(self.side) {
            return Ok(SessionEvent::Feedback(guidance_for(&output, self.side)));
        }

        let candidate = Candidate {
            image: frame.to_rgb_image()?,
            exif: Some(ExifMetadata {
                captured_at: Some(frame.timestamp),
                ..Default::default()
            }),
            score: output.quality_score(),
            output,
        };

        Ok(picker_event(self.picker.consider(candidate)))
    }

    /// Timer-driven deadline check so a stalled frame feed still produces
    /// the picked event. Drive this from a periodic task alongside frames.
    pub fn poll(&mut self) -> SessionEvent {
        picker_event(self.picker.poll())
    }

    /// Flip to the other document side: clears detector rolling history and
    /// the picker window. The scanner's engine latch survives on purpose.
    pub fn flip_side(&mut self, side: DocumentSide) {
        log::info!("Scan session flipped to {} side", side.as_str());
        self.side = side;
        self.scanner.reset();
        self.picker.reset();
    }

    pub fn scanner(&self) -> &DocumentScanner {
        &self.scanner
    }
}

fn picker_event(state: PickerState) -> SessionEvent {
    match state {
        PickerState::Picked(candidate) => SessionEvent::Picked(candidate),
        PickerState::Holding {
            remaining,
            best_score,
        } => SessionEvent::Holding {
            remaining,
            best_score,
        },
        // An open window never reports idle from consider; a poll on an
        // idle picker means nothing qualified yet.
        PickerState::Idle => SessionEvent::NoDocument,
    }
}

/// Derive user guidance from a disqualified frame. The engine supplies its
/// own feedback; legacy outputs are mapped from the detector verdicts.
fn guidance_for(output: &DocumentScannerOutput, side: DocumentSide) -> CaptureFeedback {
    if let Some(feedback) = output.feedback() {
        return feedback;
    }

    match output {
        DocumentScannerOutput::Legacy {
            id_detector,
            motion_blur,
            camera_properties,
            blur,
            ..
        } => match id_detector.zoom_level {
            ZoomLevel::TooFar => CaptureFeedback::TooFar,
            ZoomLevel::TooClose => CaptureFeedback::TooClose,
            ZoomLevel::Ok => {
                if id_detector.classification == Classification::Invalid {
                    CaptureFeedback::DocumentNotFound
                } else if !id_detector.classification.matches(side) {
                    CaptureFeedback::WrongSide
                } else if motion_blur.has_motion_blur
                    || blur.is_blurry
                    || camera_properties.map_or(false, |p| p.is_adjusting_focus)
                {
                    CaptureFeedback::Blurry
                } else {
                    CaptureFeedback::DocumentNotFound
                }
            }
        },
        // Engine outputs without explicit feedback are terminal captures of
        // the wrong side.
        DocumentScannerOutput::Engine { .. } => CaptureFeedback::WrongSide,
    }
}
