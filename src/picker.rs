//! Best-frame picker.
//!
//! A greedy fixed-window maximum-score selector: the first qualifying
//! frame opens a hold window, higher-scoring frames replace the stored
//! candidate, and when the window elapses the best candidate is emitted
//! as picked. A very high score arriving after the window closes is never
//! reconsidered.

use crate::types::{DocumentScannerOutput, ExifMetadata};
use std::time::{Duration, Instant};

/// A candidate frame held by the picker. Replaced wholesale whenever a
/// strictly higher-scoring frame arrives within the window.
#[derive(Debug, Clone, PartialEq)]
pub struct Candidate {
    pub image: image::RgbImage,
    pub output: DocumentScannerOutput,
    pub exif: Option<ExifMetadata>,
    pub score: f32,
}

/// Picker state returned from every call.
#[derive(Debug, Clone, PartialEq)]
pub enum PickerState {
    Idle,
    Holding { remaining: Duration, best_score: f32 },
    Picked(Candidate),
}

pub struct BestFramePicker {
    window: Duration,
    deadline: Option<Instant>,
    best: Option<Candidate>,
}

impl BestFramePicker {
    pub fn new(window: Duration) -> Self {
        Self {
            window,
            deadline: None,
            best: None,
        }
    }

    /// Offer a qualifying frame to the picker.
    ///
    /// The first call in an idle window stores the candidate and opens the
    /// window. Later calls before the deadline replace the stored best only
    /// on a strictly greater score. At or after the deadline the stored
    /// best is returned as `Picked` and the picker goes idle; the offered
    /// candidate is not considered for the closed window.
    pub fn consider(&mut self, candidate: Candidate) -> PickerState {
        self.consider_at(candidate, Instant::now())
    }

    /// Clock-injected variant of [`consider`](Self::consider).
    pub fn consider_at(&mut self, candidate: Candidate, now: Instant) -> PickerState {
        match self.deadline {
            None => {
                log::debug!(
                    "Picker window opened for {:?} with score {:.3}",
                    self.window,
                    candidate.score
                );
                let best_score = candidate.score;
                self.best = Some(candidate);
                self.deadline = Some(now + self.window);
                PickerState::Holding {
                    remaining: self.window,
                    best_score,
                }
            }
            Some(deadline) => {
                if now >= deadline {
                    return self.finish_window();
                }

                let replace = self
                    .best
                    .as_ref()
                    .map_or(true, |best| candidate.score > best.score);
                if replace {
                    log::debug!("Picker candidate replaced, score {:.3}", candidate.score);
                    self.best = Some(candidate);
                }

                PickerState::Holding {
                    remaining: deadline - now,
                    best_score: self.best.as_ref().map_or(0.0, |b| b.score),
                }
            }
        }
    }

    /// Check the deadline without offering a frame.
    ///
    /// Emits `Picked` once the window has elapsed even if no further frames
    /// arrive; session drivers should call this on a timer so a stalled
    /// feed still produces the picked event.
    pub fn poll(&mut self) -> PickerState {
        self.poll_at(Instant::now())
    }

    /// Clock-injected variant of [`poll`](Self::poll).
    pub fn poll_at(&mut self, now: Instant) -> PickerState {
        match self.deadline {
            None => PickerState::Idle,
            Some(deadline) if now >= deadline => self.finish_window(),
            Some(deadline) => PickerState::Holding {
                remaining: deadline - now,
                best_score: self.best.as_ref().map_or(0.0, |b| b.score),
            },
        }
    }

    /// Unconditionally clear the deadline and the stored candidate. The
    /// next `consider` behaves exactly like the first on a fresh picker.
    pub fn reset(&mut self) {
        self.deadline = None;
        self.best = None;
    }

    fn finish_window(&mut self) -> PickerState {
        self.deadline = None;
        match self.best.take() {
            Some(best) => {
                log::info!("Picker emitted best frame with score {:.3}", best.score);
                PickerState::Picked(best)
            }
            None => PickerState::Idle,
        }
    }
}

impl Default for BestFramePicker {
    fn default() -> Self {
        Self::new(Duration::from_secs(1))
    }
}
