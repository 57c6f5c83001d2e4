//! Motion-blur detector.
//!
//! Tracks bounding-box IOU across consecutive frames: a frame is treated
//! as carrying motion-blur risk until the box has held an IOU at or above
//! the threshold continuously for `min_time`. Any movement below the
//! threshold restarts the stability clock.

use crate::types::{BoundingBox, MotionBlurOutput};
use std::time::{Duration, Instant};

pub struct MotionBlurDetector {
    iou_threshold: f32,
    min_time: Duration,
    previous: Option<BoundingBox>,
    stable_since: Option<Instant>,
}

impl MotionBlurDetector {
    pub fn new(iou_threshold: f32, min_time: Duration) -> Self {
        Self {
            iou_threshold,
            min_time,
            previous: None,
            stable_since: None,
        }
    }

    /// Scan one frame's bounding box against the rolling history.
    pub fn scan(&mut self, bounding_box: &BoundingBox) -> MotionBlurOutput {
        self.scan_at(bounding_box, Instant::now())
    }

    /// Clock-injected variant of [`scan`](Self::scan) for deterministic tests.
    pub fn scan_at(&mut self, bounding_box: &BoundingBox, now: Instant) -> MotionBlurOutput {
        let output = match self.previous {
            None => {
                self.stable_since = Some(now);
                MotionBlurOutput {
                    has_motion_blur: true,
                    iou: None,
                    stable_for: Duration::ZERO,
                }
            }
            Some(previous) => {
                let iou = previous.iou(bounding_box);
                if iou >= self.iou_threshold {
                    let since = *self.stable_since.get_or_insert(now);
                    let stable_for = now.duration_since(since);
                    MotionBlurOutput {
                        has_motion_blur: stable_for < self.min_time,
                        iou: Some(iou),
                        stable_for,
                    }
                } else {
                    // Box moved; restart the stability clock.
                    self.stable_since = Some(now);
                    MotionBlurOutput {
                        has_motion_blur: true,
                        iou: Some(iou),
                        stable_for: Duration::ZERO,
                    }
                }
            }
        };

        self.previous = Some(*bounding_box);
        output
    }

    /// Clear rolling history. Used on side flip or capture restart.
    pub fn reset(&mut self) {
        self.previous = None;
        self.stable_since = None;
    }
}

impl Default for MotionBlurDetector {
    fn default() -> Self {
        Self::new(0.95, Duration::from_millis(500))
    }
}
