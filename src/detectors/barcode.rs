//! Barcode detector.
//!
//! Scans only the back-of-card barcode strip for a PDF417-like bar
//! pattern: enough luminance contrast and a high enough density of
//! dark/light transitions per row. The detector owns a per-session
//! timeout; once it elapses without a readable barcode, "no barcode" is
//! terminal: the strip decode is skipped from then on and later frames
//! cannot reverse the verdict until `reset()`. The rest of the pipeline
//! then judges back-side frames on the non-barcode quality path alone.

use super::luminance_plane;
use crate::errors::ScannerError;
use crate::types::{BarcodeOutput, BoundingBox, CameraFrame};
use std::time::{Duration, Instant};

pub struct BarcodeDetector {
    timeout: Duration,
    min_transition_density: f32,
    min_contrast: f32,
    first_scan: Option<Instant>,
    timed_out: bool,
}

impl BarcodeDetector {
    pub fn new(timeout: Duration, min_transition_density: f32, min_contrast: f32) -> Self {
        Self {
            timeout,
            min_transition_density,
            min_contrast,
            first_scan: None,
            timed_out: false,
        }
    }

    /// Scan the barcode strip of the detected document region.
    pub fn scan(
        &mut self,
        frame: &CameraFrame,
        document_box: &BoundingBox,
    ) -> Result<BarcodeOutput, ScannerError> {
        self.scan_at(frame, document_box, Instant::now())
    }

    /// Clock-injected variant of [`scan`](Self::scan) for deterministic tests.
    pub fn scan_at(
        &mut self,
        frame: &CameraFrame,
        document_box: &BoundingBox,
        now: Instant,
    ) -> Result<BarcodeOutput, ScannerError> {
        let started = *self.first_scan.get_or_insert(now);

        // Once the verdict is terminal the decode is skipped entirely;
        // frames after the timeout cannot reopen it.
        if self.timed_out {
            return Ok(BarcodeOutput {
                has_barcode: false,
                symbology: None,
                timed_out: true,
            });
        }

        let strip = barcode_strip(document_box);
        let crop = frame.crop(&strip)?;
        let has_barcode = self.strip_has_bars(&crop);
        let timed_out = !has_barcode && now.duration_since(started) >= self.timeout;

        if timed_out {
            log::debug!("Barcode scan timed out; no-barcode is terminal for this session");
            self.timed_out = true;
        }

        Ok(BarcodeOutput {
            has_barcode,
            symbology: has_barcode.then(|| "pdf417".to_string()),
            timed_out,
        })
    }

    /// Clear the timeout clock and the terminal verdict. Used on side flip
    /// or capture restart.
    pub fn reset(&mut self) {
        self.first_scan = None;
        self.timed_out = false;
    }

    /// A strip "has bars" when most rows show strong contrast and a dense
    /// alternation of dark and light runs.
    fn strip_has_bars(&self, crop: &CameraFrame) -> bool {
        let width = crop.width as usize;
        let height = crop.height as usize;
        if width < 8 || height == 0 {
            return false;
        }

        let plane = luminance_plane(crop);
        let mut qualifying_rows = 0usize;

        for y in 0..height {
            let row = &plane[y * width..(y + 1) * width];
            let min = row.iter().cloned().fold(f32::MAX, f32::min);
            let max = row.iter().cloned().fold(f32::MIN, f32::max);
            if (max - min) / 255.0 < self.min_contrast {
                continue;
            }

            let midpoint = (max + min) / 2.0;
            let mut transitions = 0usize;
            let mut previous_dark = row[0] < midpoint;
            for value in &row[1..] {
                let dark = *value < midpoint;
                if dark != previous_dark {
                    transitions += 1;
                    previous_dark = dark;
                }
            }

            if transitions as f32 / width as f32 >= self.min_transition_density {
                qualifying_rows += 1;
            }
        }

        qualifying_rows as f32 / height as f32 >= 0.5
    }
}

impl Default for BarcodeDetector {
    fn default() -> Self {
        Self::new(Duration::from_secs(3), 0.08, 0.35)
    }
}

/// The barcode strip is the lower half of the detected document box.
fn barcode_strip(document_box: &BoundingBox) -> BoundingBox {
    BoundingBox::new(
        document_box.x,
        document_box.y + document_box.height / 2.0,
        document_box.width,
        document_box.height / 2.0,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn document_box() -> BoundingBox {
        BoundingBox::new(0.1, 0.1, 0.8, 0.8)
    }

    /// Frame whose lower document half alternates dark/light vertical bars.
    fn barcode_frame(width: u32, height: u32) -> CameraFrame {
        let mut data = vec![200u8; (width * height * 3) as usize];
        for y in (height / 2)..height {
            for x in 0..width {
                let value = if (x / 2) % 2 == 0 { 10 } else { 245 };
                let idx = ((y * width + x) * 3) as usize;
                data[idx] = value;
                data[idx + 1] = value;
                data[idx + 2] = value;
            }
        }
        CameraFrame::new(data, width, height, "test".to_string())
    }

    fn plain_frame(width: u32, height: u32) -> CameraFrame {
        CameraFrame::new(vec![200u8; (width * height * 3) as usize], width, height, "test".to_string())
    }

    #[test]
    fn test_bar_pattern_is_detected() {
        let mut detector = BarcodeDetector::default();
        let output = detector
            .scan_at(&barcode_frame(100, 100), &document_box(), Instant::now())
            .unwrap();
        assert!(output.has_barcode);
        assert_eq!(output.symbology.as_deref(), Some("pdf417"));
        assert!(!output.timed_out);
    }

    #[test]
    fn test_plain_strip_has_no_barcode() {
        let mut detector = BarcodeDetector::default();
        let output = detector
            .scan_at(&plain_frame(100, 100), &document_box(), Instant::now())
            .unwrap();
        assert!(!output.has_barcode);
        assert!(!output.timed_out);
    }

    #[test]
    fn test_timeout_makes_no_barcode_terminal() {
        let mut detector = BarcodeDetector::new(Duration::from_secs(3), 0.08, 0.35);
        let t0 = Instant::now();

        let first = detector
            .scan_at(&plain_frame(100, 100), &document_box(), t0)
            .unwrap();
        assert!(!first.is_terminal());

        let late = detector
            .scan_at(
                &plain_frame(100, 100),
                &document_box(),
                t0 + Duration::from_secs(4),
            )
            .unwrap();
        assert!(late.timed_out);
        assert!(late.is_terminal());
    }

    #[test]
    fn test_terminal_verdict_is_never_retried() {
        let mut detector = BarcodeDetector::new(Duration::from_secs(3), 0.08, 0.35);
        let t0 = Instant::now();

        detector
            .scan_at(&plain_frame(100, 100), &document_box(), t0)
            .unwrap();
        let terminal = detector
            .scan_at(
                &plain_frame(100, 100),
                &document_box(),
                t0 + Duration::from_secs(4),
            )
            .unwrap();
        assert!(terminal.timed_out);

        // A decodable strip arriving after the timeout cannot reverse the
        // terminal no-barcode verdict.
        let late = detector
            .scan_at(
                &barcode_frame(100, 100),
                &document_box(),
                t0 + Duration::from_secs(5),
            )
            .unwrap();
        assert!(!late.has_barcode);
        assert!(late.timed_out);
        assert!(late.is_terminal());
    }

    #[test]
    fn test_reset_clears_terminal_verdict() {
        let mut detector = BarcodeDetector::new(Duration::from_secs(3), 0.08, 0.35);
        let t0 = Instant::now();
        detector
            .scan_at(&plain_frame(100, 100), &document_box(), t0)
            .unwrap();
        detector
            .scan_at(
                &plain_frame(100, 100),
                &document_box(),
                t0 + Duration::from_secs(4),
            )
            .unwrap();

        detector.reset();
        let output = detector
            .scan_at(
                &barcode_frame(100, 100),
                &document_box(),
                t0 + Duration::from_secs(5),
            )
            .unwrap();
        assert!(output.has_barcode);
        assert!(!output.timed_out);
    }

    #[test]
    fn test_reset_restarts_timeout_clock() {
        let mut detector = BarcodeDetector::new(Duration::from_secs(3), 0.08, 0.35);
        let t0 = Instant::now();
        detector
            .scan_at(&plain_frame(100, 100), &document_box(), t0)
            .unwrap();

        detector.reset();
        let output = detector
            .scan_at(
                &plain_frame(100, 100),
                &document_box(),
                t0 + Duration::from_secs(4),
            )
            .unwrap();
        assert!(!output.timed_out);
    }
}
