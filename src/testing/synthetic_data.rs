//! Deterministic synthetic camera frames.
//!
//! Frame generators shaped like real capture sessions: a textured ID-card
//! region over a flat background, with and without a barcode strip. All
//! content is a pure function of pixel position so tests are repeatable.

use crate::types::{BoundingBox, CameraFrame};

/// Normalized region the synthetic document occupies in every generator.
pub fn synthetic_document_box() -> BoundingBox {
    BoundingBox::new(0.125, 0.125, 0.75, 0.75)
}

/// Flat gray frame with no document-like structure.
pub fn synthetic_blank_frame(width: u32, height: u32) -> CameraFrame {
    CameraFrame::new(
        vec![200u8; (width * height * 3) as usize],
        width,
        height,
        "synthetic".to_string(),
    )
}

/// Frame with a sharp, textured document region over a flat background.
///
/// The texture alternates printed-looking line blocks with position-keyed
/// noise, giving high local variance (document detection) and high
/// Laplacian variance (sharpness).
pub fn synthetic_document_frame(width: u32, height: u32) -> CameraFrame {
    let mut frame = synthetic_blank_frame(width, height);
    paint_document(&mut frame, false);
    frame
}

/// Like [`synthetic_document_frame`] but with dark/light vertical bars in
/// the lower half of the document, shaped like a PDF417 strip.
pub fn synthetic_barcode_frame(width: u32, height: u32) -> CameraFrame {
    let mut frame = synthetic_blank_frame(width, height);
    paint_document(&mut frame, true);
    frame
}

fn paint_document(frame: &mut CameraFrame, with_barcode: bool) {
    let region = synthetic_document_box();
    let width = frame.width;
    let height = frame.height;

    let x0 = (region.x * width as f32) as u32;
    let y0 = (region.y * height as f32) as u32;
    let x1 = ((region.x + region.width) * width as f32) as u32;
    let y1 = ((region.y + region.height) * height as f32) as u32;
    let mid_y = (y0 + y1) / 2;

    for y in y0..y1 {
        for x in x0..x1 {
            let value = if with_barcode && y >= mid_y {
                // Barcode strip: 2px-wide alternating bars.
                if (x / 2) % 2 == 0 {
                    10
                } else {
                    245
                }
            } else if y % 7 < 2 {
                // Printed text line.
                20
            } else {
                // Card stock with position-keyed grain.
                (170 + ((x * 31 + y * 17) % 61)) as u8
            };

            let idx = ((y * width + x) * 3) as usize;
            frame.data[idx] = value;
            frame.data[idx + 1] = value;
            frame.data[idx + 2] = value;
        }
    }
}
