//! idscan: on-device identity document scanning.
//!
//! This crate is the image-quality scanning core of an identity
//! verification flow. It consumes live camera frames plus per-frame ML
//! detector outputs, runs multiple quality detectors per frame, degrades
//! one-way from a licensed capture engine to a legacy per-detector
//! pipeline on engine failure, and selects the best frame over a rolling
//! time window.
//!
//! # Features
//! - Document/ID detection with IOU non-max suppression and zoom verdicts
//! - Motion-blur, Laplacian sharpness, and barcode quality detectors
//! - Capture engine adapter with typed license and runner errors
//! - One-way per-session fallback from engine to legacy pipeline
//! - Fixed-window best-frame picker with timer-driven expiry
//!
//! # Usage
//! ```rust,no_run
//! use idscan::config::IdScanConfig;
//! use idscan::detectors::{ContrastModel, DocumentDetector};
//! use idscan::picker::BestFramePicker;
//! use idscan::scanner::DocumentScanner;
//! use idscan::session::ScanSession;
//! use idscan::types::{CameraFrame, Classification, DocumentSide};
//!
//! # async fn run(frame: CameraFrame) -> Result<(), idscan::ScannerError> {
//! let config = IdScanConfig::load_or_default();
//! let detector = config.document_detector(Box::new(ContrastModel::new(
//!     Classification::IdCardFront,
//! )));
//! let scanner = DocumentScanner::new(detector, None);
//! let mut session = ScanSession::new(scanner, config.picker(), DocumentSide::Front);
//!
//! let event = session.process_frame(&frame).await?;
//! # Ok(())
//! # }
//! ```
pub mod config;
pub mod detectors;
pub mod engine;
pub mod errors;
pub mod invariant_ppt;
pub mod picker;
pub mod scanner;
pub mod session;
pub mod types;

// Testing utilities - synthetic data and scriptable collaborators
pub mod testing;

// Re-exports for convenience
pub use errors::ScannerError;
pub use picker::{BestFramePicker, Candidate, PickerState};
pub use scanner::DocumentScanner;
pub use session::{ScanSession, SessionEvent};
pub use types::{
    CameraFrame, CameraProperties, Classification, DocumentScannerOutput, DocumentSide,
};

/// Initialize logging for the scanning pipeline
pub fn init_logging() {
    if std::env::var("RUST_LOG").is_err() {
        std::env::set_var("RUST_LOG", "idscan=info");
    }
    let _ = env_logger::try_init();
}

/// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const NAME: &str = env!("CARGO_PKG_NAME");
pub const DESCRIPTION: &str = env!("CARGO_PKG_DESCRIPTION");

/// Get crate information
pub fn get_info() -> CrateInfo {
    CrateInfo {
        name: NAME.to_string(),
        version: VERSION.to_string(),
        description: DESCRIPTION.to_string(),
    }
}

/// Crate information structure
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct CrateInfo {
    pub name: String,
    pub version: String,
    pub description: String,
}
