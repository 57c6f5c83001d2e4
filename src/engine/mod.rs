//! Capture engine adapter.
//!
//! Wraps a licensed, vendor-supplied document capture analyzer behind the
//! [`AnalyzerBackend`] seam and normalizes its callback-based results into
//! [`EngineResult`] values and typed [`EngineError`] failures.
//!
//! Each engine instance is session-scoped and owns its own completion
//! channels; there is no shared delegate, so concurrent sessions and tests
//! stay isolated.

pub mod errors;

pub use errors::{CaptureStateError, EngineError, LicenseError};

use crate::assert_invariant;
use crate::types::{CameraFrame, DocumentSide};
use serde::{Deserialize, Serialize};
use std::sync::mpsc;
use std::time::Duration;
use tokio::sync::oneshot;

/// How long license setup may block before surfacing a timeout.
pub const LICENSE_TIMEOUT: Duration = Duration::from_secs(1);

/// In-progress capture guidance reported while the engine is still hunting
/// for a good frame. Forwarded to the UI layer as user guidance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CaptureFeedback {
    TooFar,
    TooClose,
    Blurry,
    Glare,
    Occluded,
    WrongSide,
    Tilted,
    DocumentNotFound,
}

impl CaptureFeedback {
    /// User-facing guidance string for this feedback state.
    pub fn guidance(&self) -> &'static str {
        match self {
            CaptureFeedback::TooFar => "move closer",
            CaptureFeedback::TooClose => "move farther away",
            CaptureFeedback::Blurry => "hold still",
            CaptureFeedback::Glare => "reduce glare",
            CaptureFeedback::Occluded => "uncover the document",
            CaptureFeedback::WrongSide => "flip the document",
            CaptureFeedback::Tilted => "hold the document flat",
            CaptureFeedback::DocumentNotFound => "position the document in the frame",
        }
    }
}

/// Terminal or in-progress analysis result for one frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum EngineResult {
    /// The engine settled on a capture: the original frame, the
    /// perspective-corrected document crop, and which side it saw.
    Captured {
        original: CameraFrame,
        transformed: CameraFrame,
        side: DocumentSide,
    },
    /// Still analyzing; carries guidance for the user.
    Capturing(CaptureFeedback),
}

/// Seam to the vendor analyzer.
///
/// `request_license` must eventually send exactly one setup result on
/// `done` (the adapter stops waiting after [`LICENSE_TIMEOUT`]).
/// `submit` receives exactly one frame and must deliver exactly one
/// terminal callback on its completion channel: a result or an error,
/// never both, never more than one.
pub trait AnalyzerBackend: Send {
    fn request_license(
        &mut self,
        license_key: &str,
        done: mpsc::Sender<Result<(), LicenseError>>,
    );

    fn submit(
        &mut self,
        frame: CameraFrame,
        done: oneshot::Sender<Result<EngineResult, EngineError>>,
    );
}

/// Session-scoped adapter over an [`AnalyzerBackend`].
///
/// Construction performs license setup synchronously; `analyze` is one
/// frame in flight at a time, enforced by `&mut self` and the await.
pub struct CaptureEngine {
    backend: Box<dyn AnalyzerBackend>,
    in_flight: bool,
}

impl CaptureEngine {
    /// Set up the engine license, blocking up to [`LICENSE_TIMEOUT`].
    ///
    /// Any failure here is fatal for the adapter's lifetime: callers should
    /// log it and run the session without an engine.
    pub fn new(
        mut backend: Box<dyn AnalyzerBackend>,
        license_key: &str,
    ) -> Result<Self, EngineError> {
        let (tx, rx) = mpsc::channel();
        backend.request_license(license_key, tx);

        match rx.recv_timeout(LICENSE_TIMEOUT) {
            Ok(Ok(())) => {
                log::info!("Capture engine license verified");
                Ok(Self {
                    backend,
                    in_flight: false,
                })
            }
            Ok(Err(reason)) => {
                log::error!("Capture engine license setup failed: {}", reason.as_str());
                Err(EngineError::License(reason))
            }
            Err(mpsc::RecvTimeoutError::Timeout) => {
                log::error!(
                    "Capture engine license setup timed out after {:?}",
                    LICENSE_TIMEOUT
                );
                Err(EngineError::License(LicenseError::CheckTimedOut))
            }
            Err(mpsc::RecvTimeoutError::Disconnected) => {
                log::error!("Capture engine dropped the license channel");
                Err(EngineError::License(LicenseError::CheckFailed))
            }
        }
    }

    /// Analyze one frame and await its terminal callback.
    ///
    /// Callers must not pipeline frames: the next frame may only be
    /// submitted once this call resolves. `&mut self` makes concurrent
    /// submission unrepresentable; the adapter does not queue internally.
    pub async fn analyze(&mut self, frame: &CameraFrame) -> Result<EngineResult, EngineError> {
        assert_invariant!(
            !self.in_flight,
            "a frame is only submitted after the previous result resolved",
            "engine::analyze"
        );
        self.in_flight = true;

        let (tx, rx) = oneshot::channel();
        self.backend.submit(frame.clone(), tx);

        let received = rx.await;
        self.in_flight = false;
        let result = received
            .map_err(|_| EngineError::Unknown("analyzer dropped completion channel".to_string()))?;

        if let Err(err) = &result {
            log::warn!("Capture engine analysis error: {}", err);
        }
        result
    }
}
