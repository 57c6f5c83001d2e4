//! Typed failures surfaced by the capture engine adapter.
//!
//! License errors are fatal for the adapter's lifetime. Capture-state
//! errors are per-frame; only runner errors trip the scanner's one-way
//! fallback latch.

use crate::types::DocumentSide;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Why license setup failed. One of these is surfaced whenever engine
/// construction fails or the 1-second license wait times out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LicenseError {
    NetworkRequired,
    RemoteCheckFailed,
    Locked,
    CheckFailed,
    CheckTimedOut,
    Invalid,
    PermissionExpired,
    PayloadCorrupted,
    SignatureVerificationFailed,
}

impl LicenseError {
    pub fn as_str(&self) -> &'static str {
        match self {
            LicenseError::NetworkRequired => "network connection required",
            LicenseError::RemoteCheckFailed => "remote license check failed",
            LicenseError::Locked => "license is locked",
            LicenseError::CheckFailed => "license check failed",
            LicenseError::CheckTimedOut => "license check timed out",
            LicenseError::Invalid => "license is invalid",
            LicenseError::PermissionExpired => "license permission expired",
            LicenseError::PayloadCorrupted => "license payload corrupted",
            LicenseError::SignatureVerificationFailed => "license signature verification failed",
        }
    }
}

/// Per-frame analysis failures reported by the engine runtime.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum CaptureStateError {
    /// The engine captured the opposite side of the one requested.
    WrongSide {
        expected: DocumentSide,
        got: DocumentSide,
    },
    /// Analysis finished without producing a usable result.
    NoValidResult,
    /// Runner-level failure wrapping the underlying SDK error code.
    Runner { code: i32, message: String },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum EngineError {
    License(LicenseError),
    CaptureState(CaptureStateError),
    Unknown(String),
}

impl EngineError {
    pub fn runner(code: i32, message: impl Into<String>) -> Self {
        EngineError::CaptureState(CaptureStateError::Runner {
            code,
            message: message.into(),
        })
    }

    pub fn wrong_side(expected: DocumentSide, got: DocumentSide) -> Self {
        EngineError::CaptureState(CaptureStateError::WrongSide { expected, got })
    }

    pub fn no_valid_result() -> Self {
        EngineError::CaptureState(CaptureStateError::NoValidResult)
    }

    /// Whether this error should permanently disable the engine for the
    /// rest of the session.
    pub fn is_runner_error(&self) -> bool {
        matches!(
            self,
            EngineError::CaptureState(CaptureStateError::Runner { .. })
        )
    }
}

impl fmt::Display for EngineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EngineError::License(reason) => write!(f, "license error: {}", reason.as_str()),
            EngineError::CaptureState(CaptureStateError::WrongSide { expected, got }) => write!(
                f,
                "captured {} while scanning {}",
                got.as_str(),
                expected.as_str()
            ),
            EngineError::CaptureState(CaptureStateError::NoValidResult) => {
                write!(f, "analysis produced no valid result")
            }
            EngineError::CaptureState(CaptureStateError::Runner { code, message }) => {
                write!(f, "runner error {}: {}", code, message)
            }
            EngineError::Unknown(msg) => write!(f, "unknown engine error: {}", msg),
        }
    }
}

impl std::error::Error for EngineError {}
