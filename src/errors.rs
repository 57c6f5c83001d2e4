use crate::engine::errors::EngineError;
use std::fmt;

#[derive(Debug, Clone, PartialEq)]
pub enum ScannerError {
    InvalidFrame(String),
    CropError(String),
    ModelError(String),
    DetectorError(String),
    Engine(EngineError),
}

impl fmt::Display for ScannerError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ScannerError::InvalidFrame(msg) => write!(f, "Invalid frame: {}", msg),
            ScannerError::CropError(msg) => write!(f, "Crop error: {}", msg),
            ScannerError::ModelError(msg) => write!(f, "Detection model error: {}", msg),
            ScannerError::DetectorError(msg) => write!(f, "Detector error: {}", msg),
            ScannerError::Engine(err) => write!(f, "Capture engine error: {}", err),
        }
    }
}

impl std::error::Error for ScannerError {}

impl From<EngineError> for ScannerError {
    fn from(err: EngineError) -> Self {
        ScannerError::Engine(err)
    }
}
