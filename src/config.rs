//! Configuration management for idscan.
//!
//! Provides loading, saving, and validation of detector thresholds,
//! capture-engine settings, and picker timing.

use crate::detectors::{
    BarcodeDetector, DetectionModel, DocumentDetector, DocumentDetectorConfig,
    LaplacianBlurDetector, MotionBlurDetector,
};
use crate::errors::ScannerError;
use crate::picker::BestFramePicker;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Root configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IdScanConfig {
    pub document: DocumentDetectorConfig,
    pub motion_blur: MotionBlurConfig,
    pub blur: BlurConfig,
    pub barcode: BarcodeConfig,
    pub picker: PickerConfig,
    pub engine: EngineConfig,
}

/// Motion-blur detector configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MotionBlurConfig {
    /// IOU at or above which consecutive boxes count as steady
    pub iou_threshold: f32,
    /// How long the box must stay steady before motion blur clears (ms)
    pub min_time_ms: u64,
}

/// Laplacian sharpness configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BlurConfig {
    /// Laplacian variance below which the crop is blurry
    pub variance_threshold: f32,
}

/// Barcode detector configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BarcodeConfig {
    /// Per-session decode timeout (ms) after which no-barcode is terminal
    pub timeout_ms: u64,
    /// Minimum dark/light transitions per pixel of strip width
    pub min_transition_density: f32,
    /// Minimum normalized luminance spread per strip row
    pub min_contrast: f32,
}

/// Best-frame picker configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PickerConfig {
    /// Hold window length (ms)
    pub window_ms: u64,
}

/// Capture engine configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Whether to attempt engine setup at all
    pub enabled: bool,
    /// Vendor license key; empty means run without the engine
    pub license_key: String,
}

impl Default for IdScanConfig {
    fn default() -> Self {
        Self {
            document: DocumentDetectorConfig::default(),
            motion_blur: MotionBlurConfig {
                iou_threshold: 0.95,
                min_time_ms: 500,
            },
            blur: BlurConfig {
                variance_threshold: 120.0,
            },
            barcode: BarcodeConfig {
                timeout_ms: 3000,
                min_transition_density: 0.08,
                min_contrast: 0.35,
            },
            picker: PickerConfig { window_ms: 1000 },
            engine: EngineConfig {
                enabled: true,
                license_key: String::new(),
            },
        }
    }
}

impl IdScanConfig {
    /// Load configuration from TOML file
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self, ScannerError> {
        let path = path.as_ref();

        if !path.exists() {
            log::info!("Config file not found at {:?}, using defaults", path);
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(path).map_err(|e| {
            ScannerError::DetectorError(format!("Failed to read config file: {}", e))
        })?;

        let config: IdScanConfig = toml::from_str(&contents).map_err(|e| {
            ScannerError::DetectorError(format!("Failed to parse config file: {}", e))
        })?;

        log::info!("Loaded configuration from {:?}", path);
        Ok(config)
    }

    /// Save configuration to TOML file
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<(), ScannerError> {
        let path = path.as_ref();

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| {
                ScannerError::DetectorError(format!("Failed to create config directory: {}", e))
            })?;
        }

        let toml_string = toml::to_string_pretty(self).map_err(|e| {
            ScannerError::DetectorError(format!("Failed to serialize config: {}", e))
        })?;

        fs::write(path, toml_string).map_err(|e| {
            ScannerError::DetectorError(format!("Failed to write config file: {}", e))
        })?;

        log::info!("Saved configuration to {:?}", path);
        Ok(())
    }

    /// Get default config file path
    pub fn default_path() -> PathBuf {
        PathBuf::from("idscan.toml")
    }

    /// Load from default location or create with defaults
    pub fn load_or_default() -> Self {
        Self::load_from_file(Self::default_path()).unwrap_or_else(|e| {
            log::warn!("Failed to load config, using defaults: {}", e);
            Self::default()
        })
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<(), String> {
        if !(0.0..=1.0).contains(&self.document.score_threshold) {
            return Err("Score threshold must be between 0.0 and 1.0".to_string());
        }
        if !(0.0..=1.0).contains(&self.document.nms_iou_threshold) {
            return Err("NMS IOU threshold must be between 0.0 and 1.0".to_string());
        }
        if self.document.min_box_area <= 0.0
            || self.document.max_box_area > 1.0
            || self.document.min_box_area >= self.document.max_box_area
        {
            return Err("Box area bounds must satisfy 0 < min < max <= 1".to_string());
        }

        if !(0.0..=1.0).contains(&self.motion_blur.iou_threshold) {
            return Err("Motion blur IOU threshold must be between 0.0 and 1.0".to_string());
        }
        if self.motion_blur.min_time_ms == 0 || self.motion_blur.min_time_ms > 10_000 {
            return Err("Motion blur min time must be 1-10000 ms".to_string());
        }

        if self.blur.variance_threshold < 0.0 {
            return Err("Blur variance threshold must be non-negative".to_string());
        }

        if self.barcode.timeout_ms == 0 || self.barcode.timeout_ms > 60_000 {
            return Err("Barcode timeout must be 1-60000 ms".to_string());
        }
        if !(0.0..=1.0).contains(&self.barcode.min_contrast) {
            return Err("Barcode contrast must be between 0.0 and 1.0".to_string());
        }

        if self.picker.window_ms == 0 || self.picker.window_ms > 30_000 {
            return Err("Picker window must be 1-30000 ms".to_string());
        }

        Ok(())
    }

    pub fn document_detector(&self, model: Box<dyn DetectionModel>) -> DocumentDetector {
        DocumentDetector::new(model, self.document.clone())
    }

    pub fn motion_blur_detector(&self) -> MotionBlurDetector {
        MotionBlurDetector::new(
            self.motion_blur.iou_threshold,
            Duration::from_millis(self.motion_blur.min_time_ms),
        )
    }

    pub fn blur_detector(&self) -> LaplacianBlurDetector {
        LaplacianBlurDetector::new(self.blur.variance_threshold)
    }

    pub fn barcode_detector(&self) -> BarcodeDetector {
        BarcodeDetector::new(
            Duration::from_millis(self.barcode.timeout_ms),
            self.barcode.min_transition_density,
            self.barcode.min_contrast,
        )
    }

    pub fn picker(&self) -> BestFramePicker {
        BestFramePicker::new(Duration::from_millis(self.picker.window_ms))
    }
}
