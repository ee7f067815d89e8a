//! Config validation with user-friendly error messages.

use crate::schema::{OcrEngineKind, WarehouseConfig};
use thiserror::Error;

/// A config validation error with field path and message.
#[derive(Debug, Error)]
#[error("Config validation error at '{path}': {message}")]
pub struct ConfigValidationError {
    pub path: String,
    pub message: String,
}

/// A collection of validation errors found in one pass.
#[derive(Debug, Default)]
pub struct ValidationReport {
    pub errors: Vec<ConfigValidationError>,
    pub warnings: Vec<ConfigValidationError>,
}

impl ValidationReport {
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    fn error(&mut self, path: impl Into<String>, message: impl Into<String>) {
        self.errors.push(ConfigValidationError {
            path: path.into(),
            message: message.into(),
        });
    }

    fn warn(&mut self, path: impl Into<String>, message: impl Into<String>) {
        self.warnings.push(ConfigValidationError {
            path: path.into(),
            message: message.into(),
        });
    }
}

/// Validate the config and return a report of all errors and warnings.
pub fn validate(config: &WarehouseConfig) -> ValidationReport {
    let mut report = ValidationReport::default();
    validate_server(config, &mut report);
    validate_storage(config, &mut report);
    validate_ocr(config, &mut report);
    validate_selector(config, &mut report);
    report
}

fn validate_server(config: &WarehouseConfig, report: &mut ValidationReport) {
    let server = &config.server;
    if server.bind_address.trim().is_empty() {
        report.error("server.bindAddress", "Bind address cannot be empty");
    }
    if server.port == 0 {
        report.error("server.port", "Port must be non-zero");
    }
    if server.max_upload_bytes == 0 {
        report.error("server.maxUploadBytes", "Upload limit must be non-zero");
    }
}

fn validate_storage(config: &WarehouseConfig, report: &mut ValidationReport) {
    if config.storage.db_path.trim().is_empty() {
        report.error("storage.dbPath", "Database path cannot be empty");
    }
    if config.storage.upload_dir.trim().is_empty() {
        report.error("storage.uploadDir", "Upload directory cannot be empty");
    }
}

fn validate_ocr(config: &WarehouseConfig, report: &mut ValidationReport) {
    let ocr = &config.ocr;
    if ocr.engine == OcrEngineKind::Disabled {
        report.warn("ocr.engine", "OCR disabled; scans will never be labeled automatically");
        return;
    }
    if ocr.tesseract_bin.trim().is_empty() {
        report.error("ocr.tesseractBin", "Tesseract binary cannot be empty");
    }
    if ocr.languages.is_empty() {
        report.error("ocr.languages", "At least one language is required");
    }
    if ocr.languages.iter().any(|l| l.trim().is_empty()) {
        report.error("ocr.languages", "Language codes cannot be empty");
    }
    if ocr.page_seg_mode > 13 {
        report.error(
            "ocr.pageSegMode",
            format!("Page segmentation mode {} is outside 0..=13", ocr.page_seg_mode),
        );
    }
    if ocr.timeout_secs == 0 {
        report.error("ocr.timeoutSecs", "Timeout must be at least one second");
    }
}

fn validate_selector(config: &WarehouseConfig, report: &mut ValidationReport) {
    let threshold = config.selector.confidence_threshold;
    if !(0.0..=1.0).contains(&threshold) {
        report.error(
            "selector.confidenceThreshold",
            format!("Threshold {threshold} must be a fraction between 0 and 1"),
        );
    } else if threshold == 0.0 {
        report.warn(
            "selector.confidenceThreshold",
            "Threshold 0 accepts every scored detection",
        );
    } else if threshold > 1.0 - f64::EPSILON {
        report.warn(
            "selector.confidenceThreshold",
            "Threshold 1 only accepts perfect detections",
        );
    }
}
