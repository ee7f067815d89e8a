//! Turning uploaded photos into labels.
//!
//! Upload normalization, OCR engine adapters, and the label selection
//! heuristic that reduces raw detections to a single letter.

pub mod disabled;
pub mod mime_detect;
pub mod recognizer;
pub mod selector;
pub mod tesseract;
pub mod upload;

pub use disabled::DisabledEngine;
pub use mime_detect::{detect_mime_type, is_inline_safe};
pub use recognizer::{Recognition, Recognizer};
pub use selector::{LabelSelector, DEFAULT_CONFIDENCE_THRESHOLD};
pub use tesseract::TesseractEngine;
pub use upload::{decode_upload, NormalizedImage};
