//! Default values for every config field.

/// Default HTTP bind address.
pub const DEFAULT_BIND_ADDRESS: &str = "0.0.0.0";

/// Default HTTP port.
pub const DEFAULT_PORT: u16 = 8000;

/// Default cap on a single multipart upload (10 MiB).
pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;

/// Default SQLite database path.
pub const DEFAULT_DB_PATH: &str = "robowarehouse.db";

/// Default directory for stored scan images.
pub const DEFAULT_UPLOAD_DIR: &str = "uploads";

/// Default tesseract executable.
pub const DEFAULT_TESSERACT_BIN: &str = "tesseract";

/// Default tesseract language pack.
pub const DEFAULT_LANGUAGE: &str = "eng";

/// Sparse text: labels are usually isolated glyphs, not paragraphs.
pub const DEFAULT_PAGE_SEG_MODE: u8 = 11;

/// Default OCR timeout in seconds.
pub const DEFAULT_OCR_TIMEOUT_SECS: u64 = 30;

/// Default minimum fractional confidence for a detection.
pub const DEFAULT_CONFIDENCE_THRESHOLD: f64 = 0.30;

/// Default log level.
pub const DEFAULT_LOG_LEVEL: &str = "info";
