use thiserror::Error;

/// Top-level error type for the RoboWarehouse service.
#[derive(Debug, Error)]
pub enum WarehouseError {
    #[error("invalid image: {0}")]
    InvalidImage(String),

    #[error("bad request: {0}")]
    BadRequest(String),

    #[error("scan not found: {0}")]
    ScanNotFound(i64),

    #[error("upload exceeds {limit} bytes")]
    PayloadTooLarge { limit: usize },

    #[error("OCR engine error ({engine}): {message}")]
    Ocr { engine: String, message: String },

    #[error("OCR timed out after {0}s")]
    OcrTimeout(u64),

    #[error("storage error: {0}")]
    Storage(String),

    #[error("configuration error: {0}")]
    Config(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl WarehouseError {
    pub fn ocr(engine: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Ocr {
            engine: engine.into(),
            message: message.into(),
        }
    }

    /// Recover a typed error that travelled through `anyhow`.
    pub fn from_anyhow(err: anyhow::Error) -> Self {
        match err.downcast::<WarehouseError>() {
            Ok(typed) => typed,
            Err(other) => WarehouseError::Other(other),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn typed_error_survives_anyhow_round_trip() {
        let err: anyhow::Error = WarehouseError::ScanNotFound(7).into();
        match WarehouseError::from_anyhow(err) {
            WarehouseError::ScanNotFound(id) => assert_eq!(id, 7),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn foreign_error_becomes_other() {
        let err = anyhow::anyhow!("disk on fire");
        assert!(matches!(WarehouseError::from_anyhow(err), WarehouseError::Other(_)));
    }
}
