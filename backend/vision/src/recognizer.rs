//! Recognition pipeline: OCR engine, then label selection, under a timeout.

use std::sync::Arc;
use std::time::Duration;

use robowarehouse_core::{Detection, LabelResult, OcrEngine, WarehouseError};
use serde::Serialize;
use tracing::{info, instrument};

use crate::selector::LabelSelector;

/// Everything recognition produced for one image.
#[derive(Debug, Clone, Serialize)]
pub struct Recognition {
    pub result: LabelResult,
    /// Raw text of every detection joined with ", ", independent of the chosen label
    pub raw_text: Option<String>,
    pub detections: Vec<Detection>,
}

pub struct Recognizer {
    engine: Arc<dyn OcrEngine>,
    selector: LabelSelector,
    timeout: Duration,
}

impl Recognizer {
    pub fn new(engine: Arc<dyn OcrEngine>, selector: LabelSelector, timeout: Duration) -> Self {
        Self {
            engine,
            selector,
            timeout,
        }
    }

    pub fn engine_name(&self) -> &str {
        self.engine.name()
    }

    pub fn selector(&self) -> LabelSelector {
        self.selector
    }

    /// Run OCR over a normalized PNG and pick the best label.
    #[instrument(skip(self, png), fields(engine = %self.engine.name(), size = png.len()))]
    pub async fn recognize(&self, png: &[u8]) -> Result<Recognition, WarehouseError> {
        let detections = tokio::time::timeout(self.timeout, self.engine.detect(png))
            .await
            .map_err(|_| WarehouseError::OcrTimeout(self.timeout.as_secs()))?
            .map_err(WarehouseError::from_anyhow)?;

        let result = self.selector.select(&detections);
        let raw_text = join_raw_text(&detections);

        info!(
            detections = detections.len(),
            label = ?result.label,
            confidence = result.confidence_percent,
            "Recognition finished"
        );

        Ok(Recognition {
            result,
            raw_text,
            detections,
        })
    }
}

fn join_raw_text(detections: &[Detection]) -> Option<String> {
    if detections.is_empty() {
        return None;
    }
    Some(
        detections
            .iter()
            .map(|d| d.text.as_str())
            .collect::<Vec<_>>()
            .join(", "),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::disabled::DisabledEngine;
    use anyhow::Result;
    use async_trait::async_trait;

    struct Scripted(Vec<Detection>);

    #[async_trait]
    impl OcrEngine for Scripted {
        fn name(&self) -> &str {
            "scripted"
        }

        async fn detect(&self, _png: &[u8]) -> Result<Vec<Detection>> {
            Ok(self.0.clone())
        }
    }

    struct Stalled;

    #[async_trait]
    impl OcrEngine for Stalled {
        fn name(&self) -> &str {
            "stalled"
        }

        async fn detect(&self, _png: &[u8]) -> Result<Vec<Detection>> {
            tokio::time::sleep(Duration::from_secs(60)).await;
            Ok(Vec::new())
        }
    }

    struct Broken;

    #[async_trait]
    impl OcrEngine for Broken {
        fn name(&self) -> &str {
            "broken"
        }

        async fn detect(&self, _png: &[u8]) -> Result<Vec<Detection>> {
            Err(WarehouseError::ocr("broken", "model missing").into())
        }
    }

    fn recognizer(engine: Arc<dyn OcrEngine>) -> Recognizer {
        Recognizer::new(engine, LabelSelector::default(), Duration::from_secs(5))
    }

    #[tokio::test]
    async fn joins_raw_text_of_all_detections() {
        let engine = Arc::new(Scripted(vec![
            Detection::new("c7", 0.95),
            Detection::new("b", 0.50),
            Detection::new("noise", 0.05),
        ]));
        let recognition = recognizer(engine).recognize(b"png").await.unwrap();
        assert_eq!(recognition.result.label.as_deref(), Some("b"));
        assert_eq!(recognition.raw_text.as_deref(), Some("c7, b, noise"));
        assert_eq!(recognition.detections.len(), 3);
    }

    #[tokio::test]
    async fn no_detections_means_no_raw_text() {
        let recognition = recognizer(Arc::new(DisabledEngine))
            .recognize(b"png")
            .await
            .unwrap();
        assert!(recognition.result.is_absent());
        assert_eq!(recognition.raw_text, None);
    }

    #[tokio::test(start_paused = true)]
    async fn slow_engine_times_out() {
        let recognizer = Recognizer::new(
            Arc::new(Stalled),
            LabelSelector::default(),
            Duration::from_secs(2),
        );
        let err = recognizer.recognize(b"png").await.unwrap_err();
        assert!(matches!(err, WarehouseError::OcrTimeout(2)));
    }

    #[tokio::test]
    async fn engine_errors_keep_their_type() {
        let err = recognizer(Arc::new(Broken)).recognize(b"png").await.unwrap_err();
        assert!(matches!(err, WarehouseError::Ocr { .. }));
    }
}
