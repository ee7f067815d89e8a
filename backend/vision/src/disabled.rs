use anyhow::Result;
use async_trait::async_trait;
use robowarehouse_core::{Detection, OcrEngine};

/// Engine that never detects anything.
///
/// Every scan ends up unlabeled, leaving labeling to the operator.
#[derive(Debug, Clone, Copy, Default)]
pub struct DisabledEngine;

#[async_trait]
impl OcrEngine for DisabledEngine {
    fn name(&self) -> &str {
        "disabled"
    }

    async fn detect(&self, _png: &[u8]) -> Result<Vec<Detection>> {
        Ok(Vec::new())
    }
}
