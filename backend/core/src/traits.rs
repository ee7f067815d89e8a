use anyhow::Result;
use async_trait::async_trait;

use crate::detection::Detection;

/// An optical character recognition backend.
///
/// Engines are built once by the composition root and shared behind an `Arc`.
/// Whatever the engine reports natively is normalized into [`Detection`]s
/// before it leaves the implementation.
#[async_trait]
pub trait OcrEngine: Send + Sync {
    /// Engine name for logs (e.g., "tesseract").
    fn name(&self) -> &str;

    /// Run recognition over a PNG-encoded RGB image.
    async fn detect(&self, png: &[u8]) -> Result<Vec<Detection>>;
}
