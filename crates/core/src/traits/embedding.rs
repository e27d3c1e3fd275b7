//! Embedding traits

use async_trait::async_trait;

use crate::Result;

/// Text embedding interface
///
/// Implementations:
/// - `OllamaEmbedder` - HTTP embedding provider
/// - `HashEmbedder` - deterministic local embedder
///
/// Fails with `Error::EmbeddingUnavailable` on provider error.
#[async_trait]
pub trait Embedder: Send + Sync + 'static {
    /// Embed a single text
    async fn embed(&self, text: &str) -> Result<Vec<f32>>;

    /// Output dimensionality
    fn dimension(&self) -> usize;

    /// Embedder name for logging
    fn name(&self) -> &str;
}
