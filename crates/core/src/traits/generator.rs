//! Text generation traits

use async_trait::async_trait;

use crate::Result;

/// Bounded-length natural-language completion
///
/// `context` carries the passage texts the prompt was built from.
/// Fails with `Error::GenerationUnavailable` on provider error.
#[async_trait]
pub trait Generator: Send + Sync + 'static {
    async fn generate(&self, prompt: &str, context: &[String]) -> Result<String>;

    /// Model name for logging
    fn model_name(&self) -> &str;
}
