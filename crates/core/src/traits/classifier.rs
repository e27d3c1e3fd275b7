//! Intent classification traits

use async_trait::async_trait;

use crate::{Judgment, Result};

/// External text-classification capability
///
/// Returns `Judgment::Unknown` when the answer is ambiguous. Fails with
/// `Error::ClassificationUnavailable` on provider error. The decision policy
/// applied to these judgments belongs to the intent gate.
#[async_trait]
pub trait IntentClassifier: Send + Sync + 'static {
    async fn classify(&self, text: &str) -> Result<Judgment>;

    /// Classify with domain terms already spotted in the text
    ///
    /// Classifiers that cannot use hints fall back to `classify`.
    async fn classify_with_hints(&self, text: &str, hints: &[String]) -> Result<Judgment> {
        let _ = hints;
        self.classify(text).await
    }

    /// Classifier name for logging
    fn name(&self) -> &str;
}
