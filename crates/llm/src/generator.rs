//! `Generator` over a chat backend

use async_trait::async_trait;
use std::sync::Arc;

use agri_faq_core::{Error, Generator, Result};

use crate::backend::{GenerationOptions, LlmBackend};
use crate::prompt::{Message, GROUNDED_SYSTEM_PROMPT};

/// Sends a prepared grounded prompt with the grounding system instruction
pub struct LlmGenerator {
    backend: Arc<dyn LlmBackend>,
    options: GenerationOptions,
}

impl LlmGenerator {
    pub fn new(backend: Arc<dyn LlmBackend>) -> Self {
        Self {
            backend,
            options: GenerationOptions::default(),
        }
    }

    pub fn with_options(mut self, options: GenerationOptions) -> Self {
        self.options = options;
        self
    }
}

#[async_trait]
impl Generator for LlmGenerator {
    async fn generate(&self, prompt: &str, context: &[String]) -> Result<String> {
        let messages = [Message::system(GROUNDED_SYSTEM_PROMPT), Message::user(prompt)];

        let result = self.backend.generate(&messages, self.options).await?;
        let text = result.text.trim();
        if text.is_empty() {
            return Err(Error::GenerationUnavailable("Empty completion".to_string()));
        }

        tracing::debug!(
            model = self.backend.model_name(),
            passages = context.len(),
            tokens = result.tokens,
            finish_reason = ?result.finish_reason,
            "Answer generated"
        );

        Ok(text.to_string())
    }

    fn model_name(&self) -> &str {
        self.backend.model_name()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::{FinishReason, GenerationResult};
    use crate::LlmError;
    use parking_lot::Mutex;

    struct ScriptedBackend {
        replies: Mutex<Vec<std::result::Result<String, LlmError>>>,
        seen: Mutex<Vec<Vec<Message>>>,
    }

    impl ScriptedBackend {
        fn new(replies: Vec<std::result::Result<String, LlmError>>) -> Arc<Self> {
            Arc::new(Self {
                replies: Mutex::new(replies),
                seen: Mutex::new(Vec::new()),
            })
        }
    }

    #[async_trait]
    impl LlmBackend for ScriptedBackend {
        async fn generate(
            &self,
            messages: &[Message],
            _options: GenerationOptions,
        ) -> std::result::Result<GenerationResult, LlmError> {
            self.seen.lock().push(messages.to_vec());
            let text = self.replies.lock().remove(0)?;
            Ok(GenerationResult {
                text,
                tokens: 3,
                total_time_ms: 1,
                finish_reason: FinishReason::Stop,
            })
        }

        fn model_name(&self) -> &str {
            "scripted"
        }
    }

    #[tokio::test]
    async fn test_generate_trims_and_sends_system_prompt() {
        let backend = ScriptedBackend::new(vec![Ok("  Aids vegetative recovery.\n".to_string())]);
        let generator = LlmGenerator::new(backend.clone());

        let answer = generator.generate("Q: what?", &["ctx".to_string()]).await.unwrap();
        assert_eq!(answer, "Aids vegetative recovery.");

        let seen = backend.seen.lock();
        assert_eq!(seen[0][0].content, GROUNDED_SYSTEM_PROMPT);
        assert_eq!(seen[0][1].content, "Q: what?");
    }

    #[tokio::test]
    async fn test_backend_failure_is_generation_unavailable() {
        let backend = ScriptedBackend::new(vec![Err(LlmError::Network("refused".to_string()))]);
        let err = LlmGenerator::new(backend).generate("p", &[]).await.unwrap_err();
        assert!(matches!(err, Error::GenerationUnavailable(_)));
        assert!(err.is_transient());
    }

    #[tokio::test]
    async fn test_empty_completion_is_unavailable() {
        let backend = ScriptedBackend::new(vec![Ok("   ".to_string())]);
        let err = LlmGenerator::new(backend).generate("p", &[]).await.unwrap_err();
        assert!(matches!(err, Error::GenerationUnavailable(_)));
    }
}
