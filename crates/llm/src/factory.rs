//! LLM Factory
//!
//! Creates the configured backend and the `Generator` / `IntentClassifier`
//! views over it.
//!
//! ## Supported Providers
//! - **OpenAI**: any OpenAI-compatible `chat/completions` API
//! - **Ollama**: local models via `/api/chat`

use std::sync::Arc;

use agri_faq_config::{LlmConfig as LlmSettings, LlmProvider};
use agri_faq_core::{Generator, IntentClassifier};

use crate::backend::{LlmBackend, LlmConfig, OllamaBackend, OpenAIBackend, OpenAIConfig};
use crate::classifier::LlmIntentClassifier;
use crate::generator::LlmGenerator;
use crate::LlmError;

/// Build the chat backend selected by `settings.provider`
pub fn create_backend(settings: &LlmSettings) -> Result<Arc<dyn LlmBackend>, LlmError> {
    let backend: Arc<dyn LlmBackend> = match settings.provider {
        LlmProvider::OpenAI => Arc::new(OpenAIBackend::new(OpenAIConfig {
            endpoint: settings.endpoint.clone(),
            api_key: settings.api_key.clone().unwrap_or_default(),
            model: settings.model.clone(),
            max_tokens: settings.max_tokens,
            temperature: settings.temperature,
            timeout: settings.timeout(),
        })?),
        LlmProvider::Ollama => Arc::new(OllamaBackend::new(LlmConfig {
            endpoint: settings.endpoint.clone(),
            model: settings.model.clone(),
            max_tokens: settings.max_tokens,
            temperature: settings.temperature,
            timeout: settings.timeout(),
            ..Default::default()
        })?),
    };

    tracing::info!(
        provider = ?settings.provider,
        model = %settings.model,
        endpoint = %settings.endpoint,
        "Created LLM backend"
    );

    Ok(backend)
}

pub fn create_generator(backend: Arc<dyn LlmBackend>) -> Arc<dyn Generator> {
    Arc::new(LlmGenerator::new(backend))
}

pub fn create_classifier(backend: Arc<dyn LlmBackend>) -> Arc<dyn IntentClassifier> {
    Arc::new(LlmIntentClassifier::new(backend))
}
