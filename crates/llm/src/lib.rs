//! LLM integration for the FAQ core
//!
//! Features:
//! - Ollama and OpenAI-compatible chat backends
//! - Grounded answer prompts (generic and focused on one named term)
//! - `Generator` and `IntentClassifier` implementations over any backend

pub mod backend;
pub mod classifier;
pub mod factory;
pub mod generator;
pub mod prompt;

pub use backend::{
    FinishReason, GenerationOptions, GenerationResult, LlmBackend, LlmConfig, OllamaBackend,
    OpenAIBackend, OpenAIConfig,
};
pub use classifier::{parse_judgment, LlmIntentClassifier};
pub use factory::{create_backend, create_classifier, create_generator};
pub use generator::LlmGenerator;
pub use prompt::{Message, PromptBuilder, Role};

use thiserror::Error;

/// LLM errors
#[derive(Error, Debug)]
pub enum LlmError {
    #[error("Generation error: {0}")]
    Generation(String),

    #[error("API error: {0}")]
    Api(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Timeout")]
    Timeout,

    #[error("Configuration error: {0}")]
    Configuration(String),
}

impl From<reqwest::Error> for LlmError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            LlmError::Timeout
        } else {
            LlmError::Network(err.to_string())
        }
    }
}

impl From<LlmError> for agri_faq_core::Error {
    fn from(err: LlmError) -> Self {
        match err {
            LlmError::Configuration(msg) => agri_faq_core::Error::Config(msg),
            other => agri_faq_core::Error::GenerationUnavailable(other.to_string()),
        }
    }
}
