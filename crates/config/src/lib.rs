//! Configuration management for the agricultural FAQ service
//!
//! Supports loading configuration from:
//! - YAML/TOML files under `config/`
//! - Environment variables (AGRI_FAQ__ prefix)
//!
//! The term-correction vocabulary is a separate file, see [`vocabulary`].

pub mod constants;
pub mod settings;
pub mod vocabulary;

pub use settings::{
    load_settings, load_settings_from, CacheConfig, EmbeddingConfig, EmbeddingProvider,
    IntentConfig, LlmConfig, LlmProvider, ObservabilityConfig, RagConfig, RuntimeEnvironment,
    ServerConfig, Settings,
};
pub use vocabulary::VocabularyConfig;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Configuration file not found: {0}")]
    FileNotFound(String),

    #[error("Failed to parse configuration: {0}")]
    ParseError(String),

    #[error("Missing required field: {0}")]
    MissingField(String),

    #[error("Invalid value for {field}: {message}")]
    InvalidValue { field: String, message: String },

    #[error("Environment error: {0}")]
    Environment(String),
}

impl From<config::ConfigError> for ConfigError {
    fn from(err: config::ConfigError) -> Self {
        ConfigError::ParseError(err.to_string())
    }
}

impl From<ConfigError> for agri_faq_core::Error {
    fn from(err: ConfigError) -> Self {
        agri_faq_core::Error::Config(err.to_string())
    }
}
