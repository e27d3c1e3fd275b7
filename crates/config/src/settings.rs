//! Main settings module

use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

use agri_faq_core::RetryPolicy;

use crate::constants::{cache, endpoints, models, rag, timeouts};
use crate::ConfigError;

/// Runtime environment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum RuntimeEnvironment {
    /// Relaxed validation
    #[default]
    Development,
    Staging,
    /// All validations enforced
    Production,
}

impl RuntimeEnvironment {
    pub fn is_production(&self) -> bool {
        matches!(self, Self::Production)
    }

    /// Check if strict validation should be applied
    pub fn is_strict(&self) -> bool {
        matches!(self, Self::Production | Self::Staging)
    }
}

/// Main application settings
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Settings {
    #[serde(default)]
    pub environment: RuntimeEnvironment,

    #[serde(default)]
    pub server: ServerConfig,

    /// Corpus, chunking and retrieval
    #[serde(default)]
    pub rag: RagConfig,

    /// Embedding provider
    #[serde(default)]
    pub embedding: EmbeddingConfig,

    /// Generation provider (also backs the intent classifier)
    #[serde(default)]
    pub llm: LlmConfig,

    #[serde(default)]
    pub intent: IntentConfig,

    /// Response cache tiers and priming
    #[serde(default)]
    pub cache: CacheConfig,

    /// Term-correction vocabulary file; the built-in table is used when unset
    #[serde(default)]
    pub vocabulary_path: Option<String>,

    #[serde(default)]
    pub observability: ObservabilityConfig,
}

impl Settings {
    /// Validate all sections
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.validate_server()?;
        self.validate_rag()?;
        self.validate_providers()?;
        self.validate_cache()?;
        Ok(())
    }

    fn validate_server(&self) -> Result<(), ConfigError> {
        if self.server.port == 0 {
            return Err(ConfigError::InvalidValue {
                field: "server.port".to_string(),
                message: "Port cannot be 0".to_string(),
            });
        }
        if self.server.timeout_seconds == 0 {
            return Err(ConfigError::InvalidValue {
                field: "server.timeout_seconds".to_string(),
                message: "Request timeout must be positive".to_string(),
            });
        }
        let request_timeout_ms = self.server.timeout_seconds.saturating_mul(1000);
        if self.server.query_deadline_ms == 0 || self.server.query_deadline_ms >= request_timeout_ms {
            return Err(ConfigError::InvalidValue {
                field: "server.query_deadline_ms".to_string(),
                message: format!(
                    "Must be positive and below the request timeout ({} ms), got {}",
                    request_timeout_ms, self.server.query_deadline_ms
                ),
            });
        }
        Ok(())
    }

    fn validate_rag(&self) -> Result<(), ConfigError> {
        let rag = &self.rag;

        if !(0.0..=1.0).contains(&rag.min_similarity) {
            return Err(ConfigError::InvalidValue {
                field: "rag.min_similarity".to_string(),
                message: format!("Must be between 0.0 and 1.0, got {}", rag.min_similarity),
            });
        }

        if rag.top_k == 0 {
            return Err(ConfigError::InvalidValue {
                field: "rag.top_k".to_string(),
                message: "Must retrieve at least one passage".to_string(),
            });
        }

        if rag.vector_dim == 0 {
            return Err(ConfigError::InvalidValue {
                field: "rag.vector_dim".to_string(),
                message: "Vector dimension cannot be 0".to_string(),
            });
        }

        if rag.chunk_overlap_chars >= rag.chunk_max_chars {
            return Err(ConfigError::InvalidValue {
                field: "rag.chunk_overlap_chars".to_string(),
                message: format!(
                    "Overlap ({}) must be smaller than chunk_max_chars ({})",
                    rag.chunk_overlap_chars, rag.chunk_max_chars
                ),
            });
        }

        if rag.chunk_min_chars > rag.chunk_max_chars {
            return Err(ConfigError::InvalidValue {
                field: "rag.chunk_min_chars".to_string(),
                message: "Minimum chunk size exceeds chunk_max_chars".to_string(),
            });
        }

        Ok(())
    }

    fn validate_providers(&self) -> Result<(), ConfigError> {
        if !(0.0..=2.0).contains(&self.llm.temperature) {
            return Err(ConfigError::InvalidValue {
                field: "llm.temperature".to_string(),
                message: format!("Must be between 0.0 and 2.0, got {}", self.llm.temperature),
            });
        }

        if self.llm.max_tokens == 0 {
            return Err(ConfigError::InvalidValue {
                field: "llm.max_tokens".to_string(),
                message: "max_tokens cannot be 0".to_string(),
            });
        }

        for (field, timeout_ms) in [
            ("embedding.timeout_ms", self.embedding.timeout_ms),
            ("llm.timeout_ms", self.llm.timeout_ms),
            ("intent.timeout_ms", self.intent.timeout_ms),
        ] {
            if timeout_ms == 0 {
                return Err(ConfigError::InvalidValue {
                    field: field.to_string(),
                    message: "Timeout must be positive".to_string(),
                });
            }
        }

        if self.environment.is_strict() {
            if self.embedding.provider == EmbeddingProvider::OpenAI
                && self.embedding.api_key.is_none()
            {
                return Err(ConfigError::MissingField("embedding.api_key".to_string()));
            }
            if self.llm.provider == LlmProvider::OpenAI && self.llm.api_key.is_none() {
                return Err(ConfigError::MissingField("llm.api_key".to_string()));
            }
            if self.embedding.provider == EmbeddingProvider::Hash {
                return Err(ConfigError::InvalidValue {
                    field: "embedding.provider".to_string(),
                    message: "hash embeddings are for local development only".to_string(),
                });
            }
        }

        Ok(())
    }

    fn validate_cache(&self) -> Result<(), ConfigError> {
        if self.cache.capacity == Some(0) {
            return Err(ConfigError::InvalidValue {
                field: "cache.capacity".to_string(),
                message: "Capacity cannot be 0 (omit it for an unbounded cache)".to_string(),
            });
        }
        if self.cache.ttl_secs == Some(0) {
            return Err(ConfigError::InvalidValue {
                field: "cache.ttl_secs".to_string(),
                message: "TTL cannot be 0 (omit it to disable expiry)".to_string(),
            });
        }
        if self.cache.priming_concurrency == 0 {
            return Err(ConfigError::InvalidValue {
                field: "cache.priming_concurrency".to_string(),
                message: "Priming needs at least one worker".to_string(),
            });
        }
        Ok(())
    }
}

/// HTTP server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    /// Request timeout in seconds
    #[serde(default = "default_timeout")]
    pub timeout_seconds: u64,

    /// Budget for answering one uncached query; must be below the request
    /// timeout
    #[serde(default = "default_query_deadline_ms")]
    pub query_deadline_ms: u64,

    #[serde(default = "default_true")]
    pub cors_enabled: bool,

    /// Empty means any origin
    #[serde(default)]
    pub cors_origins: Vec<String>,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}
fn default_port() -> u16 {
    8080
}
fn default_timeout() -> u64 {
    30
}
fn default_query_deadline_ms() -> u64 {
    timeouts::QUERY_DEADLINE_MS
}
fn default_true() -> bool {
    true
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            timeout_seconds: default_timeout(),
            query_deadline_ms: default_query_deadline_ms(),
            cors_enabled: true,
            cors_origins: Vec::new(),
        }
    }
}

impl ServerConfig {
    pub fn query_deadline(&self) -> Duration {
        Duration::from_millis(self.query_deadline_ms)
    }
}

/// Corpus and retrieval configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RagConfig {
    /// Maximum passages returned per query
    #[serde(default = "default_top_k")]
    pub top_k: usize,

    /// Inclusive relevance threshold on cosine similarity
    #[serde(default = "default_min_similarity")]
    pub min_similarity: f32,

    #[serde(default = "default_vector_dim")]
    pub vector_dim: usize,

    /// YAML/JSON section list or Markdown document
    #[serde(default)]
    pub corpus_path: Option<String>,

    /// JSON snapshot of the built index; rebuilt from the corpus when missing
    #[serde(default)]
    pub index_snapshot_path: Option<String>,

    #[serde(default = "default_chunk_max_chars")]
    pub chunk_max_chars: usize,

    #[serde(default = "default_chunk_overlap_chars")]
    pub chunk_overlap_chars: usize,

    #[serde(default = "default_chunk_min_chars")]
    pub chunk_min_chars: usize,
}

fn default_top_k() -> usize {
    rag::DEFAULT_TOP_K
}
fn default_min_similarity() -> f32 {
    rag::MIN_SIMILARITY
}
fn default_vector_dim() -> usize {
    rag::VECTOR_DIM
}
fn default_chunk_max_chars() -> usize {
    rag::CHUNK_MAX_CHARS
}
fn default_chunk_overlap_chars() -> usize {
    rag::CHUNK_OVERLAP_CHARS
}
fn default_chunk_min_chars() -> usize {
    rag::CHUNK_MIN_CHARS
}

impl Default for RagConfig {
    fn default() -> Self {
        Self {
            top_k: default_top_k(),
            min_similarity: default_min_similarity(),
            vector_dim: default_vector_dim(),
            corpus_path: None,
            index_snapshot_path: None,
            chunk_max_chars: default_chunk_max_chars(),
            chunk_overlap_chars: default_chunk_overlap_chars(),
            chunk_min_chars: default_chunk_min_chars(),
        }
    }
}

/// Embedding backend selection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum EmbeddingProvider {
    /// OpenAI-compatible `/embeddings`
    #[default]
    #[serde(rename = "openai")]
    OpenAI,
    /// Ollama `/api/embed`
    Ollama,
    /// Deterministic feature hashing, no network
    Hash,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbeddingConfig {
    #[serde(default)]
    pub provider: EmbeddingProvider,

    #[serde(default = "default_openai_endpoint")]
    pub endpoint: String,

    #[serde(default = "default_embedding_model")]
    pub model: String,

    #[serde(default)]
    pub api_key: Option<String>,

    #[serde(default = "default_embedding_timeout_ms")]
    pub timeout_ms: u64,

    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    #[serde(default = "default_initial_backoff_ms")]
    pub initial_backoff_ms: u64,
}

fn default_openai_endpoint() -> String {
    endpoints::OPENAI_DEFAULT.to_string()
}
fn default_embedding_model() -> String {
    models::EMBEDDING_DEFAULT.to_string()
}
fn default_embedding_timeout_ms() -> u64 {
    timeouts::EMBEDDING_MS
}
fn default_max_retries() -> u32 {
    timeouts::MAX_RETRIES
}
fn default_initial_backoff_ms() -> u64 {
    timeouts::INITIAL_BACKOFF_MS
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            provider: EmbeddingProvider::default(),
            endpoint: default_openai_endpoint(),
            model: default_embedding_model(),
            api_key: None,
            timeout_ms: default_embedding_timeout_ms(),
            max_retries: default_max_retries(),
            initial_backoff_ms: default_initial_backoff_ms(),
        }
    }
}

impl EmbeddingConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_retries: self.max_retries,
            initial_backoff: Duration::from_millis(self.initial_backoff_ms),
            timeout: self.timeout(),
        }
    }
}

/// Generation backend selection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum LlmProvider {
    #[default]
    #[serde(rename = "openai")]
    OpenAI,
    Ollama,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    #[serde(default)]
    pub provider: LlmProvider,

    #[serde(default = "default_openai_endpoint")]
    pub endpoint: String,

    #[serde(default = "default_llm_model")]
    pub model: String,

    #[serde(default)]
    pub api_key: Option<String>,

    #[serde(default = "default_temperature")]
    pub temperature: f32,

    #[serde(default = "default_max_tokens")]
    pub max_tokens: usize,

    #[serde(default = "default_generation_timeout_ms")]
    pub timeout_ms: u64,

    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    #[serde(default = "default_initial_backoff_ms")]
    pub initial_backoff_ms: u64,
}

fn default_llm_model() -> String {
    models::LLM_DEFAULT.to_string()
}
fn default_temperature() -> f32 {
    0.1
}
fn default_max_tokens() -> usize {
    300
}
fn default_generation_timeout_ms() -> u64 {
    timeouts::GENERATION_MS
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            provider: LlmProvider::default(),
            endpoint: default_openai_endpoint(),
            model: default_llm_model(),
            api_key: None,
            temperature: default_temperature(),
            max_tokens: default_max_tokens(),
            timeout_ms: default_generation_timeout_ms(),
            max_retries: default_max_retries(),
            initial_backoff_ms: default_initial_backoff_ms(),
        }
    }
}

impl LlmConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_retries: self.max_retries,
            initial_backoff: Duration::from_millis(self.initial_backoff_ms),
            timeout: self.timeout(),
        }
    }
}

/// Intent gate configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IntentConfig {
    /// Reject obviously off-topic queries before calling the classifier
    #[serde(default = "default_true")]
    pub lexicon_enabled: bool,

    #[serde(default = "default_classifier_timeout_ms")]
    pub timeout_ms: u64,

    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    #[serde(default = "default_initial_backoff_ms")]
    pub initial_backoff_ms: u64,
}

fn default_classifier_timeout_ms() -> u64 {
    timeouts::CLASSIFIER_MS
}

impl Default for IntentConfig {
    fn default() -> Self {
        Self {
            lexicon_enabled: true,
            timeout_ms: default_classifier_timeout_ms(),
            max_retries: default_max_retries(),
            initial_backoff_ms: default_initial_backoff_ms(),
        }
    }
}

impl IntentConfig {
    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_retries: self.max_retries,
            initial_backoff: Duration::from_millis(self.initial_backoff_ms),
            timeout: Duration::from_millis(self.timeout_ms),
        }
    }
}

/// Response cache configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    /// L1 entry capacity; unbounded when unset
    #[serde(default)]
    pub capacity: Option<u64>,

    /// Time-to-live measured from insertion; no expiry when unset
    #[serde(default)]
    pub ttl_secs: Option<u64>,

    /// JSON file backing the durable L2 tier
    #[serde(default)]
    pub persist_path: Option<String>,

    #[serde(default = "default_priming_concurrency")]
    pub priming_concurrency: usize,

    /// Warm-up queries, one per line
    #[serde(default)]
    pub prime_queries_path: Option<String>,
}

fn default_priming_concurrency() -> usize {
    cache::PRIMING_CONCURRENCY
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            capacity: None,
            ttl_secs: None,
            persist_path: None,
            priming_concurrency: default_priming_concurrency(),
            prime_queries_path: None,
        }
    }
}

impl CacheConfig {
    pub fn ttl(&self) -> Option<Duration> {
        self.ttl_secs.map(Duration::from_secs)
    }
}

/// Observability configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ObservabilityConfig {
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Enable JSON logging
    #[serde(default)]
    pub log_json: bool,

    /// Install the Prometheus recorder and expose /metrics
    #[serde(default = "default_true")]
    pub metrics_enabled: bool,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            log_json: false,
            metrics_enabled: true,
        }
    }
}

/// Load settings from `config/` in the working directory
pub fn load_settings(env: Option<&str>) -> Result<Settings, ConfigError> {
    load_settings_from(Path::new("config"), env)
}

/// Load settings from a config directory
///
/// Layering, later sources win:
/// 1. `{dir}/default.{yaml,toml,json}`
/// 2. `{dir}/{env}.{yaml,toml,json}`
/// 3. `AGRI_FAQ__SECTION__KEY` environment variables
pub fn load_settings_from(dir: &Path, env: Option<&str>) -> Result<Settings, ConfigError> {
    let mut builder = Config::builder();

    builder = builder.add_source(File::from(dir.join("default")).required(false));

    if let Some(env_name) = env {
        builder = builder.add_source(File::from(dir.join(env_name)).required(false));
    }

    builder = builder.add_source(
        Environment::with_prefix("AGRI_FAQ")
            .separator("__")
            .try_parsing(true),
    );

    let config = builder.build()?;
    let settings: Settings = config.try_deserialize()?;

    settings.validate()?;

    tracing::debug!(
        environment = ?settings.environment,
        top_k = settings.rag.top_k,
        min_similarity = settings.rag.min_similarity,
        "Settings loaded"
    );

    Ok(settings)
}
