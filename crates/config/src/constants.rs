//! Centralized constants for the FAQ service
//!
//! Single source of truth for default values used across the workspace.
//! `Settings` defaults and crate-local configs read from here.

/// Retrieval defaults
pub mod rag {
    /// Number of passages handed to the synthesizer
    pub const DEFAULT_TOP_K: usize = 3;

    /// Minimum cosine similarity for a passage to count as relevant
    pub const MIN_SIMILARITY: f32 = 0.85;

    /// Embedding dimensionality (text-embedding-3-small / ada-002)
    pub const VECTOR_DIM: usize = 1536;

    /// Upper bound on passage length in characters
    pub const CHUNK_MAX_CHARS: usize = 800;

    /// Characters carried over from the previous passage
    pub const CHUNK_OVERLAP_CHARS: usize = 100;

    /// Passages shorter than this are merged into their neighbour
    pub const CHUNK_MIN_CHARS: usize = 80;
}

/// Service endpoints (defaults for local development)
pub mod endpoints {
    /// Ollama endpoint, used for both generation and embeddings
    pub const OLLAMA_DEFAULT: &str = "http://localhost:11434";

    /// OpenAI-compatible API root
    pub const OPENAI_DEFAULT: &str = "https://api.openai.com/v1";
}

/// Default model names
pub mod models {
    pub const EMBEDDING_DEFAULT: &str = "text-embedding-3-small";
    pub const LLM_DEFAULT: &str = "gpt-4o-mini";
}

/// Timeouts and retry budgets for external calls
pub mod timeouts {
    /// Embedding request timeout in milliseconds
    pub const EMBEDDING_MS: u64 = 5_000;

    /// Classification request timeout in milliseconds
    pub const CLASSIFIER_MS: u64 = 5_000;

    /// Generation request timeout in milliseconds
    pub const GENERATION_MS: u64 = 20_000;

    /// Retries after the first attempt
    pub const MAX_RETRIES: u32 = 2;

    /// First backoff delay, doubled on every retry
    pub const INITIAL_BACKOFF_MS: u64 = 200;

    /// Overall budget for answering one uncached query; kept under the
    /// HTTP request timeout so a slow query degrades instead of timing out
    pub const QUERY_DEADLINE_MS: u64 = 25_000;
}

/// Response cache defaults
pub mod cache {
    /// Queries primed in parallel
    pub const PRIMING_CONCURRENCY: usize = 4;
}

/// Fixed user-facing answers
pub mod messages {
    pub const OUT_OF_DOMAIN: &str = "I can answer only agriculture related queries.";

    pub const NO_CONTEXT: &str = "I don't know. I can help you by transferring the call to subject matter expertise if needed.";

    pub const UNAVAILABLE: &str = "The service is temporarily unavailable. Please try again shortly.";
}
