//! Retrieval over a small, fixed corpus
//!
//! Features:
//! - Corpus loading from YAML/JSON section lists or Markdown
//! - Sentence-aware chunking into bounded passages
//! - In-memory embedding index with cosine similarity and JSON snapshots
//! - Threshold-gated top-k retrieval with stable tie ordering
//! - Embedding providers: OpenAI-compatible, Ollama, deterministic hashing

pub mod chunker;
pub mod corpus;
pub mod embeddings;
pub mod index;
pub mod ollama_embeddings;
pub mod openai_embeddings;
pub mod retriever;

pub use chunker::{ChunkConfig, Chunker};
pub use corpus::{corpus_fingerprint, CorpusLoader, CorpusSection};
pub use embeddings::{create_embedder, HashEmbedder};
pub use index::{cosine_similarity, EmbeddingIndex, IndexSnapshot};
pub use ollama_embeddings::{OllamaEmbedder, OllamaEmbeddingConfig};
pub use openai_embeddings::{OpenAIEmbedder, OpenAIEmbeddingConfig};
pub use retriever::{Retriever, RetrieverConfig};

use thiserror::Error;

/// RAG errors
#[derive(Error, Debug)]
pub enum RagError {
    #[error("Embedding error: {0}")]
    Embedding(String),

    #[error("Dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    #[error("Index error: {0}")]
    Index(String),

    #[error("Corpus error: {0}")]
    Corpus(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl From<serde_json::Error> for RagError {
    fn from(err: serde_json::Error) -> Self {
        RagError::Serialization(err.to_string())
    }
}

impl From<agri_faq_core::Error> for RagError {
    fn from(err: agri_faq_core::Error) -> Self {
        match err {
            agri_faq_core::Error::DimensionMismatch { expected, actual } => {
                RagError::DimensionMismatch { expected, actual }
            }
            other => RagError::Embedding(other.to_string()),
        }
    }
}

impl From<RagError> for agri_faq_core::Error {
    fn from(err: RagError) -> Self {
        match err {
            RagError::DimensionMismatch { expected, actual } => {
                agri_faq_core::Error::DimensionMismatch { expected, actual }
            }
            RagError::Embedding(msg) => agri_faq_core::Error::EmbeddingUnavailable(msg),
            RagError::Io(e) => agri_faq_core::Error::Io(e.to_string()),
            RagError::Serialization(msg) => agri_faq_core::Error::Serialization(msg),
            RagError::Index(msg) | RagError::Corpus(msg) => agri_faq_core::Error::Index(msg),
        }
    }
}
