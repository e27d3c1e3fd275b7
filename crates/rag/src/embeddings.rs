//! Text embeddings
//!
//! Provider selection plus a deterministic hashing embedder that needs no
//! model or network, used for local development and tests.

use async_trait::async_trait;
use std::sync::Arc;

use agri_faq_config::settings::{EmbeddingConfig, EmbeddingProvider};
use agri_faq_core::{Embedder, Result};

use crate::ollama_embeddings::{OllamaEmbedder, OllamaEmbeddingConfig};
use crate::openai_embeddings::{OpenAIEmbedder, OpenAIEmbeddingConfig};
use crate::RagError;

/// Build the configured embedding provider
pub fn create_embedder(
    config: &EmbeddingConfig,
    dimension: usize,
) -> std::result::Result<Arc<dyn Embedder>, RagError> {
    let embedder: Arc<dyn Embedder> = match config.provider {
        EmbeddingProvider::OpenAI => Arc::new(OpenAIEmbedder::new(OpenAIEmbeddingConfig {
            endpoint: config.endpoint.clone(),
            api_key: config.api_key.clone().unwrap_or_default(),
            model: config.model.clone(),
            embedding_dim: dimension,
            timeout: config.timeout(),
        })?),
        EmbeddingProvider::Ollama => Arc::new(OllamaEmbedder::new(OllamaEmbeddingConfig {
            endpoint: config.endpoint.clone(),
            model: config.model.clone(),
            embedding_dim: dimension,
            timeout: config.timeout(),
        })?),
        EmbeddingProvider::Hash => Arc::new(HashEmbedder::new(dimension)),
    };

    tracing::info!(
        provider = ?config.provider,
        model = %config.model,
        dimension,
        "Embedder created"
    );

    Ok(embedder)
}

/// Feature-hashing embedder over lowercase word unigrams and bigrams
///
/// Texts that share words get similar vectors. Output is L2-normalized;
/// text with no words maps to the zero vector.
#[derive(Debug, Clone)]
pub struct HashEmbedder {
    dimension: usize,
}

impl HashEmbedder {
    pub fn new(dimension: usize) -> Self {
        Self {
            dimension: dimension.max(1),
        }
    }

    pub fn embed_text(&self, text: &str) -> Vec<f32> {
        let mut embedding = vec![0.0f32; self.dimension];

        let words: Vec<String> = text
            .split(|c: char| !c.is_alphanumeric())
            .filter(|w| !w.is_empty())
            .map(str::to_lowercase)
            .collect();

        for word in &words {
            let h = fnv1a(word.as_bytes());
            embedding[(h % self.dimension as u64) as usize] += 1.0;
        }
        for pair in words.windows(2) {
            let h = fnv1a(format!("{} {}", pair[0], pair[1]).as_bytes());
            embedding[(h % self.dimension as u64) as usize] += 0.5;
        }

        let norm: f32 = embedding.iter().map(|x| x * x).sum::<f32>().sqrt();
        if norm > 0.0 {
            for v in &mut embedding {
                *v /= norm;
            }
        }

        embedding
    }
}

fn fnv1a(bytes: &[u8]) -> u64 {
    let mut hash: u64 = 0xcbf2_9ce4_8422_2325;
    for b in bytes {
        hash ^= *b as u64;
        hash = hash.wrapping_mul(0x0100_0000_01b3);
    }
    hash
}

#[async_trait]
impl Embedder for HashEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        Ok(self.embed_text(text))
    }

    fn dimension(&self) -> usize {
        self.dimension
    }

    fn name(&self) -> &str {
        "hash"
    }
}
