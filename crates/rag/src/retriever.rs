//! Relevance-gated retriever
//!
//! Applies the configured `top_k` and `min_similarity` to the live
//! embedding index. The index can be swapped atomically on corpus reload;
//! in-flight lookups keep the `Arc` they started with.

use parking_lot::RwLock;
use std::sync::Arc;

use agri_faq_config::constants::rag;
use agri_faq_core::RetrievalResult;

use crate::index::EmbeddingIndex;
use crate::RagError;

/// Retriever configuration
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RetrieverConfig {
    /// Maximum passages returned
    pub top_k: usize,
    /// Inclusive similarity threshold
    pub min_similarity: f32,
}

impl Default for RetrieverConfig {
    fn default() -> Self {
        Self {
            top_k: rag::DEFAULT_TOP_K,
            min_similarity: rag::MIN_SIMILARITY,
        }
    }
}

impl From<&agri_faq_config::RagConfig> for RetrieverConfig {
    fn from(config: &agri_faq_config::RagConfig) -> Self {
        Self {
            top_k: config.top_k,
            min_similarity: config.min_similarity,
        }
    }
}

pub struct Retriever {
    index: RwLock<Arc<EmbeddingIndex>>,
    config: RetrieverConfig,
}

impl Retriever {
    pub fn new(index: Arc<EmbeddingIndex>, config: RetrieverConfig) -> Self {
        Self {
            index: RwLock::new(index),
            config,
        }
    }

    pub fn config(&self) -> RetrieverConfig {
        self.config
    }

    /// Current index snapshot
    pub fn index(&self) -> Arc<EmbeddingIndex> {
        Arc::clone(&self.index.read())
    }

    pub fn dimension(&self) -> usize {
        self.index.read().dimension()
    }

    /// Swap in a rebuilt index, returning the previous one
    pub fn replace_index(&self, index: Arc<EmbeddingIndex>) -> Arc<EmbeddingIndex> {
        tracing::info!(
            passages = index.len(),
            dimension = index.dimension(),
            "Replacing embedding index"
        );
        std::mem::replace(&mut *self.index.write(), index)
    }

    /// Retrieve with the configured `top_k` and `min_similarity`
    pub fn retrieve(&self, query_embedding: &[f32]) -> Result<RetrievalResult, RagError> {
        self.retrieve_with(query_embedding, self.config.top_k, self.config.min_similarity)
    }

    pub fn retrieve_with(
        &self,
        query_embedding: &[f32],
        k: usize,
        min_similarity: f32,
    ) -> Result<RetrievalResult, RagError> {
        let index = self.index();
        let result = index.retrieve(query_embedding, k, min_similarity)?;

        tracing::debug!(
            hits = result.len(),
            best_similarity = ?result.best_similarity,
            min_similarity,
            "Retrieval complete"
        );

        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use agri_faq_core::Passage;

    fn index_with(vectors: &[(&str, [f32; 2])]) -> Arc<EmbeddingIndex> {
        let mut index = EmbeddingIndex::new(2);
        for (id, v) in vectors {
            index
                .insert(Passage::new(*id, "S", format!("text {}", id)), v.to_vec())
                .unwrap();
        }
        Arc::new(index)
    }

    #[test]
    fn test_config_default() {
        let config = RetrieverConfig::default();
        assert_eq!(config.top_k, 3);
        assert!((config.min_similarity - 0.85).abs() < f32::EPSILON);
    }

    #[test]
    fn test_config_from_settings() {
        let rag = agri_faq_config::RagConfig {
            top_k: 5,
            min_similarity: 0.6,
            ..Default::default()
        };
        let config = RetrieverConfig::from(&rag);
        assert_eq!(config.top_k, 5);
        assert!((config.min_similarity - 0.6).abs() < f32::EPSILON);
    }

    #[test]
    fn test_uses_configured_threshold() {
        let retriever = Retriever::new(
            index_with(&[("a", [1.0, 0.0]), ("b", [0.7, 0.7]), ("c", [0.0, 1.0])]),
            RetrieverConfig {
                top_k: 3,
                min_similarity: 0.9,
            },
        );

        let result = retriever.retrieve(&[1.0, 0.0]).unwrap();
        assert_eq!(result.len(), 1);
        assert_eq!(result.hits[0].passage.id, "a");

        let relaxed = retriever.retrieve_with(&[1.0, 0.0], 3, 0.5).unwrap();
        assert_eq!(relaxed.len(), 2);
    }

    #[test]
    fn test_replace_index() {
        let retriever = Retriever::new(index_with(&[("old", [1.0, 0.0])]), RetrieverConfig::default());
        let previous = retriever.replace_index(index_with(&[("new", [1.0, 0.0])]));

        assert_eq!(previous.passages()[0].id, "old");
        let result = retriever.retrieve(&[1.0, 0.0]).unwrap();
        assert_eq!(result.hits[0].passage.id, "new");
    }

    #[test]
    fn test_dimension_mismatch_surfaces() {
        let retriever = Retriever::new(index_with(&[("a", [1.0, 0.0])]), RetrieverConfig::default());
        assert!(matches!(
            retriever.retrieve(&[1.0, 0.0, 0.0]),
            Err(RagError::DimensionMismatch { expected: 2, actual: 3 })
        ));
    }
}
