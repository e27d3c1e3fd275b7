//! Corpus passages and retrieval results

use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Immutable unit of retrievable content
///
/// The embedding vector lives in the index's parallel vector store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Passage {
    /// Unique passage ID
    pub id: String,
    /// Source section label
    pub section: String,
    /// Raw passage text
    pub text: String,
}

impl Passage {
    pub fn new(id: impl Into<String>, section: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            section: section.into(),
            text: text.into(),
        }
    }
}

/// A passage paired with its similarity to the query
#[derive(Debug, Clone)]
pub struct ScoredPassage {
    pub passage: Arc<Passage>,
    pub similarity: f32,
}

/// Ordered retrieval hits, descending by similarity
///
/// Only passages that cleared `min_similarity` are present, so an empty
/// result means "no relevant passage".
#[derive(Debug, Clone, Default)]
pub struct RetrievalResult {
    pub hits: Vec<ScoredPassage>,
    /// Threshold the hits were filtered against
    pub min_similarity: f32,
    /// Best similarity seen before thresholding (diagnostics only)
    pub best_similarity: Option<f32>,
}

impl RetrievalResult {
    pub fn empty(min_similarity: f32) -> Self {
        Self {
            hits: Vec::new(),
            min_similarity,
            best_similarity: None,
        }
    }

    /// Did any passage clear the relevance bar
    pub fn is_relevant(&self) -> bool {
        !self.hits.is_empty()
    }

    pub fn len(&self) -> usize {
        self.hits.len()
    }

    pub fn is_empty(&self) -> bool {
        self.hits.is_empty()
    }

    pub fn top_similarity(&self) -> Option<f32> {
        self.hits.first().map(|h| h.similarity)
    }

    /// Passage texts in rank order
    pub fn texts(&self) -> Vec<String> {
        self.hits.iter().map(|h| h.passage.text.clone()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_result_is_not_relevant() {
        let result = RetrievalResult::empty(0.85);
        assert!(!result.is_relevant());
        assert_eq!(result.top_similarity(), None);
    }

    #[test]
    fn test_texts_in_rank_order() {
        let result = RetrievalResult {
            hits: vec![
                ScoredPassage {
                    passage: Arc::new(Passage::new("a-0", "A", "first")),
                    similarity: 0.95,
                },
                ScoredPassage {
                    passage: Arc::new(Passage::new("b-0", "B", "second")),
                    similarity: 0.9,
                },
            ],
            min_similarity: 0.85,
            best_similarity: Some(0.95),
        };
        assert!(result.is_relevant());
        assert_eq!(result.texts(), vec!["first", "second"]);
        assert_eq!(result.top_similarity(), Some(0.95));
    }
}
