//! In-memory embedding index
//!
//! Passages and their vectors are stored in parallel, in insertion order.
//! The index is read-only once built and is shared behind an `Arc`; a corpus
//! reload builds a new index rather than mutating the live one.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;

use agri_faq_core::{Embedder, Passage, RetrievalResult, RetryPolicy, ScoredPassage};

use crate::RagError;

const SNAPSHOT_VERSION: u32 = 1;

/// Cosine similarity; 0.0 when either vector has zero norm
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    let norm_a = norm(a);
    let norm_b = norm(b);
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot(a, b) / (norm_a * norm_b)
}

fn dot(a: &[f32], b: &[f32]) -> f32 {
    a.iter().zip(b).map(|(x, y)| x * y).sum()
}

fn norm(v: &[f32]) -> f32 {
    v.iter().map(|x| x * x).sum::<f32>().sqrt()
}

#[derive(Debug, Clone)]
pub struct EmbeddingIndex {
    dimension: usize,
    passages: Vec<Arc<Passage>>,
    vectors: Vec<Vec<f32>>,
    norms: Vec<f32>,
    fingerprint: Option<String>,
}

impl EmbeddingIndex {
    pub fn new(dimension: usize) -> Self {
        Self {
            dimension,
            passages: Vec::new(),
            vectors: Vec::new(),
            norms: Vec::new(),
            fingerprint: None,
        }
    }

    /// Tag the index with the fingerprint of the corpus it was built from
    pub fn with_fingerprint(mut self, fingerprint: impl Into<String>) -> Self {
        self.fingerprint = Some(fingerprint.into());
        self
    }

    pub fn fingerprint(&self) -> Option<&str> {
        self.fingerprint.as_deref()
    }

    pub fn dimension(&self) -> usize {
        self.dimension
    }

    pub fn len(&self) -> usize {
        self.passages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.passages.is_empty()
    }

    pub fn passages(&self) -> &[Arc<Passage>] {
        &self.passages
    }

    pub fn get(&self, id: &str) -> Option<&Arc<Passage>> {
        self.passages.iter().find(|p| p.id == id)
    }

    /// Append a passage with its precomputed embedding
    pub fn insert(&mut self, passage: Passage, vector: Vec<f32>) -> Result<(), RagError> {
        if vector.len() != self.dimension {
            return Err(RagError::DimensionMismatch {
                expected: self.dimension,
                actual: vector.len(),
            });
        }
        if vector.iter().any(|x| !x.is_finite()) {
            return Err(RagError::Index(format!(
                "Embedding for passage {} contains non-finite values",
                passage.id
            )));
        }
        if self.passages.iter().any(|p| p.id == passage.id) {
            return Err(RagError::Index(format!("Duplicate passage id {}", passage.id)));
        }

        self.norms.push(norm(&vector));
        self.vectors.push(vector);
        self.passages.push(Arc::new(passage));
        Ok(())
    }

    /// Embed every passage and build an index of the embedder's dimension
    pub async fn build(
        passages: Vec<Passage>,
        embedder: &dyn Embedder,
        retry: &RetryPolicy,
    ) -> Result<Self, RagError> {
        let start = Instant::now();
        let mut index = Self::new(embedder.dimension());

        for passage in passages {
            let vector = retry
                .run("embed_passage", || embedder.embed(&passage.text))
                .await?;
            index.insert(passage, vector)?;
        }

        tracing::info!(
            passages = index.len(),
            dimension = index.dimension,
            embedder = embedder.name(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "Embedding index built"
        );

        Ok(index)
    }

    /// Top-`k` passages with similarity >= `min_similarity`, descending,
    /// ties in insertion order. An empty result is not an error.
    pub fn retrieve(
        &self,
        query_embedding: &[f32],
        k: usize,
        min_similarity: f32,
    ) -> Result<RetrievalResult, RagError> {
        if query_embedding.len() != self.dimension {
            return Err(RagError::DimensionMismatch {
                expected: self.dimension,
                actual: query_embedding.len(),
            });
        }

        let query_norm = norm(query_embedding);
        let mut best: Option<f32> = None;
        let mut scored: Vec<(usize, f32)> = Vec::with_capacity(self.len());

        for (i, vector) in self.vectors.iter().enumerate() {
            let similarity = if query_norm == 0.0 || self.norms[i] == 0.0 {
                0.0
            } else {
                dot(query_embedding, vector) / (query_norm * self.norms[i])
            };

            best = Some(best.map_or(similarity, |b: f32| b.max(similarity)));
            if similarity >= min_similarity {
                scored.push((i, similarity));
            }
        }

        // stable: equal scores keep insertion order
        scored.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(Ordering::Equal));
        scored.truncate(k);

        Ok(RetrievalResult {
            hits: scored
                .into_iter()
                .map(|(i, similarity)| ScoredPassage {
                    passage: Arc::clone(&self.passages[i]),
                    similarity,
                })
                .collect(),
            min_similarity,
            best_similarity: best,
        })
    }

    pub fn to_snapshot(&self) -> IndexSnapshot {
        IndexSnapshot {
            version: SNAPSHOT_VERSION,
            dimension: self.dimension,
            fingerprint: self.fingerprint.clone(),
            entries: self
                .passages
                .iter()
                .zip(&self.vectors)
                .map(|(p, v)| SnapshotEntry {
                    passage: p.as_ref().clone(),
                    vector: v.clone(),
                })
                .collect(),
        }
    }

    pub fn from_snapshot(snapshot: IndexSnapshot) -> Result<Self, RagError> {
        if snapshot.version != SNAPSHOT_VERSION {
            return Err(RagError::Index(format!(
                "Unsupported snapshot version {}",
                snapshot.version
            )));
        }
        let mut index = Self::new(snapshot.dimension);
        index.fingerprint = snapshot.fingerprint;
        for entry in snapshot.entries {
            index.insert(entry.passage, entry.vector)?;
        }
        Ok(index)
    }

    /// Write a JSON snapshot atomically (temp file then rename)
    pub async fn save(&self, path: &Path) -> Result<(), RagError> {
        let json = serde_json::to_vec(&self.to_snapshot())?;

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await?;
            }
        }
        let tmp = path.with_extension("json.tmp");
        tokio::fs::write(&tmp, json).await?;
        tokio::fs::rename(&tmp, path).await?;

        tracing::info!(path = %path.display(), passages = self.len(), "Index snapshot saved");
        Ok(())
    }

    /// Load a snapshot, rejecting one built for a different dimensionality
    pub async fn load(path: &Path, expected_dimension: usize) -> Result<Self, RagError> {
        let bytes = tokio::fs::read(path).await?;
        let snapshot: IndexSnapshot = serde_json::from_slice(&bytes)?;

        if snapshot.dimension != expected_dimension {
            return Err(RagError::DimensionMismatch {
                expected: expected_dimension,
                actual: snapshot.dimension,
            });
        }

        let index = Self::from_snapshot(snapshot)?;
        tracing::info!(path = %path.display(), passages = index.len(), "Index snapshot loaded");
        Ok(index)
    }
}

/// Serialized form of an [`EmbeddingIndex`]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexSnapshot {
    pub version: u32,
    pub dimension: usize,
    /// Absent in snapshots written before fingerprinting; never matches
    #[serde(default)]
    pub fingerprint: Option<String>,
    pub entries: Vec<SnapshotEntry>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SnapshotEntry {
    pub passage: Passage,
    pub vector: Vec<f32>,
}
