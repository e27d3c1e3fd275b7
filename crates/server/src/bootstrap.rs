//! Wire settings into a ready `CacheManager`
//!
//! normalizer + lexicon → embedder → index (snapshot or corpus) →
//! LLM backend (generator, classifier) → gate / synthesizer / pipeline →
//! tiered cache.
//!
//! The index snapshot and the persisted responses are tagged with a corpus
//! fingerprint; either is discarded when the corpus, the embedder or the
//! answering model changed since it was written.

use std::path::Path;
use std::sync::Arc;

use agri_faq_agent::{
    AnswerSynthesizer, CacheManager, IntentGate, QueryPipeline, TieredCache, TieredCacheConfig,
};
use agri_faq_config::{Settings, VocabularyConfig};
use agri_faq_core::Embedder;
use agri_faq_llm::{create_backend, create_classifier, create_generator};
use agri_faq_rag::{
    corpus_fingerprint, create_embedder, ChunkConfig, Chunker, CorpusLoader, EmbeddingIndex,
    RagError, Retriever, RetrieverConfig,
};
use agri_faq_text_processing::{DomainLexicon, TermNormalizer};

use crate::ServerError;

pub async fn build_cache_manager(settings: &Settings) -> Result<Arc<CacheManager>, ServerError> {
    let normalizer = Arc::new(build_normalizer(settings)?);
    let lexicon = if settings.intent.lexicon_enabled {
        Some(Arc::new(DomainLexicon::builtin()?))
    } else {
        None
    };

    let embedder = create_embedder(&settings.embedding, settings.rag.vector_dim)?;
    let index = load_index(settings, embedder.as_ref()).await?;
    let fingerprint = response_fingerprint(&index, settings);
    let retriever = Arc::new(Retriever::new(
        Arc::new(index),
        RetrieverConfig::from(&settings.rag),
    ));

    let backend = create_backend(&settings.llm)?;
    let mut gate = IntentGate::new(create_classifier(backend.clone()), settings.intent.retry_policy());
    let mut synthesizer = AnswerSynthesizer::new(create_generator(backend), settings.llm.retry_policy());
    if let Some(lexicon) = lexicon {
        gate = gate.with_lexicon(lexicon.clone());
        synthesizer = synthesizer.with_lexicon(lexicon);
    }

    let pipeline = QueryPipeline::new(
        gate,
        embedder,
        retriever,
        synthesizer,
        settings.embedding.retry_policy(),
    );
    let cache = TieredCache::open(&TieredCacheConfig {
        fingerprint,
        ..TieredCacheConfig::from(&settings.cache)
    })
    .await?;

    let manager = CacheManager::new(normalizer, pipeline, cache)
        .with_priming_concurrency(settings.cache.priming_concurrency)
        .with_deadline(settings.server.query_deadline());

    Ok(Arc::new(manager))
}

/// Built-in table, extended by the vocabulary file when one is configured
fn build_normalizer(settings: &Settings) -> Result<TermNormalizer, ServerError> {
    let mut vocabulary = VocabularyConfig::builtin();
    if let Some(path) = &settings.vocabulary_path {
        vocabulary.merge(VocabularyConfig::load(path)?);
    }

    let normalizer = TermNormalizer::from_vocabulary(&vocabulary)?;
    tracing::info!(
        terms = vocabulary.term_count(),
        surface_forms = normalizer.len(),
        "Term normalizer ready"
    );
    Ok(normalizer)
}

/// Persisted answers depend on the indexed corpus and the answering model
fn response_fingerprint(index: &EmbeddingIndex, settings: &Settings) -> Option<String> {
    index
        .fingerprint()
        .map(|corpus| format!("{}/{:?}:{}", corpus, settings.llm.provider, settings.llm.model))
}

/// Load the index snapshot if it matches the corpus, otherwise embed the
/// corpus
///
/// A freshly built index is written back to the snapshot path. Without a
/// configured corpus any readable snapshot is used as is. With neither the
/// index is empty and every in-domain query is answered as unknown.
async fn load_index(settings: &Settings, embedder: &dyn Embedder) -> Result<EmbeddingIndex, ServerError> {
    let rag = &settings.rag;
    let snapshot = rag.index_snapshot_path.as_deref().map(Path::new);

    let corpus = match rag.corpus_path.as_deref() {
        Some(corpus_path) => {
            let sections = CorpusLoader::load_path(Path::new(corpus_path))?;
            let chunker = Chunker::new(ChunkConfig::from(rag));
            let passages = CorpusLoader::into_passages(&sections, &chunker);
            let embedder_id = format!("{}:{}", embedder.name(), settings.embedding.model);
            let fingerprint = corpus_fingerprint(&passages, &embedder_id, embedder.dimension());
            tracing::info!(
                path = corpus_path,
                sections = sections.len(),
                passages = passages.len(),
                fingerprint = %fingerprint,
                "Corpus loaded"
            );
            Some((passages, fingerprint))
        }
        None => None,
    };

    if let Some(path) = snapshot.filter(|p| p.exists()) {
        match EmbeddingIndex::load(path, rag.vector_dim).await {
            Ok(index) => match &corpus {
                Some((_, fingerprint)) if index.fingerprint() != Some(fingerprint.as_str()) => {
                    tracing::info!(
                        path = %path.display(),
                        "Corpus or embedder changed since the snapshot was written, rebuilding"
                    );
                }
                _ => return Ok(index),
            },
            Err(e @ RagError::DimensionMismatch { .. }) => return Err(e.into()),
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "Unreadable index snapshot, rebuilding");
            }
        }
    }

    let Some((passages, fingerprint)) = corpus else {
        tracing::warn!("No corpus configured, starting with an empty index");
        return Ok(EmbeddingIndex::new(rag.vector_dim));
    };

    let index = EmbeddingIndex::build(passages, embedder, &settings.embedding.retry_policy())
        .await?
        .with_fingerprint(fingerprint);

    if let Some(path) = snapshot {
        if let Err(e) = index.save(path).await {
            tracing::warn!(path = %path.display(), error = %e, "Failed to save index snapshot");
        }
    }

    Ok(index)
}
