//! End-to-end tests for the query core
//!
//! Drive the cache manager with deterministic collaborators: a keyword
//! embedder (one dimension per domain keyword), a rule-based classifier and
//! a generator that quotes its top passage.

use async_trait::async_trait;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use agri_faq_agent::{
    AnswerSynthesizer, CacheManager, CacheStatus, CacheTier, IntentGate, PrimeReport,
    QueryPipeline, TieredCache, TieredCacheConfig,
};
use agri_faq_config::constants::messages;
use agri_faq_core::{
    Classification, Embedder, Error, Generator, IntentClassifier, Judgment, Passage, Response,
    Result, RetryPolicy,
};
use agri_faq_rag::{EmbeddingIndex, HashEmbedder, Retriever, RetrieverConfig};
use agri_faq_text_processing::{DomainLexicon, TermNormalizer};

const DORMULIN_QUERY: &str = "What is Dormulin Vegetative used for?";
const MISSPELLED_QUERY: &str = "What is Dormolin Vegetative used for?";
const PURPLE_CARROTS: &str = "How to grow purple carrots in space?";
const LAPTOPS: &str = "Best laptops for gaming in 2024";

const KEYWORDS: &[&str] = &["dormulin", "vegetative", "thrips", "chilli", "zetol", "mildew"];

struct KeywordEmbedder {
    failing: AtomicBool,
}

impl KeywordEmbedder {
    fn new() -> Arc<Self> {
        Arc::new(Self {
            failing: AtomicBool::new(false),
        })
    }

    fn vector(text: &str) -> Vec<f32> {
        let mut vector = vec![0.0; KEYWORDS.len()];
        for word in text
            .to_lowercase()
            .split(|c: char| !c.is_alphanumeric())
            .filter(|w| !w.is_empty())
        {
            if let Some(i) = KEYWORDS.iter().position(|k| *k == word) {
                vector[i] += 1.0;
            }
        }
        vector
    }
}

#[async_trait]
impl Embedder for KeywordEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(Error::EmbeddingUnavailable("offline".to_string()));
        }
        Ok(Self::vector(text))
    }

    fn dimension(&self) -> usize {
        KEYWORDS.len()
    }

    fn name(&self) -> &str {
        "keyword"
    }
}

/// In-domain when the text names a known crop topic; otherwise unknown
struct RuleClassifier {
    calls: AtomicUsize,
    failing: AtomicBool,
    unsure: AtomicBool,
}

impl RuleClassifier {
    fn new() -> Arc<Self> {
        Arc::new(Self {
            calls: AtomicUsize::new(0),
            failing: AtomicBool::new(false),
            unsure: AtomicBool::new(false),
        })
    }
}

#[async_trait]
impl IntentClassifier for RuleClassifier {
    async fn classify(&self, text: &str) -> Result<Judgment> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.failing.load(Ordering::SeqCst) {
            return Err(Error::ClassificationUnavailable("offline".to_string()));
        }
        if self.unsure.load(Ordering::SeqCst) {
            return Ok(Judgment::Unknown);
        }
        let text = text.to_lowercase();
        let in_domain = ["dormulin", "grow", "thrips", "chilli"]
            .iter()
            .any(|term| text.contains(term));
        Ok(if in_domain {
            Judgment::InDomain
        } else {
            Judgment::Unknown
        })
    }

    fn name(&self) -> &str {
        "rules"
    }
}

/// Answers with the top passage; can be slowed down or made to fail
struct QuotingGenerator {
    calls: AtomicUsize,
    delay: Duration,
    failing: AtomicBool,
}

impl QuotingGenerator {
    fn new(delay: Duration) -> Arc<Self> {
        Arc::new(Self {
            calls: AtomicUsize::new(0),
            delay,
            failing: AtomicBool::new(false),
        })
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Generator for QuotingGenerator {
    async fn generate(&self, _prompt: &str, context: &[String]) -> Result<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        tokio::time::sleep(self.delay).await;
        if self.failing.load(Ordering::SeqCst) {
            return Err(Error::GenerationUnavailable("offline".to_string()));
        }
        Ok(context.first().cloned().unwrap_or_default())
    }

    fn model_name(&self) -> &str {
        "quoting"
    }
}

fn corpus() -> Vec<Passage> {
    vec![
        Passage::new(
            "dormulin-vegetative-0",
            "Dormulin Vegetative",
            "Dormulin Vegetative supports vegetative-stage recovery of crops after stress, \
             restoring shoot growth and leaf vigour.",
        ),
        Passage::new(
            "thrips-0",
            "Thrips",
            "Thrips damage chilli leaves; spray at dusk and repeat after ten days.",
        ),
        Passage::new(
            "zetol-select-0",
            "Zetol Select",
            "Zetol Select controls powdery mildew when sprayed at first symptoms.",
        ),
    ]
}

fn fast_retry() -> RetryPolicy {
    RetryPolicy {
        max_retries: 1,
        initial_backoff: Duration::from_millis(1),
        timeout: Duration::from_secs(2),
    }
}

struct Harness {
    manager: Arc<CacheManager>,
    embedder: Arc<KeywordEmbedder>,
    classifier: Arc<RuleClassifier>,
    generator: Arc<QuotingGenerator>,
}

async fn index(embedder: &KeywordEmbedder) -> Arc<EmbeddingIndex> {
    Arc::new(
        EmbeddingIndex::build(corpus(), embedder, &fast_retry())
            .await
            .unwrap(),
    )
}

async fn harness_with(cache: TieredCache, delay: Duration) -> Harness {
    harness_configured(cache, delay, None).await
}

async fn harness_configured(cache: TieredCache, delay: Duration, deadline: Option<Duration>) -> Harness {
    let embedder = KeywordEmbedder::new();
    let classifier = RuleClassifier::new();
    let generator = QuotingGenerator::new(delay);
    let lexicon = Arc::new(DomainLexicon::builtin().unwrap());

    let retriever = Arc::new(Retriever::new(
        index(&embedder).await,
        RetrieverConfig {
            top_k: 3,
            min_similarity: 0.85,
        },
    ));
    let gate = IntentGate::new(classifier.clone(), fast_retry()).with_lexicon(lexicon.clone());
    let synthesizer = AnswerSynthesizer::new(generator.clone(), fast_retry()).with_lexicon(lexicon);
    let pipeline = QueryPipeline::new(gate, embedder.clone(), retriever, synthesizer, fast_retry());

    let mut manager = CacheManager::new(
        Arc::new(TermNormalizer::builtin().unwrap()),
        pipeline,
        cache,
    )
    .with_priming_concurrency(4);
    if let Some(deadline) = deadline {
        manager = manager.with_deadline(deadline);
    }

    Harness {
        manager: Arc::new(manager),
        embedder,
        classifier,
        generator,
    }
}

async fn harness() -> Harness {
    harness_with(TieredCache::memory(None, None), Duration::ZERO).await
}

#[tokio::test]
async fn scenario_grounded_answer() {
    let h = harness().await;
    let resp = h.manager.handle(DORMULIN_QUERY).await.unwrap();

    assert_eq!(resp.record.classification(), Classification::Grounded);
    assert!(resp.record.answer().contains("vegetative-stage recovery"));
    assert_eq!(resp.cache_status, CacheStatus::Miss);
    match &resp.record.response {
        Response::Grounded { sources, .. } => {
            assert_eq!(sources.len(), 1);
            assert_eq!(sources[0].passage_id, "dormulin-vegetative-0");
            assert!(sources[0].similarity >= 0.85);
        }
        other => panic!("expected grounded, got {:?}", other),
    }
}

#[tokio::test]
async fn scenario_in_domain_without_context() {
    let h = harness().await;
    let resp = h.manager.handle(PURPLE_CARROTS).await.unwrap();

    assert_eq!(resp.record.classification(), Classification::NoContext);
    assert_eq!(resp.record.answer(), messages::NO_CONTEXT);
    assert_eq!(h.generator.calls(), 0);
}

#[tokio::test]
async fn scenario_out_of_domain() {
    let h = harness().await;
    let resp = h.manager.handle(LAPTOPS).await.unwrap();

    assert_eq!(resp.record.classification(), Classification::OutOfDomain);
    assert_eq!(resp.record.answer(), messages::OUT_OF_DOMAIN);
    assert_eq!(h.classifier.calls.load(Ordering::SeqCst), 0);
    assert_eq!(h.generator.calls(), 0);
}

#[tokio::test]
async fn scenario_misspelled_product_name() {
    let h = harness().await;
    let correct = h.manager.handle(DORMULIN_QUERY).await.unwrap();
    let misspelled = h.manager.handle(MISSPELLED_QUERY).await.unwrap();

    assert_eq!(misspelled.normalized, DORMULIN_QUERY);
    assert_eq!(misspelled.corrections.len(), 1);
    assert_eq!(misspelled.corrections[0].original, "Dormolin");
    assert_eq!(misspelled.corrections[0].corrected, "Dormulin");
    assert_eq!(misspelled.cache_key, correct.cache_key);
    assert_eq!(misspelled.record.response, correct.record.response);
    assert_eq!(misspelled.cache_status, CacheStatus::Hit(CacheTier::L1));
}

#[tokio::test]
async fn scenario_repeat_served_from_cache() {
    let h = harness().await;
    let first = h.manager.handle(DORMULIN_QUERY).await.unwrap();
    let second = h.manager.handle(DORMULIN_QUERY).await.unwrap();

    assert_eq!(second.cache_status, CacheStatus::Hit(CacheTier::L1));
    assert_eq!(second.record, first.record);
    assert_eq!(h.generator.calls(), 1);
    assert_eq!(h.classifier.calls.load(Ordering::SeqCst), 1);

    let stats = h.manager.stats();
    assert_eq!(stats.pipeline_runs, 1);
    assert_eq!(stats.l1_hits, 1);
    assert_eq!(stats.misses, 1);
}

#[tokio::test]
async fn surface_variants_share_one_entry() {
    let h = harness().await;
    let a = h.manager.handle(DORMULIN_QUERY).await.unwrap();
    let b = h.manager.handle("  what is   DORMULIN vegetative USED for?  ").await.unwrap();

    assert_eq!(a.cache_key, b.cache_key);
    assert_eq!(a.record.response, b.record.response);
    assert!(b.cache_status.is_hit());
    assert_eq!(h.manager.stats().pipeline_runs, 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_requests_run_pipeline_once() {
    let h = harness_with(TieredCache::memory(None, None), Duration::from_millis(50)).await;

    let handles: Vec<_> = (0..8)
        .map(|i| {
            let manager = Arc::clone(&h.manager);
            let query = if i % 2 == 0 { DORMULIN_QUERY } else { MISSPELLED_QUERY };
            tokio::spawn(async move { manager.handle(query).await.unwrap() })
        })
        .collect();

    let mut answers = Vec::new();
    for handle in handles {
        answers.push(handle.await.unwrap());
    }

    assert_eq!(h.generator.calls(), 1);
    assert_eq!(h.manager.stats().pipeline_runs, 1);
    assert_eq!(answers.iter().filter(|r| r.cache_status == CacheStatus::Miss).count(), 1);
    assert!(answers.iter().all(|r| r.record.response == answers[0].record.response));
}

#[tokio::test]
async fn unknown_judgment_is_out_of_domain_even_with_context() {
    let h = harness().await;
    h.classifier.unsure.store(true, Ordering::SeqCst);

    let resp = h.manager.handle(DORMULIN_QUERY).await.unwrap();
    assert_eq!(resp.record.classification(), Classification::OutOfDomain);
    assert!(!resp.record.degraded);
    assert_eq!(h.generator.calls(), 0);
}

#[tokio::test]
async fn classifier_failure_is_out_of_domain_and_not_cached() {
    let h = harness().await;
    h.classifier.failing.store(true, Ordering::SeqCst);

    let resp = h.manager.handle(DORMULIN_QUERY).await.unwrap();
    assert_eq!(resp.record.classification(), Classification::OutOfDomain);
    assert!(resp.record.degraded);

    h.classifier.failing.store(false, Ordering::SeqCst);
    let recovered = h.manager.handle(DORMULIN_QUERY).await.unwrap();
    assert_eq!(recovered.cache_status, CacheStatus::Miss);
    assert_eq!(recovered.record.classification(), Classification::Grounded);
}

#[tokio::test]
async fn generation_failure_degrades_to_no_context() {
    let h = harness().await;
    h.generator.failing.store(true, Ordering::SeqCst);

    let resp = h.manager.handle(DORMULIN_QUERY).await.unwrap();
    assert_eq!(resp.record.classification(), Classification::NoContext);
    assert!(resp.record.degraded);
    // first attempt plus one retry
    assert_eq!(h.generator.calls(), 2);

    h.generator.failing.store(false, Ordering::SeqCst);
    let recovered = h.manager.handle(DORMULIN_QUERY).await.unwrap();
    assert_eq!(recovered.record.classification(), Classification::Grounded);
}

#[tokio::test]
async fn embedding_failure_is_unavailable_and_not_cached() {
    let h = harness().await;
    h.embedder.failing.store(true, Ordering::SeqCst);

    let resp = h.manager.handle(DORMULIN_QUERY).await.unwrap();
    assert_eq!(resp.record.classification(), Classification::Unavailable);
    assert_eq!(resp.record.answer(), messages::UNAVAILABLE);
    assert!(resp.record.degraded);

    h.embedder.failing.store(false, Ordering::SeqCst);
    let recovered = h.manager.handle(DORMULIN_QUERY).await.unwrap();
    assert_eq!(recovered.cache_status, CacheStatus::Miss);
    assert_eq!(recovered.record.classification(), Classification::Grounded);
}

#[tokio::test]
async fn dimension_mismatch_is_surfaced() {
    let keyword = KeywordEmbedder::new();
    let classifier = RuleClassifier::new();
    let generator = QuotingGenerator::new(Duration::ZERO);

    // index built with the keyword embedder, queries embedded at another dimension
    let retriever = Arc::new(Retriever::new(index(&keyword).await, RetrieverConfig::default()));
    let pipeline = QueryPipeline::new(
        IntentGate::new(classifier, fast_retry()),
        Arc::new(HashEmbedder::new(KEYWORDS.len() + 2)),
        retriever,
        AnswerSynthesizer::new(generator, fast_retry()),
        fast_retry(),
    );
    let manager = CacheManager::new(
        Arc::new(TermNormalizer::builtin().unwrap()),
        pipeline,
        TieredCache::memory(None, None),
    );

    let err = manager.handle(DORMULIN_QUERY).await.unwrap_err();
    assert_eq!(
        err,
        Error::DimensionMismatch {
            expected: KEYWORDS.len(),
            actual: KEYWORDS.len() + 2,
        }
    );
    assert_eq!(manager.stats().l1_entries, 0);
}

#[tokio::test]
async fn invalidate_all_clears_entries() {
    let h = harness().await;
    h.manager.handle(DORMULIN_QUERY).await.unwrap();
    h.manager.invalidate_all().await.unwrap();

    let resp = h.manager.handle(DORMULIN_QUERY).await.unwrap();
    assert_eq!(resp.cache_status, CacheStatus::Miss);
    assert_eq!(h.generator.calls(), 2);
    assert_eq!(h.manager.stats().generation, 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn result_computed_across_invalidation_is_not_committed() {
    let h = harness_with(TieredCache::memory(None, None), Duration::from_millis(100)).await;

    let manager = Arc::clone(&h.manager);
    let in_flight = tokio::spawn(async move { manager.handle(DORMULIN_QUERY).await.unwrap() });

    tokio::time::sleep(Duration::from_millis(30)).await;
    h.manager.invalidate_all().await.unwrap();

    let first = in_flight.await.unwrap();
    assert_eq!(first.record.classification(), Classification::Grounded);

    let second = h.manager.handle(DORMULIN_QUERY).await.unwrap();
    assert_eq!(second.cache_status, CacheStatus::Miss);
    assert_eq!(h.generator.calls(), 2);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn promotion_from_l2_never_outlives_invalidation() {
    for round in 0..20 {
        let dir = tempfile::tempdir().unwrap();
        let config = TieredCacheConfig {
            persist_path: Some(dir.path().join("responses.json")),
            ..Default::default()
        };
        {
            let seed = harness_with(TieredCache::open(&config).await.unwrap(), Duration::ZERO).await;
            seed.manager.handle(DORMULIN_QUERY).await.unwrap();
        }

        // the entry now lives only in L2; fresh computes are degraded and
        // never cached, so anything left in L1 afterwards would be stale
        let h = harness_with(TieredCache::open(&config).await.unwrap(), Duration::ZERO).await;
        h.embedder.failing.store(true, Ordering::SeqCst);

        let readers: Vec<_> = (0..4)
            .map(|_| {
                let manager = Arc::clone(&h.manager);
                tokio::spawn(async move { manager.handle(DORMULIN_QUERY).await.unwrap() })
            })
            .collect();
        h.manager.invalidate_all().await.unwrap();
        for reader in readers {
            reader.await.unwrap();
        }

        let after = h.manager.handle(DORMULIN_QUERY).await.unwrap();
        assert_eq!(after.cache_status, CacheStatus::Miss, "stale entry served in round {}", round);
        assert_eq!(after.record.classification(), Classification::Unavailable);
        assert_eq!(h.manager.stats().l2_entries, Some(0));
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn abandoned_request_commits_nothing_and_releases_key() {
    let h = harness_with(TieredCache::memory(None, None), Duration::from_millis(200)).await;

    let manager = Arc::clone(&h.manager);
    let task = tokio::spawn(async move { manager.handle(DORMULIN_QUERY).await });
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert_eq!(h.manager.stats().in_flight, 1);
    assert_eq!(h.generator.calls(), 1);

    task.abort();
    assert!(task.await.unwrap_err().is_cancelled());

    let stats = h.manager.stats();
    assert_eq!(stats.in_flight, 0);
    assert_eq!(stats.l1_entries, 0);

    let resp = h.manager.handle(DORMULIN_QUERY).await.unwrap();
    assert_eq!(resp.cache_status, CacheStatus::Miss);
    assert_eq!(resp.record.classification(), Classification::Grounded);
    assert_eq!(h.generator.calls(), 2);
    assert_eq!(h.manager.stats().in_flight, 0);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn abandoned_waiter_leaves_computing_request_intact() {
    let h = harness_with(TieredCache::memory(None, None), Duration::from_millis(150)).await;

    let first = {
        let manager = Arc::clone(&h.manager);
        tokio::spawn(async move { manager.handle(DORMULIN_QUERY).await.unwrap() })
    };
    tokio::time::sleep(Duration::from_millis(30)).await;
    let waiter = {
        let manager = Arc::clone(&h.manager);
        tokio::spawn(async move { manager.handle(MISSPELLED_QUERY).await.unwrap() })
    };
    tokio::time::sleep(Duration::from_millis(30)).await;
    waiter.abort();
    let _ = waiter.await;

    let resp = first.await.unwrap();
    assert_eq!(resp.cache_status, CacheStatus::Miss);
    assert_eq!(h.manager.stats().in_flight, 0);

    let cached = h.manager.handle(MISSPELLED_QUERY).await.unwrap();
    assert_eq!(cached.cache_status, CacheStatus::Hit(CacheTier::L1));
    assert_eq!(h.generator.calls(), 1);
}

#[tokio::test]
async fn query_past_deadline_is_unavailable_and_not_cached() {
    let h = harness_configured(
        TieredCache::memory(None, None),
        Duration::from_millis(300),
        Some(Duration::from_millis(100)),
    )
    .await;

    let resp = h.manager.handle(DORMULIN_QUERY).await.unwrap();
    assert_eq!(resp.record.classification(), Classification::Unavailable);
    assert_eq!(resp.record.answer(), messages::UNAVAILABLE);
    assert!(resp.record.degraded);
    assert_eq!(resp.cache_status, CacheStatus::Miss);

    let stats = h.manager.stats();
    assert_eq!(stats.l1_entries, 0);
    assert_eq!(stats.in_flight, 0);

    // queries that need no generation finish well inside the deadline
    let ood = h.manager.handle(LAPTOPS).await.unwrap();
    assert_eq!(ood.record.classification(), Classification::OutOfDomain);
    assert!(!ood.record.degraded);
}

#[tokio::test]
async fn reload_index_invalidates_and_checks_dimension() {
    let h = harness().await;
    h.manager.handle(DORMULIN_QUERY).await.unwrap();

    let mut reduced = EmbeddingIndex::new(KEYWORDS.len());
    reduced
        .insert(
            Passage::new("thrips-0", "Thrips", "Thrips damage chilli leaves."),
            KeywordEmbedder::vector("thrips chilli"),
        )
        .unwrap();
    h.manager.reload_index(Arc::new(reduced)).await.unwrap();

    // the Dormulin passage is gone, so the answer is now unknown
    let resp = h.manager.handle(DORMULIN_QUERY).await.unwrap();
    assert_eq!(resp.cache_status, CacheStatus::Miss);
    assert_eq!(resp.record.classification(), Classification::NoContext);

    let wrong = Arc::new(EmbeddingIndex::new(KEYWORDS.len() + 1));
    assert!(matches!(
        h.manager.reload_index(wrong).await,
        Err(Error::DimensionMismatch { .. })
    ));
}

#[tokio::test]
async fn persistent_tier_survives_restart() {
    let dir = tempfile::tempdir().unwrap();
    let config = TieredCacheConfig {
        capacity: Some(100),
        persist_path: Some(dir.path().join("responses.json")),
        ..Default::default()
    };

    {
        let h = harness_with(TieredCache::open(&config).await.unwrap(), Duration::ZERO).await;
        h.manager.handle(DORMULIN_QUERY).await.unwrap();
        assert_eq!(h.manager.stats().l2_entries, Some(1));
    }

    let restarted = harness_with(TieredCache::open(&config).await.unwrap(), Duration::ZERO).await;
    let resp = restarted.manager.handle(MISSPELLED_QUERY).await.unwrap();

    assert_eq!(resp.cache_status, CacheStatus::Hit(CacheTier::L2));
    assert_eq!(resp.record.classification(), Classification::Grounded);
    assert_eq!(restarted.generator.calls(), 0);

    let again = restarted.manager.handle(DORMULIN_QUERY).await.unwrap();
    assert_eq!(again.cache_status, CacheStatus::Hit(CacheTier::L1));
}

#[tokio::test]
async fn priming_populates_cache_in_background() {
    let h = harness().await;
    let queries = vec![
        DORMULIN_QUERY.to_string(),
        MISSPELLED_QUERY.to_string(),
        PURPLE_CARROTS.to_string(),
        LAPTOPS.to_string(),
    ];

    let report = h.manager.prime(queries).await.unwrap();
    assert_eq!(
        report,
        PrimeReport {
            primed: 3,
            already_cached: 1,
            degraded: 0,
            failed: 0,
        }
    );

    for query in [DORMULIN_QUERY, PURPLE_CARROTS, LAPTOPS] {
        let resp = h.manager.handle(query).await.unwrap();
        assert!(resp.cache_status.is_hit(), "{} not primed", query);
    }
    assert_eq!(h.generator.calls(), 1);
}

#[tokio::test]
async fn priming_reports_degraded_queries() {
    let h = harness().await;
    h.generator.failing.store(true, Ordering::SeqCst);

    let report = h.manager.prime(vec![DORMULIN_QUERY.to_string()]).await.unwrap();
    assert_eq!(report.degraded, 1);
    assert_eq!(report.primed, 0);
    assert_eq!(h.manager.stats().l1_entries, 0);
}

#[tokio::test]
async fn grounding_boundary_holds() {
    let h = harness().await;

    for query in [DORMULIN_QUERY, PURPLE_CARROTS, LAPTOPS, "How do I stop thrips on chilli?"] {
        let resp = h.manager.handle(query).await.unwrap();
        match resp.record.classification() {
            Classification::Grounded => {
                assert!(matches!(&resp.record.response, Response::Grounded { sources, .. } if !sources.is_empty()));
            }
            Classification::NoContext => assert_eq!(resp.record.answer(), messages::NO_CONTEXT),
            Classification::OutOfDomain => assert_eq!(resp.record.answer(), messages::OUT_OF_DOMAIN),
            Classification::Unavailable => panic!("no collaborator failed for {}", query),
        }
    }
}
