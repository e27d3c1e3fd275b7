//! Cache manager: the single query entry point
//!
//! raw query → term correction → cache key → L1/L2 → pipeline → commit.
//!
//! Concurrent requests for the same uncached key are serialized on a per-key
//! async mutex; the first runs the pipeline, the rest wait and then read the
//! committed entry. Results are committed only after the pipeline completes,
//! only when not degraded, and only when no invalidation happened meanwhile.
//! A request dropped mid-pipeline commits nothing and releases its key.
//! Uncached work is bounded by an overall deadline, past which the answer
//! is a degraded UNAVAILABLE.

use dashmap::DashMap;
use futures::StreamExt;
use serde::Serialize;
use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::{Mutex, OwnedMutexGuard};
use tokio::task::JoinHandle;

use agri_faq_config::constants::messages;
use agri_faq_core::{Error, Response, ResponseRecord, Result, Timing};
use agri_faq_rag::{EmbeddingIndex, Retriever};
use agri_faq_text_processing::{cache_key, Correction, TermNormalizer};

use crate::cache::{CacheTier, TieredCache};
use crate::pipeline::QueryPipeline;

/// Where a response came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CacheStatus {
    Hit(CacheTier),
    Miss,
}

impl CacheStatus {
    pub fn is_hit(&self) -> bool {
        matches!(self, CacheStatus::Hit(_))
    }
}

/// Result of `handle`
#[derive(Debug, Clone)]
pub struct QueryResponse {
    pub record: ResponseRecord,
    /// Query after term correction
    pub normalized: String,
    pub corrections: Vec<Correction>,
    pub cache_key: String,
    pub cache_status: CacheStatus,
}

/// Outcome counts of a priming run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct PrimeReport {
    /// Newly computed and committed
    pub primed: usize,
    pub already_cached: usize,
    /// Computed but not committed because a collaborator failed
    pub degraded: usize,
    pub failed: usize,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CacheStats {
    pub l1_entries: u64,
    pub l2_entries: Option<usize>,
    pub l1_hits: u64,
    pub l2_hits: u64,
    pub misses: u64,
    pub pipeline_runs: u64,
    pub generation: u64,
    /// Keys with a request currently computing or waiting
    pub in_flight: usize,
}

#[derive(Debug, Default)]
struct Counters {
    l1_hits: AtomicU64,
    l2_hits: AtomicU64,
    misses: AtomicU64,
    pipeline_runs: AtomicU64,
}

pub struct CacheManager {
    normalizer: Arc<TermNormalizer>,
    pipeline: QueryPipeline,
    cache: TieredCache,
    in_flight: DashMap<String, Arc<Mutex<()>>>,
    /// Bumped by `invalidate_all`; results computed under an older value
    /// are not committed
    generation: AtomicU64,
    /// Held for read while committing, for write while invalidating
    commit_lock: tokio::sync::RwLock<()>,
    priming_concurrency: usize,
    deadline: Option<Duration>,
    counters: Counters,
}

impl CacheManager {
    pub fn new(normalizer: Arc<TermNormalizer>, pipeline: QueryPipeline, cache: TieredCache) -> Self {
        Self {
            normalizer,
            pipeline,
            cache,
            in_flight: DashMap::new(),
            generation: AtomicU64::new(0),
            commit_lock: tokio::sync::RwLock::new(()),
            priming_concurrency: agri_faq_config::constants::cache::PRIMING_CONCURRENCY,
            deadline: None,
            counters: Counters::default(),
        }
    }

    pub fn with_priming_concurrency(mut self, concurrency: usize) -> Self {
        self.priming_concurrency = concurrency.max(1);
        self
    }

    /// Bound the time spent on one uncached query, including waiting on
    /// another request for the same key
    pub fn with_deadline(mut self, deadline: Duration) -> Self {
        self.deadline = Some(deadline);
        self
    }

    pub fn normalizer(&self) -> &TermNormalizer {
        &self.normalizer
    }

    pub fn retriever(&self) -> &Arc<Retriever> {
        self.pipeline.retriever()
    }

    /// Answer one raw query
    pub async fn handle(&self, raw_query: &str) -> Result<QueryResponse> {
        let start = Instant::now();
        let (normalized, corrections) = self.normalizer.normalize_with_corrections(raw_query);
        let key = cache_key(&normalized);

        if !corrections.is_empty() {
            tracing::debug!(
                raw = %raw_query,
                normalized = %normalized,
                corrections = corrections.len(),
                "Query terms corrected"
            );
        }

        let response = |record: ResponseRecord, cache_status: CacheStatus| QueryResponse {
            record,
            normalized: normalized.clone(),
            corrections: corrections.clone(),
            cache_key: key.clone(),
            cache_status,
        };

        if let Some((record, tier)) = self.lookup(&key).await {
            return Ok(response(record, CacheStatus::Hit(tier)));
        }

        let resolved = match self.deadline {
            Some(deadline) => tokio::time::timeout(deadline, self.resolve(&key, &normalized))
                .await
                .unwrap_or_else(|_| {
                    tracing::warn!(
                        key = %key,
                        deadline_ms = deadline.as_millis() as u64,
                        "Query deadline exceeded, returning service-unavailable response"
                    );
                    metrics::counter!("agri_faq_degraded_total", "stage" => "deadline").increment(1);
                    let timing = Timing {
                        total_ms: start.elapsed().as_millis() as u64,
                        ..Timing::default()
                    };
                    let record = ResponseRecord::degraded(
                        Response::Unavailable {
                            answer: messages::UNAVAILABLE.to_string(),
                        },
                        timing,
                    );
                    Ok((record, CacheStatus::Miss))
                }),
            None => self.resolve(&key, &normalized).await,
        };
        let result = resolved.map(|(record, status)| response(record, status));

        if let Ok(resp) = &result {
            metrics::counter!(
                "agri_faq_queries_total",
                "classification" => resp.record.classification().as_str()
            )
            .increment(1);
            tracing::debug!(
                key = %key,
                classification = %resp.record.classification(),
                cache = ?resp.cache_status,
                elapsed_ms = start.elapsed().as_millis() as u64,
                "Query handled"
            );
        }

        result
    }

    /// Wait for the key's slot, re-check the cache, then compute
    async fn resolve(&self, key: &str, normalized: &str) -> Result<(ResponseRecord, CacheStatus)> {
        let _slot = InFlightSlot::acquire(&self.in_flight, key).await;

        // another request may have committed while we waited
        if let Some((record, tier)) = self.lookup(key).await {
            return Ok((record, CacheStatus::Hit(tier)));
        }
        let record = self.compute(key, normalized).await?;
        Ok((record, CacheStatus::Miss))
    }

    /// Cache read under the commit lock, so an L2 promotion cannot land in
    /// L1 after an invalidation has cleared it
    async fn lookup(&self, key: &str) -> Option<(ResponseRecord, CacheTier)> {
        let (entry, tier) = {
            let _commit = self.commit_lock.read().await;
            self.cache.get(key).await?
        };
        let counter = match tier {
            CacheTier::L1 => &self.counters.l1_hits,
            CacheTier::L2 => &self.counters.l2_hits,
        };
        counter.fetch_add(1, Ordering::Relaxed);
        metrics::counter!("agri_faq_cache_hits_total", "tier" => tier.as_str()).increment(1);
        Some((entry.record.clone(), tier))
    }

    /// Run the pipeline and commit its result
    async fn compute(&self, key: &str, normalized: &str) -> Result<ResponseRecord> {
        self.counters.misses.fetch_add(1, Ordering::Relaxed);
        self.counters.pipeline_runs.fetch_add(1, Ordering::Relaxed);
        metrics::counter!("agri_faq_cache_misses_total").increment(1);

        let generation = self.generation.load(Ordering::SeqCst);
        let start = Instant::now();
        let record = self.pipeline.run(normalized).await?;
        metrics::histogram!("agri_faq_pipeline_duration_seconds").record(start.elapsed().as_secs_f64());

        if !record.is_cacheable() {
            tracing::warn!(
                key,
                classification = %record.classification(),
                "Degraded response not cached"
            );
            return Ok(record);
        }

        let _commit = self.commit_lock.read().await;
        if self.generation.load(Ordering::SeqCst) != generation {
            tracing::debug!(key, "Cache invalidated during pipeline, result not cached");
            return Ok(record);
        }
        self.cache.insert(key, record.clone()).await;
        tracing::debug!(key, classification = %record.classification(), "Cached response");

        Ok(record)
    }

    /// Drop every cached response from all tiers
    pub async fn invalidate_all(&self) -> Result<()> {
        let _commit = self.commit_lock.write().await;
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        self.cache.clear().await?;
        tracing::info!(generation, "Response cache invalidated");
        Ok(())
    }

    /// Swap in a rebuilt index and invalidate the cache
    pub async fn reload_index(&self, index: Arc<EmbeddingIndex>) -> Result<()> {
        let expected = self.pipeline.embedder().dimension();
        if index.dimension() != expected {
            return Err(Error::DimensionMismatch {
                expected,
                actual: index.dimension(),
            });
        }

        self.pipeline.retriever().replace_index(index);
        self.invalidate_all().await
    }

    /// Run `queries` through `handle` in the background with bounded
    /// concurrency; normal traffic is not blocked
    pub fn prime(self: &Arc<Self>, queries: Vec<String>) -> JoinHandle<PrimeReport> {
        let manager = Arc::clone(self);
        let concurrency = self.priming_concurrency;

        tokio::spawn(async move {
            let total = queries.len();
            tracing::info!(queries = total, concurrency, "Cache priming started");

            let report = futures::stream::iter(queries)
                .map(|query| {
                    let manager = Arc::clone(&manager);
                    async move {
                        let result = manager.handle(&query).await;
                        if let Err(e) = &result {
                            tracing::warn!(query = %query, error = %e, "Priming query failed");
                        }
                        result
                    }
                })
                .buffer_unordered(concurrency)
                .fold(PrimeReport::default(), |mut report, result| async move {
                    match result {
                        Ok(resp) if resp.cache_status.is_hit() => report.already_cached += 1,
                        Ok(resp) if resp.record.degraded => report.degraded += 1,
                        Ok(_) => report.primed += 1,
                        Err(_) => report.failed += 1,
                    }
                    report
                })
                .await;

            tracing::info!(
                primed = report.primed,
                already_cached = report.already_cached,
                degraded = report.degraded,
                failed = report.failed,
                "Cache priming finished"
            );
            report
        })
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            l1_entries: self.cache.l1_len(),
            l2_entries: self.cache.l2_len(),
            l1_hits: self.counters.l1_hits.load(Ordering::Relaxed),
            l2_hits: self.counters.l2_hits.load(Ordering::Relaxed),
            misses: self.counters.misses.load(Ordering::Relaxed),
            pipeline_runs: self.counters.pipeline_runs.load(Ordering::Relaxed),
            generation: self.generation.load(Ordering::SeqCst),
            in_flight: self.in_flight.len(),
        }
    }

    /// Write pending cache bookkeeping to durable storage
    pub async fn flush(&self) -> Result<()> {
        self.cache.flush().await
    }
}

/// Holds a key's serialization mutex; on drop, including when the owning
/// request is cancelled, removes the key's map entry once nobody else
/// holds or waits on it
struct InFlightSlot<'a> {
    map: &'a DashMap<String, Arc<Mutex<()>>>,
    key: &'a str,
    lock: Option<Arc<Mutex<()>>>,
    guard: Option<OwnedMutexGuard<()>>,
}

impl<'a> InFlightSlot<'a> {
    async fn acquire(map: &'a DashMap<String, Arc<Mutex<()>>>, key: &'a str) -> InFlightSlot<'a> {
        let lock = map
            .entry(key.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone();
        let mut slot = Self {
            map,
            key,
            lock: Some(Arc::clone(&lock)),
            guard: None,
        };
        slot.guard = Some(lock.lock_owned().await);
        slot
    }
}

impl Drop for InFlightSlot<'_> {
    fn drop(&mut self) {
        self.guard.take();
        self.lock.take();
        // only the map's own reference left
        self.map.remove_if(self.key, |_, lock| Arc::strong_count(lock) == 1);
    }
}

/// Read warm-up queries: one per line, blank lines and `#` comments skipped
pub fn load_prime_queries(path: &Path) -> Result<Vec<String>> {
    let content = std::fs::read_to_string(path)?;
    Ok(content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(str::to_string)
        .collect())
}
