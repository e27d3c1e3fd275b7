//! Two-tier response cache.
//!
//! L1 (moka in-memory) → L2 (optional JSON file).
//! Write-through: a committed miss is written to L1 and L2. An L2 hit is
//! promoted into L1 keeping its original expiry, so the configured TTL holds
//! across tiers and restarts. Hit counts and access times flow back to L2.

pub mod disk;
pub mod memory;

pub use disk::DiskCache;
pub use memory::MemoryCache;

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use agri_faq_config::CacheConfig;
use agri_faq_core::{ResponseRecord, Result};

/// Tier that served a lookup
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CacheTier {
    L1,
    L2,
}

impl CacheTier {
    pub fn as_str(&self) -> &'static str {
        match self {
            CacheTier::L1 => "l1",
            CacheTier::L2 => "l2",
        }
    }
}

/// A cached response with its access bookkeeping
///
/// Only the hit counter and last-access time change after creation.
#[derive(Debug)]
pub struct CacheEntry {
    pub record: ResponseRecord,
    pub created_at: DateTime<Utc>,
    /// Never expires when `None`
    pub expires_at: Option<DateTime<Utc>>,
    hits: AtomicU64,
    last_accessed: Mutex<DateTime<Utc>>,
}

impl CacheEntry {
    pub fn new(record: ResponseRecord, ttl: Option<Duration>) -> Self {
        let now = Utc::now();
        let expires_at = ttl
            .and_then(|ttl| chrono::Duration::from_std(ttl).ok())
            .and_then(|ttl| now.checked_add_signed(ttl));
        Self {
            record,
            created_at: now,
            expires_at,
            hits: AtomicU64::new(0),
            last_accessed: Mutex::new(now),
        }
    }

    pub fn is_expired(&self) -> bool {
        self.expires_at.is_some_and(|at| Utc::now() >= at)
    }

    /// Record a hit, returning the new hit count
    pub fn touch(&self) -> u64 {
        *self.last_accessed.lock() = Utc::now();
        self.hits.fetch_add(1, Ordering::Relaxed) + 1
    }

    pub fn hits(&self) -> u64 {
        self.hits.load(Ordering::Relaxed)
    }

    pub fn last_accessed(&self) -> DateTime<Utc> {
        *self.last_accessed.lock()
    }

    pub fn to_stored(&self) -> StoredEntry {
        StoredEntry {
            record: self.record.clone(),
            created_at: self.created_at,
            expires_at: self.expires_at,
            last_accessed: self.last_accessed(),
            hits: self.hits(),
        }
    }
}

/// Serialized form of a `CacheEntry` in the L2 file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredEntry {
    pub record: ResponseRecord,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub expires_at: Option<DateTime<Utc>>,
    pub last_accessed: DateTime<Utc>,
    pub hits: u64,
}

impl StoredEntry {
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.is_some_and(|at| now >= at)
    }
}

impl From<StoredEntry> for CacheEntry {
    fn from(stored: StoredEntry) -> Self {
        Self {
            record: stored.record,
            created_at: stored.created_at,
            expires_at: stored.expires_at,
            hits: AtomicU64::new(stored.hits),
            last_accessed: Mutex::new(stored.last_accessed),
        }
    }
}

/// Cache tier options
#[derive(Debug, Clone, Default)]
pub struct TieredCacheConfig {
    /// Per-tier capacity; unbounded when `None`
    pub capacity: Option<u64>,
    pub ttl: Option<Duration>,
    /// L2 file; L2 is disabled when `None`
    pub persist_path: Option<PathBuf>,
    /// Identifies the corpus and models behind the answers; an L2 file
    /// written under another fingerprint is discarded on open
    pub fingerprint: Option<String>,
}

impl From<&CacheConfig> for TieredCacheConfig {
    fn from(config: &CacheConfig) -> Self {
        Self {
            capacity: config.capacity,
            ttl: config.ttl(),
            persist_path: config.persist_path.as_ref().map(PathBuf::from),
            fingerprint: None,
        }
    }
}

/// Coordinates lookups across L1 and L2
pub struct TieredCache {
    l1: MemoryCache,
    l2: Option<DiskCache>,
    ttl: Option<Duration>,
}

impl TieredCache {
    /// In-memory only
    pub fn memory(capacity: Option<u64>, ttl: Option<Duration>) -> Self {
        Self {
            l1: MemoryCache::new(capacity, ttl),
            l2: None,
            ttl,
        }
    }

    /// Open both tiers, loading the L2 file when one is configured
    pub async fn open(config: &TieredCacheConfig) -> Result<Self> {
        let l2 = match &config.persist_path {
            Some(path) => Some(
                DiskCache::open(
                    path.clone(),
                    config.capacity.map(|c| c as usize),
                    config.fingerprint.clone(),
                )
                .await?,
            ),
            None => None,
        };

        tracing::info!(
            capacity = ?config.capacity,
            ttl = ?config.ttl,
            persistent = l2.is_some(),
            "Response cache ready"
        );

        Ok(Self {
            l1: MemoryCache::new(config.capacity, config.ttl),
            l2,
            ttl: config.ttl,
        })
    }

    /// Look up a key: L1, then L2 with promotion into L1
    ///
    /// Expired entries are misses in either tier.
    pub async fn get(&self, key: &str) -> Option<(Arc<CacheEntry>, CacheTier)> {
        if let Some(entry) = self.l1.get(key) {
            if !entry.is_expired() {
                self.record_hit(key, &entry);
                tracing::debug!(key, tier = "l1", "cache hit");
                return Some((entry, CacheTier::L1));
            }
            self.l1.remove(key);
        }

        let l2 = self.l2.as_ref()?;
        let entry = Arc::new(l2.get(key).await?);
        self.record_hit(key, &entry);
        self.l1.insert(key.to_string(), Arc::clone(&entry));
        tracing::debug!(key, tier = "l2", "cache hit");
        Some((entry, CacheTier::L2))
    }

    fn record_hit(&self, key: &str, entry: &CacheEntry) {
        let hits = entry.touch();
        if let Some(l2) = &self.l2 {
            l2.record_access(key, hits, entry.last_accessed());
        }
    }

    /// Write-through insert into both tiers
    pub async fn insert(&self, key: &str, record: ResponseRecord) -> Arc<CacheEntry> {
        let entry = Arc::new(CacheEntry::new(record, self.ttl));
        self.l1.insert(key.to_string(), Arc::clone(&entry));

        if let Some(l2) = &self.l2 {
            if let Err(e) = l2.insert(key, entry.to_stored()).await {
                tracing::warn!(key, error = %e, "Failed to persist cache entry");
            }
        }
        entry
    }

    /// Clear every tier
    pub async fn clear(&self) -> Result<()> {
        self.l1.clear();
        if let Some(l2) = &self.l2 {
            l2.clear().await?;
        }
        Ok(())
    }

    /// Write pending access bookkeeping to the L2 file
    pub async fn flush(&self) -> Result<()> {
        match &self.l2 {
            Some(l2) => l2.flush().await,
            None => Ok(()),
        }
    }

    pub fn l1_len(&self) -> u64 {
        self.l1.len()
    }

    pub fn l2_len(&self) -> Option<usize> {
        self.l2.as_ref().map(DiskCache::len)
    }
}
