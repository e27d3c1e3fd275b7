//! L2 durable response cache: one JSON file holding the corpus fingerprint
//! and a map of cache key to entry.
//!
//! The file is decoded once at open and rewritten through a temp file and
//! rename on every insert or removal. Entries are decoded one at a time, so
//! one undecodable entry costs only that entry. A file written under another
//! fingerprint is discarded whole. Over capacity, the least recently
//! accessed entries are evicted.

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};

use agri_faq_core::{Error, Result};

use super::{CacheEntry, StoredEntry};

#[derive(Deserialize)]
struct CacheFile {
    #[serde(default)]
    fingerprint: Option<String>,
    #[serde(default)]
    entries: BTreeMap<String, serde_json::Value>,
}

#[derive(Serialize)]
struct CacheFileRef<'a> {
    fingerprint: Option<&'a str>,
    entries: &'a BTreeMap<String, StoredEntry>,
}

pub struct DiskCache {
    path: PathBuf,
    capacity: Option<usize>,
    fingerprint: Option<String>,
    entries: RwLock<BTreeMap<String, StoredEntry>>,
    /// Access bookkeeping changed since the last rewrite
    dirty: AtomicBool,
    /// Serializes file rewrites
    write_lock: tokio::sync::Mutex<()>,
}

impl DiskCache {
    pub async fn open(path: PathBuf, capacity: Option<usize>, fingerprint: Option<String>) -> Result<Self> {
        let file = match tokio::fs::read_to_string(&path).await {
            Ok(content) => match serde_json::from_str::<CacheFile>(&content) {
                Ok(file) => Some(file),
                Err(e) => {
                    let err = Error::CacheCorruption {
                        key: "*".to_string(),
                        message: e.to_string(),
                    };
                    tracing::warn!(path = %path.display(), error = %err, "Discarding unreadable cache file");
                    None
                }
            },
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => None,
            Err(e) => return Err(e.into()),
        };

        let mut entries = BTreeMap::new();
        let mut rewrite = false;
        if let Some(file) = file {
            if file.fingerprint != fingerprint {
                tracing::info!(
                    path = %path.display(),
                    discarded = file.entries.len(),
                    "Corpus changed since responses were persisted, discarding them"
                );
                rewrite = true;
            } else {
                let now = Utc::now();
                for (key, value) in file.entries {
                    match serde_json::from_value::<StoredEntry>(value) {
                        Ok(stored) if stored.is_expired_at(now) => rewrite = true,
                        Ok(stored) => {
                            entries.insert(key, stored);
                        }
                        Err(e) => {
                            let err = Error::CacheCorruption {
                                key,
                                message: e.to_string(),
                            };
                            tracing::warn!(error = %err, "Discarding corrupted cache entry");
                            metrics::counter!("agri_faq_degraded_total", "stage" => "cache").increment(1);
                            rewrite = true;
                        }
                    }
                }
            }
        }
        if evict_over_capacity(&mut entries, capacity, None) > 0 {
            rewrite = true;
        }

        tracing::info!(path = %path.display(), entries = entries.len(), "Loaded persistent cache");

        let cache = Self {
            path,
            capacity,
            fingerprint,
            entries: RwLock::new(entries),
            dirty: AtomicBool::new(false),
            write_lock: tokio::sync::Mutex::new(()),
        };
        if rewrite {
            if let Err(e) = cache.persist().await {
                tracing::warn!(error = %e, "Failed to rewrite cache file");
            }
        }
        Ok(cache)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Entry for `key`; an expired entry is dropped and reported as a miss
    pub async fn get(&self, key: &str) -> Option<CacheEntry> {
        let stored = self.entries.read().get(key).cloned()?;
        if !stored.is_expired_at(Utc::now()) {
            return Some(stored.into());
        }

        tracing::debug!(key, "Persisted entry expired");
        self.entries.write().remove(key);
        if let Err(e) = self.persist().await {
            tracing::warn!(error = %e, "Failed to rewrite cache file");
        }
        None
    }

    /// Record a hit in memory; written out by the next rewrite or `flush`
    pub fn record_access(&self, key: &str, hits: u64, last_accessed: DateTime<Utc>) {
        if let Some(stored) = self.entries.write().get_mut(key) {
            stored.hits = hits;
            stored.last_accessed = last_accessed;
            self.dirty.store(true, Ordering::Relaxed);
        }
    }

    pub async fn insert(&self, key: &str, entry: StoredEntry) -> Result<()> {
        let evicted = {
            let mut entries = self.entries.write();
            entries.insert(key.to_string(), entry);
            evict_over_capacity(&mut entries, self.capacity, Some(key))
        };
        if evicted > 0 {
            tracing::debug!(evicted, "Persistent cache at capacity, evicted least recently used");
        }
        self.persist().await
    }

    pub async fn clear(&self) -> Result<()> {
        self.entries.write().clear();
        self.persist().await
    }

    /// Rewrite the file if access bookkeeping changed since the last write
    pub async fn flush(&self) -> Result<()> {
        if self.dirty.load(Ordering::Relaxed) {
            self.persist().await?;
        }
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    async fn persist(&self) -> Result<()> {
        let _guard = self.write_lock.lock().await;
        self.dirty.store(false, Ordering::Relaxed);
        let content = {
            let entries = self.entries.read();
            serde_json::to_vec_pretty(&CacheFileRef {
                fingerprint: self.fingerprint.as_deref(),
                entries: &*entries,
            })?
        };

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await?;
        }
        let tmp = self.path.with_extension("json.tmp");
        let written = async {
            tokio::fs::write(&tmp, content).await?;
            tokio::fs::rename(&tmp, &self.path).await
        }
        .await;
        if let Err(e) = written {
            self.dirty.store(true, Ordering::Relaxed);
            return Err(e.into());
        }
        Ok(())
    }
}

/// Drop expired entries, then the least recently accessed, until within
/// `capacity`; `keep` is never evicted. Returns the number removed.
fn evict_over_capacity(
    entries: &mut BTreeMap<String, StoredEntry>,
    capacity: Option<usize>,
    keep: Option<&str>,
) -> usize {
    let Some(capacity) = capacity else {
        return 0;
    };
    let before = entries.len();
    if before <= capacity {
        return 0;
    }

    let now = Utc::now();
    entries.retain(|key, entry| Some(key.as_str()) == keep || !entry.is_expired_at(now));

    while entries.len() > capacity {
        let oldest = entries
            .iter()
            .filter(|(key, _)| Some(key.as_str()) != keep)
            .min_by_key(|(_, entry)| entry.last_accessed)
            .map(|(key, _)| key.clone());
        match oldest {
            Some(key) => {
                entries.remove(&key);
            }
            None => break,
        }
    }

    before - entries.len()
}
