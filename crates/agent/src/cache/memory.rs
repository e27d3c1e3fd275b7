//! L1 in-memory response cache using moka.
//!
//! Capacity-bounded (TinyLFU admission) with an optional time-to-live
//! measured from insertion. Unbounded when no capacity is configured.

use std::sync::Arc;
use std::time::Duration;

use moka::sync::Cache;

use super::CacheEntry;

pub struct MemoryCache {
    cache: Cache<String, Arc<CacheEntry>>,
}

impl MemoryCache {
    pub fn new(capacity: Option<u64>, ttl: Option<Duration>) -> Self {
        let mut builder = Cache::<String, Arc<CacheEntry>>::builder();
        if let Some(capacity) = capacity {
            builder = builder.max_capacity(capacity);
        }
        if let Some(ttl) = ttl {
            builder = builder.time_to_live(ttl);
        }

        Self {
            cache: builder.build(),
        }
    }

    pub fn get(&self, key: &str) -> Option<Arc<CacheEntry>> {
        self.cache.get(key)
    }

    pub fn insert(&self, key: String, entry: Arc<CacheEntry>) {
        self.cache.insert(key, entry);
    }

    pub fn remove(&self, key: &str) {
        self.cache.invalidate(key);
    }

    /// Entry count after pending evictions are applied
    pub fn len(&self) -> u64 {
        self.cache.run_pending_tasks();
        self.cache.entry_count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&self) {
        self.cache.invalidate_all();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use agri_faq_core::{Response, ResponseRecord, Timing};

    fn entry(answer: &str) -> Arc<CacheEntry> {
        Arc::new(CacheEntry::new(ResponseRecord::new(
            Response::NoContext {
                answer: answer.to_string(),
            },
            Timing::default(),
        ), None))
    }

    #[test]
    fn insert_and_get() {
        let cache = MemoryCache::new(Some(10), None);
        cache.insert("k".to_string(), entry("a"));
        assert_eq!(cache.get("k").unwrap().record.answer(), "a");
        assert!(cache.get("missing").is_none());
    }

    #[test]
    fn capacity_bounds_entries() {
        let cache = MemoryCache::new(Some(2), None);
        for i in 0..20 {
            cache.insert(format!("k{}", i), entry("x"));
        }
        assert!(cache.len() <= 2);
    }

    #[test]
    fn clear_hides_entries() {
        let cache = MemoryCache::new(None, None);
        cache.insert("a".to_string(), entry("a"));
        cache.clear();
        assert!(cache.get("a").is_none());
    }

    #[test]
    fn ttl_expires_entries() {
        let cache = MemoryCache::new(None, Some(Duration::from_millis(20)));
        cache.insert("a".to_string(), entry("a"));
        std::thread::sleep(Duration::from_millis(60));
        assert!(cache.get("a").is_none());
    }
}
