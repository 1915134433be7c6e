// SPDX-FileCopyrightText: 2026 Telsage Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! LRU response cache with per-entry time-to-live.
//!
//! All operations take a single mutex, so a reader never observes a partially
//! written entry. Expired entries are purged at the start of every access;
//! capacity overflow then evicts the least recently used entry.

use std::num::NonZeroUsize;
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

use lru::LruCache;
use serde::Serialize;
use tokio::time::Instant;
use tracing::{debug, trace};

use crate::key::CacheKey;

/// One cached response. Replaced, never mutated.
#[derive(Debug, Clone)]
struct CacheEntry {
    value: String,
    created_at: Instant,
    ttl: Duration,
}

impl CacheEntry {
    fn is_expired(&self, now: Instant) -> bool {
        now.saturating_duration_since(self.created_at) >= self.ttl
    }
}

/// Cumulative cache counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub insertions: u64,
    pub expirations: u64,
    pub evictions: u64,
}

struct Inner {
    entries: LruCache<CacheKey, CacheEntry>,
    stats: CacheStats,
}

impl Inner {
    fn purge_expired(&mut self, now: Instant) {
        let expired: Vec<CacheKey> = self
            .entries
            .iter()
            .filter(|(_, entry)| entry.is_expired(now))
            .map(|(key, _)| key.clone())
            .collect();
        for key in expired {
            self.entries.pop(&key);
            self.stats.expirations += 1;
            trace!(key = %key, "cache entry expired");
        }
    }
}

/// Bounded, time-expiring cache from query fingerprint to response text.
pub struct ResponseCache {
    inner: Mutex<Inner>,
    capacity: NonZeroUsize,
}

impl ResponseCache {
    /// Default number of entries.
    pub const DEFAULT_CAPACITY: usize = 1000;

    /// A cache holding at most `capacity` entries (a capacity of 0 is treated as 1).
    pub fn new(capacity: usize) -> Self {
        let capacity = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
        Self {
            inner: Mutex::new(Inner {
                entries: LruCache::new(capacity),
                stats: CacheStats::default(),
            }),
            capacity,
        }
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        // A panic while holding the lock cannot leave an entry half-written.
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Look up `key`, refreshing its recency on a hit.
    pub fn get(&self, key: &CacheKey) -> Option<String> {
        let mut inner = self.lock();
        inner.purge_expired(Instant::now());
        let value = inner.entries.get(key).map(|entry| entry.value.clone());
        match value {
            Some(_) => inner.stats.hits += 1,
            None => inner.stats.misses += 1,
        }
        value
    }

    /// Store `value` under `key` for `ttl`. Overwrites refresh the creation time.
    /// A zero `ttl` stores nothing.
    pub fn put(&self, key: CacheKey, value: String, ttl: Duration) {
        if ttl.is_zero() {
            return;
        }
        let now = Instant::now();
        let mut inner = self.lock();
        inner.purge_expired(now);
        let entry = CacheEntry {
            value,
            created_at: now,
            ttl,
        };
        inner.stats.insertions += 1;
        if let Some((evicted, _)) = inner.entries.push(key.clone(), entry)
            && evicted != key
        {
            inner.stats.evictions += 1;
            debug!(key = %evicted, "cache entry evicted (capacity)");
        }
    }

    /// Number of entries, after purging expired ones.
    pub fn len(&self) -> usize {
        let mut inner = self.lock();
        inner.purge_expired(Instant::now());
        inner.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&self) {
        self.lock().entries.clear();
    }

    pub fn capacity(&self) -> usize {
        self.capacity.get()
    }

    pub fn stats(&self) -> CacheStats {
        self.lock().stats
    }
}

impl Default for ResponseCache {
    fn default() -> Self {
        Self::new(Self::DEFAULT_CAPACITY)
    }
}

impl std::fmt::Debug for ResponseCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResponseCache")
            .field("capacity", &self.capacity)
            .field("stats", &self.stats())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;
    use std::sync::Arc;

    use telsage_core::{QueryCategory, QueryClassification};

    use super::*;

    fn key(query: &str) -> CacheKey {
        let c = QueryClassification::new(
            QueryCategory::Procedure,
            Vec::new(),
            1.0,
            BTreeSet::new(),
            Vec::new(),
        );
        CacheKey::fingerprint(query, &c, None, None)
    }

    const TTL: Duration = Duration::from_secs(60);

    #[tokio::test(start_paused = true)]
    async fn round_trip_before_expiry() {
        let cache = ResponseCache::new(10);
        cache.put(key("a"), "answer".into(), TTL);
        tokio::time::advance(Duration::from_secs(59)).await;
        assert_eq!(cache.get(&key("a")).as_deref(), Some("answer"));
    }

    #[tokio::test(start_paused = true)]
    async fn expires_below_capacity() {
        let cache = ResponseCache::new(10);
        cache.put(key("a"), "answer".into(), TTL);
        tokio::time::advance(TTL).await;
        assert_eq!(cache.get(&key("a")), None);
        assert!(cache.is_empty());
        let stats = cache.stats();
        assert_eq!(stats.expirations, 1);
        assert_eq!(stats.misses, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn overwrite_refreshes_created_at() {
        let cache = ResponseCache::new(10);
        cache.put(key("a"), "old".into(), TTL);
        tokio::time::advance(Duration::from_secs(40)).await;
        cache.put(key("a"), "new".into(), TTL);
        tokio::time::advance(Duration::from_secs(40)).await;
        assert_eq!(cache.get(&key("a")).as_deref(), Some("new"));
        assert_eq!(cache.len(), 1);
        assert_eq!(cache.stats().evictions, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn evicts_least_recently_used() {
        let cache = ResponseCache::new(2);
        cache.put(key("a"), "1".into(), TTL);
        cache.put(key("b"), "2".into(), TTL);
        // Touch "a" so "b" is the LRU entry.
        assert!(cache.get(&key("a")).is_some());
        cache.put(key("c"), "3".into(), TTL);
        assert!(cache.get(&key("b")).is_none());
        assert!(cache.get(&key("a")).is_some());
        assert!(cache.get(&key("c")).is_some());
        assert_eq!(cache.stats().evictions, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn expired_entries_are_purged_before_evicting() {
        let cache = ResponseCache::new(2);
        cache.put(key("short"), "1".into(), Duration::from_secs(1));
        cache.put(key("long"), "2".into(), TTL);
        tokio::time::advance(Duration::from_secs(2)).await;
        cache.put(key("new"), "3".into(), TTL);
        assert!(cache.get(&key("long")).is_some());
        assert_eq!(cache.stats().evictions, 0);
        assert_eq!(cache.stats().expirations, 1);
    }

    #[test]
    fn zero_ttl_is_a_no_op() {
        let cache = ResponseCache::new(10);
        cache.put(key("a"), "answer".into(), Duration::ZERO);
        assert!(cache.is_empty());
        assert_eq!(cache.stats().insertions, 0);
    }

    #[test]
    fn zero_capacity_holds_one_entry() {
        let cache = ResponseCache::new(0);
        assert_eq!(cache.capacity(), 1);
        cache.put(key("a"), "1".into(), TTL);
        cache.put(key("b"), "2".into(), TTL);
        assert_eq!(cache.len(), 1);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_access_is_consistent() {
        let cache = Arc::new(ResponseCache::new(64));
        let mut handles = Vec::new();
        for i in 0..16 {
            let cache = Arc::clone(&cache);
            handles.push(tokio::spawn(async move {
                let k = key(&format!("q{}", i % 4));
                cache.put(k.clone(), format!("v{}", i % 4), TTL);
                cache.get(&k)
            }));
        }
        for (i, handle) in handles.into_iter().enumerate() {
            let value = handle.await.unwrap();
            assert_eq!(value, Some(format!("v{}", i % 4)));
        }
        assert_eq!(cache.len(), 4);
    }
}
