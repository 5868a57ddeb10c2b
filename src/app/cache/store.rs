//! Time-bounded in-memory key/value store
//!
//! Entries carry an absolute expiry. An expired entry is reported as a miss on
//! read but stays in the map until [`TtlStore::purge_expired`] sweeps it, so a
//! failed refresh never removes anything.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use tokio::sync::RwLock;
use tokio::time::Instant;
use tracing::debug;

use super::stats::CacheStats;

/// Stored value with its expiry
#[derive(Debug, Clone)]
struct CacheEntry<V> {
    value: V,
    expires_at: Instant,
}

impl<V> CacheEntry<V> {
    fn new(value: V, ttl: Duration) -> Self {
        Self {
            value,
            expires_at: Instant::now() + ttl,
        }
    }

    fn is_expired(&self, now: Instant) -> bool {
        now >= self.expires_at
    }
}

/// Thread-safe store with per-entry expiry
///
/// Values are cloned out on read, so `V` should be cheap to clone (an `Arc`
/// or an enum of `Arc`s). Writers hold the write lock for the whole insert,
/// which makes every `set` atomic with respect to concurrent readers.
#[derive(Debug)]
pub struct TtlStore<V> {
    entries: RwLock<HashMap<String, CacheEntry<V>>>,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl<V: Clone> Default for TtlStore<V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V: Clone> TtlStore<V> {
    /// Create an empty store
    pub fn new() -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
        }
    }

    /// Get a live value, or `None` on miss or expiry
    pub async fn get(&self, key: &str) -> Option<V> {
        let entries = self.entries.read().await;
        let value = Self::live_value(&entries, key, Instant::now());
        self.record_lookup(key, value.is_some());
        value
    }

    /// Get several live values from one consistent snapshot
    ///
    /// All keys are read under a single read lock, so a concurrent
    /// [`TtlStore::set_many`] is observed either entirely or not at all.
    pub async fn get_many(&self, keys: &[&str]) -> Vec<Option<V>> {
        let entries = self.entries.read().await;
        let now = Instant::now();
        keys.iter()
            .map(|key| {
                let value = Self::live_value(&entries, key, now);
                self.record_lookup(key, value.is_some());
                value
            })
            .collect()
    }

    /// Insert or overwrite an entry that expires after `ttl`
    pub async fn set(&self, key: impl Into<String>, value: V, ttl: Duration) {
        let key = key.into();
        let mut entries = self.entries.write().await;
        debug!("Cache SET for key: {} (TTL: {}s)", key, ttl.as_secs());
        entries.insert(key, CacheEntry::new(value, ttl));
    }

    /// Insert or overwrite several entries under one write lock
    pub async fn set_many<I>(&self, values: I, ttl: Duration)
    where
        I: IntoIterator<Item = (String, V)>,
    {
        let mut entries = self.entries.write().await;
        let mut written = 0usize;
        for (key, value) in values {
            entries.insert(key, CacheEntry::new(value, ttl));
            written += 1;
        }
        debug!("Cache SET for {} keys (TTL: {}s)", written, ttl.as_secs());
    }

    /// Physically remove expired entries, returning how many were dropped
    pub async fn purge_expired(&self) -> usize {
        let mut entries = self.entries.write().await;
        let before = entries.len();
        let now = Instant::now();
        entries.retain(|_, entry| !entry.is_expired(now));
        before - entries.len()
    }

    /// Current cache statistics
    pub async fn stats(&self) -> CacheStats {
        let entries = self.entries.read().await;
        let now = Instant::now();
        let expired = entries.values().filter(|e| e.is_expired(now)).count();
        CacheStats {
            total_entries: entries.len(),
            expired_entries: expired,
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
        }
    }

    fn live_value(entries: &HashMap<String, CacheEntry<V>>, key: &str, now: Instant) -> Option<V> {
        entries
            .get(key)
            .filter(|entry| !entry.is_expired(now))
            .map(|entry| entry.value.clone())
    }

    fn record_lookup(&self, key: &str, hit: bool) {
        if hit {
            self.hits.fetch_add(1, Ordering::Relaxed);
            debug!("Cache HIT for key: {}", key);
        } else {
            self.misses.fetch_add(1, Ordering::Relaxed);
            debug!("Cache MISS for key: {}", key);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    /// Test set then get
    #[tokio::test]
    async fn test_set_then_get() {
        let store = TtlStore::new();
        store.set("gorivos", 1u32, Duration::from_secs(60)).await;

        assert_eq!(store.get("gorivos").await, Some(1));
        assert_eq!(store.get("opcijas").await, None);
    }

    /// Test overwrite replaces value and expiry
    #[tokio::test]
    async fn test_overwrite_replaces_value_and_expiry() {
        let store = TtlStore::new();
        store.set("gorivos", 1u32, Duration::ZERO).await;
        assert_eq!(store.get("gorivos").await, None);

        store.set("gorivos", 2u32, Duration::from_secs(60)).await;
        assert_eq!(store.get("gorivos").await, Some(2));
    }

    /// Test entry expires after TTL
    #[tokio::test(start_paused = true)]
    async fn test_entry_expires_after_ttl() {
        let store = TtlStore::new();
        store.set("postajas", "stations", Duration::from_secs(180)).await;

        tokio::time::advance(Duration::from_secs(179)).await;
        assert_eq!(store.get("postajas").await, Some("stations"));

        tokio::time::advance(Duration::from_secs(1)).await;
        assert_eq!(store.get("postajas").await, None);

        // Logically gone but still held until purged
        let stats = store.stats().await;
        assert_eq!(stats.total_entries, 1);
        assert_eq!(stats.expired_entries, 1);
    }

    /// Test purge expired
    #[tokio::test(start_paused = true)]
    async fn test_purge_expired() {
        let store = TtlStore::new();
        store.set("short", 1u8, Duration::from_secs(10)).await;
        store.set("long", 2u8, Duration::from_secs(100)).await;

        tokio::time::advance(Duration::from_secs(50)).await;
        assert_eq!(store.purge_expired().await, 1);
        assert_eq!(store.stats().await.total_entries, 1);
        assert_eq!(store.get("long").await, Some(2));
    }

    /// Test set many and get many
    #[tokio::test]
    async fn test_set_many_and_get_many() {
        let store = TtlStore::new();
        store
            .set_many(
                vec![("a".to_string(), 1u8), ("b".to_string(), 2u8)],
                Duration::from_secs(60),
            )
            .await;

        assert_eq!(
            store.get_many(&["a", "b", "c"]).await,
            vec![Some(1), Some(2), None]
        );
    }

    /// Test hit and miss counters
    #[tokio::test]
    async fn test_hit_and_miss_counters() {
        let store = TtlStore::new();
        store.set("a", 1u8, Duration::from_secs(60)).await;
        store.get("a").await;
        store.get("a").await;
        store.get("b").await;

        let stats = store.stats().await;
        assert_eq!(stats.hits, 2);
        assert_eq!(stats.misses, 1);
    }

    /// Test concurrent readers see whole values
    #[tokio::test]
    async fn test_concurrent_readers_see_whole_values() {
        let store = Arc::new(TtlStore::new());
        store
            .set("v", Arc::new(vec![0u32; 1000]), Duration::from_secs(60))
            .await;

        let mut handles = Vec::new();
        for i in 0..8u32 {
            let store = Arc::clone(&store);
            handles.push(tokio::spawn(async move {
                if i % 2 == 0 {
                    store
                        .set("v", Arc::new(vec![i; 1000]), Duration::from_secs(60))
                        .await;
                } else {
                    let value = store.get("v").await.unwrap();
                    let first = value[0];
                    assert!(value.iter().all(|x| *x == first));
                }
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }
    }
}
