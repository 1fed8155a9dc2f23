//! Capacity- and TTL-bounded LRU store.

use super::manager::CacheStats;
use lru::LruCache;
use std::num::NonZeroUsize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;
use std::time::{Duration, Instant};
use tracing::trace;

#[derive(Debug, Clone)]
struct CacheEntry<V> {
    value: V,
    inserted_at: Instant,
    ttl: Duration,
}

impl<V> CacheEntry<V> {
    fn new(value: V, ttl: Duration) -> Self {
        let now = Instant::now();
        Self {
            value,
            inserted_at: now,
            ttl,
        }
    }

    fn is_expired(&self, now: Instant) -> bool {
        now.duration_since(self.inserted_at) >= self.ttl
    }
}

struct AtomicStats {
    hits: AtomicU64,
    misses: AtomicU64,
    sets: AtomicU64,
    evictions: AtomicU64,
    expirations: AtomicU64,
}

impl AtomicStats {
    fn new() -> Self {
        Self {
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
            sets: AtomicU64::new(0),
            evictions: AtomicU64::new(0),
            expirations: AtomicU64::new(0),
        }
    }

    fn to_stats(&self) -> CacheStats {
        CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            sets: self.sets.load(Ordering::Relaxed),
            evictions: self.evictions.load(Ordering::Relaxed),
            expirations: self.expirations.load(Ordering::Relaxed),
        }
    }
}

/// Least-recently-used cache whose entries also expire after a TTL.
///
/// - Lookups never fail: a miss is `None`.
/// - Expiry is lazy. An expired entry reads as absent (and counts as a miss)
///   but stays in storage until the next write purges it.
/// - Inserting past capacity silently evicts the least-recently-used entry.
///
/// All mutation happens under one short `Mutex` section; statistics are
/// atomics so [`TtlLruCache::stats`] never contends with lookups.
pub struct TtlLruCache<V> {
    entries: Mutex<LruCache<String, CacheEntry<V>>>,
    default_ttl: Duration,
    stats: AtomicStats,
}

impl<V: Clone> TtlLruCache<V> {
    /// `capacity` is clamped to at least 1.
    pub fn new(capacity: usize, default_ttl: Duration) -> Self {
        let capacity = NonZeroUsize::new(capacity.max(1)).unwrap_or(NonZeroUsize::MIN);
        Self {
            entries: Mutex::new(LruCache::new(capacity)),
            default_ttl,
            stats: AtomicStats::new(),
        }
    }

    pub fn get(&self, key: &str) -> Option<V> {
        let now = Instant::now();
        let mut entries = match self.entries.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        let expired = match entries.peek(key) {
            None => {
                self.stats.misses.fetch_add(1, Ordering::Relaxed);
                return None;
            }
            Some(entry) => entry.is_expired(now),
        };
        if expired {
            self.stats.misses.fetch_add(1, Ordering::Relaxed);
            self.stats.expirations.fetch_add(1, Ordering::Relaxed);
            trace!(key, "cache entry expired");
            return None;
        }
        let entry = entries.get(key)?;
        self.stats.hits.fetch_add(1, Ordering::Relaxed);
        Some(entry.value.clone())
    }

    pub fn set(&self, key: impl Into<String>, value: V) {
        self.set_with_ttl(key, value, self.default_ttl);
    }

    pub fn set_with_ttl(&self, key: impl Into<String>, value: V, ttl: Duration) {
        let key = key.into();
        let now = Instant::now();
        let mut entries = match self.entries.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };

        let expired: Vec<String> = entries
            .iter()
            .filter(|(_, e)| e.is_expired(now))
            .map(|(k, _)| k.clone())
            .collect();
        for k in expired {
            entries.pop(&k);
        }

        let replacing = entries.contains(&key);
        if let Some((evicted, _)) = entries.push(key, CacheEntry::new(value, ttl)) {
            if !replacing {
                self.stats.evictions.fetch_add(1, Ordering::Relaxed);
                trace!(key = evicted.as_str(), "cache entry evicted");
            }
        }
        self.stats.sets.fetch_add(1, Ordering::Relaxed);
    }

    pub fn remove(&self, key: &str) -> bool {
        match self.entries.lock() {
            Ok(mut entries) => entries.pop(key).is_some(),
            Err(poisoned) => poisoned.into_inner().pop(key).is_some(),
        }
    }

    pub fn clear(&self) {
        match self.entries.lock() {
            Ok(mut entries) => entries.clear(),
            Err(poisoned) => poisoned.into_inner().clear(),
        }
    }

    /// Number of physically stored entries, expired ones included.
    pub fn len(&self) -> usize {
        match self.entries.lock() {
            Ok(entries) => entries.len(),
            Err(poisoned) => poisoned.into_inner().len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn capacity(&self) -> usize {
        match self.entries.lock() {
            Ok(entries) => entries.cap().get(),
            Err(poisoned) => poisoned.into_inner().cap().get(),
        }
    }

    pub fn stats(&self) -> CacheStats {
        self.stats.to_stats()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn test_get_after_set_is_hit() {
        let cache = TtlLruCache::new(4, Duration::from_secs(60));
        cache.set("a", 1u32);
        assert_eq!(cache.get("a"), Some(1));
        let stats = cache.stats();
        assert_eq!(stats.hits, 1);
        assert_eq!(stats.misses, 0);
        assert_eq!(stats.sets, 1);
    }

    #[test]
    fn test_missing_key_is_miss() {
        let cache: TtlLruCache<u32> = TtlLruCache::new(4, Duration::from_secs(60));
        assert_eq!(cache.get("nope"), None);
        assert_eq!(cache.stats().misses, 1);
        assert_eq!(cache.stats().hit_rate(), 0.0);
    }

    #[test]
    fn test_evicts_least_recently_used() {
        let cache = TtlLruCache::new(3, Duration::from_secs(60));
        cache.set("a", 1);
        cache.set("b", 2);
        cache.set("c", 3);
        // Touch "a" so "b" becomes least recently used
        assert_eq!(cache.get("a"), Some(1));
        cache.set("d", 4);

        assert_eq!(cache.len(), 3);
        assert_eq!(cache.get("b"), None);
        assert_eq!(cache.get("a"), Some(1));
        assert_eq!(cache.get("c"), Some(3));
        assert_eq!(cache.get("d"), Some(4));
        assert_eq!(cache.stats().evictions, 1);
    }

    #[test]
    fn test_overwrite_does_not_evict() {
        let cache = TtlLruCache::new(2, Duration::from_secs(60));
        cache.set("a", 1);
        cache.set("b", 2);
        cache.set("a", 10);
        assert_eq!(cache.len(), 2);
        assert_eq!(cache.get("a"), Some(10));
        assert_eq!(cache.get("b"), Some(2));
        assert_eq!(cache.stats().evictions, 0);
    }

    #[test]
    fn test_expired_entry_is_miss_but_still_stored() {
        let cache = TtlLruCache::new(4, Duration::from_millis(30));
        cache.set("a", 1);
        thread::sleep(Duration::from_millis(50));

        assert_eq!(cache.get("a"), None);
        let stats = cache.stats();
        assert_eq!(stats.misses, 1);
        assert_eq!(stats.expirations, 1);
        // Lazy expiry: still physically present until the next write
        assert_eq!(cache.len(), 1);

        cache.set_with_ttl("b", 2, Duration::from_secs(60));
        assert_eq!(cache.len(), 1);
        assert_eq!(cache.get("b"), Some(2));
    }

    #[test]
    fn test_set_resets_ttl_clock() {
        let cache = TtlLruCache::new(4, Duration::from_millis(80));
        cache.set("a", 1);
        thread::sleep(Duration::from_millis(50));
        cache.set("a", 2);
        thread::sleep(Duration::from_millis(50));
        assert_eq!(cache.get("a"), Some(2));
    }

    #[test]
    fn test_zero_capacity_clamped() {
        let cache = TtlLruCache::new(0, Duration::from_secs(1));
        assert_eq!(cache.capacity(), 1);
        cache.set("a", 1);
        cache.set("b", 2);
        assert_eq!(cache.len(), 1);
        assert_eq!(cache.get("b"), Some(2));
    }

    #[test]
    fn test_remove_and_clear() {
        let cache = TtlLruCache::new(4, Duration::from_secs(60));
        cache.set("a", 1);
        cache.set("b", 2);
        assert!(cache.remove("a"));
        assert!(!cache.remove("a"));
        cache.clear();
        assert!(cache.is_empty());
    }

    #[test]
    fn test_stats_snapshot_does_not_mutate() {
        let cache = TtlLruCache::new(4, Duration::from_secs(60));
        cache.set("a", 1);
        let _ = cache.get("a");
        let first = cache.stats();
        let second = cache.stats();
        assert_eq!(first, second);
    }

    #[test]
    fn test_concurrent_access_respects_capacity() {
        let cache = Arc::new(TtlLruCache::new(16, Duration::from_secs(60)));
        let mut handles = vec![];
        for t in 0..8 {
            let cache = Arc::clone(&cache);
            handles.push(thread::spawn(move || {
                for i in 0..100 {
                    let key = format!("{}-{}", t, i);
                    cache.set(key.clone(), i);
                    let _ = cache.get(&key);
                }
            }));
        }
        for h in handles {
            h.join().unwrap();
        }
        assert!(cache.len() <= 16);
        let stats = cache.stats();
        assert_eq!(stats.sets, 800);
        assert_eq!(stats.hits + stats.misses, 800);
    }
}
