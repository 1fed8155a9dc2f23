//! Cache manager: the two cache tiers used by the retrieval service.

use super::backend::TtlLruCache;
use super::key::CacheKeyGenerator;
use crate::config::CacheConfig;
use crate::embeddings::Vector;
use crate::service::RetrievedDocument;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Hit/miss accounting for one cache instance.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub sets: u64,
    pub evictions: u64,
    pub expirations: u64,
}

impl CacheStats {
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}

/// Stats for both tiers, as reported by `get_stats`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct CacheManagerStats {
    pub embedding: CacheStats,
    pub response: CacheStats,
}

pub type EmbeddingCache = TtlLruCache<Vector>;
pub type ResponseCache = TtlLruCache<Arc<[RetrievedDocument]>>;

/// Owns the embedding tier (normalized query -> vector) and the response tier
/// (composite request key -> ranked documents). A disabled tier always misses
/// and records nothing.
pub struct CacheManager {
    embedding: Option<EmbeddingCache>,
    response: Option<ResponseCache>,
    keys: CacheKeyGenerator,
}

impl CacheManager {
    pub fn new(embedding: &CacheConfig, response: &CacheConfig) -> Self {
        Self {
            embedding: embedding
                .enabled
                .then(|| TtlLruCache::new(embedding.capacity, embedding.ttl())),
            response: response
                .enabled
                .then(|| TtlLruCache::new(response.capacity, response.ttl())),
            keys: CacheKeyGenerator::new(),
        }
    }

    pub fn keys(&self) -> &CacheKeyGenerator {
        &self.keys
    }

    pub fn get_embedding(&self, query: &str) -> Option<Vector> {
        let cache = self.embedding.as_ref()?;
        cache.get(&self.keys.embedding_key(query))
    }

    pub fn put_embedding(&self, query: &str, vector: Vector) {
        if let Some(cache) = self.embedding.as_ref() {
            cache.set(self.keys.embedding_key(query), vector);
        }
    }

    pub fn get_response(&self, key: &str) -> Option<Arc<[RetrievedDocument]>> {
        self.response.as_ref()?.get(key)
    }

    pub fn put_response(&self, key: String, documents: Arc<[RetrievedDocument]>) {
        if let Some(cache) = self.response.as_ref() {
            cache.set(key, documents);
        }
    }

    /// Drop every cached response (e.g. after the corpus changed).
    pub fn invalidate_responses(&self) {
        if let Some(cache) = self.response.as_ref() {
            cache.clear();
        }
    }

    pub fn stats(&self) -> CacheManagerStats {
        CacheManagerStats {
            embedding: self.embedding.as_ref().map(|c| c.stats()).unwrap_or_default(),
            response: self.response.as_ref().map(|c| c.stats()).unwrap_or_default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_hit_rate() {
        let stats = CacheStats {
            hits: 3,
            misses: 1,
            ..Default::default()
        };
        assert!((stats.hit_rate() - 0.75).abs() < 1e-9);
    }

    #[test]
    fn test_embedding_tier_normalizes_queries() {
        let mgr = CacheManager::new(
            &CacheConfig::new(10, Duration::from_secs(60)),
            &CacheConfig::new(10, Duration::from_secs(60)),
        );
        mgr.put_embedding("AI Policy", vec![0.1, 0.2]);
        assert_eq!(mgr.get_embedding("  ai   policy "), Some(vec![0.1, 0.2]));
        assert_eq!(mgr.stats().embedding.hits, 1);
        assert_eq!(mgr.stats().response, CacheStats::default());
    }

    #[test]
    fn test_disabled_tier_never_hits() {
        let mgr = CacheManager::new(&CacheConfig::disabled(), &CacheConfig::disabled());
        mgr.put_embedding("q", vec![1.0]);
        assert_eq!(mgr.get_embedding("q"), None);
        assert_eq!(mgr.stats(), CacheManagerStats::default());
    }

    #[test]
    fn test_invalidate_responses() {
        let mgr = CacheManager::new(
            &CacheConfig::new(10, Duration::from_secs(60)),
            &CacheConfig::new(10, Duration::from_secs(60)),
        );
        let key = mgr.keys().response_key("search", "q", 5, false, None);
        mgr.put_response(key.clone(), Arc::from(Vec::new()));
        assert!(mgr.get_response(&key).is_some());
        mgr.invalidate_responses();
        assert!(mgr.get_response(&key).is_none());
    }
}
