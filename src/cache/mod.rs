//! Result caching: a generic LRU+TTL store specialized into two tiers.
//!
//! # Caching Module
//!
//! Retrieval is dominated by two slow steps: computing the query embedding and
//! running the search itself. Each gets its own cache tier so a repeated query
//! can skip one or both.
//!
//! ## Key Components
//!
//! | Component | Description |
//! |-----------|-------------|
//! | [`TtlLruCache`] | Generic capacity- and TTL-bounded LRU store with hit/miss stats |
//! | [`CacheManager`] | Embedding tier + response tier, owned by the service |
//! | [`CacheKeyGenerator`] | Query normalization and composite response keys |
//! | [`CacheStats`] | Monotonic hit/miss/eviction counters |
//!
//! ## Example
//!
//! ```rust
//! use rag_retrieval::cache::TtlLruCache;
//! use std::time::Duration;
//!
//! let cache = TtlLruCache::new(2, Duration::from_secs(60));
//! cache.set("a", vec![0.1_f32, 0.2]);
//! cache.set("b", vec![0.3_f32]);
//! cache.get("a");                 // "a" is now most recently used
//! cache.set("c", vec![0.4_f32]);  // evicts "b"
//! assert!(cache.get("b").is_none());
//! assert_eq!(cache.stats().hits, 1);
//! ```

mod backend;
mod key;
mod manager;

pub use backend::TtlLruCache;
pub use key::{normalize_query, CacheKeyGenerator};
pub use manager::{CacheManager, CacheManagerStats, CacheStats, EmbeddingCache, ResponseCache};
