//! Cache key generation.

use sha2::{Digest, Sha256};
use std::collections::BTreeMap;

/// Normalize query text for cache lookups: trim, lowercase, collapse whitespace.
pub fn normalize_query(query: &str) -> String {
    query
        .split_whitespace()
        .map(|w| w.to_lowercase())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Builds response-cache keys from the full set of parameters that affect a
/// result list, so differently-parameterized queries never share an entry.
pub struct CacheKeyGenerator;

impl CacheKeyGenerator {
    pub fn new() -> Self {
        Self
    }

    /// Key for the embedding tier: the normalized query itself.
    pub fn embedding_key(&self, query: &str) -> String {
        normalize_query(query)
    }

    /// Key for the response tier.
    pub fn response_key(
        &self,
        operation: &str,
        query: &str,
        top_k: usize,
        use_reranking: bool,
        vector_weight: Option<f32>,
    ) -> String {
        let mut parts: BTreeMap<&str, String> = BTreeMap::new();
        parts.insert("op", operation.to_string());
        parts.insert("query", normalize_query(query));
        parts.insert("top_k", top_k.to_string());
        parts.insert("rerank", use_reranking.to_string());
        if let Some(w) = vector_weight {
            parts.insert("vector_weight", format!("{:.3}", w));
        }
        let canonical = serde_json::to_string(&parts).unwrap_or_default();
        let mut hasher = Sha256::new();
        hasher.update(canonical.as_bytes());
        hasher
            .finalize()
            .iter()
            .map(|b| format!("{:02x}", b))
            .collect()
    }
}

impl Default for CacheKeyGenerator {
    fn default() -> Self {
        Self::new()
    }
}
