//! Service configuration.
//!
//! Configuration is plain serde data with a default for every field, so a
//! partial YAML/JSON document is enough. Layering order is: defaults, file,
//! `RAG_*` environment overrides, then [`RetrievalConfig::validate`].
//!
//! ```rust
//! use rag_retrieval::config::RetrievalConfig;
//!
//! let cfg = RetrievalConfig::from_yaml_str("hybrid:\n  default_vector_weight: 0.7\n").unwrap();
//! assert_eq!(cfg.hybrid.default_vector_weight, 0.7);
//! assert_eq!(cfg.bm25.k1, 1.2);
//! ```

use crate::hybrid::ScoreNormalization;
use crate::rerank::RerankerKind;
use crate::{Error, ErrorContext, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// One cache tier.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    pub enabled: bool,
    pub capacity: usize,
    pub ttl_secs: u64,
}

impl CacheConfig {
    pub fn new(capacity: usize, ttl: Duration) -> Self {
        Self {
            enabled: true,
            capacity,
            ttl_secs: ttl.as_secs(),
        }
    }

    pub fn disabled() -> Self {
        Self {
            enabled: false,
            ..Self::default()
        }
    }

    pub fn ttl(&self) -> Duration {
        Duration::from_secs(self.ttl_secs)
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            capacity: 1000,
            ttl_secs: 3600,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BreakerConfig {
    pub failure_threshold: u32,
    pub cooldown_secs: u64,
}

impl Default for BreakerConfig {
    fn default() -> Self {
        Self {
            failure_threshold: 5,
            cooldown_secs: 30,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Bm25Config {
    /// Term-frequency saturation.
    pub k1: f32,
    /// Length-normalization strength, 0..=1.
    pub b: f32,
}

impl Default for Bm25Config {
    fn default() -> Self {
        Self { k1: 1.2, b: 0.75 }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HybridConfig {
    pub default_vector_weight: f32,
    /// Explicit lexical weight; `None` means `1 - vector_weight`.
    pub lexical_weight_override: Option<f32>,
    /// Each score family is fetched with `top_k * candidate_multiplier` candidates.
    pub candidate_multiplier: usize,
    pub vector_normalization: ScoreNormalization,
    pub lexical_normalization: ScoreNormalization,
}

impl Default for HybridConfig {
    fn default() -> Self {
        Self {
            default_vector_weight: 0.5,
            lexical_weight_override: None,
            candidate_multiplier: 3,
            vector_normalization: ScoreNormalization::Bounded,
            lexical_normalization: ScoreNormalization::MaxScaled,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RerankConfig {
    pub kind: RerankerKind,
    /// Candidates handed to the reranker = `top_k * overfetch_factor`.
    pub overfetch_factor: usize,
    /// Blend of the first-pass score into the heuristic score, 0..=1.
    pub original_weight: f32,
    pub base_url: Option<String>,
    pub model: Option<String>,
    pub api_key_env: String,
    pub timeout_secs: u64,
}

impl Default for RerankConfig {
    fn default() -> Self {
        Self {
            kind: RerankerKind::Heuristic,
            overfetch_factor: 2,
            original_weight: 0.0,
            base_url: None,
            model: None,
            api_key_env: "COHERE_API_KEY".to_string(),
            timeout_secs: 30,
        }
    }
}

/// Top-level configuration of a [`crate::service::RetrievalService`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetrievalConfig {
    pub embedding_cache: CacheConfig,
    pub response_cache: CacheConfig,
    pub circuit_breaker: BreakerConfig,
    pub bm25: Bm25Config,
    pub hybrid: HybridConfig,
    pub rerank: RerankConfig,
    /// Returned document content is truncated to this many characters.
    pub content_max_chars: usize,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            embedding_cache: CacheConfig::default(),
            response_cache: CacheConfig {
                enabled: true,
                capacity: 500,
                ttl_secs: 300,
            },
            circuit_breaker: BreakerConfig::default(),
            bm25: Bm25Config::default(),
            hybrid: HybridConfig::default(),
            rerank: RerankConfig::default(),
            content_max_chars: 1000,
        }
    }
}

impl RetrievalConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_yaml_str(s: &str) -> Result<Self> {
        Ok(serde_yaml::from_str(s)?)
    }

    pub fn from_json_str(s: &str) -> Result<Self> {
        Ok(serde_json::from_str(s)?)
    }

    /// Load from a `.yaml`/`.yml` or `.json` file, apply env overrides and validate.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)?;
        let cfg = match path.extension().and_then(|e| e.to_str()) {
            Some("json") => Self::from_json_str(&raw)?,
            Some("yaml") | Some("yml") => Self::from_yaml_str(&raw)?,
            other => {
                return Err(Error::configuration_with_context(
                    "unsupported configuration file extension",
                    ErrorContext::new()
                        .with_field_path(path.display().to_string())
                        .with_details(format!("extension: {:?}", other)),
                ))
            }
        };
        let cfg = cfg.apply_env_overrides();
        cfg.validate()?;
        Ok(cfg)
    }

    /// Apply `RAG_*` environment overrides. Unparseable values are ignored.
    pub fn apply_env_overrides(mut self) -> Self {
        if let Some(v) = env_parse::<usize>("RAG_EMBEDDING_CACHE_CAPACITY") {
            self.embedding_cache.capacity = v;
        }
        if let Some(v) = env_parse::<u64>("RAG_EMBEDDING_CACHE_TTL_SECS") {
            self.embedding_cache.ttl_secs = v;
        }
        if let Some(v) = env_parse::<usize>("RAG_RESPONSE_CACHE_CAPACITY") {
            self.response_cache.capacity = v;
        }
        if let Some(v) = env_parse::<u64>("RAG_RESPONSE_CACHE_TTL_SECS") {
            self.response_cache.ttl_secs = v;
        }
        if let Some(v) = env_parse::<u32>("RAG_BREAKER_FAILURE_THRESHOLD") {
            self.circuit_breaker.failure_threshold = v;
        }
        if let Some(v) = env_parse::<u64>("RAG_BREAKER_COOLDOWN_SECS") {
            self.circuit_breaker.cooldown_secs = v;
        }
        if let Some(v) = env_parse::<f32>("RAG_VECTOR_WEIGHT") {
            self.hybrid.default_vector_weight = v;
        }
        self
    }

    pub fn validate(&self) -> Result<()> {
        for (name, cache) in [
            ("embedding_cache", &self.embedding_cache),
            ("response_cache", &self.response_cache),
        ] {
            if cache.enabled && cache.capacity == 0 {
                return Err(invalid(format!("{}.capacity", name), "must be at least 1"));
            }
        }
        if self.circuit_breaker.failure_threshold == 0 {
            return Err(invalid(
                "circuit_breaker.failure_threshold",
                "must be at least 1",
            ));
        }
        if !(self.bm25.k1.is_finite() && self.bm25.k1 >= 0.0) {
            return Err(invalid("bm25.k1", "must be a non-negative number"));
        }
        if !(0.0..=1.0).contains(&self.bm25.b) {
            return Err(invalid("bm25.b", "must be within [0, 1]"));
        }
        if !(0.0..=1.0).contains(&self.hybrid.default_vector_weight) {
            return Err(invalid(
                "hybrid.default_vector_weight",
                "must be within [0, 1]",
            ));
        }
        if let Some(w) = self.hybrid.lexical_weight_override {
            if !(0.0..=1.0).contains(&w) {
                return Err(invalid(
                    "hybrid.lexical_weight_override",
                    "must be within [0, 1]",
                ));
            }
        }
        if self.hybrid.candidate_multiplier == 0 {
            return Err(invalid("hybrid.candidate_multiplier", "must be at least 1"));
        }
        if self.rerank.overfetch_factor == 0 {
            return Err(invalid("rerank.overfetch_factor", "must be at least 1"));
        }
        if !(0.0..=1.0).contains(&self.rerank.original_weight) {
            return Err(invalid("rerank.original_weight", "must be within [0, 1]"));
        }
        if self.rerank.kind == RerankerKind::CrossEncoder {
            let base = self.rerank.base_url.as_deref().ok_or_else(|| {
                invalid("rerank.base_url", "required for the cross-encoder reranker")
            })?;
            url::Url::parse(base)
                .map_err(|e| invalid("rerank.base_url", format!("invalid URL: {}", e)))?;
            if self.rerank.model.is_none() {
                return Err(invalid(
                    "rerank.model",
                    "required for the cross-encoder reranker",
                ));
            }
        }
        if self.content_max_chars == 0 {
            return Err(invalid("content_max_chars", "must be at least 1"));
        }
        Ok(())
    }
}

fn env_parse<T: std::str::FromStr>(key: &str) -> Option<T> {
    std::env::var(key).ok().and_then(|s| s.trim().parse::<T>().ok())
}

fn invalid(field: impl Into<String>, details: impl Into<String>) -> Error {
    Error::configuration_with_context(
        "invalid retrieval configuration",
        ErrorContext::new()
            .with_field_path(field)
            .with_details(details)
            .with_source("config"),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let cfg = RetrievalConfig::default();
        assert!(cfg.validate().is_ok());
        assert_eq!(cfg.embedding_cache.capacity, 1000);
        assert_eq!(cfg.response_cache.ttl(), Duration::from_secs(300));
        assert_eq!(cfg.circuit_breaker.failure_threshold, 5);
        assert_eq!(cfg.content_max_chars, 1000);
    }

    #[test]
    fn test_partial_yaml_keeps_defaults() {
        let yaml = r#"
circuit_breaker:
  failure_threshold: 3
rerank:
  kind: none
"#;
        let cfg = RetrievalConfig::from_yaml_str(yaml).unwrap();
        assert_eq!(cfg.circuit_breaker.failure_threshold, 3);
        assert_eq!(cfg.circuit_breaker.cooldown_secs, 30);
        assert_eq!(cfg.rerank.kind, RerankerKind::None);
        assert_eq!(cfg.hybrid.lexical_normalization, ScoreNormalization::MaxScaled);
    }

    #[test]
    fn test_json_config() {
        let cfg = RetrievalConfig::from_json_str(
            r#"{"hybrid": {"vector_normalization": "min_max"}, "bm25": {"b": 0.5}}"#,
        )
        .unwrap();
        assert_eq!(cfg.hybrid.vector_normalization, ScoreNormalization::MinMax);
        assert_eq!(cfg.bm25.b, 0.5);
    }

    #[test]
    fn test_validation_rejects_bad_values() {
        let mut cfg = RetrievalConfig::default();
        cfg.hybrid.default_vector_weight = 1.5;
        let err = cfg.validate().unwrap_err();
        assert_eq!(
            err.context().and_then(|c| c.field_path.clone()).as_deref(),
            Some("hybrid.default_vector_weight")
        );

        let mut cfg = RetrievalConfig::default();
        cfg.response_cache.capacity = 0;
        assert!(cfg.validate().is_err());

        // A disabled tier may have zero capacity
        cfg.response_cache.enabled = false;
        assert!(cfg.validate().is_ok());

        let mut cfg = RetrievalConfig::default();
        cfg.circuit_breaker.failure_threshold = 0;
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn test_cross_encoder_requires_endpoint() {
        let mut cfg = RetrievalConfig::default();
        cfg.rerank.kind = RerankerKind::CrossEncoder;
        assert!(cfg.validate().is_err());
        cfg.rerank.base_url = Some("not a url".into());
        cfg.rerank.model = Some("rerank-v3.5".into());
        assert!(cfg.validate().is_err());
        cfg.rerank.base_url = Some("https://api.cohere.com/v2".into());
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn test_env_overrides() {
        std::env::set_var("RAG_BREAKER_COOLDOWN_SECS", "7");
        std::env::set_var("RAG_VECTOR_WEIGHT", "not-a-number");
        let cfg = RetrievalConfig::default().apply_env_overrides();
        std::env::remove_var("RAG_BREAKER_COOLDOWN_SECS");
        std::env::remove_var("RAG_VECTOR_WEIGHT");
        assert_eq!(cfg.circuit_breaker.cooldown_secs, 7);
        assert_eq!(cfg.hybrid.default_vector_weight, 0.5);
    }
}
