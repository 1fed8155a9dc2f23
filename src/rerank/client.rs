//! Cross-encoder reranker backed by a Cohere-compatible `/rerank` endpoint.

use super::reranker::Reranker;
use super::types::RerankCandidate;
use crate::config::RerankConfig;
use crate::{Error, ErrorContext, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

#[derive(Serialize)]
struct RerankRequest<'a> {
    model: &'a str,
    query: &'a str,
    documents: Vec<&'a str>,
    top_n: usize,
}

#[derive(Deserialize)]
struct RerankResponse {
    results: Vec<RerankHit>,
}

#[derive(Deserialize)]
struct RerankHit {
    index: usize,
    relevance_score: f32,
}

pub struct CrossEncoderReranker {
    http_client: reqwest::Client,
    model: String,
    base_url: String,
    endpoint_path: String,
    api_key: Option<String>,
}

impl CrossEncoderReranker {
    pub fn builder() -> CrossEncoderRerankerBuilder {
        CrossEncoderRerankerBuilder::new()
    }

    /// Build from the `rerank` configuration section; the API key is read
    /// from the variable named by `api_key_env`.
    pub fn from_config(cfg: &RerankConfig) -> Result<Self> {
        let mut builder = Self::builder().timeout_secs(cfg.timeout_secs);
        if let Some(model) = &cfg.model {
            builder = builder.model(model);
        }
        if let Some(url) = &cfg.base_url {
            builder = builder.base_url(url);
        }
        if let Ok(key) = std::env::var(&cfg.api_key_env) {
            builder = builder.api_key(key);
        }
        builder.build()
    }

    pub fn model(&self) -> &str {
        &self.model
    }
}

#[async_trait]
impl Reranker for CrossEncoderReranker {
    fn name(&self) -> &'static str {
        "cross_encoder"
    }

    async fn score(&self, query: &str, candidates: &[RerankCandidate]) -> Result<Vec<f32>> {
        if candidates.is_empty() {
            return Ok(Vec::new());
        }
        let endpoint = format!("{}{}", self.base_url, self.endpoint_path);
        let body = RerankRequest {
            model: &self.model,
            query,
            documents: candidates.iter().map(|c| c.content.as_str()).collect(),
            top_n: candidates.len(),
        };
        let mut req = self
            .http_client
            .post(&endpoint)
            .header("Content-Type", "application/json")
            .json(&body);
        if let Some(key) = &self.api_key {
            req = req.bearer_auth(key);
        }
        let response = req.send().await.map_err(|e| {
            Error::network_with_context(
                format!("Rerank request failed: {}", e),
                ErrorContext::new().with_source("rerank"),
            )
        })?;
        let status = response.status();
        let body_str = response.text().await.map_err(|e| {
            Error::network_with_context(
                format!("Failed to read Rerank response: {}", e),
                ErrorContext::new().with_source("rerank"),
            )
        })?;
        if !status.is_success() {
            return Err(Error::Api {
                status: status.as_u16(),
                message: format!("Rerank API error: {}", body_str),
            });
        }
        let parsed: RerankResponse = serde_json::from_str(&body_str).map_err(|e| {
            Error::rerank_with_context(
                "Invalid rerank response",
                ErrorContext::new()
                    .with_details(e.to_string())
                    .with_source("rerank"),
            )
        })?;
        // Candidates the provider leaves out score 0.
        let mut scores = vec![0.0f32; candidates.len()];
        for hit in parsed.results {
            let slot = scores.get_mut(hit.index).ok_or_else(|| {
                Error::rerank_with_context(
                    "Invalid rerank response: index out of range",
                    ErrorContext::new()
                        .with_details(format!("index {} of {}", hit.index, candidates.len()))
                        .with_source("rerank"),
                )
            })?;
            *slot = hit.relevance_score;
        }
        Ok(scores)
    }
}

pub struct CrossEncoderRerankerBuilder {
    model: Option<String>,
    api_key: Option<String>,
    base_url: Option<String>,
    endpoint_path: Option<String>,
    timeout_secs: u64,
}

impl CrossEncoderRerankerBuilder {
    pub fn new() -> Self {
        Self {
            model: None,
            api_key: None,
            base_url: None,
            endpoint_path: None,
            timeout_secs: 30,
        }
    }
    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }
    pub fn api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = Some(url.into());
        self
    }
    pub fn endpoint_path(mut self, path: impl Into<String>) -> Self {
        self.endpoint_path = Some(path.into());
        self
    }
    pub fn timeout_secs(mut self, secs: u64) -> Self {
        self.timeout_secs = secs;
        self
    }

    pub fn build(self) -> Result<CrossEncoderReranker> {
        let model = self
            .model
            .ok_or_else(|| Error::configuration("Model must be specified"))?;
        let base_url = self
            .base_url
            .unwrap_or_else(|| "https://api.cohere.com/v2".to_string());
        url::Url::parse(&base_url).map_err(|e| {
            Error::configuration_with_context(
                "invalid rerank base URL",
                ErrorContext::new()
                    .with_field_path("rerank.base_url")
                    .with_details(e.to_string()),
            )
        })?;
        let endpoint_path = self
            .endpoint_path
            .unwrap_or_else(|| "/rerank".to_string());
        let endpoint_path = if endpoint_path.starts_with('/') {
            endpoint_path
        } else {
            format!("/{}", endpoint_path)
        };
        let http_client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(self.timeout_secs))
            .build()
            .map_err(|e| Error::configuration(format!("Failed to create HTTP client: {}", e)))?;
        Ok(CrossEncoderReranker {
            http_client,
            model,
            base_url: base_url.trim_end_matches('/').to_string(),
            endpoint_path,
            api_key: self.api_key,
        })
    }
}

impl Default for CrossEncoderRerankerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_normalizes_endpoint() {
        let r = CrossEncoderReranker::builder()
            .model("rerank-v3.5")
            .base_url("http://localhost:8080/")
            .endpoint_path("v1/rerank")
            .build()
            .unwrap();
        assert_eq!(r.base_url, "http://localhost:8080");
        assert_eq!(r.endpoint_path, "/v1/rerank");
        assert!(r.api_key.is_none());
    }

    #[test]
    fn test_from_config_requires_model() {
        let cfg = RerankConfig::default();
        assert!(CrossEncoderReranker::from_config(&cfg).is_err());
    }
}
