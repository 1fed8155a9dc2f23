//! HTTP embedding model for OpenAI-compatible endpoints.

use super::model::EmbeddingModel;
use super::types::{EmbeddingRequest, EmbeddingResponse};
use super::vectors::Vector;
use crate::{Error, ErrorContext, Result};
use async_trait::async_trait;
use tracing::debug;

pub struct HttpEmbeddingModel {
    http_client: reqwest::Client,
    model: String,
    base_url: String,
    api_key: Option<String>,
    dimensions: usize,
    send_dimensions: bool,
}

impl HttpEmbeddingModel {
    pub fn builder() -> HttpEmbeddingModelBuilder {
        HttpEmbeddingModelBuilder::new()
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    async fn execute(&self, request: EmbeddingRequest) -> Result<EmbeddingResponse> {
        let endpoint = format!("{}/v1/embeddings", self.base_url);
        let mut req = self
            .http_client
            .post(&endpoint)
            .header("Content-Type", "application/json")
            .json(&request);
        if let Some(key) = &self.api_key {
            req = req.bearer_auth(key);
        }
        let response = req.send().await.map_err(|e| {
            Error::network_with_context(
                format!("Embedding request failed: {}", e),
                ErrorContext::new().with_source("embeddings"),
            )
        })?;
        let status = response.status();
        let body = response.text().await.map_err(|e| {
            Error::network_with_context(
                format!("Failed to read response: {}", e),
                ErrorContext::new().with_source("embeddings"),
            )
        })?;
        if !status.is_success() {
            return Err(Error::Api {
                status: status.as_u16(),
                message: format!("Embedding API error: {}", body),
            });
        }
        serde_json::from_str(&body).map_err(|e| {
            Error::embedding_with_context(
                "malformed embedding response",
                ErrorContext::new()
                    .with_details(e.to_string())
                    .with_source("embeddings"),
            )
        })
    }
}

#[async_trait]
impl EmbeddingModel for HttpEmbeddingModel {
    async fn embed(&self, text: &str) -> Result<Vector> {
        let mut request = EmbeddingRequest::new(&self.model, text);
        if self.send_dimensions {
            request = request.with_dimensions(self.dimensions);
        }
        let response = self.execute(request).await?;
        if let Some(usage) = &response.usage {
            debug!(tokens = usage.total_tokens, model = %self.model, "embedding usage");
        }
        response.into_first().ok_or_else(|| {
            Error::embedding_with_context(
                "embedding response contained no vectors",
                ErrorContext::new().with_source("embeddings"),
            )
        })
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }

    fn name(&self) -> &str {
        &self.model
    }
}

pub struct HttpEmbeddingModelBuilder {
    model: Option<String>,
    api_key: Option<String>,
    base_url: Option<String>,
    dimensions: Option<usize>,
    send_dimensions: bool,
    timeout_secs: u64,
}

impl HttpEmbeddingModelBuilder {
    pub fn new() -> Self {
        Self {
            model: None,
            api_key: None,
            base_url: None,
            dimensions: None,
            send_dimensions: false,
            timeout_secs: 60,
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
    /// Expected vector length. Required.
    pub fn dimensions(mut self, dimensions: usize) -> Self {
        self.dimensions = Some(dimensions);
        self
    }
    /// Ask the provider to shorten vectors to `dimensions` (models that support it).
    pub fn request_dimensions(mut self, yes: bool) -> Self {
        self.send_dimensions = yes;
        self
    }
    pub fn timeout_secs(mut self, secs: u64) -> Self {
        self.timeout_secs = secs;
        self
    }

    pub fn build(self) -> Result<HttpEmbeddingModel> {
        let model = self
            .model
            .ok_or_else(|| Error::configuration("Model must be specified"))?;
        let dimensions = self
            .dimensions
            .filter(|d| *d > 0)
            .ok_or_else(|| Error::configuration("Embedding dimensions must be specified"))?;
        // Local servers (Ollama, vLLM) usually run without a key.
        let api_key = self
            .api_key
            .or_else(|| std::env::var("OPENAI_API_KEY").ok());
        let base_url = self
            .base_url
            .unwrap_or_else(|| "https://api.openai.com".to_string());
        url::Url::parse(&base_url).map_err(|e| {
            Error::configuration_with_context(
                "invalid embedding base URL",
                ErrorContext::new()
                    .with_field_path("base_url")
                    .with_details(e.to_string()),
            )
        })?;
        let http_client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(self.timeout_secs))
            .build()
            .map_err(|e| Error::configuration(format!("Failed to create HTTP client: {}", e)))?;
        Ok(HttpEmbeddingModel {
            http_client,
            model,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
            dimensions,
            send_dimensions: self.send_dimensions,
        })
    }
}

impl Default for HttpEmbeddingModelBuilder {
    fn default() -> Self {
        Self::new()
    }
}
