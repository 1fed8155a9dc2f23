//! Embedding model boundary and the cache-fronted embedder.

use super::vectors::Vector;
use crate::cache::CacheManager;
use crate::{Error, ErrorContext, Result};
use async_trait::async_trait;
use std::sync::Arc;
use tracing::debug;

/// External text embedding model. May be slow; results are cached by
/// [`CachedEmbedder`].
#[async_trait]
pub trait EmbeddingModel: Send + Sync {
    async fn embed(&self, text: &str) -> Result<Vector>;

    /// Fixed length of every vector this model returns.
    fn dimensions(&self) -> usize;

    fn name(&self) -> &str;
}

/// Looks up the embedding tier first and only calls the model on a miss.
/// The model call happens outside any cache lock.
pub struct CachedEmbedder {
    model: Arc<dyn EmbeddingModel>,
    caches: Arc<CacheManager>,
}

impl CachedEmbedder {
    pub fn new(model: Arc<dyn EmbeddingModel>, caches: Arc<CacheManager>) -> Self {
        Self { model, caches }
    }

    pub fn model(&self) -> &Arc<dyn EmbeddingModel> {
        &self.model
    }

    pub async fn embed(&self, query: &str) -> Result<Vector> {
        if let Some(v) = self.caches.get_embedding(query) {
            debug!("embedding cache hit");
            return Ok(v);
        }
        let vector = self.model.embed(query).await?;
        if vector.len() != self.model.dimensions() {
            return Err(Error::embedding_with_context(
                "embedding has unexpected length",
                ErrorContext::new()
                    .with_details(format!(
                        "expected {}, got {}",
                        self.model.dimensions(),
                        vector.len()
                    ))
                    .with_source(self.model.name().to_string()),
            ));
        }
        self.caches.put_embedding(query, vector.clone());
        Ok(vector)
    }
}
