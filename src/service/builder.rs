use super::retrieval::RetrievalService;
use crate::cache::CacheManager;
use crate::config::RetrievalConfig;
use crate::embeddings::{CachedEmbedder, EmbeddingModel};
use crate::hybrid::HybridSearcher;
use crate::lexical::{Bm25Params, LexicalIndex};
use crate::rerank::{self, Reranker};
use crate::resilience::{CircuitBreaker, CircuitBreakerConfig};
use crate::store::{DocumentStore, VectorIndex};
use crate::telemetry::{CallRecorder, NoopRecorder, QueryMetrics};
use crate::{Error, Result};
use std::sync::Arc;
use tracing::info;

/// Builder for [`RetrievalService`].
///
/// The embedding model, vector index and document store are required.
/// Everything else comes from [`RetrievalConfig`].
pub struct RetrievalServiceBuilder {
    config: RetrievalConfig,
    embedding_model: Option<Arc<dyn EmbeddingModel>>,
    vector_index: Option<Arc<dyn VectorIndex>>,
    document_store: Option<Arc<dyn DocumentStore>>,
    reranker: Option<Arc<dyn Reranker>>,
    recorder: Arc<dyn CallRecorder>,
}

impl RetrievalServiceBuilder {
    pub fn new() -> Self {
        Self {
            config: RetrievalConfig::default(),
            embedding_model: None,
            vector_index: None,
            document_store: None,
            reranker: None,
            recorder: Arc::new(NoopRecorder),
        }
    }

    pub fn config(mut self, config: RetrievalConfig) -> Self {
        self.config = config;
        self
    }

    pub fn embedding_model(mut self, model: Arc<dyn EmbeddingModel>) -> Self {
        self.embedding_model = Some(model);
        self
    }

    pub fn vector_index(mut self, index: Arc<dyn VectorIndex>) -> Self {
        self.vector_index = Some(index);
        self
    }

    pub fn document_store(mut self, store: Arc<dyn DocumentStore>) -> Self {
        self.document_store = Some(store);
        self
    }

    /// Use this reranker instead of the one `config.rerank.kind` selects.
    pub fn reranker(mut self, reranker: Arc<dyn Reranker>) -> Self {
        self.reranker = Some(reranker);
        self
    }

    /// Inject a call recorder. Default is a no-op recorder.
    pub fn call_recorder(mut self, recorder: Arc<dyn CallRecorder>) -> Self {
        self.recorder = recorder;
        self
    }

    /// Validate the configuration, build the lexical index from the document
    /// store and assemble the service.
    pub async fn build(self) -> Result<RetrievalService> {
        let config = self.config;
        config.validate()?;
        let model = self
            .embedding_model
            .ok_or_else(|| Error::configuration("Embedding model must be specified"))?;
        let vectors = self
            .vector_index
            .ok_or_else(|| Error::configuration("Vector index must be specified"))?;
        let documents = self
            .document_store
            .ok_or_else(|| Error::configuration("Document store must be specified"))?;
        let reranker = match self.reranker {
            Some(r) if config.rerank.kind != rerank::RerankerKind::None => Some(r),
            Some(_) => None,
            None => rerank::from_config(&config.rerank)?,
        };

        let caches = Arc::new(CacheManager::new(
            &config.embedding_cache,
            &config.response_cache,
        ));
        let params = Bm25Params::from(&config.bm25);
        let corpus = documents.list().await?;
        let lexical = Arc::new(LexicalIndex::with_documents(&corpus, params));
        let hybrid = HybridSearcher::new(
            vectors.clone(),
            lexical.clone(),
            config.hybrid.candidate_multiplier,
        );
        let breaker = CircuitBreaker::new(CircuitBreakerConfig::from(&config.circuit_breaker));

        info!(
            documents = corpus.len(),
            embedding_model = model.name(),
            reranker = reranker.as_ref().map(|r| r.name()).unwrap_or("none"),
            "retrieval service ready"
        );

        Ok(RetrievalService {
            embedder: CachedEmbedder::new(model, caches.clone()),
            vectors,
            documents,
            lexical,
            hybrid,
            caches,
            breaker,
            reranker,
            recorder: self.recorder,
            metrics: QueryMetrics::new(),
            config,
        })
    }
}

impl Default for RetrievalServiceBuilder {
    fn default() -> Self {
        Self::new()
    }
}
