use super::builder::RetrievalServiceBuilder;
use super::types::{IndexCounts, RetrievalStats, RetrievedDocument, SearchResponse, SourceInfo};
use crate::cache::CacheManager;
use crate::config::RetrievalConfig;
use crate::embeddings::CachedEmbedder;
use crate::error_code::OutcomeCode;
use crate::hybrid::{FusionParams, HybridSearcher};
use crate::lexical::LexicalIndex;
use crate::rerank::{RerankCandidate, Reranker};
use crate::resilience::CircuitBreaker;
use crate::store::{DocId, Document, DocumentStore, VectorIndex};
use crate::telemetry::{CallOutcome, CallRecord, CallRecorder, QueryMetrics};
use crate::{Error, ErrorContext, Result};
use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, info_span, warn, Instrument};
use uuid::Uuid;

/// Largest accepted `top_k`.
pub const MAX_TOP_K: usize = 100;

/// A document scored by the first pass, before reranking and truncation.
struct Scored {
    doc: Document,
    similarity: f32,
    vector_score: f32,
    bm25_score: f32,
    hybrid_score: f32,
}

impl Scored {
    fn first_pass_score(&self) -> f32 {
        self.hybrid_score
    }
}

/// Resilient retrieval over an external vector index and document store.
///
/// Owns the two cache tiers, the circuit breaker guarding the external
/// retrieval stage, the lexical index, the reranker and query metrics.
/// Share it as `Arc<RetrievalService>`; all operations take `&self`.
pub struct RetrievalService {
    pub(super) config: RetrievalConfig,
    pub(super) embedder: CachedEmbedder,
    pub(super) vectors: Arc<dyn VectorIndex>,
    pub(super) documents: Arc<dyn DocumentStore>,
    pub(super) lexical: Arc<LexicalIndex>,
    pub(super) hybrid: HybridSearcher,
    pub(super) caches: Arc<CacheManager>,
    pub(super) breaker: CircuitBreaker,
    pub(super) reranker: Option<Arc<dyn Reranker>>,
    pub(super) recorder: Arc<dyn CallRecorder>,
    pub(super) metrics: QueryMetrics,
}

impl RetrievalService {
    pub fn builder() -> RetrievalServiceBuilder {
        RetrievalServiceBuilder::new()
    }

    pub fn config(&self) -> &RetrievalConfig {
        &self.config
    }

    pub fn circuit_breaker(&self) -> &CircuitBreaker {
        &self.breaker
    }

    pub fn lexical_index(&self) -> &Arc<LexicalIndex> {
        &self.lexical
    }

    pub fn reranker_name(&self) -> Option<&'static str> {
        self.reranker.as_ref().map(|r| r.name())
    }

    /// Vector similarity search, optionally reranked.
    pub async fn search_documents(
        &self,
        query: &str,
        top_k: usize,
        use_reranking: bool,
    ) -> Result<SearchResponse> {
        let span = info_span!("search_documents", query_id = %Uuid::new_v4(), top_k, use_reranking);
        self.observe(
            "search_documents",
            top_k,
            self.search_documents_inner(query, top_k, use_reranking),
        )
        .instrument(span)
        .await
    }

    /// Weighted fusion of vector similarity and BM25. `vector_weight`
    /// defaults to `hybrid.default_vector_weight`. Reranking applies when a
    /// reranker is configured.
    pub async fn search_hybrid(
        &self,
        query: &str,
        top_k: usize,
        vector_weight: Option<f32>,
    ) -> Result<SearchResponse> {
        let span = info_span!("search_hybrid", query_id = %Uuid::new_v4(), top_k, vector_weight);
        self.observe(
            "search_hybrid",
            top_k,
            self.search_hybrid_inner(query, top_k, vector_weight),
        )
        .instrument(span)
        .await
    }

    /// Full, untruncated document by id.
    pub async fn get_document(&self, id: DocId) -> Result<Option<Document>> {
        let documents = &self.documents;
        self.guarded("get_document", move || async move { documents.fetch(id).await })
            .await
    }

    /// Every stored document's source, ordered by source name.
    pub async fn list_sources(&self) -> Result<Vec<SourceInfo>> {
        let documents = &self.documents;
        let corpus = self
            .guarded("list_sources", move || async move { documents.list().await })
            .await?;
        let mut sources: Vec<SourceInfo> = corpus
            .into_iter()
            .map(|d| SourceInfo {
                id: d.id,
                length: d.content.chars().count(),
                source: d.metadata.source,
                doc_type: d.metadata.doc_type,
            })
            .collect();
        sources.sort_by(|a, b| a.source.cmp(&b.source).then_with(|| a.id.cmp(&b.id)));
        Ok(sources)
    }

    pub async fn count_documents(&self) -> Result<IndexCounts> {
        let documents = &self.documents;
        let vectors = &self.vectors;
        let (docs, embeddings) = self
            .guarded("count_documents", move || async move {
                futures::future::try_join(documents.count(), vectors.len()).await
            })
            .await?;
        Ok(IndexCounts::new(docs, embeddings, self.lexical.len()))
    }

    /// Rebuild the BM25 index from the document store and drop every cached
    /// response. Returns the number of indexed documents.
    pub async fn refresh_lexical_index(&self) -> Result<usize> {
        let documents = &self.documents;
        let corpus = self
            .guarded("refresh_lexical_index", move || async move { documents.list().await })
            .await?;
        self.lexical.rebuild(&corpus);
        self.caches.invalidate_responses();
        Ok(self.lexical.len())
    }

    pub fn get_stats(&self) -> RetrievalStats {
        RetrievalStats {
            cache: self.caches.stats(),
            circuit: self.breaker.snapshot(),
            queries: self.metrics.summary(),
        }
    }

    async fn search_documents_inner(
        &self,
        query: &str,
        top_k: usize,
        use_reranking: bool,
    ) -> Result<SearchResponse> {
        validate_request(query, top_k)?;
        let rerank = use_reranking && self.reranker.is_some();
        let key = self
            .caches
            .keys()
            .response_key("search", query, top_k, rerank, None);
        if let Some(hit) = self.cached(&key) {
            return Ok(hit);
        }

        let embedding = self.embedder.embed(query).await?;
        let fetch_k = self.fetch_k(top_k, rerank);
        let vectors = &self.vectors;
        let documents = &self.documents;
        let embedding = &embedding;
        let (hits, docs) = self
            .guarded("vector_search", move || async move {
                let hits = vectors.search(embedding, fetch_k).await?;
                let ids: Vec<DocId> = hits.iter().map(|h| h.doc_id).collect();
                let docs = documents.fetch_many(&ids).await?;
                Ok((hits, docs))
            })
            .await?;

        let metric = self.vectors.metric();
        let mut by_id: HashMap<DocId, Document> = docs.into_iter().map(|d| (d.id, d)).collect();
        let scored: Vec<Scored> = hits
            .into_iter()
            .filter_map(|h| {
                let doc = by_id.remove(&h.doc_id)?;
                let sim = metric.similarity(h.distance);
                Some(Scored {
                    doc,
                    similarity: sim,
                    vector_score: sim,
                    bm25_score: 0.0,
                    hybrid_score: sim,
                })
            })
            .collect();
        self.finish(key, query, scored, top_k, rerank).await
    }

    async fn search_hybrid_inner(
        &self,
        query: &str,
        top_k: usize,
        vector_weight: Option<f32>,
    ) -> Result<SearchResponse> {
        validate_request(query, top_k)?;
        let rerank = self.reranker.is_some();
        let fetch_k = self.fetch_k(top_k, rerank);
        let params = FusionParams::from_config(&self.config.hybrid, vector_weight, fetch_k);
        params.validate()?;
        let key = self.caches.keys().response_key(
            "hybrid",
            query,
            top_k,
            rerank,
            Some(params.vector_weight),
        );
        if let Some(hit) = self.cached(&key) {
            return Ok(hit);
        }

        let embedding = self.embedder.embed(query).await?;
        let hybrid = &self.hybrid;
        let documents = &self.documents;
        let embedding = &embedding;
        let params = &params;
        let (fused, docs) = self
            .guarded("hybrid_search", move || async move {
                let fused = hybrid.search(query, embedding, params).await?;
                let ids: Vec<DocId> = fused.iter().map(|r| r.doc_id).collect();
                let docs = documents.fetch_many(&ids).await?;
                Ok((fused, docs))
            })
            .await?;

        let mut by_id: HashMap<DocId, Document> = docs.into_iter().map(|d| (d.id, d)).collect();
        let scored: Vec<Scored> = fused
            .into_iter()
            .filter_map(|r| {
                let doc = by_id.remove(&r.doc_id)?;
                Some(Scored {
                    doc,
                    similarity: r.vector_score,
                    vector_score: r.vector_score,
                    bm25_score: r.bm25_score,
                    hybrid_score: r.hybrid_score,
                })
            })
            .collect();
        self.finish(key, query, scored, top_k, rerank).await
    }

    /// Rerank (or truncate), shape the documents and fill the response cache.
    async fn finish(
        &self,
        key: String,
        query: &str,
        scored: Vec<Scored>,
        top_k: usize,
        rerank: bool,
    ) -> Result<SearchResponse> {
        let (ordered, degraded) = match self.reranker.as_ref().filter(|_| rerank) {
            Some(reranker) => self.rerank(reranker.as_ref(), query, scored, top_k).await,
            None => {
                let mut scored = scored;
                scored.truncate(top_k);
                (scored.into_iter().map(|s| (s, None)).collect(), false)
            }
        };

        let max_chars = self.config.content_max_chars;
        let documents: Vec<RetrievedDocument> = ordered
            .into_iter()
            .enumerate()
            .map(|(i, (s, rerank_score))| RetrievedDocument {
                doc_id: s.doc.id,
                content: truncate_chars(&s.doc.content, max_chars).to_string(),
                source: s.doc.metadata.source,
                doc_type: s.doc.metadata.doc_type,
                similarity: round3(s.similarity),
                vector_score: s.vector_score,
                bm25_score: s.bm25_score,
                hybrid_score: s.hybrid_score,
                rerank_score,
                rank: i + 1,
            })
            .collect();

        // A degraded ranking is not cached so the next query can try the
        // reranker again.
        if !degraded {
            self.caches
                .put_response(key, Arc::from(documents.as_slice()));
        }
        let outcome = if degraded {
            OutcomeCode::DegradedRanking
        } else if documents.is_empty() {
            OutcomeCode::NoResults
        } else {
            OutcomeCode::Ok
        };
        Ok(SearchResponse {
            documents,
            outcome,
            cached: false,
        })
    }

    async fn rerank(
        &self,
        reranker: &dyn Reranker,
        query: &str,
        scored: Vec<Scored>,
        top_k: usize,
    ) -> (Vec<(Scored, Option<f32>)>, bool) {
        let candidates: Vec<RerankCandidate> = scored
            .iter()
            .map(|s| RerankCandidate {
                doc_id: s.doc.id,
                content: s.doc.content.clone(),
                metadata: s.doc.metadata.clone(),
                original_score: s.first_pass_score(),
            })
            .collect();
        let started = Instant::now();
        let result = reranker.rerank(query, candidates, top_k).await;
        match result {
            Ok(results) => {
                self.recorder.record(CallRecord::new(
                    "rerank",
                    started.elapsed(),
                    CallOutcome::Success,
                ));
                let mut by_id: HashMap<DocId, Scored> =
                    scored.into_iter().map(|s| (s.doc.id, s)).collect();
                let ordered = results
                    .into_iter()
                    .filter_map(|r| by_id.remove(&r.doc_id).map(|s| (s, Some(r.rerank_score))))
                    .collect();
                (ordered, false)
            }
            Err(e) => {
                self.recorder.record(CallRecord::new(
                    "rerank",
                    started.elapsed(),
                    CallOutcome::Failure(e.kind().to_string()),
                ));
                warn!(reranker = reranker.name(), error = %e, "rerank failed, keeping first-pass order");
                let ordered = scored
                    .into_iter()
                    .take(top_k)
                    .map(|s| {
                        let original = s.first_pass_score();
                        (s, Some(original))
                    })
                    .collect();
                (ordered, true)
            }
        }
    }

    fn cached(&self, key: &str) -> Option<SearchResponse> {
        let documents = self.caches.get_response(key)?;
        debug!("response cache hit");
        let documents = documents.to_vec();
        let outcome = if documents.is_empty() {
            OutcomeCode::NoResults
        } else {
            OutcomeCode::Ok
        };
        Some(SearchResponse {
            documents,
            outcome,
            cached: true,
        })
    }

    fn fetch_k(&self, top_k: usize, rerank: bool) -> usize {
        if rerank {
            top_k
                .saturating_mul(self.config.rerank.overfetch_factor)
                .max(top_k)
        } else {
            top_k
        }
    }

    /// Run `op` through the circuit breaker and record its duration and outcome.
    async fn guarded<T, F, Fut>(&self, operation: &'static str, op: F) -> Result<T>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let started = Instant::now();
        let result = self.breaker.call(op).await;
        let outcome = match &result {
            Ok(_) => CallOutcome::Success,
            Err(Error::CircuitOpen { .. }) => CallOutcome::Rejected,
            Err(e) => CallOutcome::Failure(e.kind().to_string()),
        };
        self.recorder
            .record(CallRecord::new(operation, started.elapsed(), outcome));
        result
    }

    /// Query-level metrics and the completion log line.
    async fn observe<Fut>(&self, operation: &'static str, top_k: usize, fut: Fut) -> Result<SearchResponse>
    where
        Fut: Future<Output = Result<SearchResponse>>,
    {
        let started = Instant::now();
        let result = fut.await;
        let elapsed = started.elapsed();
        match &result {
            Ok(resp) => {
                self.metrics.record_query(elapsed);
                info!(
                    operation,
                    top_k,
                    results = resp.documents.len(),
                    duration_ms = elapsed.as_secs_f64() * 1000.0,
                    cached = resp.cached,
                    outcome = resp.outcome.name(),
                    "query completed"
                );
            }
            Err(e) => {
                self.metrics.record_error(e.kind());
                warn!(
                    operation,
                    error = e.kind(),
                    code = e.outcome_code().code(),
                    duration_ms = elapsed.as_secs_f64() * 1000.0,
                    "query failed"
                );
            }
        }
        result
    }
}

fn validate_request(query: &str, top_k: usize) -> Result<()> {
    if query.trim().is_empty() {
        return Err(Error::validation_with_context(
            "query must not be empty",
            ErrorContext::new().with_field_path("query"),
        ));
    }
    if top_k == 0 || top_k > MAX_TOP_K {
        return Err(Error::validation_with_context(
            format!("top_k must be within 1..={}", MAX_TOP_K),
            ErrorContext::new()
                .with_field_path("top_k")
                .with_details(format!("got {}", top_k)),
        ));
    }
    Ok(())
}

fn round3(x: f32) -> f32 {
    (x * 1000.0).round() / 1000.0
}

/// At most `max` characters of `s`, cut on a char boundary.
fn truncate_chars(s: &str, max: usize) -> &str {
    match s.char_indices().nth(max) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}
