//! # rag-retrieval
//!
//! Resilient hybrid retrieval for retrieval-augmented generation.
//!
//! ## Overview
//!
//! Given a query, the service returns a ranked list of documents from a
//! vector index and a local BM25 index, fused by a configurable weight and
//! optionally reranked. The slow, failure-prone external calls sit behind a
//! circuit breaker, and two TTL-bounded LRU caches (query embeddings and
//! final responses) keep repeated queries cheap.
//!
//! ## Core Philosophy
//!
//! - **Fail fast**: an unhealthy backend yields `Unavailable` quickly instead of a timeout
//! - **Deterministic**: ties are broken by document id, ranks are dense and 1-based
//! - **Degrade, don't fail**: a broken reranker falls back to first-pass order
//! - **No globals**: every cache, breaker and index is owned by a service instance
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use rag_retrieval::config::RetrievalConfig;
//! use rag_retrieval::embeddings::HttpEmbeddingModel;
//! use rag_retrieval::service::RetrievalService;
//! use rag_retrieval::store::{MemoryDocumentStore, MemoryVectorIndex};
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> rag_retrieval::Result<()> {
//!     let model = HttpEmbeddingModel::builder()
//!         .model("text-embedding-3-small")
//!         .dimensions(1536)
//!         .build()?;
//!     let service = RetrievalService::builder()
//!         .config(RetrievalConfig::from_path("retrieval.yaml")?)
//!         .embedding_model(Arc::new(model))
//!         .vector_index(Arc::new(MemoryVectorIndex::new(1536)))
//!         .document_store(Arc::new(MemoryDocumentStore::new()))
//!         .build()
//!         .await?;
//!
//!     let resp = service.search_hybrid("AI policy", 5, Some(0.7)).await?;
//!     for doc in &resp.documents {
//!         println!("{} {} {:.3}", doc.rank, doc.source, doc.hybrid_score);
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Module Organization
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`service`] | The query pipeline and its builder |
//! | [`cache`] | TTL + LRU cache, embedding and response tiers |
//! | [`resilience`] | Circuit breaker |
//! | [`lexical`] | Tokenizer and BM25 index |
//! | [`hybrid`] | Score normalization and weighted fusion |
//! | [`rerank`] | Heuristic and cross-encoder rerankers |
//! | [`embeddings`] | Embedding model boundary and vector math |
//! | [`store`] | Vector index and document store boundaries |
//! | [`config`] | YAML/JSON configuration with env overrides |
//! | [`telemetry`] | Call records and query metrics |

pub mod cache;
pub mod config;
pub mod embeddings;
pub mod error_code;
pub mod hybrid;
pub mod lexical;
pub mod rerank;
pub mod resilience;
pub mod service;
pub mod store;
pub mod telemetry;

// Re-export main types for convenience
pub use error_code::OutcomeCode;
pub use service::{RetrievalService, RetrievalServiceBuilder, RetrievedDocument, SearchResponse};

/// Result type alias for the library
pub type Result<T> = std::result::Result<T, Error>;

/// Error type for the library
pub mod error;
pub use error::{Error, ErrorContext};
