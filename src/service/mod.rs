//! The retrieval service: cache, circuit breaker, hybrid search and
//! reranking composed into one query pipeline.
//!
//! ```rust
//! use rag_retrieval::embeddings::HashingEmbedder;
//! use rag_retrieval::service::RetrievalService;
//! use rag_retrieval::store::{Document, DocumentMetadata, MemoryDocumentStore, MemoryVectorIndex};
//! use std::sync::Arc;
//!
//! # tokio_test::block_on(async {
//! let embedder = HashingEmbedder::new(64);
//! let doc = Document::new(1, "AI policy requires transparency", DocumentMetadata::new("policy.md", "md"));
//! let vectors = MemoryVectorIndex::new(64);
//! vectors.insert(doc.id, embedder.embed_sync(&doc.content)).unwrap();
//!
//! let service = RetrievalService::builder()
//!     .embedding_model(Arc::new(embedder))
//!     .vector_index(Arc::new(vectors))
//!     .document_store(Arc::new(MemoryDocumentStore::with_documents(vec![doc])))
//!     .build()
//!     .await
//!     .unwrap();
//! let resp = service.search_hybrid("AI policy", 5, None).await.unwrap();
//! assert_eq!(resp.documents[0].doc_id, 1);
//! # });
//! ```

mod builder;
mod retrieval;
mod types;

pub use builder::RetrievalServiceBuilder;
pub use retrieval::{RetrievalService, MAX_TOP_K};
pub use types::{
    IndexCounts, IndexStatus, RetrievalStats, RetrievedDocument, SearchResponse, SourceInfo,
};
