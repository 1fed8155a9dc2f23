//! Shared fixtures for integration tests.

#![allow(dead_code)]

use async_trait::async_trait;
use rag_retrieval::config::RetrievalConfig;
use rag_retrieval::embeddings::HashingEmbedder;
use rag_retrieval::service::{RetrievalService, RetrievalServiceBuilder};
use rag_retrieval::store::{
    DocId, Document, DocumentMetadata, DocumentStore, MemoryDocumentStore, MemoryVectorIndex,
};
use rag_retrieval::{Error, Result};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

pub const DIMS: usize = 128;

/// The three-document corpus used across tests.
pub fn corpus() -> Vec<Document> {
    vec![
        Document::new(1, "AI policy requires transparency", DocumentMetadata::new("d1.md", "md")),
        Document::new(2, "unrelated gardening tips", DocumentMetadata::new("d2.pdf", "pdf")),
        Document::new(3, "AI policy requires accountability", DocumentMetadata::new("d3.md", "md")),
    ]
}

pub fn vector_index(docs: &[Document]) -> MemoryVectorIndex {
    let embedder = HashingEmbedder::new(DIMS);
    let index = MemoryVectorIndex::new(DIMS);
    for d in docs {
        index.insert(d.id, embedder.embed_sync(&d.content)).unwrap();
    }
    index
}

pub fn builder_for(store: Arc<dyn DocumentStore>, docs: &[Document], config: RetrievalConfig) -> RetrievalServiceBuilder {
    RetrievalService::builder()
        .config(config)
        .embedding_model(Arc::new(HashingEmbedder::new(DIMS)))
        .vector_index(Arc::new(vector_index(docs)))
        .document_store(store)
}

pub async fn service_with(config: RetrievalConfig) -> RetrievalService {
    let docs = corpus();
    let store = Arc::new(MemoryDocumentStore::with_documents(docs.clone()));
    builder_for(store, &docs, config).build().await.unwrap()
}

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// Document store whose fetches can be switched to fail.
pub struct FlakyStore {
    inner: MemoryDocumentStore,
    pub failing: AtomicBool,
    pub fetch_calls: AtomicUsize,
}

impl FlakyStore {
    pub fn new(docs: Vec<Document>) -> Self {
        Self {
            inner: MemoryDocumentStore::with_documents(docs),
            failing: AtomicBool::new(false),
            fetch_calls: AtomicUsize::new(0),
        }
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    pub fn calls(&self) -> usize {
        self.fetch_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl DocumentStore for FlakyStore {
    async fn fetch(&self, id: DocId) -> Result<Option<Document>> {
        self.fetch_many(&[id]).await.map(|mut v| v.pop())
    }

    async fn fetch_many(&self, ids: &[DocId]) -> Result<Vec<Document>> {
        self.fetch_calls.fetch_add(1, Ordering::SeqCst);
        if self.failing.load(Ordering::SeqCst) {
            return Err(Error::retrieval("document store connection refused"));
        }
        self.inner.fetch_many(ids).await
    }

    async fn list(&self) -> Result<Vec<Document>> {
        self.inner.list().await
    }
}
