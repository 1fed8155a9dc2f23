//! In-process implementations of the store boundaries, for tests, demos and
//! small corpora that fit in memory.

use super::{DistanceMetric, DocId, Document, DocumentStore, VectorHit, VectorIndex};
use crate::embeddings::{cosine_similarity, Vector};
use crate::{Error, ErrorContext, Result};
use async_trait::async_trait;
use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::sync::RwLock;

#[derive(Default)]
pub struct MemoryDocumentStore {
    docs: RwLock<BTreeMap<DocId, Document>>,
}

impl MemoryDocumentStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_documents(documents: impl IntoIterator<Item = Document>) -> Self {
        let store = Self::new();
        for doc in documents {
            store.insert(doc);
        }
        store
    }

    pub fn insert(&self, doc: Document) {
        let mut docs = match self.docs.write() {
            Ok(g) => g,
            Err(poisoned) => poisoned.into_inner(),
        };
        docs.insert(doc.id, doc);
    }

    pub fn remove(&self, id: DocId) -> Option<Document> {
        let mut docs = match self.docs.write() {
            Ok(g) => g,
            Err(poisoned) => poisoned.into_inner(),
        };
        docs.remove(&id)
    }

    fn read(&self) -> std::sync::RwLockReadGuard<'_, BTreeMap<DocId, Document>> {
        match self.docs.read() {
            Ok(g) => g,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}

#[async_trait]
impl DocumentStore for MemoryDocumentStore {
    async fn fetch(&self, id: DocId) -> Result<Option<Document>> {
        Ok(self.read().get(&id).cloned())
    }

    async fn fetch_many(&self, ids: &[DocId]) -> Result<Vec<Document>> {
        let docs = self.read();
        Ok(ids.iter().filter_map(|id| docs.get(id).cloned()).collect())
    }

    async fn list(&self) -> Result<Vec<Document>> {
        Ok(self.read().values().cloned().collect())
    }

    async fn count(&self) -> Result<usize> {
        Ok(self.read().len())
    }
}

/// Brute-force cosine-distance index.
pub struct MemoryVectorIndex {
    dimensions: usize,
    vectors: RwLock<BTreeMap<DocId, Vector>>,
}

impl MemoryVectorIndex {
    pub fn new(dimensions: usize) -> Self {
        Self {
            dimensions,
            vectors: RwLock::new(BTreeMap::new()),
        }
    }

    pub fn dimensions(&self) -> usize {
        self.dimensions
    }

    pub fn insert(&self, id: DocId, vector: Vector) -> Result<()> {
        self.check_dims(&vector)?;
        let mut vectors = match self.vectors.write() {
            Ok(g) => g,
            Err(poisoned) => poisoned.into_inner(),
        };
        vectors.insert(id, vector);
        Ok(())
    }

    pub fn remove(&self, id: DocId) -> bool {
        let mut vectors = match self.vectors.write() {
            Ok(g) => g,
            Err(poisoned) => poisoned.into_inner(),
        };
        vectors.remove(&id).is_some()
    }

    fn check_dims(&self, vector: &[f32]) -> Result<()> {
        if vector.len() != self.dimensions {
            return Err(Error::validation_with_context(
                "vector dimension mismatch",
                ErrorContext::new()
                    .with_details(format!("expected {}, got {}", self.dimensions, vector.len()))
                    .with_source("memory_vector_index"),
            ));
        }
        Ok(())
    }
}

#[async_trait]
impl VectorIndex for MemoryVectorIndex {
    async fn search(&self, query: &[f32], k: usize) -> Result<Vec<VectorHit>> {
        self.check_dims(query)?;
        let vectors = match self.vectors.read() {
            Ok(g) => g,
            Err(poisoned) => poisoned.into_inner(),
        };
        let mut hits = Vec::with_capacity(vectors.len());
        for (id, v) in vectors.iter() {
            let cos = cosine_similarity(query, v)?;
            hits.push(VectorHit {
                doc_id: *id,
                distance: 1.0 - cos,
            });
        }
        hits.sort_by(|a, b| {
            a.distance
                .partial_cmp(&b.distance)
                .unwrap_or(Ordering::Equal)
                .then_with(|| a.doc_id.cmp(&b.doc_id))
        });
        hits.truncate(k);
        Ok(hits)
    }

    fn metric(&self) -> DistanceMetric {
        DistanceMetric::Cosine
    }

    async fn len(&self) -> Result<usize> {
        Ok(match self.vectors.read() {
            Ok(g) => g.len(),
            Err(poisoned) => poisoned.into_inner().len(),
        })
    }
}
