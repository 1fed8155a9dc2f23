//! Boundaries to the external vector index and document store.
//!
//! The retrieval core treats both as opaque, possibly slow and possibly
//! failing collaborators. Calls through these traits are the ones guarded by
//! the circuit breaker.

mod memory;

pub use memory::{MemoryDocumentStore, MemoryVectorIndex};

use crate::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

pub type DocId = u64;

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DocumentMetadata {
    /// Source name (file name, URL, ...).
    pub source: String,
    /// Document type (e.g. "pdf", "md").
    #[serde(rename = "type")]
    pub doc_type: String,
}

impl DocumentMetadata {
    pub fn new(source: impl Into<String>, doc_type: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            doc_type: doc_type.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    pub id: DocId,
    pub content: String,
    pub metadata: DocumentMetadata,
}

impl Document {
    pub fn new(id: DocId, content: impl Into<String>, metadata: DocumentMetadata) -> Self {
        Self {
            id,
            content: content.into(),
            metadata,
        }
    }
}

/// Metric space of the distances a [`VectorIndex`] returns.
///
/// The conversion to a `[0, 1]` similarity depends on it: the familiar
/// `1 - distance` is only meaningful for cosine distance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DistanceMetric {
    /// `1 - cos(a, b)`, in `[0, 2]`.
    Cosine,
    /// Euclidean distance, unbounded.
    L2,
    /// Negative inner product of unit vectors, in `[-1, 1]`.
    InnerProduct,
}

impl DistanceMetric {
    pub fn similarity(&self, distance: f32) -> f32 {
        if !distance.is_finite() {
            return 0.0;
        }
        match self {
            DistanceMetric::Cosine => (1.0 - distance).max(0.0),
            DistanceMetric::L2 => 1.0 / (1.0 + distance.max(0.0)),
            DistanceMetric::InnerProduct => ((1.0 - distance) / 2.0).clamp(0.0, 1.0),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct VectorHit {
    pub doc_id: DocId,
    pub distance: f32,
}

#[async_trait]
pub trait VectorIndex: Send + Sync {
    /// Nearest `k` documents, closest first.
    async fn search(&self, query: &[f32], k: usize) -> Result<Vec<VectorHit>>;

    fn metric(&self) -> DistanceMetric;

    /// Number of indexed embeddings.
    async fn len(&self) -> Result<usize>;
}

#[async_trait]
pub trait DocumentStore: Send + Sync {
    async fn fetch(&self, id: DocId) -> Result<Option<Document>>;

    /// Fetch several documents; missing ids are skipped, order follows `ids`.
    async fn fetch_many(&self, ids: &[DocId]) -> Result<Vec<Document>> {
        let fetched = futures::future::try_join_all(ids.iter().map(|id| self.fetch(*id))).await?;
        Ok(fetched.into_iter().flatten().collect())
    }

    /// The whole corpus (used to build the lexical index).
    async fn list(&self) -> Result<Vec<Document>>;

    async fn count(&self) -> Result<usize> {
        Ok(self.list().await?.len())
    }
}
