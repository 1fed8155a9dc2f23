//! Rerank types.

use crate::store::{DocId, DocumentMetadata};
use serde::{Deserialize, Serialize};

/// A first-pass result handed to a reranker.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RerankCandidate {
    pub doc_id: DocId,
    pub content: String,
    pub metadata: DocumentMetadata,
    /// Score from the first pass (similarity or hybrid score).
    pub original_score: f32,
}

/// A reranked document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RerankResult {
    pub doc_id: DocId,
    pub content: String,
    pub metadata: DocumentMetadata,
    pub original_score: f32,
    pub rerank_score: f32,
    /// 1-based position after reranking.
    pub final_rank: usize,
}

impl From<RerankResult> for RerankCandidate {
    fn from(r: RerankResult) -> Self {
        Self {
            doc_id: r.doc_id,
            content: r.content,
            metadata: r.metadata,
            original_score: r.original_score,
        }
    }
}
