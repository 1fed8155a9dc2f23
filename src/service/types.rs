//! Types returned by [`super::RetrievalService`].

use crate::cache::CacheManagerStats;
use crate::error_code::OutcomeCode;
use crate::resilience::CircuitSnapshot;
use crate::store::DocId;
use crate::telemetry::MetricsSummary;
use serde::{Deserialize, Serialize};

/// One ranked document, as returned and as stored in the response cache.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetrievedDocument {
    pub doc_id: DocId,
    pub source: String,
    #[serde(rename = "type")]
    pub doc_type: String,
    /// Possibly truncated.
    pub content: String,
    /// Vector similarity rounded to 3 decimals.
    pub similarity: f32,
    pub vector_score: f32,
    pub bm25_score: f32,
    pub hybrid_score: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rerank_score: Option<f32>,
    /// 1-based.
    pub rank: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchResponse {
    pub documents: Vec<RetrievedDocument>,
    pub outcome: OutcomeCode,
    /// Served from the response cache.
    pub cached: bool,
}

impl SearchResponse {
    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }

    pub fn doc_ids(&self) -> Vec<DocId> {
        self.documents.iter().map(|d| d.doc_id).collect()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetrievalStats {
    pub cache: CacheManagerStats,
    pub circuit: CircuitSnapshot,
    pub queries: MetricsSummary,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceInfo {
    pub id: DocId,
    pub source: String,
    #[serde(rename = "type")]
    pub doc_type: String,
    /// Content length in characters.
    pub length: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IndexStatus {
    Complete,
    /// Some documents lack an embedding or a lexical entry.
    Incomplete,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexCounts {
    pub documents: usize,
    pub embeddings: usize,
    pub lexical_documents: usize,
    pub status: IndexStatus,
}

impl IndexCounts {
    pub fn new(documents: usize, embeddings: usize, lexical_documents: usize) -> Self {
        let status = if documents == embeddings && documents == lexical_documents {
            IndexStatus::Complete
        } else {
            IndexStatus::Incomplete
        };
        Self {
            documents,
            embeddings,
            lexical_documents,
            status,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_index_status() {
        assert_eq!(IndexCounts::new(3, 3, 3).status, IndexStatus::Complete);
        assert_eq!(IndexCounts::new(3, 2, 3).status, IndexStatus::Incomplete);
        assert_eq!(IndexCounts::new(3, 3, 0).status, IndexStatus::Incomplete);
    }

    #[test]
    fn test_document_serializes_type_and_skips_missing_rerank() {
        let doc = RetrievedDocument {
            doc_id: 1,
            source: "a.pdf".into(),
            doc_type: "pdf".into(),
            content: "x".into(),
            similarity: 0.5,
            vector_score: 0.5,
            bm25_score: 0.0,
            hybrid_score: 0.5,
            rerank_score: None,
            rank: 1,
        };
        let json = serde_json::to_value(&doc).unwrap();
        assert_eq!(json["type"], "pdf");
        assert!(json.get("rerank_score").is_none());
    }
}
