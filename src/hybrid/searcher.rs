//! Drives vector search, lexical search and fusion for one query.

use super::fusion::{fuse, FusionParams, SearchResult};
use crate::lexical::LexicalIndex;
use crate::store::{DocId, VectorIndex};
use crate::Result;
use std::sync::Arc;
use tracing::debug;

pub struct HybridSearcher {
    vectors: Arc<dyn VectorIndex>,
    lexical: Arc<LexicalIndex>,
    candidate_multiplier: usize,
}

impl HybridSearcher {
    pub fn new(vectors: Arc<dyn VectorIndex>, lexical: Arc<LexicalIndex>, candidate_multiplier: usize) -> Self {
        Self {
            vectors,
            lexical,
            candidate_multiplier: candidate_multiplier.max(1),
        }
    }

    /// Vector hits converted to similarities with the index's own metric.
    pub async fn vector_candidates(&self, query_vector: &[f32], k: usize) -> Result<Vec<(DocId, f32)>> {
        let metric = self.vectors.metric();
        let hits = self.vectors.search(query_vector, k).await?;
        Ok(hits
            .into_iter()
            .map(|h| (h.doc_id, metric.similarity(h.distance)))
            .collect())
    }

    pub async fn search(
        &self,
        query_text: &str,
        query_vector: &[f32],
        params: &FusionParams,
    ) -> Result<Vec<SearchResult>> {
        params.validate()?;
        let candidates = params.top_k.saturating_mul(self.candidate_multiplier);
        let vector = self.vector_candidates(query_vector, candidates).await?;
        let lexical = self.lexical.snapshot().search(query_text, candidates);
        debug!(
            vector = vector.len(),
            lexical = lexical.len(),
            "hybrid candidates"
        );
        fuse(&vector, &lexical, params)
    }
}
