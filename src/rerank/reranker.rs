//! The reranker boundary.

use super::types::{RerankCandidate, RerankResult};
use crate::{Error, ErrorContext, Result};
use async_trait::async_trait;

#[async_trait]
pub trait Reranker: Send + Sync {
    fn name(&self) -> &'static str;

    /// One relevance score per candidate, in input order.
    async fn score(&self, query: &str, candidates: &[RerankCandidate]) -> Result<Vec<f32>>;

    /// Score, sort descending (equal scores keep input order), keep `top_k`
    /// and assign 1-based ranks.
    async fn rerank(
        &self,
        query: &str,
        candidates: Vec<RerankCandidate>,
        top_k: usize,
    ) -> Result<Vec<RerankResult>> {
        if candidates.is_empty() || top_k == 0 {
            return Ok(Vec::new());
        }
        let scores = self.score(query, &candidates).await?;
        if scores.len() != candidates.len() {
            return Err(Error::rerank_with_context(
                "reranker returned wrong number of scores",
                ErrorContext::new()
                    .with_details(format!(
                        "expected {}, got {}",
                        candidates.len(),
                        scores.len()
                    ))
                    .with_source(self.name()),
            ));
        }
        Ok(order(candidates, scores, top_k))
    }
}

pub(crate) fn order(
    candidates: Vec<RerankCandidate>,
    scores: Vec<f32>,
    top_k: usize,
) -> Vec<RerankResult> {
    let mut scored: Vec<(f32, RerankCandidate)> = scores
        .into_iter()
        .map(|s| if s.is_nan() { 0.0 } else { s })
        .zip(candidates)
        .collect();
    // sort_by is stable
    scored.sort_by(|a, b| b.0.total_cmp(&a.0));
    scored
        .into_iter()
        .take(top_k)
        .enumerate()
        .map(|(i, (rerank_score, c))| RerankResult {
            doc_id: c.doc_id,
            content: c.content,
            metadata: c.metadata,
            original_score: c.original_score,
            rerank_score,
            final_rank: i + 1,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::DocumentMetadata;

    struct Fixed(Vec<f32>);

    #[async_trait]
    impl Reranker for Fixed {
        fn name(&self) -> &'static str {
            "fixed"
        }
        async fn score(&self, _q: &str, _c: &[RerankCandidate]) -> Result<Vec<f32>> {
            Ok(self.0.clone())
        }
    }

    fn cand(id: u64, score: f32) -> RerankCandidate {
        RerankCandidate {
            doc_id: id,
            content: format!("doc {}", id),
            metadata: DocumentMetadata::new(format!("{}.md", id), "md"),
            original_score: score,
        }
    }

    #[tokio::test]
    async fn test_rerank_sorts_truncates_and_ranks() {
        let r = Fixed(vec![0.1, 0.9, 0.5, 0.9]);
        let out = r
            .rerank("q", vec![cand(1, 0.4), cand(2, 0.3), cand(3, 0.2), cand(4, 0.1)], 3)
            .await
            .unwrap();
        let ids: Vec<u64> = out.iter().map(|r| r.doc_id).collect();
        // 2 and 4 tie; input order kept
        assert_eq!(ids, vec![2, 4, 3]);
        assert_eq!(
            out.iter().map(|r| r.final_rank).collect::<Vec<_>>(),
            vec![1, 2, 3]
        );
        assert_eq!(out[0].original_score, 0.3);
        assert_eq!(out[0].content, "doc 2");
    }

    #[tokio::test]
    async fn test_rerank_rejects_score_count_mismatch() {
        let r = Fixed(vec![0.1]);
        let err = r.rerank("q", vec![cand(1, 0.4), cand(2, 0.3)], 2).await.unwrap_err();
        assert!(matches!(err, Error::Rerank { .. }));
    }

    #[tokio::test]
    async fn test_rerank_empty_input() {
        let r = Fixed(vec![]);
        assert!(r.rerank("q", vec![], 5).await.unwrap().is_empty());
    }
}
