//! Term-overlap reranker that needs no model.

use super::reranker::Reranker;
use super::types::RerankCandidate;
use crate::lexical::{tokenize, unique_terms};
use crate::Result;
use async_trait::async_trait;
use std::collections::HashSet;

const COVERAGE_WEIGHT: f32 = 0.7;
const DENSITY_WEIGHT: f32 = 0.3;

/// Scores `0.7 * coverage + 0.3 * density`.
///
/// `coverage` is the fraction of unique query terms found in the document;
/// `density` is matched term occurrences over `sqrt(document length)`,
/// clamped to `[0, 1]`. With `original_weight > 0` the first-pass score is
/// blended in linearly.
#[derive(Debug, Clone, Default)]
pub struct HeuristicReranker {
    original_weight: f32,
}

impl HeuristicReranker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_original_weight(mut self, weight: f32) -> Self {
        self.original_weight = weight.clamp(0.0, 1.0);
        self
    }

    pub fn score_text(&self, query_terms: &HashSet<String>, content: &str) -> f32 {
        if query_terms.is_empty() {
            return 0.0;
        }
        let tokens = tokenize(content);
        if tokens.is_empty() {
            return 0.0;
        }
        let mut found: HashSet<&str> = HashSet::new();
        let mut occurrences = 0usize;
        for t in &tokens {
            if query_terms.contains(t) {
                occurrences += 1;
                found.insert(t.as_str());
            }
        }
        let coverage = found.len() as f32 / query_terms.len() as f32;
        let density = (occurrences as f32 / (tokens.len() as f32).sqrt()).clamp(0.0, 1.0);
        COVERAGE_WEIGHT * coverage + DENSITY_WEIGHT * density
    }
}

#[async_trait]
impl Reranker for HeuristicReranker {
    fn name(&self) -> &'static str {
        "heuristic"
    }

    async fn score(&self, query: &str, candidates: &[RerankCandidate]) -> Result<Vec<f32>> {
        let terms: HashSet<String> = unique_terms(query).into_iter().collect();
        let w = self.original_weight;
        Ok(candidates
            .iter()
            .map(|c| {
                let s = self.score_text(&terms, &c.content);
                if w > 0.0 {
                    (1.0 - w) * s + w * c.original_score.clamp(0.0, 1.0)
                } else {
                    s
                }
            })
            .collect())
    }
}
