//! Second-pass reranking of first-pass results.
//!
//! | Component | Description |
//! |-----------|-------------|
//! | [`Reranker`] | Score candidates; provided `rerank` sorts and ranks |
//! | [`HeuristicReranker`] | Query-term coverage and density, no model |
//! | [`CrossEncoderReranker`] | Cohere-compatible `/rerank` HTTP endpoint |

mod client;
mod heuristic;
mod reranker;
mod types;

pub use client::{CrossEncoderReranker, CrossEncoderRerankerBuilder};
pub use heuristic::HeuristicReranker;
pub use reranker::Reranker;
pub use types::{RerankCandidate, RerankResult};

use crate::config::RerankConfig;
use crate::Result;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RerankerKind {
    #[default]
    Heuristic,
    CrossEncoder,
    None,
}

/// The reranker selected by configuration, or `None` when disabled.
pub fn from_config(cfg: &RerankConfig) -> Result<Option<Arc<dyn Reranker>>> {
    Ok(match cfg.kind {
        RerankerKind::Heuristic => Some(Arc::new(
            HeuristicReranker::new().with_original_weight(cfg.original_weight),
        )),
        RerankerKind::CrossEncoder => Some(Arc::new(CrossEncoderReranker::from_config(cfg)?)),
        RerankerKind::None => None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_from_config() {
        let mut cfg = RerankConfig::default();
        assert_eq!(from_config(&cfg).unwrap().map(|r| r.name()), Some("heuristic"));
        cfg.kind = RerankerKind::None;
        assert!(from_config(&cfg).unwrap().is_none());
    }

    #[test]
    fn test_kind_serde_names() {
        assert_eq!(
            serde_json::to_string(&RerankerKind::CrossEncoder).unwrap(),
            "\"cross_encoder\""
        );
    }
}
