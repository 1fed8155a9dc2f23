//! Weighted fusion of vector and BM25 score lists.

use super::normalize::ScoreNormalization;
use crate::config::HybridConfig;
use crate::store::DocId;
use crate::{Error, ErrorContext, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// One fused result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchResult {
    pub doc_id: DocId,
    /// Similarity in `[0, 1]`; 0 when the vector search did not return the document.
    pub vector_score: f32,
    /// Raw BM25 score; 0 when the document matched no query term.
    pub bm25_score: f32,
    pub hybrid_score: f32,
    /// 1-based.
    pub rank: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FusionParams {
    pub vector_weight: f32,
    pub lexical_weight_override: Option<f32>,
    pub vector_normalization: ScoreNormalization,
    pub lexical_normalization: ScoreNormalization,
    pub top_k: usize,
}

impl FusionParams {
    pub fn new(vector_weight: f32, top_k: usize) -> Self {
        Self {
            vector_weight,
            lexical_weight_override: None,
            vector_normalization: ScoreNormalization::Bounded,
            lexical_normalization: ScoreNormalization::MaxScaled,
            top_k,
        }
    }

    /// Parameters from configuration; `vector_weight` falls back to the
    /// configured default.
    pub fn from_config(cfg: &HybridConfig, vector_weight: Option<f32>, top_k: usize) -> Self {
        Self {
            vector_weight: vector_weight.unwrap_or(cfg.default_vector_weight),
            lexical_weight_override: cfg.lexical_weight_override,
            vector_normalization: cfg.vector_normalization,
            lexical_normalization: cfg.lexical_normalization,
            top_k,
        }
    }

    pub fn with_lexical_weight(mut self, weight: f32) -> Self {
        self.lexical_weight_override = Some(weight);
        self
    }

    pub fn with_normalization(mut self, vector: ScoreNormalization, lexical: ScoreNormalization) -> Self {
        self.vector_normalization = vector;
        self.lexical_normalization = lexical;
        self
    }

    pub fn lexical_weight(&self) -> f32 {
        self.lexical_weight_override
            .unwrap_or(1.0 - self.vector_weight)
    }

    pub fn validate(&self) -> Result<()> {
        check_weight("vector_weight", self.vector_weight)?;
        if let Some(w) = self.lexical_weight_override {
            check_weight("lexical_weight", w)?;
        }
        Ok(())
    }
}

fn check_weight(field: &str, w: f32) -> Result<()> {
    if !(0.0..=1.0).contains(&w) {
        return Err(Error::validation_with_context(
            "weight must be within [0, 1]",
            ErrorContext::new()
                .with_field_path(field)
                .with_details(format!("got {}", w)),
        ));
    }
    Ok(())
}

#[derive(Default)]
struct Entry {
    vector_raw: Option<f32>,
    bm25_raw: Option<f32>,
    vector_norm: f32,
    bm25_norm: f32,
}

/// Fuse two score families into one ranking.
///
/// `vector` holds `(doc, similarity)` pairs, `lexical` holds
/// `(doc, bm25)` pairs. A document present in only one family scores 0 in
/// the other. Ties are broken by ascending doc id. If a family lists a
/// document more than once, its best score counts.
pub fn fuse(
    vector: &[(DocId, f32)],
    lexical: &[(DocId, f32)],
    params: &FusionParams,
) -> Result<Vec<SearchResult>> {
    params.validate()?;
    let w = params.vector_weight;
    let lw = params.lexical_weight();

    let mut entries: BTreeMap<DocId, Entry> = BTreeMap::new();
    for (id, s) in dedup_max(vector) {
        entries.entry(id).or_default().vector_raw = Some(s);
    }
    for (id, s) in dedup_max(lexical) {
        entries.entry(id).or_default().bm25_raw = Some(s);
    }

    // Normalize over the documents each family actually returned.
    let mut vec_norm: Vec<f32> = entries.values().filter_map(|e| e.vector_raw).collect();
    params.vector_normalization.apply(&mut vec_norm);
    let mut lex_norm: Vec<f32> = entries.values().filter_map(|e| e.bm25_raw).collect();
    params.lexical_normalization.apply(&mut lex_norm);

    let mut vi = vec_norm.into_iter();
    let mut li = lex_norm.into_iter();
    for e in entries.values_mut() {
        if e.vector_raw.is_some() {
            e.vector_norm = vi.next().unwrap_or(0.0);
        }
        if e.bm25_raw.is_some() {
            e.bm25_norm = li.next().unwrap_or(0.0);
        }
    }

    let mut results: Vec<SearchResult> = entries
        .into_iter()
        .map(|(doc_id, e)| SearchResult {
            doc_id,
            vector_score: e.vector_raw.unwrap_or(0.0).clamp(0.0, 1.0),
            bm25_score: e.bm25_raw.unwrap_or(0.0).max(0.0),
            hybrid_score: w * e.vector_norm + lw * e.bm25_norm,
            rank: 0,
        })
        .collect();

    results.sort_by(|a, b| {
        b.hybrid_score
            .total_cmp(&a.hybrid_score)
            .then_with(|| a.doc_id.cmp(&b.doc_id))
    });
    results.truncate(params.top_k);
    for (i, r) in results.iter_mut().enumerate() {
        r.rank = i + 1;
    }
    Ok(results)
}

fn dedup_max(scores: &[(DocId, f32)]) -> BTreeMap<DocId, f32> {
    let mut out = BTreeMap::new();
    for &(id, s) in scores {
        let s = if s.is_finite() { s } else { 0.0 };
        out.entry(id)
            .and_modify(|cur: &mut f32| *cur = cur.max(s))
            .or_insert(s);
    }
    out
}
