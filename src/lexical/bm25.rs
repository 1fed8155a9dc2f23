//! Okapi BM25 over an in-memory inverted index.

use super::tokenizer::{tokenize, unique_terms};
use crate::store::{DocId, Document};
use crate::{Error, ErrorContext, Result};
use std::cmp::Ordering;
use std::collections::HashMap;

/// Tunable BM25 constants.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bm25Params {
    /// Term-frequency saturation.
    pub k1: f32,
    /// Length-normalization strength (0 = none, 1 = full).
    pub b: f32,
}

impl Default for Bm25Params {
    fn default() -> Self {
        Self { k1: 1.2, b: 0.75 }
    }
}

impl Bm25Params {
    pub fn new(k1: f32, b: f32) -> Result<Self> {
        if !(k1.is_finite() && k1 >= 0.0) {
            return Err(Error::validation_with_context(
                "k1 must be a non-negative number",
                ErrorContext::new().with_field_path("bm25.k1"),
            ));
        }
        if !(0.0..=1.0).contains(&b) {
            return Err(Error::validation_with_context(
                "b must be within [0, 1]",
                ErrorContext::new().with_field_path("bm25.b"),
            ));
        }
        Ok(Self { k1, b })
    }
}

impl From<&crate::config::Bm25Config> for Bm25Params {
    fn from(cfg: &crate::config::Bm25Config) -> Self {
        Self {
            k1: cfg.k1,
            b: cfg.b,
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct Posting {
    doc: u32,
    tf: u32,
}

/// Immutable inverted index. Build a new one to change the corpus.
#[derive(Debug, Clone)]
pub struct Bm25Index {
    params: Bm25Params,
    postings: HashMap<String, Vec<Posting>>,
    doc_ids: Vec<DocId>,
    doc_lens: Vec<u32>,
    positions: HashMap<DocId, u32>,
    avg_len: f32,
}

impl Bm25Index {
    pub fn empty(params: Bm25Params) -> Self {
        Self {
            params,
            postings: HashMap::new(),
            doc_ids: Vec::new(),
            doc_lens: Vec::new(),
            positions: HashMap::new(),
            avg_len: 0.0,
        }
    }

    /// Index `documents`. A repeated id keeps its last occurrence.
    pub fn build<'a>(documents: impl IntoIterator<Item = &'a Document>, params: Bm25Params) -> Self {
        let mut latest: HashMap<DocId, &Document> = HashMap::new();
        for doc in documents {
            latest.insert(doc.id, doc);
        }
        let mut docs: Vec<&Document> = latest.into_values().collect();
        docs.sort_by_key(|d| d.id);

        let mut index = Self::empty(params);
        let mut total_len: u64 = 0;
        for (pos, doc) in docs.iter().enumerate() {
            let pos = pos as u32;
            let tokens = tokenize(&doc.content);
            let mut tfs: HashMap<String, u32> = HashMap::new();
            for t in &tokens {
                *tfs.entry(t.clone()).or_insert(0) += 1;
            }
            for (term, tf) in tfs {
                index
                    .postings
                    .entry(term)
                    .or_default()
                    .push(Posting { doc: pos, tf });
            }
            total_len += tokens.len() as u64;
            index.doc_ids.push(doc.id);
            index.doc_lens.push(tokens.len() as u32);
            index.positions.insert(doc.id, pos);
        }
        if !index.doc_ids.is_empty() {
            index.avg_len = total_len as f32 / index.doc_ids.len() as f32;
        }
        index
    }

    pub fn len(&self) -> usize {
        self.doc_ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.doc_ids.is_empty()
    }

    pub fn params(&self) -> Bm25Params {
        self.params
    }

    pub fn avg_doc_len(&self) -> f32 {
        self.avg_len
    }

    pub fn vocabulary_size(&self) -> usize {
        self.postings.len()
    }

    /// Number of documents containing `term` (already tokenized).
    pub fn doc_freq(&self, term: &str) -> usize {
        self.postings.get(term).map(|p| p.len()).unwrap_or(0)
    }

    pub fn contains(&self, id: DocId) -> bool {
        self.positions.contains_key(&id)
    }

    fn idf(&self, df: usize) -> f32 {
        let n = self.doc_ids.len() as f32;
        let df = df as f32;
        (1.0 + (n - df + 0.5) / (df + 0.5)).ln()
    }

    fn term_weight(&self, tf: u32, doc_len: u32) -> f32 {
        let Bm25Params { k1, b } = self.params;
        let tf = tf as f32;
        let norm = if self.avg_len > 0.0 {
            1.0 - b + b * (doc_len as f32 / self.avg_len)
        } else {
            1.0
        };
        tf * (k1 + 1.0) / (tf + k1 * norm)
    }

    fn accumulate(&self, query: &str) -> HashMap<u32, f32> {
        let mut scores: HashMap<u32, f32> = HashMap::new();
        for term in unique_terms(query) {
            let Some(postings) = self.postings.get(&term) else {
                continue;
            };
            let idf = self.idf(postings.len());
            for p in postings {
                let len = self.doc_lens[p.doc as usize];
                *scores.entry(p.doc).or_insert(0.0) += idf * self.term_weight(p.tf, len);
            }
        }
        scores
    }

    /// Score every matching document. Documents sharing no term with the
    /// query are omitted. Sorted by score descending, then id ascending.
    pub fn search(&self, query: &str, limit: usize) -> Vec<(DocId, f32)> {
        let mut hits: Vec<(DocId, f32)> = self
            .accumulate(query)
            .into_iter()
            .filter(|(_, s)| *s > 0.0)
            .map(|(pos, s)| (self.doc_ids[pos as usize], s))
            .collect();
        hits.sort_by(|a, b| {
            b.1.partial_cmp(&a.1)
                .unwrap_or(Ordering::Equal)
                .then_with(|| a.0.cmp(&b.0))
        });
        hits.truncate(limit);
        hits
    }

    /// BM25 score of a single document; 0.0 when absent or unmatched.
    pub fn score_document(&self, query: &str, id: DocId) -> f32 {
        let Some(&pos) = self.positions.get(&id) else {
            return 0.0;
        };
        let len = self.doc_lens[pos as usize];
        unique_terms(query)
            .iter()
            .filter_map(|term| {
                let postings = self.postings.get(term)?;
                let p = postings.iter().find(|p| p.doc == pos)?;
                Some(self.idf(postings.len()) * self.term_weight(p.tf, len))
            })
            .sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::DocumentMetadata;

    fn doc(id: DocId, content: &str) -> Document {
        Document::new(id, content, DocumentMetadata::new(format!("doc{}", id), "txt"))
    }

    fn corpus() -> Vec<Document> {
        vec![
            doc(1, "AI policy requires transparency"),
            doc(2, "unrelated gardening tips"),
            doc(3, "AI policy requires accountability"),
        ]
    }

    #[test]
    fn test_build_statistics() {
        let index = Bm25Index::build(&corpus(), Bm25Params::default());
        assert_eq!(index.len(), 3);
        assert_eq!(index.doc_freq("ai"), 2);
        assert_eq!(index.doc_freq("gardening"), 1);
        assert_eq!(index.doc_freq("missing"), 0);
        assert!((index.avg_doc_len() - 11.0 / 3.0).abs() < 1e-6);
    }

    #[test]
    fn test_unmatched_documents_excluded() {
        let index = Bm25Index::build(&corpus(), Bm25Params::default());
        let hits = index.search("AI policy", 10);
        let ids: Vec<DocId> = hits.iter().map(|(id, _)| *id).collect();
        assert_eq!(ids, vec![1, 3]);
        assert!(hits.iter().all(|(_, s)| *s > 0.0));
        assert_eq!(index.score_document("AI policy", 2), 0.0);
    }

    #[test]
    fn test_ties_broken_by_ascending_id() {
        let index = Bm25Index::build(&corpus(), Bm25Params::default());
        let hits = index.search("requires", 10);
        assert_eq!(hits[0].0, 1);
        assert_eq!(hits[1].0, 3);
        assert_eq!(hits[0].1, hits[1].1);
    }

    #[test]
    fn test_higher_term_frequency_scores_higher_at_equal_length() {
        let docs = vec![
            doc(1, "policy policy policy audit"),
            doc(2, "policy audit review board"),
            doc(3, "gardening tips for spring"),
        ];
        let index = Bm25Index::build(&docs, Bm25Params::default());
        let s1 = index.score_document("policy", 1);
        let s2 = index.score_document("policy", 2);
        assert!(s1 > s2, "{} should exceed {}", s1, s2);
    }

    #[test]
    fn test_length_normalization() {
        let docs = vec![
            doc(1, "policy"),
            doc(2, "policy with a lot of other words around it"),
        ];
        let index = Bm25Index::build(&docs, Bm25Params::default());
        assert!(index.score_document("policy", 1) > index.score_document("policy", 2));

        let flat = Bm25Index::build(&docs, Bm25Params::new(1.2, 0.0).unwrap());
        assert!((flat.score_document("policy", 1) - flat.score_document("policy", 2)).abs() < 1e-6);
    }

    #[test]
    fn test_rare_terms_weigh_more() {
        let docs = vec![
            doc(1, "common rare"),
            doc(2, "common filler"),
            doc(3, "common filler"),
        ];
        let index = Bm25Index::build(&docs, Bm25Params::default());
        let rare = index.search("rare", 10);
        let common = index.search("common", 10);
        assert!(rare[0].1 > common[0].1);
    }

    #[test]
    fn test_search_matches_score_document() {
        let index = Bm25Index::build(&corpus(), Bm25Params::default());
        for (id, score) in index.search("ai transparency", 10) {
            assert!((score - index.score_document("ai transparency", id)).abs() < 1e-6);
        }
    }

    #[test]
    fn test_duplicate_ids_keep_last() {
        let docs = vec![doc(1, "old text"), doc(1, "new text")];
        let index = Bm25Index::build(&docs, Bm25Params::default());
        assert_eq!(index.len(), 1);
        assert!(index.search("old", 10).is_empty());
        assert_eq!(index.search("new", 10).len(), 1);
    }

    #[test]
    fn test_empty_index_and_query() {
        let index = Bm25Index::empty(Bm25Params::default());
        assert!(index.search("anything", 10).is_empty());
        let index = Bm25Index::build(&corpus(), Bm25Params::default());
        assert!(index.search("", 10).is_empty());
        assert!(index.search("!!!", 10).is_empty());
    }

    #[test]
    fn test_params_validation() {
        assert!(Bm25Params::new(-1.0, 0.5).is_err());
        assert!(Bm25Params::new(1.2, 1.5).is_err());
        assert!(Bm25Params::new(0.0, 1.0).is_ok());
    }
}
