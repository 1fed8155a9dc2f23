//! Hot-swappable lexical index.

use super::bm25::{Bm25Index, Bm25Params};
use crate::store::{DocId, Document};
use arc_swap::ArcSwap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use tracing::info;

/// Holds the active [`Bm25Index`] behind an `ArcSwap`.
///
/// Readers take a [`snapshot`](Self::snapshot) and score against it without
/// locking. A rebuild constructs the replacement completely before a single
/// atomic pointer swap, so in-flight queries keep the index they started with.
pub struct LexicalIndex {
    active: ArcSwap<Bm25Index>,
    params: Bm25Params,
    generation: AtomicU64,
    rebuild_lock: Mutex<()>,
}

impl LexicalIndex {
    pub fn new(params: Bm25Params) -> Self {
        Self {
            active: ArcSwap::from_pointee(Bm25Index::empty(params)),
            params,
            generation: AtomicU64::new(0),
            rebuild_lock: Mutex::new(()),
        }
    }

    pub fn with_documents<'a>(
        documents: impl IntoIterator<Item = &'a Document>,
        params: Bm25Params,
    ) -> Self {
        let index = Self::new(params);
        index.rebuild(documents);
        index
    }

    /// Stable reference to the current index.
    pub fn snapshot(&self) -> Arc<Bm25Index> {
        self.active.load_full()
    }

    /// Build a fresh index from `documents` and swap it in. Concurrent
    /// rebuilds are serialized; the last one to finish wins.
    pub fn rebuild<'a>(&self, documents: impl IntoIterator<Item = &'a Document>) -> u64 {
        let _guard = match self.rebuild_lock.lock() {
            Ok(g) => g,
            Err(poisoned) => poisoned.into_inner(),
        };
        let next = Bm25Index::build(documents, self.params);
        let docs = next.len();
        let terms = next.vocabulary_size();
        self.active.store(Arc::new(next));
        let generation = self.generation.fetch_add(1, Ordering::AcqRel) + 1;
        info!(generation, docs, terms, "lexical index swapped");
        generation
    }

    /// Number of completed rebuilds.
    pub fn generation(&self) -> u64 {
        self.generation.load(Ordering::Acquire)
    }

    pub fn len(&self) -> usize {
        self.active.load().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn search(&self, query: &str, limit: usize) -> Vec<(DocId, f32)> {
        self.active.load().search(query, limit)
    }
}
