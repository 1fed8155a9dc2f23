//! Lexical retrieval: tokenization and BM25 scoring without embeddings.
//!
//! | Component | Description |
//! |-----------|-------------|
//! | [`tokenize`] | Lowercase, split on non-alphanumeric characters |
//! | [`Bm25Index`] | Immutable inverted index with BM25 scoring |
//! | [`LexicalIndex`] | Active index behind an atomic pointer swap |
//!
//! ```rust
//! use rag_retrieval::lexical::{Bm25Params, LexicalIndex};
//! use rag_retrieval::store::{Document, DocumentMetadata};
//!
//! let docs = vec![
//!     Document::new(1, "AI policy requires transparency", DocumentMetadata::new("a.md", "md")),
//!     Document::new(2, "unrelated gardening tips", DocumentMetadata::new("b.md", "md")),
//! ];
//! let index = LexicalIndex::with_documents(&docs, Bm25Params::default());
//! let hits = index.search("ai policy", 10);
//! assert_eq!(hits.len(), 1);
//! assert_eq!(hits[0].0, 1);
//! ```

mod bm25;
mod index;
mod tokenizer;

pub use bm25::{Bm25Index, Bm25Params};
pub use index::LexicalIndex;
pub use tokenizer::{tokenize, unique_terms};
