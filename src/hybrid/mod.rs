//! Hybrid search: weighted fusion of vector similarity and BM25.
//!
//! ```rust
//! use rag_retrieval::hybrid::{fuse, FusionParams};
//!
//! let vector = [(1, 0.9), (2, 0.4)];
//! let lexical = [(2, 6.0), (3, 3.0)];
//! let fused = fuse(&vector, &lexical, &FusionParams::new(0.5, 10)).unwrap();
//! assert_eq!(fused[0].doc_id, 2);
//! assert_eq!(fused.len(), 3);
//! ```

mod fusion;
mod normalize;
mod searcher;

pub use fusion::{fuse, FusionParams, SearchResult};
pub use normalize::ScoreNormalization;
pub use searcher::HybridSearcher;
