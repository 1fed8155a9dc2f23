//! Embeddings: the model boundary, vector math and two model implementations.
//!
//! | Component | Description |
//! |-----------|-------------|
//! | [`EmbeddingModel`] | Async text-to-vector boundary |
//! | [`CachedEmbedder`] | Embedding cache tier in front of a model |
//! | [`HttpEmbeddingModel`] | OpenAI-compatible `/v1/embeddings` client |
//! | [`HashingEmbedder`] | Deterministic offline feature-hashing model |

mod client;
mod hashing;
mod model;
mod types;
mod vectors;

pub use client::{HttpEmbeddingModel, HttpEmbeddingModelBuilder};
pub use hashing::HashingEmbedder;
pub use model::{CachedEmbedder, EmbeddingModel};
pub use types::{EmbeddingData, EmbeddingRequest, EmbeddingResponse, EmbeddingUsage};
pub use vectors::{
    cosine_similarity, dot_product, magnitude, normalize_vector, Vector,
};
