//! Deterministic offline embedder based on feature hashing.

use super::model::EmbeddingModel;
use super::vectors::{normalize_vector, Vector};
use crate::lexical::tokenize;
use crate::Result;
use async_trait::async_trait;
use sha2::{Digest, Sha256};

/// Hashes each token into one of `dimensions` signed buckets and
/// L2-normalizes the result. Texts sharing terms get positive cosine
/// similarity; no network, same output on every run.
#[derive(Debug, Clone)]
pub struct HashingEmbedder {
    dimensions: usize,
}

impl HashingEmbedder {
    pub fn new(dimensions: usize) -> Self {
        Self {
            dimensions: dimensions.max(1),
        }
    }

    pub fn embed_sync(&self, text: &str) -> Vector {
        let mut v = vec![0.0f32; self.dimensions];
        for token in tokenize(text) {
            let digest = Sha256::digest(token.as_bytes());
            let mut bytes = [0u8; 8];
            bytes.copy_from_slice(&digest[..8]);
            let h = u64::from_le_bytes(bytes);
            let bucket = (h % self.dimensions as u64) as usize;
            let sign = if digest[8] & 1 == 0 { 1.0 } else { -1.0 };
            v[bucket] += sign;
        }
        normalize_vector(&v)
    }
}

impl Default for HashingEmbedder {
    fn default() -> Self {
        Self::new(256)
    }
}

#[async_trait]
impl EmbeddingModel for HashingEmbedder {
    async fn embed(&self, text: &str) -> Result<Vector> {
        Ok(self.embed_sync(text))
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }

    fn name(&self) -> &str {
        "hashing"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::embeddings::cosine_similarity;

    #[test]
    fn test_deterministic_and_normalized() {
        let e = HashingEmbedder::new(64);
        let a = e.embed_sync("AI policy requires transparency");
        assert_eq!(a, e.embed_sync("ai POLICY requires transparency"));
        assert_eq!(a.len(), 64);
        let norm: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
        assert!((norm - 1.0).abs() < 1e-5);
    }

    #[test]
    fn test_shared_terms_are_closer() {
        let e = HashingEmbedder::new(256);
        let q = e.embed_sync("ai policy");
        let near = e.embed_sync("AI policy requires transparency");
        let far = e.embed_sync("gardening tips for spring");
        assert!(cosine_similarity(&q, &near).unwrap() > cosine_similarity(&q, &far).unwrap());
    }

    #[test]
    fn test_empty_text_is_zero_vector() {
        let e = HashingEmbedder::new(8);
        assert!(e.embed_sync("  ").iter().all(|x| *x == 0.0));
    }
}
