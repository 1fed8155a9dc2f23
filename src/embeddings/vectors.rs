//! Vector operations for embeddings.

use crate::{Error, Result};

pub type Vector = Vec<f32>;

pub fn dot_product(a: &[f32], b: &[f32]) -> Result<f32> {
    if a.len() != b.len() {
        return Err(Error::validation(format!("Vector dimensions must match: {} != {}", a.len(), b.len())));
    }
    Ok(a.iter().zip(b.iter()).map(|(x, y)| x * y).sum())
}

pub fn magnitude(v: &[f32]) -> f32 {
    v.iter().map(|x| x * x).sum::<f32>().sqrt()
}

pub fn normalize_vector(v: &[f32]) -> Vector {
    let mag = magnitude(v);
    if mag == 0.0 { return v.to_vec(); }
    v.iter().map(|x| x / mag).collect()
}

/// Cosine similarity in `[-1, 1]`; 0.0 when either vector is all zeros.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> Result<f32> {
    let dot = dot_product(a, b)?;
    let mag_a = magnitude(a);
    let mag_b = magnitude(b);
    if mag_a == 0.0 || mag_b == 0.0 { return Ok(0.0); }
    Ok((dot / (mag_a * mag_b)).clamp(-1.0, 1.0))
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPSILON: f32 = 1e-6;

    fn approx_eq(a: f32, b: f32) -> bool {
        (a - b).abs() < EPSILON
    }

    #[test]
    fn test_dot_product_dimension_mismatch() {
        assert!(dot_product(&[1.0, 2.0], &[1.0, 2.0, 3.0]).is_err());
    }

    #[test]
    fn test_normalize_vector_basic() {
        let normalized = normalize_vector(&[3.0, 4.0]);
        assert!(approx_eq(normalized[0], 0.6));
        assert!(approx_eq(normalized[1], 0.8));
        assert!(approx_eq(magnitude(&normalized), 1.0));
    }

    #[test]
    fn test_normalize_vector_zero() {
        let v = vec![0.0, 0.0, 0.0];
        assert_eq!(normalize_vector(&v), v);
    }

    #[test]
    fn test_cosine_similarity_cases() {
        assert!(approx_eq(cosine_similarity(&[1.0, 2.0, 3.0], &[1.0, 2.0, 3.0]).unwrap(), 1.0));
        assert!(approx_eq(cosine_similarity(&[1.0, 2.0], &[-1.0, -2.0]).unwrap(), -1.0));
        assert!(approx_eq(cosine_similarity(&[1.0, 0.0], &[0.0, 1.0]).unwrap(), 0.0));
        // Zero vector
        assert!(approx_eq(cosine_similarity(&[0.0, 0.0], &[1.0, 1.0]).unwrap(), 0.0));
    }
}
