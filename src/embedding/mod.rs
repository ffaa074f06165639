//! Embedding generation in a shared image/text space.

mod clip;

pub use clip::ClipEmbedder;

use crate::error::Result;
use async_trait::async_trait;
use std::path::Path;

/// Trait for multimodal embedding generation.
///
/// Text and image vectors must come from the same model so that distances between them
/// are meaningful. Implementations return unit-norm vectors.
#[async_trait]
pub trait Embedder: Send + Sync {
    /// Embed an image file.
    async fn embed_image(&self, path: &Path) -> Result<Vec<f32>>;

    /// Embed text, truncated to the model's input budget.
    async fn embed_text(&self, text: &str) -> Result<Vec<f32>>;

    /// Get the embedding dimensions.
    fn dimensions(&self) -> usize;
}

/// Scale a vector to unit length. Zero vectors are returned unchanged.
pub fn normalize(mut vector: Vec<f32>) -> Vec<f32> {
    let norm: f32 = vector.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm > 0.0 {
        for x in &mut vector {
            *x /= norm;
        }
    }
    vector
}

/// Truncate text to at most `max_chars` characters, respecting char boundaries.
pub fn truncate_for_text(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_produces_unit_norm() {
        let v = normalize(vec![3.0, 4.0]);
        assert!((v[0] - 0.6).abs() < 1e-6);
        assert!((v[1] - 0.8).abs() < 1e-6);
        let norm: f32 = v.iter().map(|x| x * x).sum::<f32>().sqrt();
        assert!((norm - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_normalize_zero_vector() {
        assert_eq!(normalize(vec![0.0, 0.0]), vec![0.0, 0.0]);
    }

    #[test]
    fn test_truncate_for_text() {
        assert_eq!(truncate_for_text("hello", 400), "hello");
        assert_eq!(truncate_for_text("hello", 3), "hel");
        // Multi-byte characters count as one
        assert_eq!(truncate_for_text("héllo", 2), "hé");
        let long = "a".repeat(1000);
        assert_eq!(truncate_for_text(&long, 400).len(), 400);
    }
}
