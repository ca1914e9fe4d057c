//! Text embedding for medicine-name similarity.
//!
//! The embedding model is an opaque scorer: [`EmbeddingProvider`] turns text
//! into a vector and [`cosine_similarity`] compares two of them. The local
//! provider runs a sentence encoder through ONNX Runtime.

pub mod local;

use anyhow::Result;

/// Trait for embedding text into vectors.
///
/// All methods are synchronous; callers in async contexts should use
/// `tokio::task::spawn_blocking`.
pub trait EmbeddingProvider: Send + Sync {
    /// Embed a single text string into a vector.
    fn embed(&self, text: &str) -> Result<Vec<f32>>;

    /// Embed a batch of text strings. Implementations may override for batched inference.
    fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>> {
        texts.iter().map(|t| self.embed(t)).collect()
    }
}

/// Create the local embedding provider from config.
///
/// Returns an error if model files are not found; run `medwise model download` first.
pub fn create_provider(
    config: &crate::config::MatcherConfig,
) -> Result<Box<dyn EmbeddingProvider>> {
    let provider = local::LocalEmbeddingProvider::new(config)?;
    Ok(Box::new(provider))
}

/// Cosine similarity in `[-1, 1]`; 0 when either vector has zero norm or the
/// lengths differ.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() {
        return 0.0;
    }
    let dot: f32 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        0.0
    } else {
        dot / (norm_a * norm_b)
    }
}
