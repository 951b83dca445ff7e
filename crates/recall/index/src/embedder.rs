//! Embedding generation.
//!
//! The hash embedder is the offline default: deterministic, dependency-free,
//! good enough for tests and air-gapped runs. Real semantic quality comes
//! from an HTTP embedder pointed at a model endpoint.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::IndexResult;

/// Vector width of all-MiniLM-L6-v2, the default model.
pub const EMBEDDING_DIM_384: usize = 384;

/// Turns text into a fixed-width vector.
#[async_trait]
pub trait Embedder: Send + Sync {
    /// Width of the vectors this embedder produces.
    fn dimension(&self) -> usize;

    /// Model name or identifier, for logs and diagnostics.
    fn model_name(&self) -> &str;

    /// Embed one text.
    async fn embed(&self, text: &str) -> IndexResult<Vec<f32>>;
}

/// Embedding configuration shared by embedder implementations.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbedderConfig {
    /// Model name or identifier.
    pub model: String,
    /// Vector width the engine expects.
    pub dimension: usize,
    /// Base URL of an OpenAI-compatible endpoint (the `/v1` root). `None`
    /// selects the offline hash embedder.
    pub base_url: Option<String>,
    /// Environment variable holding the API key, when the endpoint needs one.
    pub api_key_env: Option<String>,
    /// Per-request timeout for HTTP embedders.
    pub timeout_ms: u64,
}

impl Default for EmbedderConfig {
    fn default() -> Self {
        Self {
            model: "all-MiniLM-L6-v2".to_string(),
            dimension: EMBEDDING_DIM_384,
            base_url: None,
            api_key_env: None,
            timeout_ms: 30_000,
        }
    }
}

/// Deterministic hash-based embedder.
///
/// Maps equal texts to equal unit vectors, so ranking is stable across runs.
/// No semantic understanding; use an HTTP embedder for real retrieval
/// quality.
#[derive(Debug, Clone)]
pub struct HashEmbedder {
    dimension: usize,
}

impl HashEmbedder {
    pub fn new(dimension: usize) -> Self {
        assert!(dimension > 0, "embedding dimension must be positive");
        Self { dimension }
    }
}

impl Default for HashEmbedder {
    fn default() -> Self {
        Self::new(EMBEDDING_DIM_384)
    }
}

#[async_trait]
impl Embedder for HashEmbedder {
    fn dimension(&self) -> usize {
        self.dimension
    }

    fn model_name(&self) -> &str {
        "hash-embedder"
    }

    async fn embed(&self, text: &str) -> IndexResult<Vec<f32>> {
        // FNV-style fold over the text, then one splitmix step per lane.
        let mut seed: u64 = 0xcbf2_9ce4_8422_2325;
        for &byte in text.as_bytes() {
            seed ^= u64::from(byte);
            seed = seed.wrapping_mul(0x0000_0100_0000_01b3);
        }

        let mut embedding = vec![0.0f32; self.dimension];
        for (lane, value) in embedding.iter_mut().enumerate() {
            let mut z = seed.wrapping_add((lane as u64).wrapping_mul(0x9e37_79b9_7f4a_7c15));
            z = (z ^ (z >> 30)).wrapping_mul(0xbf58_476d_1ce4_e5b9);
            z = (z ^ (z >> 27)).wrapping_mul(0x94d0_49bb_1331_11eb);
            z ^= z >> 31;
            // Map to [-1, 1].
            *value = (z as i64 as f32) / (i64::MAX as f32);
        }

        let norm: f32 = embedding.iter().map(|x| x * x).sum::<f32>().sqrt();
        if norm > 0.0 {
            for value in &mut embedding {
                *value /= norm;
            }
        }

        Ok(embedding)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn embedding_is_deterministic() {
        let embedder = HashEmbedder::default();
        let a = embedder.embed("retry storm in webhooks").await.unwrap();
        let b = embedder.embed("retry storm in webhooks").await.unwrap();
        assert_eq!(a, b);
        assert_eq!(a.len(), EMBEDDING_DIM_384);
    }

    #[tokio::test]
    async fn different_texts_embed_differently() {
        let embedder = HashEmbedder::default();
        let a = embedder.embed("alpha").await.unwrap();
        let b = embedder.embed("beta").await.unwrap();
        assert_ne!(a, b);
    }

    #[tokio::test]
    async fn embedding_is_unit_length() {
        let embedder = HashEmbedder::default();
        let v = embedder.embed("normalize me").await.unwrap();
        let norm: f32 = v.iter().map(|x| x * x).sum::<f32>().sqrt();
        assert!((norm - 1.0).abs() < 1e-5, "norm was {norm}");
    }

    #[tokio::test]
    async fn dimension_is_respected() {
        let embedder = HashEmbedder::new(16);
        assert_eq!(embedder.dimension(), 16);
        assert_eq!(embedder.embed("small").await.unwrap().len(), 16);
    }

    #[test]
    fn config_defaults_to_offline_minilm_width() {
        let config = EmbedderConfig::default();
        assert_eq!(config.dimension, EMBEDDING_DIM_384);
        assert!(config.base_url.is_none());
    }
}
