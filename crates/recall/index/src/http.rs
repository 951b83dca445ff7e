//! HTTP embedder for OpenAI-compatible endpoints.
//!
//! Speaks `POST {base_url}/embeddings` with the standard request/response
//! shape, which covers OpenAI itself, Ollama's compatibility surface, and
//! most self-hosted embedding servers. Connection problems, timeouts, 429
//! and 5xx map to transient errors; everything else is permanent.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::embedder::{Embedder, EmbedderConfig};
use crate::error::{IndexError, IndexResult};

#[derive(Debug, Serialize)]
struct EmbeddingRequest<'a> {
    model: &'a str,
    input: &'a str,
}

#[derive(Debug, Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingData>,
}

#[derive(Debug, Deserialize)]
struct EmbeddingData {
    embedding: Vec<f32>,
}

/// Embedding client for an OpenAI-compatible `/v1/embeddings` endpoint.
pub struct HttpEmbedder {
    client: reqwest::Client,
    base_url: String,
    config: EmbedderConfig,
}

impl HttpEmbedder {
    pub fn new(config: EmbedderConfig) -> IndexResult<Self> {
        let base_url = config
            .base_url
            .clone()
            .ok_or_else(|| IndexError::embedding_permanent("http embedder requires a base_url"))?;
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_millis(config.timeout_ms))
            .build()
            .map_err(|e| IndexError::embedding_permanent(format!("http client: {e}")))?;
        Ok(Self {
            client,
            base_url,
            config,
        })
    }

    fn api_key(&self) -> Option<String> {
        self.config
            .api_key_env
            .as_ref()
            .and_then(|var| std::env::var(var).ok())
    }
}

#[async_trait]
impl Embedder for HttpEmbedder {
    fn dimension(&self) -> usize {
        self.config.dimension
    }

    fn model_name(&self) -> &str {
        &self.config.model
    }

    async fn embed(&self, text: &str) -> IndexResult<Vec<f32>> {
        let url = format!("{}/embeddings", self.base_url.trim_end_matches('/'));
        let body = EmbeddingRequest {
            model: &self.config.model,
            input: text,
        };

        let mut request = self.client.post(&url).json(&body);
        if let Some(key) = self.api_key() {
            request = request.bearer_auth(key);
        }

        let response = request.send().await.map_err(|e| {
            if e.is_timeout() || e.is_connect() {
                IndexError::embedding_transient(format!("embedding request: {e}"))
            } else {
                IndexError::embedding_permanent(format!("embedding request: {e}"))
            }
        })?;

        let status = response.status();
        if status.is_server_error() || status.as_u16() == 429 {
            return Err(IndexError::embedding_transient(format!(
                "embedding endpoint returned {status}"
            )));
        }
        if !status.is_success() {
            return Err(IndexError::embedding_permanent(format!(
                "embedding endpoint returned {status}"
            )));
        }

        let parsed: EmbeddingResponse = response
            .json()
            .await
            .map_err(|e| IndexError::embedding_permanent(format!("embedding response: {e}")))?;

        let vector = parsed
            .data
            .into_iter()
            .next()
            .map(|d| d.embedding)
            .ok_or_else(|| {
                IndexError::embedding_permanent("embedding response contained no vectors")
            })?;

        if vector.len() != self.config.dimension {
            return Err(IndexError::Dimension {
                expected: self.config.dimension,
                got: vector.len(),
            });
        }
        Ok(vector)
    }
}
