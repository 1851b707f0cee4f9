use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::{RagError, Result};
use crate::ollama::OllamaClient;

/// Turns text into a fixed-length vector.
#[async_trait]
pub trait Embedder: Send + Sync {
    async fn embed(&self, text: &str) -> Result<Vec<f32>>;

    fn dimensions(&self) -> usize;
}

#[derive(Serialize)]
struct EmbeddingRequest<'a> {
    model: &'a str,
    prompt: &'a str,
}

#[derive(Deserialize)]
struct EmbeddingResponse {
    embedding: Vec<f32>,
}

/// Embeddings from Ollama's `/api/embeddings`. Every call hits the service.
pub struct OllamaEmbedder {
    client: OllamaClient,
    model: String,
    dimensions: usize,
}

impl OllamaEmbedder {
    pub fn new(client: OllamaClient, model: impl Into<String>, dimensions: usize) -> Self {
        Self {
            client,
            model: model.into(),
            dimensions,
        }
    }
}

#[async_trait]
impl Embedder for OllamaEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        tracing::debug!(model = %self.model, text_len = text.len(), "embedding text");

        let request = EmbeddingRequest {
            model: &self.model,
            prompt: text,
        };
        let response: EmbeddingResponse = self
            .client
            .post_json("/api/embeddings", &request)
            .await
            .map_err(|message| RagError::Embedding {
                model: self.model.clone(),
                message,
            })?;

        if response.embedding.is_empty() {
            return Err(RagError::Embedding {
                model: self.model.clone(),
                message: "service returned an empty embedding".to_string(),
            });
        }
        if response.embedding.len() != self.dimensions {
            return Err(RagError::DimensionMismatch {
                expected: self.dimensions,
                actual: response.embedding.len(),
            });
        }

        Ok(response.embedding)
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }
}
