use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::config::Config;
use crate::errors::{AppError, AppResult};

/// Computes embedding vectors for chunk and query text. The vector store
/// delegates all embedding computation here.
#[async_trait]
pub trait EmbeddingBackend: Send + Sync {
    async fn embed(&self, text: &str) -> AppResult<Vec<f32>>;
}

/// Embeddings served by an Ollama-compatible endpoint.
pub struct OllamaEmbeddings {
    client: reqwest::Client,
    url: String,
    model: String,
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

impl OllamaEmbeddings {
    pub fn new(config: &Config) -> AppResult<Self> {
        // Same rule as the generation client: never fall back to a client
        // missing the configured timeout.
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.backend_timeout_secs))
            .build()?;
        Ok(Self {
            client,
            url: format!("{}/api/embeddings", config.backend_url),
            model: config.embedding_model_name.clone(),
        })
    }
}

#[async_trait]
impl EmbeddingBackend for OllamaEmbeddings {
    async fn embed(&self, text: &str) -> AppResult<Vec<f32>> {
        let response = self
            .client
            .post(&self.url)
            .json(&EmbeddingRequest {
                model: &self.model,
                prompt: text,
            })
            .send()
            .await?
            .error_for_status()?;

        let body: EmbeddingResponse = response.json().await?;
        if body.embedding.is_empty() {
            return Err(AppError::GenerationBackendError(
                "embedding endpoint returned an empty vector".to_string(),
            ));
        }
        Ok(body.embedding)
    }
}
