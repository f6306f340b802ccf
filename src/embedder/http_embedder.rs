use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::RwLock;
use std::collections::HashMap;
use std::time::Duration;

use super::Embedder;
use crate::config::Settings;
use crate::error::ApiError;

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

pub struct HttpEmbedder {
    client: Client,
    base_url: String,
    api_key: String,
    model: String,
    dimension: usize,
    timeout: Duration,
    cache: Arc<RwLock<HashMap<String, Vec<f32>>>>,
}

impl HttpEmbedder {
    pub fn new(settings: &Settings, timeout: Duration) -> Self {
        Self {
            client: Client::new(),
            base_url: settings.base_url.clone(),
            api_key: settings.api_key.clone(),
            model: settings.embed_model.clone(),
            dimension: settings.embed_dimension,
            timeout,
            cache: Arc::new(RwLock::new(HashMap::new())),
        }
    }
}

#[async_trait]
impl Embedder for HttpEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>, ApiError> {
        if let Some(cached) = self.cache.read().await.get(text) {
            return Ok(cached.clone());
        }

        let url = format!("{}/v1/embeddings", self.base_url);
        let body = EmbeddingRequest {
            model: &self.model,
            input: text,
        };

        let response = tokio::time::timeout(
            self.timeout,
            self.client
                .post(&url)
                .bearer_auth(&self.api_key)
                .json(&body)
                .send(),
        )
        .await
        .map_err(|_| ApiError::EmbedFailed {
            index: 0,
            reason: "embedding request timed out".to_string(),
        })?
        .map_err(|e| ApiError::EmbedFailed {
            index: 0,
            reason: e.to_string(),
        })?;

        if !response.status().is_success() {
            return Err(ApiError::EmbedFailed {
                index: 0,
                reason: format!("embedding service returned {}", response.status()),
            });
        }

        let parsed: EmbeddingResponse = response.json().await.map_err(|e| ApiError::EmbedFailed {
            index: 0,
            reason: format!("malformed embedding response: {e}"),
        })?;

        let vector = parsed
            .data
            .into_iter()
            .next()
            .ok_or_else(|| ApiError::EmbedFailed {
                index: 0,
                reason: "embedding response contained no vectors".to_string(),
            })?
            .embedding;

        if vector.len() != self.dimension {
            return Err(ApiError::EmbedFailed {
                index: 0,
                reason: format!(
                    "embedding dimension mismatch: expected {}, got {}",
                    self.dimension,
                    vector.len()
                ),
            });
        }

        self.cache.write().await.insert(text.to_string(), vector.clone());
        Ok(vector)
    }

    fn dimension(&self) -> usize {
        self.dimension
    }
}
