//! HTTP client for a CLIP-style multimodal embedding service.
//!
//! Requests follow the common multimodal `/embeddings` shape:
//! `{"model": ..., "input": [{"text": ...} | {"image": <base64>}]}` answered with
//! `{"data": [{"index": 0, "embedding": [...]}]}`.

use super::{normalize, truncate_for_text, Embedder};
use crate::config::{optional_api_key, EmbeddingSettings, EMBEDDING_API_KEY_ENV};
use crate::error::{Result, VidmindError};
use crate::openai::http_client;
use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::{debug, instrument};

#[derive(Debug, Serialize)]
#[serde(rename_all = "lowercase")]
enum EmbeddingInput {
    Text(String),
    Image(String),
}

#[derive(Debug, Serialize)]
struct EmbeddingRequest<'a> {
    model: &'a str,
    input: Vec<EmbeddingInput>,
}

#[derive(Debug, Deserialize)]
struct EmbeddingData {
    index: usize,
    embedding: Vec<f32>,
}

#[derive(Debug, Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingData>,
}

/// CLIP embedder backed by an HTTP service.
pub struct ClipEmbedder {
    http: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
    model: String,
    dimensions: usize,
    max_text_chars: usize,
}

impl ClipEmbedder {
    /// Create an embedder from settings. `EMBEDDING_API_KEY` is sent when present.
    pub fn new(settings: &EmbeddingSettings) -> Result<Self> {
        Ok(Self {
            http: http_client()?,
            base_url: settings.base_url.trim_end_matches('/').to_string(),
            api_key: optional_api_key(EMBEDDING_API_KEY_ENV),
            model: settings.model.clone(),
            dimensions: settings.dimensions,
            max_text_chars: settings.max_text_chars,
        })
    }

    /// Set the API key explicitly.
    pub fn with_api_key(mut self, api_key: Option<String>) -> Self {
        self.api_key = api_key;
        self
    }

    async fn request(&self, input: EmbeddingInput) -> Result<Vec<f32>> {
        let body = EmbeddingRequest {
            model: &self.model,
            input: vec![input],
        };

        let mut request = self
            .http
            .post(format!("{}/embeddings", self.base_url))
            .json(&body);
        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key);
        }

        let response = request.send().await?;
        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            return Err(VidmindError::Embedding(format!(
                "Embedding service returned {}: {}",
                status, text
            )));
        }

        let parsed: EmbeddingResponse = response.json().await?;
        let embedding = parsed
            .data
            .into_iter()
            .min_by_key(|d| d.index)
            .map(|d| d.embedding)
            .ok_or_else(|| VidmindError::Embedding("Empty embedding response".to_string()))?;

        if embedding.len() != self.dimensions {
            return Err(VidmindError::Embedding(format!(
                "Expected {} dimensions, service returned {}",
                self.dimensions,
                embedding.len()
            )));
        }

        Ok(normalize(embedding))
    }
}

#[async_trait]
impl Embedder for ClipEmbedder {
    #[instrument(skip(self), fields(path = %path.display()))]
    async fn embed_image(&self, path: &Path) -> Result<Vec<f32>> {
        let bytes = tokio::fs::read(path).await?;
        debug!("Embedding image ({} bytes)", bytes.len());
        self.request(EmbeddingInput::Image(STANDARD.encode(bytes))).await
    }

    #[instrument(skip(self, text), fields(chars = text.chars().count()))]
    async fn embed_text(&self, text: &str) -> Result<Vec<f32>> {
        let truncated = truncate_for_text(text, self.max_text_chars);
        self.request(EmbeddingInput::Text(truncated.to_string())).await
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }
}
