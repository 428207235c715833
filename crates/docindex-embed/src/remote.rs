//! OpenAI-compatible embeddings client.
//!
//! Text embeddings go through `/embeddings`; image embeddings through
//! `/images/embeddings` and carry the provider's model version back. No
//! retries here: transient-failure handling belongs to the backend layer.

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use docindex_core::error::{Error, Result};
use docindex_core::traits::Embedder;

pub struct RemoteEmbedder {
    client: Client,
    text_endpoint: String,
    image_endpoint: String,
    model: String,
    dim: usize,
    id: String,
}

impl RemoteEmbedder {
    pub fn new(api_key: &str, base_url: &str, model: &str, dim: usize) -> Result<Self> {
        if api_key.trim().is_empty() {
            return Err(Error::InvalidConfig("missing embeddings API key".into()));
        }
        if model.trim().is_empty() {
            return Err(Error::InvalidConfig("missing embeddings model name".into()));
        }
        let mut headers = HeaderMap::new();
        let auth = format!("Bearer {}", api_key.trim());
        headers.insert(
            AUTHORIZATION,
            HeaderValue::from_str(&auth)
                .map_err(|e| Error::InvalidConfig(format!("invalid API key: {}", e)))?,
        );
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        let client = Client::builder()
            .timeout(Duration::from_secs(60))
            .default_headers(headers)
            .build()
            .map_err(|e| Error::InvalidConfig(format!("failed to build HTTP client: {}", e)))?;
        let base = base_url.trim_end_matches('/');
        Ok(Self {
            client,
            text_endpoint: format!("{}/embeddings", base),
            image_endpoint: format!("{}/images/embeddings", base),
            model: model.to_string(),
            dim,
            id: format!("remote:{}:d{}", model, dim),
        })
    }
}

#[async_trait]
impl Embedder for RemoteEmbedder {
    fn embedder_id(&self) -> &str {
        &self.id
    }

    fn dim(&self) -> usize {
        self.dim
    }

    fn supports_images(&self) -> bool {
        true
    }

    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }
        let request = EmbeddingRequest { model: &self.model, input: texts, dimensions: self.dim };
        let resp = self
            .client
            .post(&self.text_endpoint)
            .json(&request)
            .send()
            .await
            .map_err(classify_transport)?;
        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_else(|_| "<body unavailable>".to_string());
            return Err(Error::Operation(format!(
                "embeddings request failed ({}): {}",
                status, body
            )));
        }
        let mut parsed: EmbeddingResponse = resp
            .json()
            .await
            .map_err(|e| Error::Operation(format!("failed to parse embedding response: {}", e)))?;
        parsed.data.sort_by_key(|entry| entry.index);
        if parsed.data.len() != texts.len() {
            return Err(Error::Operation(format!(
                "provider returned {} embeddings for {} inputs",
                parsed.data.len(),
                texts.len()
            )));
        }
        Ok(parsed.data.into_iter().map(|entry| entry.embedding).collect())
    }

    async fn embed_image(&self, image_ref: &str) -> Result<Vec<f32>> {
        let request = ImageEmbeddingRequest { model: &self.model, image: image_ref };
        let resp = self
            .client
            .post(&self.image_endpoint)
            .json(&request)
            .send()
            .await
            .map_err(classify_transport)?;
        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_else(|_| "<body unavailable>".to_string());
            return Err(Error::Operation(format!(
                "image embedding request failed ({}): {}",
                status, body
            )));
        }
        let parsed: ImageEmbeddingResponse = resp.json().await.map_err(|e| {
            Error::Operation(format!("failed to parse image embedding response: {}", e))
        })?;
        tracing::debug!(model_version = %parsed.model_version, "image embedded");
        Ok(parsed.vector)
    }
}

fn classify_transport(err: reqwest::Error) -> Error {
    if err.is_timeout() || err.is_connect() {
        Error::Connection(err.to_string())
    } else {
        Error::Operation(err.to_string())
    }
}

#[derive(Serialize)]
struct EmbeddingRequest<'a> {
    model: &'a str,
    input: &'a [String],
    dimensions: usize,
}

#[derive(Debug, Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingData>,
}

#[derive(Debug, Deserialize)]
struct EmbeddingData {
    embedding: Vec<f32>,
    index: usize,
}

#[derive(Serialize)]
struct ImageEmbeddingRequest<'a> {
    model: &'a str,
    image: &'a str,
}

#[derive(Debug, Deserialize)]
struct ImageEmbeddingResponse {
    vector: Vec<f32>,
    #[serde(rename = "modelVersion")]
    model_version: String,
}
