//! HTTP embedding client for OpenAI-compatible `/v1/embeddings` endpoints.
//!
//! Sends `{model, encoding_format: "float", input}` with a bearer token and
//! expects a JSON object whose `data` array holds one `embedding` per input.
//! Responses are re-ordered by `index` when the service provides it; the
//! indices must then cover every input exactly once. Any count mismatch
//! or misaligned index rejects the whole batch.
//!
//! ```rust,no_run
//! # use ragline::config::EmbeddingConfig;
//! # use ragline::embedding::HttpEmbedder;
//! use ragline_core::embedding::Embedder;
//!
//! let embedder = HttpEmbedder::from_config(&EmbeddingConfig::default()).unwrap();
//! let vectors = embedder.embed(&["hello".to_string()]).unwrap();
//! assert_eq!(vectors.len(), 1);
//! ```

use anyhow::{Context, Result};
use ragline_core::embedding::{align_batch, Embedder};
use ragline_core::models::Embedded;
use ragline_core::{ServiceError, ServiceResult};
use reqwest::blocking::Client;
use serde::{Deserialize, Serialize};

use crate::config::EmbeddingConfig;
use crate::http;

/// Blocking client for an OpenAI-compatible embeddings endpoint.
pub struct HttpEmbedder {
    client: Client,
    endpoint: String,
    model: String,
}

impl HttpEmbedder {
    /// Build a client for the full endpoint URL (e.g.
    /// `http://localhost:8080/v1/embeddings`).
    pub fn new(endpoint: &str, api_key: &str, model: &str, timeout_secs: u64) -> Result<Self> {
        http::ensure_http_url(endpoint, "embedding")?;
        anyhow::ensure!(!model.trim().is_empty(), "missing embedding model name");
        let client = http::build_client(timeout_secs, http::bearer(api_key), "embedding")
            .context("embedding client setup failed")?;
        Ok(Self {
            client,
            endpoint: endpoint.trim_end_matches('/').to_string(),
            model: model.to_string(),
        })
    }

    pub fn from_config(config: &EmbeddingConfig) -> Result<Self> {
        Self::new(
            &config.url,
            &config.api_key,
            &config.model,
            config.timeout_secs,
        )
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

impl Embedder for HttpEmbedder {
    fn model_name(&self) -> &str {
        &self.model
    }

    fn embed(&self, inputs: &[String]) -> ServiceResult<Vec<Embedded>> {
        if inputs.is_empty() {
            return Ok(Vec::new());
        }
        let request = EmbeddingRequest {
            model: &self.model,
            encoding_format: "float",
            input: inputs,
        };
        let body = http::send_json(self.client.post(&self.endpoint).json(&request))?;
        let raw = body.raw.clone();
        let response: EmbeddingResponse = body.decode()?;
        parse_embedding_response(response, inputs, &raw)
    }
}

#[derive(Serialize)]
struct EmbeddingRequest<'a> {
    model: &'a str,
    encoding_format: &'a str,
    input: &'a [String],
}

#[derive(Debug, Deserialize)]
struct EmbeddingResponse {
    #[serde(default)]
    data: Vec<EmbeddingData>,
}

#[derive(Debug, Deserialize)]
struct EmbeddingData {
    embedding: Vec<f32>,
    #[serde(default)]
    index: Option<usize>,
}

fn parse_embedding_response(
    response: EmbeddingResponse,
    inputs: &[String],
    raw: &str,
) -> ServiceResult<Vec<Embedded>> {
    let data = response.data;
    if data.is_empty() {
        return Err(ServiceError::shape("response has no embedding data", raw));
    }
    if data.len() != inputs.len() || data.iter().all(|d| d.index.is_none()) {
        return align_batch(inputs, data.into_iter().map(|d| d.embedding).collect(), raw);
    }

    // Indices must be a permutation of 0..inputs.len().
    let mut slots: Vec<Option<Vec<f32>>> = vec![None; inputs.len()];
    for item in data {
        let index = item
            .index
            .ok_or_else(|| ServiceError::shape("embedding item without index", raw))?;
        if index >= slots.len() {
            return Err(ServiceError::shape(
                format!(
                    "embedding index {} out of range for {} inputs",
                    index,
                    inputs.len()
                ),
                raw,
            ));
        }
        if slots[index].is_some() {
            return Err(ServiceError::shape(
                format!("embedding index {} returned more than once", index),
                raw,
            ));
        }
        slots[index] = Some(item.embedding);
    }
    let vectors: Vec<Vec<f32>> = slots.into_iter().flatten().collect();
    align_batch(inputs, vectors, raw)
}
