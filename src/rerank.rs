//! HTTP rerank client for `/v1/rerank` endpoints (Jina / SiliconFlow /
//! text-embeddings-inference style).
//!
//! Sends `{model, top_n, documents, query}` and expects a `results` array
//! of `{index, relevance_score}` objects, which are mapped back to the
//! document texts and sorted by descending score.

use anyhow::{Context, Result};
use ragline_core::models::RankedResult;
use ragline_core::rerank::{resolve_scores, Reranker};
use ragline_core::{ServiceError, ServiceResult};
use reqwest::blocking::Client;
use serde::{Deserialize, Serialize};

use crate::config::Config;
use crate::http;

/// Blocking client for a rerank endpoint.
pub struct HttpReranker {
    client: Client,
    endpoint: String,
    model: String,
}

impl HttpReranker {
    pub fn new(endpoint: &str, api_key: &str, model: &str, timeout_secs: u64) -> Result<Self> {
        http::ensure_http_url(endpoint, "rerank")?;
        anyhow::ensure!(!model.trim().is_empty(), "missing rerank model name");
        let client = http::build_client(timeout_secs, http::bearer(api_key), "rerank")
            .context("rerank client setup failed")?;
        Ok(Self {
            client,
            endpoint: endpoint.trim_end_matches('/').to_string(),
            model: model.to_string(),
        })
    }

    /// Uses `[rerank]`, falling back to the embedding key when the rerank
    /// key is unset.
    pub fn from_config(config: &Config) -> Result<Self> {
        Self::new(
            &config.rerank.url,
            config.rerank_api_key(),
            &config.rerank.model,
            config.rerank.timeout_secs,
        )
    }
}

impl Reranker for HttpReranker {
    fn model_name(&self) -> &str {
        &self.model
    }

    fn rerank(
        &self,
        documents: &[String],
        query: &str,
        top_n: usize,
    ) -> ServiceResult<Vec<RankedResult>> {
        if documents.is_empty() || top_n == 0 {
            return Ok(Vec::new());
        }
        let request = RerankRequest {
            model: &self.model,
            top_n,
            documents,
            query,
        };
        let body = http::send_json(self.client.post(&self.endpoint).json(&request))?;
        let raw = body.raw.clone();
        let response: RerankResponse = body.decode()?;
        parse_rerank_response(response, documents, top_n, &raw)
    }
}

#[derive(Serialize)]
struct RerankRequest<'a> {
    model: &'a str,
    top_n: usize,
    documents: &'a [String],
    query: &'a str,
}

#[derive(Debug, Deserialize)]
struct RerankResponse {
    #[serde(default)]
    results: Vec<RerankItem>,
}

#[derive(Debug, Deserialize)]
struct RerankItem {
    index: usize,
    relevance_score: f32,
}

fn parse_rerank_response(
    response: RerankResponse,
    documents: &[String],
    top_n: usize,
    raw: &str,
) -> ServiceResult<Vec<RankedResult>> {
    if response.results.is_empty() {
        return Err(ServiceError::shape("response has no rerank results", raw));
    }
    let scores: Vec<(usize, f32)> = response
        .results
        .iter()
        .map(|r| (r.index, r.relevance_score))
        .collect();
    resolve_scores(documents, top_n, &scores, raw)
}
