//! [`VectorStore`] backed by the Qdrant REST API.
//!
//! | Operation | Request |
//! |-----------|---------|
//! | exists | `GET /collections/{name}/exists` |
//! | create | `PUT /collections/{name}` |
//! | upsert | `PUT /collections/{name}/points?wait=true` |
//! | search | `POST /collections/{name}/points/search` |
//! | count | `POST /collections/{name}/points/count` |
//! | delete | `DELETE /collections/{name}` |
//!
//! Every reply is wrapped in Qdrant's `{"result": ..., "status": ...}`
//! envelope. The `api-key` header is only sent when a key is configured.

use anyhow::{Context, Result};
use ragline_core::models::{Candidate, Distance, PointId, StoredPoint};
use ragline_core::store::VectorStore;
use ragline_core::{ServiceError, ServiceResult};
use reqwest::blocking::Client;
use reqwest::header::HeaderName;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::config::StoreConfig;
use crate::http;

pub struct QdrantStore {
    client: Client,
    base_url: String,
}

impl QdrantStore {
    pub fn new(base_url: &str, api_key: &str, timeout_secs: u64) -> Result<Self> {
        http::ensure_http_url(base_url, "qdrant")?;
        let auth = if api_key.trim().is_empty() {
            None
        } else {
            Some((HeaderName::from_static("api-key"), api_key.to_string()))
        };
        let client = http::build_client(timeout_secs, auth, "qdrant")
            .context("qdrant client setup failed")?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn from_config(config: &StoreConfig) -> Result<Self> {
        Self::new(&config.url, &config.api_key, config.timeout_secs)
    }

    fn collection_url(&self, name: &str) -> String {
        format!("{}/collections/{}", self.base_url, name)
    }

    fn result<T: DeserializeOwned>(request: reqwest::blocking::RequestBuilder) -> ServiceResult<T> {
        let envelope: Envelope<T> = http::send_json(request)?.decode()?;
        Ok(envelope.result)
    }
}

#[derive(Deserialize)]
struct Envelope<T> {
    result: T,
}

#[derive(Deserialize)]
struct ExistsResult {
    exists: bool,
}

#[derive(Deserialize)]
struct CountResult {
    count: u64,
}

/// Search hit. The payload stays untyped: points without a string `text`
/// are skipped, not rejected.
#[derive(Deserialize)]
struct ScoredPoint {
    id: PointId,
    score: f32,
    #[serde(default)]
    payload: Option<serde_json::Value>,
}

impl ScoredPoint {
    fn text(&self) -> Option<&str> {
        self.payload.as_ref()?.get("text")?.as_str()
    }
}

/// Convert hits to candidates, skipping points without a string `text`.
fn into_candidates(hits: Vec<ScoredPoint>) -> Vec<Candidate> {
    let mut candidates = Vec::with_capacity(hits.len());
    for hit in hits {
        match hit.text().map(str::to_string) {
            Some(text) => candidates.push(Candidate {
                id: hit.id,
                score: hit.score,
                text,
            }),
            None => tracing::warn!(id = %hit.id, "search hit has no text payload, skipping"),
        }
    }
    candidates
}

#[derive(Serialize)]
struct UpsertBody<'a> {
    points: &'a [StoredPoint],
}

impl VectorStore for QdrantStore {
    fn collection_exists(&self, name: &str) -> ServiceResult<bool> {
        let url = format!("{}/exists", self.collection_url(name));
        let result: ExistsResult = Self::result(self.client.get(url))?;
        Ok(result.exists)
    }

    fn create_collection(
        &self,
        name: &str,
        vector_size: usize,
        distance: Distance,
    ) -> ServiceResult<()> {
        if vector_size == 0 {
            return Err(ServiceError::InvalidRequest(
                "vector size must be positive".to_string(),
            ));
        }
        let body = json!({ "vectors": { "size": vector_size, "distance": distance } });
        let created: bool = Self::result(self.client.put(self.collection_url(name)).json(&body))?;
        if !created {
            return Err(ServiceError::shape(
                format!("qdrant refused to create collection '{}'", name),
                body.to_string(),
            ));
        }
        tracing::debug!(collection = name, vector_size, ?distance, "qdrant collection created");
        Ok(())
    }

    fn upsert(&self, collection: &str, points: &[StoredPoint]) -> ServiceResult<()> {
        if points.is_empty() {
            return Ok(());
        }
        let url = format!("{}/points?wait=true", self.collection_url(collection));
        let _: serde_json::Value =
            Self::result(self.client.put(url).json(&UpsertBody { points }))?;
        tracing::debug!(collection, points = points.len(), "upserted points");
        Ok(())
    }

    fn search(
        &self,
        collection: &str,
        vector: &[f32],
        limit: usize,
    ) -> ServiceResult<Vec<Candidate>> {
        let url = format!("{}/points/search", self.collection_url(collection));
        let body = json!({ "vector": vector, "limit": limit, "with_payload": true });
        let hits: Vec<ScoredPoint> = Self::result(self.client.post(url).json(&body))?;
        Ok(into_candidates(hits))
    }

    fn count(&self, collection: &str) -> ServiceResult<u64> {
        let url = format!("{}/points/count", self.collection_url(collection));
        let result: CountResult = Self::result(self.client.post(url).json(&json!({ "exact": true })))?;
        Ok(result.count)
    }

    fn delete_collection(&self, name: &str) -> ServiceResult<bool> {
        match Self::result::<bool>(self.client.delete(self.collection_url(name))) {
            Ok(deleted) => Ok(deleted),
            Err(ServiceError::Status { status: 404, .. }) => Ok(false),
            Err(err) => Err(err),
        }
    }
}
