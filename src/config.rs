//! Configuration: TOML file, then environment overrides, then validation.
//!
//! Every field has a default, so an empty file (or no file at all) yields
//! a working local setup: embeddings on `localhost:8080`, reranking on
//! `localhost:8081`, Qdrant on `localhost:6333`.
//!
//! ```toml
//! [embedding]
//! url = "http://localhost:8080/v1/embeddings"
//! model = "text-embedding-3-small"
//!
//! [store]
//! collection = "my_collection"
//! vector_size = 768
//! distance = "Cosine"
//!
//! [chunking]
//! max_chars = 384
//! ```

use anyhow::{bail, Context, Result};
use ragline_core::models::Distance;
use serde::Deserialize;
use std::path::Path;

pub const ENV_EMBD_URL: &str = "QDRANT_EMBD_URL";
pub const ENV_EMBD_KEY: &str = "QDRANT_EMBD_KEY";
pub const ENV_EMBD_MODEL: &str = "QDRANT_EMBD_MODEL";
pub const ENV_RERANK_URL: &str = "QDRANT_RERANK_URL";
pub const ENV_RERANK_KEY: &str = "QDRANT_RERANK_KEY";
pub const ENV_RERANK_MODEL: &str = "QDRANT_RERANK_MODEL";
pub const ENV_STORE_URL: &str = "QDRANT_URL";
pub const ENV_STORE_KEY: &str = "QDRANT_KEY";
pub const ENV_COLLECTION: &str = "QDRANT_COLLECTION";
pub const ENV_CHUNK_MAX_CHARS: &str = "RAGLINE_CHUNK_MAX_CHARS";
pub const ENV_BATCH_SIZE: &str = "RAGLINE_BATCH_SIZE";

#[derive(Debug, Deserialize, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub embedding: EmbeddingConfig,
    #[serde(default)]
    pub rerank: RerankConfig,
    #[serde(default)]
    pub store: StoreConfig,
    #[serde(default)]
    pub chunking: ChunkingConfig,
    #[serde(default)]
    pub ingest: IngestConfig,
    #[serde(default)]
    pub retrieval: RetrievalConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct EmbeddingConfig {
    #[serde(default = "default_embedding_url")]
    pub url: String,
    #[serde(default = "default_embedding_key")]
    pub api_key: String,
    #[serde(default = "default_embedding_model")]
    pub model: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            url: default_embedding_url(),
            api_key: default_embedding_key(),
            model: default_embedding_model(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

fn default_embedding_url() -> String {
    "http://localhost:8080/v1/embeddings".to_string()
}
fn default_embedding_key() -> String {
    "no-key".to_string()
}
fn default_embedding_model() -> String {
    "text-embedding-3-small".to_string()
}
fn default_timeout_secs() -> u64 {
    100
}

#[derive(Debug, Deserialize, Clone)]
pub struct RerankConfig {
    #[serde(default = "default_rerank_url")]
    pub url: String,
    /// Falls back to the embedding key when unset.
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default = "default_rerank_model")]
    pub model: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for RerankConfig {
    fn default() -> Self {
        Self {
            url: default_rerank_url(),
            api_key: None,
            model: default_rerank_model(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

fn default_rerank_url() -> String {
    "http://localhost:8081/v1/rerank".to_string()
}
fn default_rerank_model() -> String {
    "BAAI/bge-reranker-v2-m3".to_string()
}

#[derive(Debug, Deserialize, Clone)]
pub struct StoreConfig {
    #[serde(default = "default_store_url")]
    pub url: String,
    /// Sent as the `api-key` header; empty means no header.
    #[serde(default)]
    pub api_key: String,
    #[serde(default = "default_collection")]
    pub collection: String,
    #[serde(default = "default_vector_size")]
    pub vector_size: usize,
    #[serde(default)]
    pub distance: Distance,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            url: default_store_url(),
            api_key: String::new(),
            collection: default_collection(),
            vector_size: default_vector_size(),
            distance: Distance::default(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

fn default_store_url() -> String {
    "http://localhost:6333".to_string()
}
fn default_collection() -> String {
    "my_collection".to_string()
}
fn default_vector_size() -> usize {
    768
}

#[derive(Debug, Deserialize, Clone)]
pub struct ChunkingConfig {
    #[serde(default = "default_max_chars")]
    pub max_chars: usize,
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self {
            max_chars: default_max_chars(),
        }
    }
}

fn default_max_chars() -> usize {
    ragline_core::chunk::DEFAULT_MAX_CHARS
}

#[derive(Debug, Deserialize, Clone)]
pub struct IngestConfig {
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,
    #[serde(default = "default_include_globs")]
    pub include_globs: Vec<String>,
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            batch_size: default_batch_size(),
            include_globs: default_include_globs(),
        }
    }
}

fn default_batch_size() -> usize {
    ragline_core::ingest::DEFAULT_BATCH_SIZE
}
fn default_include_globs() -> Vec<String> {
    vec![
        "**/*.md".to_string(),
        "**/*.txt".to_string(),
        "**/*.gz".to_string(),
    ]
}

#[derive(Debug, Deserialize, Clone)]
pub struct RetrievalConfig {
    /// Nearest-neighbor candidates fetched and reranked per query.
    #[serde(default = "default_limit")]
    pub limit: usize,
    /// Results shown after reranking.
    #[serde(default = "default_top_n")]
    pub top_n: usize,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            limit: default_limit(),
            top_n: default_top_n(),
        }
    }
}

fn default_limit() -> usize {
    5
}
fn default_top_n() -> usize {
    3
}

impl Config {
    /// Defaults plus process environment overrides.
    pub fn from_env() -> Result<Self> {
        let mut config = Config::default();
        config.apply_env_overrides(|key| std::env::var(key).ok())?;
        config.validate()?;
        Ok(config)
    }

    /// Overlay values from `lookup` (normally `std::env::var`).
    pub fn apply_env_overrides<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(v) = lookup(ENV_EMBD_URL) {
            self.embedding.url = v;
        }
        if let Some(v) = lookup(ENV_EMBD_KEY) {
            self.embedding.api_key = v;
        }
        if let Some(v) = lookup(ENV_EMBD_MODEL) {
            self.embedding.model = v;
        }
        if let Some(v) = lookup(ENV_RERANK_URL) {
            self.rerank.url = v;
        }
        if let Some(v) = lookup(ENV_RERANK_KEY) {
            self.rerank.api_key = Some(v);
        }
        if let Some(v) = lookup(ENV_RERANK_MODEL) {
            self.rerank.model = v;
        }
        if let Some(v) = lookup(ENV_STORE_URL) {
            self.store.url = v;
        }
        if let Some(v) = lookup(ENV_STORE_KEY) {
            self.store.api_key = v;
        }
        if let Some(v) = lookup(ENV_COLLECTION) {
            self.store.collection = v;
        }
        if let Some(v) = lookup(ENV_CHUNK_MAX_CHARS) {
            self.chunking.max_chars = v
                .trim()
                .parse()
                .with_context(|| format!("{} must be an integer, got '{}'", ENV_CHUNK_MAX_CHARS, v))?;
        }
        if let Some(v) = lookup(ENV_BATCH_SIZE) {
            self.ingest.batch_size = v
                .trim()
                .parse()
                .with_context(|| format!("{} must be an integer, got '{}'", ENV_BATCH_SIZE, v))?;
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        if self.chunking.max_chars == 0 {
            bail!("chunking.max_chars must be > 0");
        }
        if self.ingest.batch_size == 0 {
            bail!("ingest.batch_size must be > 0");
        }
        if self.store.vector_size == 0 {
            bail!("store.vector_size must be > 0");
        }
        if self.store.collection.trim().is_empty() {
            bail!("store.collection must not be empty");
        }
        if self.retrieval.limit < 1 {
            bail!("retrieval.limit must be >= 1");
        }
        for (name, url) in [
            ("embedding.url", &self.embedding.url),
            ("rerank.url", &self.rerank.url),
            ("store.url", &self.store.url),
        ] {
            if !(url.starts_with("http://") || url.starts_with("https://")) {
                bail!("{} must be an http(s) URL, got '{}'", name, url);
            }
        }
        Ok(())
    }

    /// Rerank API key, defaulting to the embedding key.
    pub fn rerank_api_key(&self) -> &str {
        self.rerank
            .api_key
            .as_deref()
            .unwrap_or(&self.embedding.api_key)
    }
}

/// Parse a TOML config file, then apply environment overrides.
pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    let mut config: Config =
        toml::from_str(&content).with_context(|| "Failed to parse config file")?;
    config.apply_env_overrides(|key| std::env::var(key).ok())?;
    config.validate()?;
    Ok(config)
}

/// Load `path` if it exists, otherwise fall back to [`Config::from_env`].
pub fn load_or_default(path: &Path) -> Result<Config> {
    if path.exists() {
        load_config(path)
    } else {
        tracing::debug!(path = %path.display(), "config file not found, using defaults");
        Config::from_env()
    }
}
