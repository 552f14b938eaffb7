//! Service wiring.
//!
//! Builds the embedding, rerank, and vector-store clients once from a
//! [`Config`] and hands out pipelines that share them.

use std::sync::Arc;

use anyhow::Result;
use ragline_core::chunk::Chunker;
use ragline_core::embedding::Embedder;
use ragline_core::ingest::{FailurePolicy, IngestionPipeline};
use ragline_core::rerank::Reranker;
use ragline_core::search::RetrievalPipeline;
use ragline_core::store::VectorStore;

use crate::config::Config;
use crate::embedding::HttpEmbedder;
use crate::qdrant::QdrantStore;
use crate::rerank::HttpReranker;

/// Shared handles to the three external collaborators plus the config
/// they were built from.
pub struct Services {
    config: Config,
    embedder: Arc<dyn Embedder>,
    reranker: Arc<dyn Reranker>,
    store: Arc<dyn VectorStore>,
}

impl Services {
    /// Build HTTP clients for every service named in `config`.
    pub fn from_config(config: Config) -> Result<Self> {
        let embedder = Arc::new(HttpEmbedder::from_config(&config.embedding)?);
        let reranker = Arc::new(HttpReranker::from_config(&config)?);
        let store = Arc::new(QdrantStore::from_config(&config.store)?);
        tracing::debug!(
            embedding_model = %config.embedding.model,
            rerank_model = %config.rerank.model,
            store = %config.store.url,
            collection = %config.store.collection,
            "services configured"
        );
        Ok(Self::with_backends(config, embedder, reranker, store))
    }

    /// Use caller-supplied backends, e.g. an in-memory store.
    pub fn with_backends(
        config: Config,
        embedder: Arc<dyn Embedder>,
        reranker: Arc<dyn Reranker>,
        store: Arc<dyn VectorStore>,
    ) -> Self {
        Self {
            config,
            embedder,
            reranker,
            store,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn collection(&self) -> &str {
        &self.config.store.collection
    }

    pub fn store(&self) -> &dyn VectorStore {
        self.store.as_ref()
    }

    /// Chunker using `max_chars`, or `[chunking] max_chars` when `None`.
    pub fn chunker(&self, max_chars: Option<usize>) -> Chunker {
        Chunker::new(max_chars.unwrap_or(self.config.chunking.max_chars))
    }

    pub fn ingestion(&self, batch_size: Option<usize>, policy: FailurePolicy) -> IngestionPipeline {
        IngestionPipeline::new(
            Arc::clone(&self.embedder),
            Arc::clone(&self.store),
            self.collection(),
        )
        .with_batch_size(batch_size.unwrap_or(self.config.ingest.batch_size))
        .with_failure_policy(policy)
    }

    pub fn retrieval(&self) -> RetrievalPipeline {
        RetrievalPipeline::new(
            Arc::clone(&self.embedder),
            Arc::clone(&self.store),
            Arc::clone(&self.reranker),
            self.collection(),
        )
    }
}
