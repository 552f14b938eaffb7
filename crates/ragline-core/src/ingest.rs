//! Write path: chunks → embeddings → vector store.
//!
//! [`IngestionPipeline`] embeds chunks in fixed-size batches and upserts
//! one point per chunk. Identifiers come from an explicit [`IdStrategy`]:
//!
//! - `Sequential { start }` assigns `start + batch_offset + index_in_batch`.
//!   Re-running with the same `start` overwrites the same points, but if the
//!   chunk count shrinks, the old tail points are left behind. A call whose
//!   last id would pass `u64::MAX` is rejected before anything is embedded.
//! - `ContentHash` derives a UUID from the chunk text, so reruns overwrite
//!   identical chunks regardless of their position.

use std::sync::Arc;

use crate::embedding::Embedder;
use crate::error::{ServiceError, ServiceResult};
use crate::models::{Chunk, Distance, Payload, PointId, StoredPoint};
use crate::store::VectorStore;

/// Default number of chunks per embedding request.
pub const DEFAULT_BATCH_SIZE: usize = 8;

/// How point identifiers are allocated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IdStrategy {
    Sequential { start: u64 },
    ContentHash,
}

impl IdStrategy {
    /// Identifier for `chunk` at absolute `position` within the ingest call.
    ///
    /// Fails with [`ServiceError::InvalidRequest`] when a sequential id would
    /// exceed `u64::MAX`.
    pub fn assign(&self, chunk: &Chunk, position: usize) -> ServiceResult<PointId> {
        match self {
            IdStrategy::Sequential { start } => start
                .checked_add(position as u64)
                .map(PointId::Num)
                .ok_or_else(|| {
                    ServiceError::InvalidRequest(format!(
                        "point id overflows u64: start {} + position {}",
                        start, position
                    ))
                }),
            IdStrategy::ContentHash => Ok(chunk.content_id()),
        }
    }
}

/// What to do when a batch fails with a non-transport error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FailurePolicy {
    /// Return the error and stop.
    #[default]
    FailFast,
    /// Log, count the batch as skipped, and continue.
    SkipBatch,
}

/// Outcome of one ingest call.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IngestReport {
    pub batches: usize,
    pub upserted: usize,
    pub skipped: usize,
}

/// Batches chunks through an [`Embedder`] into a [`VectorStore`] collection.
pub struct IngestionPipeline {
    embedder: Arc<dyn Embedder>,
    store: Arc<dyn VectorStore>,
    collection: String,
    batch_size: usize,
    failure_policy: FailurePolicy,
}

impl IngestionPipeline {
    pub fn new(
        embedder: Arc<dyn Embedder>,
        store: Arc<dyn VectorStore>,
        collection: impl Into<String>,
    ) -> Self {
        Self {
            embedder,
            store,
            collection: collection.into(),
            batch_size: DEFAULT_BATCH_SIZE,
            failure_policy: FailurePolicy::default(),
        }
    }

    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size.max(1);
        self
    }

    pub fn with_failure_policy(mut self, policy: FailurePolicy) -> Self {
        self.failure_policy = policy;
        self
    }

    pub fn collection(&self) -> &str {
        &self.collection
    }

    pub fn batch_size(&self) -> usize {
        self.batch_size
    }

    /// Create the collection unless it already exists. Returns `true` when
    /// it was created.
    pub fn ensure_collection(&self, vector_size: usize, distance: Distance) -> ServiceResult<bool> {
        if self.store.collection_exists(&self.collection)? {
            return Ok(false);
        }
        self.store
            .create_collection(&self.collection, vector_size, distance)?;
        tracing::info!(
            collection = %self.collection,
            vector_size,
            ?distance,
            "created collection"
        );
        Ok(true)
    }

    /// Ingest with sequential identifiers starting at `start_id`.
    pub fn ingest(&self, chunks: &[Chunk], start_id: u64) -> ServiceResult<IngestReport> {
        self.ingest_with(chunks, &IdStrategy::Sequential { start: start_id })
    }

    /// Ingest with an explicit identifier strategy.
    pub fn ingest_with(&self, chunks: &[Chunk], ids: &IdStrategy) -> ServiceResult<IngestReport> {
        // The last position has the largest id; reject the whole call before
        // anything is embedded or written.
        if let Some(last) = chunks.last() {
            ids.assign(last, chunks.len() - 1)?;
        }

        let mut report = IngestReport::default();

        for (batch_index, batch) in chunks.chunks(self.batch_size).enumerate() {
            let offset = batch_index * self.batch_size;
            report.batches += 1;

            let texts: Vec<String> = batch.iter().map(|c| c.as_str().to_string()).collect();
            let embedded = match self.embedder.embed(&texts) {
                Ok(e) if e.len() == batch.len() => e,
                Ok(e) => {
                    let err = ServiceError::shape(
                        format!("received {} embeddings for {} chunks", e.len(), batch.len()),
                        format!("batch at offset {}", offset),
                    );
                    self.on_batch_failure(err, offset, batch.len(), &mut report)?;
                    continue;
                }
                Err(err) => {
                    self.on_batch_failure(err, offset, batch.len(), &mut report)?;
                    continue;
                }
            };

            let points: Vec<StoredPoint> = embedded
                .into_iter()
                .zip(batch)
                .enumerate()
                .map(|(idx, (e, chunk))| {
                    Ok(StoredPoint {
                        id: ids.assign(chunk, offset + idx)?,
                        vector: e.vector,
                        payload: Payload { text: e.text },
                    })
                })
                .collect::<ServiceResult<_>>()?;

            match self.store.upsert(&self.collection, &points) {
                Ok(()) => {
                    report.upserted += points.len();
                    tracing::debug!(
                        collection = %self.collection,
                        offset,
                        points = points.len(),
                        "upserted batch"
                    );
                }
                Err(err) => {
                    self.on_batch_failure(err, offset, batch.len(), &mut report)?;
                }
            }
        }

        tracing::info!(
            collection = %self.collection,
            batches = report.batches,
            upserted = report.upserted,
            skipped = report.skipped,
            "ingest finished"
        );
        Ok(report)
    }

    /// Apply the failure policy: propagate, or log and count the batch as
    /// skipped.
    fn on_batch_failure(
        &self,
        err: ServiceError,
        offset: usize,
        len: usize,
        report: &mut IngestReport,
    ) -> ServiceResult<()> {
        if err.is_transport() || self.failure_policy == FailurePolicy::FailFast {
            return Err(err);
        }
        tracing::warn!(offset, len, error = %err, "skipping failed batch");
        report.skipped += len;
        Ok(())
    }
}
