//! Vector storage abstraction.
//!
//! The [`VectorStore`] trait covers the collection and point operations the
//! ingestion and retrieval pipelines need. The app crate ships a Qdrant
//! REST implementation; [`memory::InMemoryStore`] is a brute-force store
//! for tests and small corpora.
//!
//! # Operations
//!
//! | Method | Purpose |
//! |--------|---------|
//! | [`collection_exists`](VectorStore::collection_exists) | Check for a named collection |
//! | [`create_collection`](VectorStore::create_collection) | Create a collection with fixed dimensionality |
//! | [`upsert`](VectorStore::upsert) | Insert or overwrite points by id |
//! | [`search`](VectorStore::search) | Nearest-neighbor query |
//! | [`count`](VectorStore::count) | Number of stored points |
//! | [`delete_collection`](VectorStore::delete_collection) | Drop a collection and its points |

pub mod memory;

use crate::error::ServiceResult;
use crate::models::{Candidate, Distance, StoredPoint};

/// Persists `(id, vector, payload)` points in named collections.
///
/// Calls block until the backend answers.
pub trait VectorStore: Send + Sync {
    fn collection_exists(&self, name: &str) -> ServiceResult<bool>;

    fn create_collection(
        &self,
        name: &str,
        vector_size: usize,
        distance: Distance,
    ) -> ServiceResult<()>;

    /// Insert or overwrite `points`. Points whose id already exists are
    /// replaced.
    fn upsert(&self, collection: &str, points: &[StoredPoint]) -> ServiceResult<()>;

    /// Return at most `limit` points closest to `vector`, best first.
    fn search(
        &self,
        collection: &str,
        vector: &[f32],
        limit: usize,
    ) -> ServiceResult<Vec<Candidate>>;

    fn count(&self, collection: &str) -> ServiceResult<u64>;

    /// Delete a collection. Returns `false` if it did not exist.
    fn delete_collection(&self, name: &str) -> ServiceResult<bool>;
}
