//! In-memory [`VectorStore`] implementation for tests and small corpora.
//!
//! Collections live in a `HashMap` behind `std::sync::RwLock`. Search is
//! brute force over every point. Scores are "higher is closer": cosine
//! similarity, dot product, or the negated Euclidean / Manhattan distance.

use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};

use crate::embedding::cosine_similarity;
use crate::error::{ServiceError, ServiceResult};
use crate::models::{Candidate, Distance, PointId, StoredPoint};

use super::VectorStore;

struct Collection {
    vector_size: usize,
    distance: Distance,
    points: Vec<StoredPoint>,
}

/// Brute-force in-process vector store.
pub struct InMemoryStore {
    collections: RwLock<HashMap<String, Collection>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self {
            collections: RwLock::new(HashMap::new()),
        }
    }

    /// Ids stored in `collection`, in insertion order. Empty when the
    /// collection does not exist.
    pub fn point_ids(&self, collection: &str) -> Vec<PointId> {
        let collections = self.collections.read().unwrap_or_else(PoisonError::into_inner);
        collections
            .get(collection)
            .map(|c| c.points.iter().map(|p| p.id.clone()).collect())
            .unwrap_or_default()
    }
}

impl Default for InMemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

fn not_found(name: &str) -> ServiceError {
    ServiceError::InvalidRequest(format!("collection '{}' not found", name))
}

fn score(distance: Distance, a: &[f32], b: &[f32]) -> f32 {
    match distance {
        Distance::Cosine => cosine_similarity(a, b),
        Distance::Dot => a.iter().zip(b).map(|(x, y)| x * y).sum(),
        Distance::Euclid => -a
            .iter()
            .zip(b)
            .map(|(x, y)| (x - y) * (x - y))
            .sum::<f32>()
            .sqrt(),
        Distance::Manhattan => -a.iter().zip(b).map(|(x, y)| (x - y).abs()).sum::<f32>(),
    }
}

impl VectorStore for InMemoryStore {
    fn collection_exists(&self, name: &str) -> ServiceResult<bool> {
        let collections = self.collections.read().unwrap_or_else(PoisonError::into_inner);
        Ok(collections.contains_key(name))
    }

    fn create_collection(
        &self,
        name: &str,
        vector_size: usize,
        distance: Distance,
    ) -> ServiceResult<()> {
        if vector_size == 0 {
            return Err(ServiceError::InvalidRequest(
                "vector size must be > 0".to_string(),
            ));
        }
        let mut collections = self.collections.write().unwrap_or_else(PoisonError::into_inner);
        if collections.contains_key(name) {
            return Err(ServiceError::InvalidRequest(format!(
                "collection '{}' already exists",
                name
            )));
        }
        collections.insert(
            name.to_string(),
            Collection {
                vector_size,
                distance,
                points: Vec::new(),
            },
        );
        Ok(())
    }

    fn upsert(&self, collection: &str, points: &[StoredPoint]) -> ServiceResult<()> {
        let mut collections = self.collections.write().unwrap_or_else(PoisonError::into_inner);
        let coll = collections
            .get_mut(collection)
            .ok_or_else(|| not_found(collection))?;

        if let Some(bad) = points.iter().find(|p| p.vector.len() != coll.vector_size) {
            return Err(ServiceError::InvalidRequest(format!(
                "point {} has {} dimensions, collection '{}' expects {}",
                bad.id,
                bad.vector.len(),
                collection,
                coll.vector_size
            )));
        }

        for point in points {
            match coll.points.iter_mut().find(|p| p.id == point.id) {
                Some(existing) => *existing = point.clone(),
                None => coll.points.push(point.clone()),
            }
        }
        Ok(())
    }

    fn search(
        &self,
        collection: &str,
        vector: &[f32],
        limit: usize,
    ) -> ServiceResult<Vec<Candidate>> {
        let collections = self.collections.read().unwrap_or_else(PoisonError::into_inner);
        let coll = collections
            .get(collection)
            .ok_or_else(|| not_found(collection))?;

        let mut candidates: Vec<Candidate> = coll
            .points
            .iter()
            .map(|p| Candidate {
                id: p.id.clone(),
                score: score(coll.distance, vector, &p.vector),
                text: p.payload.text.clone(),
            })
            .collect();
        candidates.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        candidates.truncate(limit);
        Ok(candidates)
    }

    fn count(&self, collection: &str) -> ServiceResult<u64> {
        let collections = self.collections.read().unwrap_or_else(PoisonError::into_inner);
        collections
            .get(collection)
            .map(|c| c.points.len() as u64)
            .ok_or_else(|| not_found(collection))
    }

    fn delete_collection(&self, name: &str) -> ServiceResult<bool> {
        let mut collections = self.collections.write().unwrap_or_else(PoisonError::into_inner);
        Ok(collections.remove(name).is_some())
    }
}
