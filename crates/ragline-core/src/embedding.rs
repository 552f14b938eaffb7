//! Embedding service trait and vector utilities.
//!
//! Defines the [`Embedder`] trait that every embedding backend implements,
//! plus the batch-alignment check shared by all of them. The HTTP client
//! lives in the `ragline` app crate.

use crate::error::{ServiceError, ServiceResult};
use crate::models::Embedded;

/// Maps a batch of strings to embedding vectors.
///
/// Implementations must return exactly one [`Embedded`] per input, in input
/// order, or fail the whole batch. Empty input must not reach the service.
pub trait Embedder: Send + Sync {
    /// Returns the model identifier (e.g. `"text-embedding-3-small"`).
    fn model_name(&self) -> &str;

    /// Embed `inputs` in one request.
    fn embed(&self, inputs: &[String]) -> ServiceResult<Vec<Embedded>>;
}

/// Embed a single query text.
pub fn embed_query(embedder: &dyn Embedder, text: &str) -> ServiceResult<Vec<f32>> {
    embedder
        .embed(&[text.to_string()])?
        .into_iter()
        .next()
        .map(|e| e.vector)
        .ok_or_else(|| ServiceError::shape("empty embedding response for query", text))
}

/// Zip `inputs` with `vectors`, rejecting the batch on any count mismatch.
///
/// `raw` is the service payload, kept for the log line.
pub fn align_batch(
    inputs: &[String],
    vectors: Vec<Vec<f32>>,
    raw: &str,
) -> ServiceResult<Vec<Embedded>> {
    if vectors.len() != inputs.len() {
        return Err(ServiceError::shape(
            format!(
                "received {} embeddings for {} inputs",
                vectors.len(),
                inputs.len()
            ),
            raw,
        ));
    }
    Ok(inputs
        .iter()
        .cloned()
        .zip(vectors)
        .map(|(text, vector)| Embedded { text, vector })
        .collect())
}

/// Compute cosine similarity between two embedding vectors.
///
/// Returns a value in `[-1.0, 1.0]`, or `0.0` for empty vectors, vectors
/// of different lengths, or zero-magnitude vectors.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }

    let mut dot = 0.0f32;
    let mut norm_a = 0.0f32;
    let mut norm_b = 0.0f32;

    for (x, y) in a.iter().zip(b.iter()) {
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }

    let denom = norm_a.sqrt() * norm_b.sqrt();
    if denom < f32::EPSILON {
        return 0.0;
    }

    dot / denom
}
