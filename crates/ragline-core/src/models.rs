//! Core data models.
//!
//! These types flow through the write path (`Chunk` → `Embedded` →
//! `StoredPoint`) and the read path (`Candidate` → `RankedResult`).

use std::fmt;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use uuid::Uuid;

/// A trimmed, non-empty text segment produced by the
/// [`Chunker`](crate::chunk::Chunker). Carries nothing but its text.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Chunk {
    text: String,
}

impl Chunk {
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }

    pub fn as_str(&self) -> &str {
        &self.text
    }

    pub fn into_text(self) -> String {
        self.text
    }

    /// Number of Unicode code points in the chunk.
    pub fn char_len(&self) -> usize {
        self.text.chars().count()
    }

    /// SHA-256 of the chunk text, hex encoded.
    pub fn content_hash(&self) -> String {
        let mut hasher = Sha256::new();
        hasher.update(self.text.as_bytes());
        format!("{:x}", hasher.finalize())
    }

    /// Deterministic point identifier derived from the content hash.
    pub fn content_id(&self) -> PointId {
        let digest = Sha256::digest(self.text.as_bytes());
        let mut bytes = [0u8; 16];
        bytes.copy_from_slice(&digest[..16]);
        PointId::Uuid(Uuid::from_bytes(bytes))
    }
}

impl From<&str> for Chunk {
    fn from(text: &str) -> Self {
        Chunk::new(text)
    }
}

impl From<String> for Chunk {
    fn from(text: String) -> Self {
        Chunk::new(text)
    }
}

impl AsRef<str> for Chunk {
    fn as_ref(&self) -> &str {
        &self.text
    }
}

impl fmt::Display for Chunk {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

/// An input text paired with its embedding vector.
#[derive(Debug, Clone, PartialEq)]
pub struct Embedded {
    pub text: String,
    pub vector: Vec<f32>,
}

/// Point identifier within a collection. Qdrant accepts both forms.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PointId {
    Num(u64),
    Uuid(Uuid),
}

impl fmt::Display for PointId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PointId::Num(n) => write!(f, "{}", n),
            PointId::Uuid(u) => write!(f, "{}", u),
        }
    }
}

impl From<u64> for PointId {
    fn from(n: u64) -> Self {
        PointId::Num(n)
    }
}

/// Payload attached to every stored point.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Payload {
    pub text: String,
}

/// A point as written to a [`VectorStore`](crate::store::VectorStore).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StoredPoint {
    pub id: PointId,
    pub vector: Vec<f32>,
    pub payload: Payload,
}

/// A nearest-neighbor hit. Lives only for the duration of one query.
#[derive(Debug, Clone, PartialEq)]
pub struct Candidate {
    pub id: PointId,
    /// Similarity reported by the store; higher is closer.
    pub score: f32,
    pub text: String,
}

/// A reranked document. `relevance_score` is an opaque ordering key whose
/// range depends on the rerank model.
#[derive(Debug, Clone, PartialEq)]
pub struct RankedResult {
    pub text: String,
    pub relevance_score: f32,
}

/// Vector distance metric of a collection, using Qdrant's names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Distance {
    #[default]
    Cosine,
    Dot,
    Euclid,
    Manhattan,
}

impl std::str::FromStr for Distance {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "cosine" => Ok(Distance::Cosine),
            "dot" => Ok(Distance::Dot),
            "euclid" | "euclidean" => Ok(Distance::Euclid),
            "manhattan" => Ok(Distance::Manhattan),
            other => Err(format!(
                "unknown distance '{}': expected cosine, dot, euclid or manhattan",
                other
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_content_id_is_deterministic() {
        let a = Chunk::new("same text");
        let b = Chunk::new("same text");
        let c = Chunk::new("other text");
        assert_eq!(a.content_id(), b.content_id());
        assert_ne!(a.content_id(), c.content_id());
        assert_eq!(a.content_hash().len(), 64);
    }

    #[test]
    fn test_point_id_serializes_untagged() {
        assert_eq!(serde_json::to_string(&PointId::Num(7)).unwrap(), "7");
        let id = Chunk::new("x").content_id();
        let json = serde_json::to_string(&id).unwrap();
        assert!(json.starts_with('"') && json.len() == 38);
    }

    #[test]
    fn test_distance_parse() {
        assert_eq!("COSINE".parse::<Distance>().unwrap(), Distance::Cosine);
        assert_eq!("euclidean".parse::<Distance>().unwrap(), Distance::Euclid);
        assert!("hamming".parse::<Distance>().is_err());
        assert_eq!(serde_json::to_string(&Distance::Dot).unwrap(), "\"Dot\"");
    }

    #[test]
    fn test_char_len_counts_code_points() {
        assert_eq!(Chunk::new("机器人").char_len(), 3);
    }
}
