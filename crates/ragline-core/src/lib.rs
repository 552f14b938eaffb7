//! # ragline core
//!
//! Transport-free logic for ragline: the sentence-aware chunker, data
//! models, the [`Embedder`](embedding::Embedder), [`Reranker`](rerank::Reranker)
//! and [`VectorStore`](store::VectorStore) traits, and the ingestion and
//! retrieve-then-rerank pipelines built on top of them.
//!
//! This crate contains no HTTP client or filesystem code. Concrete service
//! clients live in the `ragline` application crate; [`store::memory`]
//! provides an in-process store for tests and small corpora.

pub mod chunk;
pub mod embedding;
pub mod error;
pub mod ingest;
pub mod models;
pub mod rerank;
pub mod search;
pub mod store;

pub use error::{Degrade, ServiceError, ServiceResult};
