//! # ragline
//!
//! Sentence-aware chunking, embedding ingestion into Qdrant, and
//! two-stage retrieval (nearest neighbors, then a cross-encoder rerank).
//!
//! The algorithms live in the `ragline-core` crate behind the
//! `Embedder`, `Reranker`, and `VectorStore` traits. This crate supplies
//! the HTTP implementations of those traits, configuration, input file
//! handling, and the `ragline` CLI.
//!
//! ## Architecture
//!
//! ```text
//! ┌────────────┐   ┌──────────────┐   ┌──────────────┐
//! │ text / .gz │──▶│   Chunker    │──▶│  Embedder    │──┐
//! └────────────┘   └──────────────┘   │ /v1/embeddings│  │ upsert
//!                                     └──────────────┘  ▼
//!                  ┌──────────────┐   ┌──────────────┐
//!   query ────────▶│  Embedder    │──▶│    Qdrant    │
//!                  └──────────────┘   └──────┬───────┘
//!                                            │ candidates
//!                                     ┌──────▼───────┐
//!                                     │  Reranker    │──▶ top texts
//!                                     │  /v1/rerank  │
//!                                     └──────────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```bash
//! ragline init                          # create the collection
//! ragline ingest ./docs                 # chunk, embed, upsert
//! ragline search "What is a panda?"     # retrieve + rerank
//! ```
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | TOML configuration and environment overrides |
//! | [`embedding`] | OpenAI-compatible embedding client |
//! | [`rerank`] | Rerank client |
//! | [`qdrant`] | Qdrant REST vector store |
//! | [`input`] | Input discovery and gzip-aware reading |
//! | [`services`] | Client construction and pipeline wiring |
//! | [`ingest`] | `chunk` and `ingest` commands |
//! | [`search`] | `search` command |
//! | [`collection`] | `init`, `count`, and `drop` commands |

pub mod collection;
pub mod config;
pub mod embedding;
mod http;
pub mod ingest;
pub mod input;
pub mod qdrant;
pub mod rerank;
pub mod search;
pub mod services;

#[cfg(test)]
mod testing;
