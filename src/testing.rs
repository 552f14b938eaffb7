//! In-process stand-ins for the external services.

use std::sync::Arc;

use ragline_core::embedding::Embedder;
use ragline_core::models::{Embedded, RankedResult};
use ragline_core::rerank::{sort_by_relevance, Reranker};
use ragline_core::store::memory::InMemoryStore;
use ragline_core::ServiceResult;

use crate::config::Config;
use crate::services::Services;

pub(crate) const DIM: usize = 4;

/// Vowel histogram; texts sharing vowels land close together.
pub(crate) struct VowelEmbedder;

impl Embedder for VowelEmbedder {
    fn model_name(&self) -> &str {
        "vowels"
    }

    fn embed(&self, inputs: &[String]) -> ServiceResult<Vec<Embedded>> {
        Ok(inputs
            .iter()
            .map(|text| {
                let mut vector = vec![0.1; DIM];
                for c in text.to_lowercase().chars() {
                    match c {
                        'a' => vector[0] += 1.0,
                        'e' => vector[1] += 1.0,
                        'i' => vector[2] += 1.0,
                        'o' | 'u' => vector[3] += 1.0,
                        _ => {}
                    }
                }
                Embedded {
                    text: text.clone(),
                    vector,
                }
            })
            .collect())
    }
}

/// Scores each document by the number of query words it contains,
/// minus one half, so documents sharing no words score below zero.
pub(crate) struct OverlapReranker;

impl Reranker for OverlapReranker {
    fn model_name(&self) -> &str {
        "overlap"
    }

    fn rerank(
        &self,
        documents: &[String],
        query: &str,
        top_n: usize,
    ) -> ServiceResult<Vec<RankedResult>> {
        let words: Vec<String> = query.split_whitespace().map(str::to_lowercase).collect();
        let mut ranked: Vec<RankedResult> = documents
            .iter()
            .map(|doc| {
                let lower = doc.to_lowercase();
                let hits = words.iter().filter(|w| lower.contains(w.as_str())).count();
                RankedResult {
                    text: doc.clone(),
                    relevance_score: hits as f32 - 0.5,
                }
            })
            .collect();
        sort_by_relevance(&mut ranked);
        ranked.truncate(top_n);
        Ok(ranked)
    }
}

/// Services over an in-memory store with a 4-dimensional collection.
pub(crate) fn memory_services() -> (Services, Arc<InMemoryStore>) {
    let mut config = Config::default();
    config.store.vector_size = DIM;
    let store = Arc::new(InMemoryStore::new());
    let services = Services::with_backends(
        config,
        Arc::new(VowelEmbedder),
        Arc::new(OverlapReranker),
        store.clone(),
    );
    (services, store)
}
