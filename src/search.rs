//! `ragline search`: embed the query, fetch nearest candidates, rerank,
//! and print the best texts.
//!
//! A failed query embedding, vector search, or rerank call (bad status or
//! malformed response) is logged and prints no results instead of aborting.
//! Transport failures and a zero `--limit` still abort.

use anyhow::{Context, Result};
use ragline_core::Degrade;

use crate::services::Services;

/// Flags of `ragline search`. `None` falls back to `[retrieval]`.
#[derive(Debug, Clone, Default)]
pub struct SearchOptions {
    pub limit: Option<usize>,
    pub top: Option<usize>,
    /// Keep results whose relevance score is not positive.
    pub all: bool,
}

pub fn run_search(services: &Services, query: &str, opts: &SearchOptions) -> Result<Vec<String>> {
    let retrieval = &services.config().retrieval;
    let limit = opts.limit.unwrap_or(retrieval.limit);
    let top = opts.top.unwrap_or(retrieval.top_n);

    anyhow::ensure!(limit >= 1, "search limit must be >= 1");

    let pipeline = services.retrieval();
    let results = match pipeline.search(query, limit) {
        Ok(results) => results,
        Err(err) if !err.is_transport() => {
            tracing::warn!(
                collection = %pipeline.collection(),
                error = %err,
                "search failed, continuing with empty result"
            );
            println!("No results.");
            return Ok(Vec::new());
        }
        Err(err) => {
            return Err(err).with_context(|| {
                format!("Search failed in collection '{}'", pipeline.collection())
            })
        }
    };
    tracing::debug!(query, candidates = results.len(), limit, "retrieved candidates");

    let texts = results.top(Some(top), !opts.all).degrade()?;

    if texts.is_empty() {
        println!("No results.");
        return Ok(texts);
    }
    for (i, text) in texts.iter().enumerate() {
        println!("{}. {}", i + 1, text.replace('\n', " ").trim());
    }
    Ok(texts)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ingest::{run_ingest, IngestOptions};
    use crate::testing::memory_services;
    use tempfile::TempDir;

    fn seeded() -> (Services, TempDir) {
        let tmp = TempDir::new().unwrap();
        std::fs::write(
            tmp.path().join("zoo.txt"),
            "The panda eats bamboo!\nA bear sleeps in winter!\nRust is a language?\n",
        )
        .unwrap();
        let (services, _) = memory_services();
        let opts = IngestOptions {
            max_chars: Some(1),
            ..Default::default()
        };
        run_ingest(&services, &[tmp.path().to_path_buf()], &opts).unwrap();
        (services, tmp)
    }

    #[test]
    fn test_search_filters_unrelated() {
        let (services, _tmp) = seeded();
        let texts = run_search(
            &services,
            "panda bamboo",
            &SearchOptions {
                limit: Some(3),
                ..Default::default()
            },
        )
        .unwrap();
        assert_eq!(texts, vec!["The panda eats bamboo!"]);
    }

    #[test]
    fn test_search_all_keeps_negative_scores() {
        let (services, _tmp) = seeded();
        let texts = run_search(
            &services,
            "panda",
            &SearchOptions {
                limit: Some(3),
                top: Some(3),
                all: true,
            },
        )
        .unwrap();
        assert_eq!(texts.len(), 3);
        assert_eq!(texts[0], "The panda eats bamboo!");
    }

    #[test]
    fn test_search_top_caps_results() {
        let (services, _tmp) = seeded();
        let texts = run_search(
            &services,
            "a",
            &SearchOptions {
                limit: Some(3),
                top: Some(1),
                all: true,
            },
        )
        .unwrap();
        assert_eq!(texts.len(), 1);
    }

    #[test]
    fn test_search_missing_collection_prints_nothing() {
        let (services, _) = memory_services();
        let texts = run_search(&services, "panda", &SearchOptions::default()).unwrap();
        assert!(texts.is_empty());
    }

    #[test]
    fn test_search_zero_limit_fails() {
        let (services, _tmp) = seeded();
        let opts = SearchOptions {
            limit: Some(0),
            ..Default::default()
        };
        assert!(run_search(&services, "panda", &opts).is_err());
    }
}
