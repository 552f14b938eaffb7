//! Read path: query → embedding → nearest neighbors → rerank.
//!
//! [`RetrievalPipeline::search`] performs the cheap first stage (one query
//! embedding plus one vector search) and returns a [`QueryResultSet`].
//! The expensive rerank pass runs lazily the first time a caller asks for
//! ranked output, and its result is memoized for the lifetime of the set.
//!
//! # Example
//!
//! ```rust,ignore
//! let results = pipeline.search("what is a panda?", 5)?;
//! for text in results.top(Some(3), true)? {
//!     println!("{}", text);
//! }
//! ```

use std::fmt;
use std::sync::{Arc, Mutex, PoisonError};

use crate::embedding::{embed_query, Embedder};
use crate::error::{ServiceError, ServiceResult};
use crate::models::{Candidate, RankedResult};
use crate::rerank::Reranker;
use crate::store::VectorStore;

/// Two-stage retriever over one collection.
pub struct RetrievalPipeline {
    embedder: Arc<dyn Embedder>,
    store: Arc<dyn VectorStore>,
    reranker: Arc<dyn Reranker>,
    collection: String,
}

impl RetrievalPipeline {
    pub fn new(
        embedder: Arc<dyn Embedder>,
        store: Arc<dyn VectorStore>,
        reranker: Arc<dyn Reranker>,
        collection: impl Into<String>,
    ) -> Self {
        Self {
            embedder,
            store,
            reranker,
            collection: collection.into(),
        }
    }

    pub fn collection(&self) -> &str {
        &self.collection
    }

    /// Embed `query` and fetch up to `limit` nearest candidates.
    ///
    /// The returned set reranks on demand, requesting the best `limit`.
    pub fn search(&self, query: &str, limit: usize) -> ServiceResult<QueryResultSet> {
        if limit == 0 {
            return Err(ServiceError::InvalidRequest(
                "search limit must be >= 1".to_string(),
            ));
        }
        let vector = embed_query(self.embedder.as_ref(), query)?;
        let candidates = self.store.search(&self.collection, &vector, limit)?;
        tracing::debug!(
            collection = %self.collection,
            limit,
            candidates = candidates.len(),
            "vector search finished"
        );
        Ok(QueryResultSet::new(
            query,
            limit,
            candidates,
            Arc::clone(&self.reranker),
        ))
    }
}

/// Candidates for one query plus a lazily computed, memoized ranking.
///
/// The reranker is called at most once successfully per set; later calls
/// to [`rerank`](Self::rerank) return the same `Arc`. The memo sits behind
/// a mutex held across the service call, so concurrent callers wait for
/// the first one instead of issuing a second request. Failed calls are not
/// memoized.
pub struct QueryResultSet {
    query: String,
    limit: usize,
    candidates: Vec<Candidate>,
    reranker: Arc<dyn Reranker>,
    ranked: Mutex<Option<Arc<Vec<RankedResult>>>>,
}

impl QueryResultSet {
    pub fn new(
        query: impl Into<String>,
        limit: usize,
        candidates: Vec<Candidate>,
        reranker: Arc<dyn Reranker>,
    ) -> Self {
        Self {
            query: query.into(),
            limit,
            candidates,
            reranker,
            ranked: Mutex::new(None),
        }
    }

    pub fn query(&self) -> &str {
        &self.query
    }

    pub fn limit(&self) -> usize {
        self.limit
    }

    /// Raw nearest-neighbor hits, in store order.
    pub fn candidates(&self) -> &[Candidate] {
        &self.candidates
    }

    pub fn texts(&self) -> Vec<String> {
        self.candidates.iter().map(|c| c.text.clone()).collect()
    }

    pub fn len(&self) -> usize {
        self.candidates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.candidates.is_empty()
    }

    /// Rerank all candidates, requesting the top `limit`.
    pub fn rerank(&self) -> ServiceResult<Arc<Vec<RankedResult>>> {
        let mut memo = self.ranked.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(ranked) = memo.as_ref() {
            return Ok(Arc::clone(ranked));
        }

        let ranked = if self.candidates.is_empty() {
            Vec::new()
        } else {
            self.reranker.rerank(&self.texts(), &self.query, self.limit)?
        };
        let ranked = Arc::new(ranked);
        *memo = Some(Arc::clone(&ranked));
        Ok(ranked)
    }

    /// Up to `top_n` texts (default: `limit`) in descending relevance.
    ///
    /// With `related`, results scoring `<= 0` are dropped.
    pub fn top(&self, top_n: Option<usize>, related: bool) -> ServiceResult<Vec<String>> {
        let top_n = top_n.unwrap_or(self.limit);
        let ranked = self.rerank()?;
        Ok(ranked
            .iter()
            .filter(|r| !related || r.relevance_score > 0.0)
            .take(top_n)
            .map(|r| r.text.clone())
            .collect())
    }
}

impl fmt::Debug for QueryResultSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let reranked = self
            .ranked
            .lock()
            .map(|m| m.is_some())
            .unwrap_or(false);
        f.debug_struct("QueryResultSet")
            .field("query", &self.query)
            .field("limit", &self.limit)
            .field("candidates", &self.candidates.len())
            .field("reranked", &reranked)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::PointId;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Scores documents from a fixed table and counts invocations.
    struct TableReranker {
        scores: HashMap<String, f32>,
        calls: AtomicUsize,
        fail_first: bool,
    }

    impl TableReranker {
        fn new(pairs: &[(&str, f32)]) -> Self {
            Self {
                scores: pairs.iter().map(|(t, s)| (t.to_string(), *s)).collect(),
                calls: AtomicUsize::new(0),
                fail_first: false,
            }
        }
    }

    impl Reranker for TableReranker {
        fn model_name(&self) -> &str {
            "table"
        }

        fn rerank(
            &self,
            documents: &[String],
            _query: &str,
            top_n: usize,
        ) -> ServiceResult<Vec<RankedResult>> {
            let call = self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail_first && call == 0 {
                return Err(ServiceError::shape("no results", "{}"));
            }
            let mut out: Vec<RankedResult> = documents
                .iter()
                .map(|d| RankedResult {
                    text: d.clone(),
                    relevance_score: self.scores.get(d).copied().unwrap_or(0.0),
                })
                .collect();
            crate::rerank::sort_by_relevance(&mut out);
            out.truncate(top_n);
            Ok(out)
        }
    }

    fn candidates(texts: &[&str]) -> Vec<Candidate> {
        texts
            .iter()
            .enumerate()
            .map(|(i, t)| Candidate {
                id: PointId::Num(i as u64),
                score: 1.0 - i as f32 * 0.1,
                text: t.to_string(),
            })
            .collect()
    }

    fn result_set(reranker: Arc<TableReranker>, limit: usize) -> QueryResultSet {
        QueryResultSet::new("q", limit, candidates(&["A?", "B!", "C"]), reranker)
    }

    #[test]
    fn test_rerank_is_memoized() {
        let reranker = Arc::new(TableReranker::new(&[("A?", 0.9), ("B!", -0.2), ("C", 0.5)]));
        let set = result_set(reranker.clone(), 3);
        let first = set.rerank().unwrap();
        let second = set.rerank().unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        set.top(None, true).unwrap();
        assert_eq!(reranker.calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_top_related_drops_non_positive() {
        let reranker = Arc::new(TableReranker::new(&[("A?", 0.9), ("B!", -0.2), ("C", 0.0)]));
        let set = result_set(reranker, 3);
        assert_eq!(set.top(Some(3), true).unwrap(), vec!["A?"]);
        assert_eq!(set.top(Some(3), false).unwrap(), vec!["A?", "C", "B!"]);
    }

    #[test]
    fn test_top_defaults_to_limit_and_may_differ() {
        let reranker = Arc::new(TableReranker::new(&[("A?", 0.9), ("B!", 0.8), ("C", 0.7)]));
        let set = result_set(reranker, 2);
        assert_eq!(set.top(None, false).unwrap(), vec!["A?", "B!"]);
        assert_eq!(set.top(Some(1), false).unwrap(), vec!["A?"]);
        assert_eq!(set.top(Some(10), false).unwrap().len(), 2);
    }

    #[test]
    fn test_failed_rerank_is_not_memoized() {
        let mut table = TableReranker::new(&[("A?", 0.9)]);
        table.fail_first = true;
        let reranker = Arc::new(table);
        let set = result_set(reranker.clone(), 3);
        assert!(set.rerank().is_err());
        assert_eq!(set.top(Some(1), true).unwrap(), vec!["A?"]);
        assert_eq!(reranker.calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_empty_set_skips_reranker() {
        let reranker = Arc::new(TableReranker::new(&[]));
        let set = QueryResultSet::new("q", 5, Vec::new(), reranker.clone());
        assert!(set.is_empty());
        assert!(set.top(None, true).unwrap().is_empty());
        assert_eq!(reranker.calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_concurrent_rerank_calls_service_once() {
        let reranker = Arc::new(TableReranker::new(&[("A?", 0.9), ("C", 0.5)]));
        let set = Arc::new(result_set(reranker.clone(), 3));
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let set = Arc::clone(&set);
                std::thread::spawn(move || set.top(None, true).unwrap())
            })
            .collect();
        for h in handles {
            assert_eq!(h.join().unwrap(), vec!["A?", "C"]);
        }
        assert_eq!(reranker.calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_debug_shows_rerank_state() {
        let reranker = Arc::new(TableReranker::new(&[]));
        let set = result_set(reranker, 3);
        assert!(format!("{:?}", set).contains("reranked: false"));
        set.rerank().unwrap();
        assert!(format!("{:?}", set).contains("reranked: true"));
    }
}
