//! Rerank service trait.
//!
//! A reranker scores (query, document) pairs with a model that is more
//! precise than vector distance, returning the best `top_n` documents.

use std::collections::HashSet;

use crate::error::{ServiceError, ServiceResult};
use crate::models::RankedResult;

/// Maps `(query, documents)` to a relevance-ordered subset of `documents`.
pub trait Reranker: Send + Sync {
    fn model_name(&self) -> &str;

    /// Score `documents` against `query` and return up to `top_n` of them,
    /// sorted by descending `relevance_score`.
    fn rerank(
        &self,
        documents: &[String],
        query: &str,
        top_n: usize,
    ) -> ServiceResult<Vec<RankedResult>>;
}

/// Map `(index, score)` pairs from a rerank response back to document text.
///
/// The response must contain exactly `min(top_n, documents.len())` entries,
/// each with a distinct in-range index. The result is sorted by descending
/// score.
pub fn resolve_scores(
    documents: &[String],
    top_n: usize,
    scores: &[(usize, f32)],
    raw: &str,
) -> ServiceResult<Vec<RankedResult>> {
    let expected = top_n.min(documents.len());
    if scores.len() != expected {
        return Err(ServiceError::shape(
            format!(
                "received {} rerank results, expected {}",
                scores.len(),
                expected
            ),
            raw,
        ));
    }

    let mut seen = HashSet::with_capacity(scores.len());
    let mut ranked = Vec::with_capacity(scores.len());
    for &(index, relevance_score) in scores {
        if !seen.insert(index) {
            return Err(ServiceError::shape(
                format!("rerank index {} returned more than once", index),
                raw,
            ));
        }
        let text = documents.get(index).ok_or_else(|| {
            ServiceError::shape(
                format!(
                    "rerank index {} out of range for {} documents",
                    index,
                    documents.len()
                ),
                raw,
            )
        })?;
        ranked.push(RankedResult {
            text: text.clone(),
            relevance_score,
        });
    }
    sort_by_relevance(&mut ranked);
    Ok(ranked)
}

/// Sort descending by score; NaN scores sink to the end.
pub fn sort_by_relevance(results: &mut [RankedResult]) {
    results.sort_by(|a, b| {
        b.relevance_score
            .partial_cmp(&a.relevance_score)
            .unwrap_or_else(|| a.relevance_score.is_nan().cmp(&b.relevance_score.is_nan()))
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    fn docs() -> Vec<String> {
        vec!["hi".into(), "it is a bear".into(), "panda".into()]
    }

    #[test]
    fn test_resolve_scores_sorts_descending() {
        let ranked = resolve_scores(&docs(), 3, &[(0, 0.1), (2, 0.9), (1, 0.4)], "{}").unwrap();
        let texts: Vec<&str> = ranked.iter().map(|r| r.text.as_str()).collect();
        assert_eq!(texts, ["panda", "it is a bear", "hi"]);
    }

    #[test]
    fn test_resolve_scores_caps_expected_at_document_count() {
        let ranked = resolve_scores(&docs(), 10, &[(0, 0.1), (1, 0.2), (2, 0.3)], "{}").unwrap();
        assert_eq!(ranked.len(), 3);
    }

    #[test]
    fn test_resolve_scores_rejects_count_mismatch() {
        let err = resolve_scores(&docs(), 3, &[(0, 0.1)], "{}").unwrap_err();
        assert!(matches!(err, ServiceError::Shape { .. }));
    }

    #[test]
    fn test_resolve_scores_rejects_bad_index() {
        let err = resolve_scores(&docs(), 1, &[(7, 0.1)], "{}").unwrap_err();
        assert!(err.to_string().contains("out of range"));
    }

    #[test]
    fn test_resolve_scores_rejects_duplicate_index() {
        let err = resolve_scores(&docs(), 2, &[(0, 0.9), (0, 0.8)], "{}").unwrap_err();
        assert!(matches!(err, ServiceError::Shape { .. }));
        assert!(err.to_string().contains("more than once"));
    }

    #[test]
    fn test_sort_puts_nan_last() {
        let mut r = vec![
            RankedResult { text: "nan".into(), relevance_score: f32::NAN },
            RankedResult { text: "low".into(), relevance_score: -1.0 },
            RankedResult { text: "high".into(), relevance_score: 2.0 },
        ];
        sort_by_relevance(&mut r);
        assert_eq!(r[0].text, "high");
        assert_eq!(r[1].text, "low");
        assert_eq!(r[2].text, "nan");
    }
}
