//! News cross-checker.
//!
//! A candidate article survives only when at least one independent
//! validation source carries a story similar enough to it. For each
//! candidate and each source, the source's articles are scanned in order
//! and the scan stops at the first one scoring at or above the threshold;
//! that source then counts as a confirmation. Candidates with no
//! confirmation are dropped.

use futures::future::join_all;
use std::collections::BTreeSet;
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::similarity::content_similarity;
use crate::sources::ValidationSource;
use crate::types::{Article, ConfirmedArticle, ValidationSet};

/// Default similarity needed for a validation article to confirm a candidate.
pub const DEFAULT_THRESHOLD: f64 = 0.3;

pub struct CrossChecker {
    sources: Vec<Arc<dyn ValidationSource>>,
    threshold: f64,
}

impl CrossChecker {
    pub fn new(sources: Vec<Arc<dyn ValidationSource>>, threshold: f64) -> Self {
        Self { sources, threshold }
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    /// One set per configured source, in configured order. A source that
    /// fails contributes an empty set.
    pub async fn fetch_validation_sets(&self, ticker: &str) -> Vec<ValidationSet> {
        let fetches = self.sources.iter().map(|source| async move {
            let name = source.name();
            match source.fetch_validation_articles(ticker).await {
                Ok(articles) => {
                    debug!(ticker, source = %name, count = articles.len(), "Validation articles fetched");
                    ValidationSet::new(name, articles)
                }
                Err(e) => {
                    warn!(ticker, source = %name, error = %e, "Validation source failed, treating as empty");
                    ValidationSet::new(name, Vec::new())
                }
            }
        });
        join_all(fetches).await
    }

    /// Confirm `candidates` for `ticker` against every validation source.
    pub async fn cross_check(&self, candidates: Vec<Article>, ticker: &str) -> Vec<ConfirmedArticle> {
        if candidates.is_empty() {
            return Vec::new();
        }
        let sets = self.fetch_validation_sets(ticker).await;
        let total = candidates.len();
        let confirmed = cross_check_sets(candidates, &sets, self.threshold);
        info!(ticker, candidates = total, confirmed = confirmed.len(), "Cross-check complete");
        confirmed
    }
}

/// Names of the sets confirming `candidate`.
pub fn confirming_sources(candidate: &Article, sets: &[ValidationSet], threshold: f64) -> BTreeSet<String> {
    let text = candidate.comparison_text();
    sets.iter()
        .filter(|set| {
            set.articles
                .iter()
                .any(|v| content_similarity(&text, &v.comparison_text()) >= threshold)
        })
        .map(|set| set.name.clone())
        .collect()
}

/// Keep the candidates confirmed by at least one set, in input order.
pub fn cross_check_sets(
    candidates: Vec<Article>,
    sets: &[ValidationSet],
    threshold: f64,
) -> Vec<ConfirmedArticle> {
    candidates
        .into_iter()
        .filter_map(|article| {
            let confirmation_sources = confirming_sources(&article, sets, threshold);
            if confirmation_sources.is_empty() {
                debug!(title = %article.title, "Candidate not confirmed, dropping");
                None
            } else {
                Some(ConfirmedArticle { article, confirmation_sources })
            }
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sources::MockValidationSource;
    use crate::types::ValidationArticle;
    use anyhow::anyhow;

    fn candidate(title: &str, snippet: &str) -> Article {
        Article {
            title: title.into(),
            snippet: snippet.into(),
            url: "https://www.ft.com/x".into(),
            source: "Ft".into(),
            published_date: "2024-11-01".into(),
            ticker: "AAPL".into(),
        }
    }

    fn validation(title: &str, summary: &str) -> ValidationArticle {
        ValidationArticle { title: title.into(), summary: Some(summary.into()), ..Default::default() }
    }

    fn apple_candidate() -> Article {
        candidate("Apple Reports Strong Earnings", "Apple beat expectations")
    }

    fn apple_validation() -> ValidationArticle {
        validation("Apple Earnings Exceed Expectations", "Apple delivered strong quarterly earnings")
    }

    fn mock_source(name: &'static str, articles: Vec<ValidationArticle>) -> Arc<dyn ValidationSource> {
        let mut m = MockValidationSource::new();
        m.expect_name().return_const(name.to_string());
        m.expect_fetch_validation_articles()
            .returning(move |_| Ok(articles.clone()));
        Arc::new(m)
    }

    #[test]
    fn test_confirmed_by_similar_story() {
        let sets = vec![ValidationSet::new("StockNewsAPI", vec![apple_validation()])];
        let out = cross_check_sets(vec![apple_candidate()], &sets, 0.3);
        assert_eq!(out.len(), 1);
        assert_eq!(
            out[0].confirmation_sources.iter().collect::<Vec<_>>(),
            vec!["StockNewsAPI"]
        );
        assert_eq!(out[0].article, apple_candidate());
    }

    #[test]
    fn test_all_sources_empty_drops_everything() {
        let sets = vec![
            ValidationSet::new("StockNewsAPI", vec![]),
            ValidationSet::new("Polygon", vec![]),
            ValidationSet::new("AlphaVantage", vec![]),
        ];
        let out = cross_check_sets(vec![apple_candidate(), candidate("B", "b")], &sets, 0.3);
        assert!(out.is_empty());
    }

    #[test]
    fn test_no_sources_drops_everything() {
        assert!(cross_check_sets(vec![apple_candidate()], &[], 0.3).is_empty());
    }

    #[test]
    fn test_unrelated_story_does_not_confirm() {
        let sets = vec![ValidationSet::new(
            "Polygon",
            vec![validation("Oil prices slide", "Crude futures fell on OPEC supply news")],
        )];
        assert!(cross_check_sets(vec![apple_candidate()], &sets, 0.7).is_empty());
    }

    #[test]
    fn test_empty_candidate_text_never_confirms() {
        // title and snippet empty: comparison text is a single space
        let sets = vec![ValidationSet::new("Polygon", vec![apple_validation()])];
        assert!(cross_check_sets(vec![candidate("", "")], &sets, 0.01).is_empty());
    }

    #[test]
    fn test_source_listed_once_even_with_many_matches() {
        let sets = vec![ValidationSet::new(
            "StockNewsAPI",
            vec![apple_validation(), apple_validation(), apple_validation()],
        )];
        let out = cross_check_sets(vec![apple_candidate()], &sets, 0.3);
        assert_eq!(out[0].confirmation_sources.len(), 1);
    }

    #[test]
    fn test_multiple_confirming_sources_sorted() {
        let sets = vec![
            ValidationSet::new("Polygon", vec![apple_validation()]),
            ValidationSet::new("AlphaVantage", vec![apple_validation()]),
        ];
        let out = cross_check_sets(vec![apple_candidate()], &sets, 0.3);
        let names: Vec<&str> = out[0].confirmation_sources.iter().map(String::as_str).collect();
        assert_eq!(names, vec!["AlphaVantage", "Polygon"]);
    }

    #[test]
    fn test_threshold_is_inclusive() {
        let sets = vec![ValidationSet::new("S", vec![validation("abcd", "")])];
        let cand = candidate("abcd", "");
        // identical text scores exactly 1.0
        assert_eq!(cross_check_sets(vec![cand], &sets, 1.0).len(), 1);
    }

    #[test]
    fn test_input_order_preserved() {
        let sets = vec![ValidationSet::new("S", vec![apple_validation(), validation("Tesla deliveries", "record")])];
        let out = cross_check_sets(
            vec![candidate("Tesla deliveries", "record"), apple_candidate()],
            &sets,
            0.3,
        );
        assert_eq!(out.len(), 2);
        assert_eq!(out[0].article.title, "Tesla deliveries");
    }

    #[test]
    fn test_more_sources_never_remove_confirmations() {
        let candidates = vec![
            apple_candidate(),
            candidate("Tesla deliveries", "record"),
            candidate("Oil prices slide", "Crude futures fell"),
        ];
        let s1 = vec![ValidationSet::new("StockNewsAPI", vec![apple_validation()])];
        let mut s12 = s1.clone();
        s12.push(ValidationSet::new(
            "Polygon",
            vec![apple_validation(), validation("Tesla deliveries", "record")],
        ));

        let before = cross_check_sets(candidates.clone(), &s1, 0.3);
        let after = cross_check_sets(candidates, &s12, 0.3);
        assert!(after.len() >= before.len());
        for confirmed in &before {
            let widened = after
                .iter()
                .find(|c| c.article == confirmed.article)
                .expect("confirmation lost after adding a source");
            assert!(confirmed.confirmation_sources.is_subset(&widened.confirmation_sources));
        }
    }

    #[tokio::test]
    async fn test_failing_source_is_treated_as_empty() {
        let mut failing = MockValidationSource::new();
        failing.expect_name().return_const("Polygon".to_string());
        failing
            .expect_fetch_validation_articles()
            .returning(|_| Err(anyhow!("connection refused")));

        let checker = CrossChecker::new(
            vec![Arc::new(failing), mock_source("StockNewsAPI", vec![apple_validation()])],
            DEFAULT_THRESHOLD,
        );
        let sets = checker.fetch_validation_sets("AAPL").await;
        assert_eq!(sets.len(), 2);
        assert_eq!(sets[0].name, "Polygon");
        assert!(sets[0].articles.is_empty());

        let out = checker.cross_check(vec![apple_candidate()], "AAPL").await;
        assert_eq!(out.len(), 1);
        assert!(out[0].confirmation_sources.contains("StockNewsAPI"));
        assert!(!out[0].confirmation_sources.contains("Polygon"));
    }

    #[tokio::test]
    async fn test_no_candidates_skips_fetch() {
        let mut source = MockValidationSource::new();
        source.expect_name().never();
        source.expect_fetch_validation_articles().never();
        let checker = CrossChecker::new(vec![Arc::new(source)], DEFAULT_THRESHOLD);
        assert!(checker.cross_check(Vec::new(), "AAPL").await.is_empty());
    }
}
