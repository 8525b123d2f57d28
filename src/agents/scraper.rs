//! Primary news scrape.
//!
//! Queries every primary search provider for a ticker and normalises the
//! combined results. Provider order is kept; a failed provider adds nothing.

use futures::future::join_all;
use std::sync::Arc;
use tracing::{info, warn};

use crate::sources::normalize::normalize;
use crate::sources::NewsSearch;
use crate::types::Article;

pub struct Scraper {
    sources: Vec<Arc<dyn NewsSearch>>,
    quality_sources: Vec<String>,
}

impl Scraper {
    pub fn new(sources: Vec<Arc<dyn NewsSearch>>, quality_sources: Vec<String>) -> Self {
        Self { sources, quality_sources }
    }

    /// Candidate articles for one ticker.
    pub async fn scrape(&self, ticker: &str) -> Vec<Article> {
        let results = join_all(self.sources.iter().map(|s| s.search(ticker))).await;

        let mut articles = Vec::new();
        for (source, result) in self.sources.iter().zip(results) {
            match result {
                Ok(raws) => articles.extend(
                    raws.into_iter()
                        .map(|raw| normalize(raw, ticker, &self.quality_sources)),
                ),
                Err(e) => {
                    warn!(ticker, source = %source.name(), error = %e, "News search failed, skipping provider");
                }
            }
        }
        info!(ticker, count = articles.len(), "Scrape complete");
        articles
    }
}
