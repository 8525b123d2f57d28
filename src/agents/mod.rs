//! Multi-stage news pipeline: scrape -> cross-check -> summarise.
//!
//! Each stage is its own type behind the provider traits in `sources` and
//! `llm`; `NewsPipeline` runs them per ticker, in input order.

pub mod crosschecker;
pub mod scraper;
pub mod summarizer;

use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::info;

use crate::config::AppConfig;
use crate::llm::InferenceClient;
use crate::sources::ProviderSet;
use crate::types::{ConfirmedArticle, RawNews, TickerSummary};

pub use crosschecker::CrossChecker;
pub use scraper::Scraper;
pub use summarizer::Summarizer;

/// Everything one pipeline run produced.
#[derive(Debug, Clone, Default)]
pub struct PipelineReport {
    /// Confirmed articles per ticker, input order.
    pub validated: Vec<(String, Vec<ConfirmedArticle>)>,
    pub summaries: Vec<TickerSummary>,
}

impl PipelineReport {
    pub fn confirmed_count(&self) -> usize {
        self.validated.iter().map(|(_, a)| a.len()).sum()
    }

    /// Raw-news input built from the confirmed articles, one line per article.
    /// Tickers without confirmed news are left out.
    pub fn raw_news(&self) -> BTreeMap<String, RawNews> {
        self.validated
            .iter()
            .filter(|(_, articles)| !articles.is_empty())
            .map(|(ticker, articles)| {
                let raw_info = articles
                    .iter()
                    .map(|c| format!("{} ({}): {}", c.article.title, c.article.source, c.article.snippet))
                    .collect::<Vec<_>>()
                    .join("\n");
                (ticker.clone(), RawNews { company_name: ticker.clone(), raw_info })
            })
            .collect()
    }
}

pub struct NewsPipeline {
    scraper: Scraper,
    checker: CrossChecker,
    summarizer: Summarizer,
}

impl NewsPipeline {
    pub fn new(scraper: Scraper, checker: CrossChecker, summarizer: Summarizer) -> Self {
        Self { scraper, checker, summarizer }
    }

    pub fn from_providers(
        cfg: &AppConfig,
        providers: &ProviderSet,
        inference: Option<Arc<dyn InferenceClient>>,
    ) -> Self {
        Self::new(
            Scraper::new(providers.search.clone(), cfg.news.quality_sources.clone()),
            CrossChecker::new(providers.validation.clone(), cfg.crosscheck.similarity_threshold),
            Summarizer::new(inference),
        )
    }

    pub async fn run(&self, tickers: &[String]) -> PipelineReport {
        info!(tickers = tickers.len(), threshold = self.checker.threshold(), "Starting news pipeline");
        let mut report = PipelineReport::default();

        for ticker in tickers {
            let candidates = self.scraper.scrape(ticker).await;
            let confirmed = self.checker.cross_check(candidates, ticker).await;
            let summary = self.summarizer.summarize_ticker(ticker, &confirmed).await;
            report.summaries.push(summary);
            report.validated.push((ticker.clone(), confirmed));
        }

        info!(confirmed = report.confirmed_count(), "News pipeline complete");
        report
    }
}
