//! Scrape, cross-check and summarise with fixture providers plus a
//! hand-written validation source.

use anyhow::{bail, Result};
use async_trait::async_trait;
use std::sync::Arc;

use portfolio_newsletter::agents::{CrossChecker, NewsPipeline, Scraper, Summarizer};
use portfolio_newsletter::config::AppConfig;
use portfolio_newsletter::sources::fixtures::Fixtures;
use portfolio_newsletter::sources::{ProviderSet, ValidationSource};
use portfolio_newsletter::storage;
use portfolio_newsletter::types::{TickerSummary, ValidationArticle};

struct DownSource;

#[async_trait]
impl ValidationSource for DownSource {
    fn name(&self) -> String {
        "Down".to_string()
    }

    async fn fetch_validation_articles(&self, _ticker: &str) -> Result<Vec<ValidationArticle>> {
        bail!("connection refused")
    }
}

fn tickers(list: &[&str]) -> Vec<String> {
    list.iter().map(|s| s.to_string()).collect()
}

#[tokio::test]
async fn test_fixture_pipeline_end_to_end() {
    let cfg = AppConfig::default();
    let providers = ProviderSet::fixtures(&cfg.news.quality_sources).unwrap();
    let report = NewsPipeline::from_providers(&cfg, &providers, None)
        .run(&tickers(&["AAPL", "GOOGL", "TSLA", "MSFT"]))
        .await;

    assert_eq!(report.confirmed_count(), 7);
    assert_eq!(report.summaries.len(), 4);
    assert_eq!(report.summaries[3], TickerSummary::empty("MSFT"));
    for (_, confirmed) in &report.validated {
        for article in confirmed {
            assert!(!article.confirmation_sources.is_empty());
        }
    }
    assert!(report.summaries[0].summary.contains("AAPL"));
}

#[tokio::test]
async fn test_failing_source_does_not_block_others() {
    let fixtures = Fixtures::load().unwrap();
    let mut validation = fixtures.validation;
    validation.insert(0, Arc::new(DownSource));

    let cfg = AppConfig::default();
    let pipeline = NewsPipeline::new(
        Scraper::new(fixtures.search, cfg.news.quality_sources.clone()),
        CrossChecker::new(validation, 0.3),
        Summarizer::new(None),
    );
    let report = pipeline.run(&tickers(&["AAPL"])).await;
    assert_eq!(report.validated[0].1.len(), 3);
    assert!(report.validated[0]
        .1
        .iter()
        .all(|a| !a.confirmation_sources.contains("Down")));
}

#[tokio::test]
async fn test_only_failing_sources_drop_everything() {
    let fixtures = Fixtures::load().unwrap();
    let cfg = AppConfig::default();
    let pipeline = NewsPipeline::new(
        Scraper::new(fixtures.search, cfg.news.quality_sources.clone()),
        CrossChecker::new(vec![Arc::new(DownSource) as Arc<dyn ValidationSource>], 0.3),
        Summarizer::new(None),
    );
    let report = pipeline.run(&tickers(&["GOOGL"])).await;
    assert_eq!(report.confirmed_count(), 0);
    assert_eq!(report.summaries[0].summary, TickerSummary::NO_NEWS);
}

#[tokio::test]
async fn test_pipeline_export_feeds_bullet_input() {
    let cfg = AppConfig::default();
    let providers = ProviderSet::fixtures(&cfg.news.quality_sources).unwrap();
    let report = NewsPipeline::from_providers(&cfg, &providers, None)
        .run(&tickers(&["TSLA"]))
        .await;

    let mut path = std::env::temp_dir();
    path.push(format!("newsletter_it_raw_{}.json", uuid::Uuid::new_v4()));
    let path = path.to_string_lossy().to_string();

    storage::save_raw_news(&report.raw_news(), &path).unwrap();
    let input = storage::load_raw_news(&path).unwrap();
    assert_eq!(input["TSLA"].raw_info.lines().count(), 2);
    std::fs::remove_file(&path).unwrap();
}
