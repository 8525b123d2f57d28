//! Offline provider set.
//!
//! Every provider trait backed by embedded sample responses, stored in each
//! provider's own wire shape and decoded through the same mapping the live
//! adapter uses. Price history is synthesised deterministically per ticker.

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{Datelike, Duration, NaiveDate, Weekday};
use serde::Deserialize;
use std::collections::HashMap;
use std::sync::Arc;

use super::alphavantage::FeedItem;
use super::newsapi::Headline;
use super::polygon::PolygonItem;
use super::stocknews::StockNewsItem;
use super::{HeadlineSource, NewsSearch, PriceSource, RawArticle, ValidationSource};
use crate::types::{PriceBar, PriceHistory, ValidationArticle};

const SAMPLE_DATA: &str = include_str!("sample_data.json");

/// Tickers the sample data covers.
pub const SAMPLE_TICKERS: &[&str] = &["AAPL", "GOOGL", "TSLA"];

#[derive(Debug, Deserialize)]
struct SampleData {
    exa: HashMap<String, Vec<RawArticle>>,
    google_news: HashMap<String, Vec<RawArticle>>,
    stocknews: HashMap<String, Vec<StockNewsItem>>,
    polygon: HashMap<String, Vec<PolygonItem>>,
    alphavantage: HashMap<String, Vec<FeedItem>>,
}

fn convert<T: Into<ValidationArticle>>(
    map: HashMap<String, Vec<T>>,
) -> HashMap<String, Vec<ValidationArticle>> {
    map.into_iter()
        .map(|(ticker, items)| (ticker, items.into_iter().map(Into::into).collect()))
        .collect()
}

/// Primary search answering from a fixed table.
pub struct FixtureSearch {
    name: String,
    articles: HashMap<String, Vec<RawArticle>>,
}

impl FixtureSearch {
    pub fn new(name: impl Into<String>, articles: HashMap<String, Vec<RawArticle>>) -> Self {
        Self { name: name.into(), articles }
    }
}

#[async_trait]
impl NewsSearch for FixtureSearch {
    fn name(&self) -> String {
        self.name.clone()
    }

    async fn search(&self, ticker: &str) -> Result<Vec<RawArticle>> {
        Ok(self.articles.get(ticker).cloned().unwrap_or_default())
    }
}

/// Validation source answering from a fixed table.
pub struct FixtureValidation {
    name: String,
    articles: HashMap<String, Vec<ValidationArticle>>,
}

impl FixtureValidation {
    pub fn new(name: impl Into<String>, articles: HashMap<String, Vec<ValidationArticle>>) -> Self {
        Self { name: name.into(), articles }
    }
}

#[async_trait]
impl ValidationSource for FixtureValidation {
    fn name(&self) -> String {
        self.name.clone()
    }

    async fn fetch_validation_articles(&self, ticker: &str) -> Result<Vec<ValidationArticle>> {
        Ok(self.articles.get(ticker).cloned().unwrap_or_default())
    }
}

/// The full sample provider set, in the order the live pipeline wires them.
pub struct Fixtures {
    pub search: Vec<Arc<dyn NewsSearch>>,
    pub validation: Vec<Arc<dyn ValidationSource>>,
}

impl Fixtures {
    pub fn load() -> Result<Self> {
        let data: SampleData =
            serde_json::from_str(SAMPLE_DATA).context("Embedded sample data is malformed")?;

        let search: Vec<Arc<dyn NewsSearch>> = vec![
            Arc::new(FixtureSearch::new("Exa", data.exa)),
            Arc::new(FixtureSearch::new("GoogleNews", data.google_news)),
        ];
        let validation: Vec<Arc<dyn ValidationSource>> = vec![
            Arc::new(FixtureValidation::new("StockNewsAPI", convert(data.stocknews))),
            Arc::new(FixtureValidation::new("Polygon", convert(data.polygon))),
            Arc::new(FixtureValidation::new("AlphaVantage", convert(data.alphavantage))),
        ];
        Ok(Self { search, validation })
    }
}

// ---------------------------------------------------------------------------
// Prices
// ---------------------------------------------------------------------------

/// Number of trading days the synthetic series covers (about three months).
pub const SAMPLE_TRADING_DAYS: usize = 63;

/// Deterministic daily bars: a gentle wave over a drift, seeded by ticker.
pub struct FixturePrices {
    end: NaiveDate,
    days: usize,
}

impl FixturePrices {
    pub fn new() -> Self {
        Self {
            end: NaiveDate::from_ymd_opt(2024, 11, 1).unwrap_or_default(),
            days: SAMPLE_TRADING_DAYS,
        }
    }

    pub fn with_days(mut self, days: usize) -> Self {
        self.days = days;
        self
    }

    pub fn series(&self, ticker: &str) -> PriceHistory {
        let seed = ticker.bytes().fold(0u64, |acc, b| acc.wrapping_mul(31).wrapping_add(b as u64));
        let base = 50.0 + (seed % 250) as f64;
        let drift = ((seed % 7) as f64 - 3.0) * 0.001;
        let phase = (seed % 13) as f64;

        let mut dates = Vec::with_capacity(self.days);
        let mut day = self.end;
        while dates.len() < self.days {
            if !matches!(day.weekday(), Weekday::Sat | Weekday::Sun) {
                dates.push(day);
            }
            day -= Duration::days(1);
        }
        dates.reverse();

        let mut prev_close = base;
        dates
            .into_iter()
            .enumerate()
            .map(|(i, date)| {
                let t = i as f64;
                let close = base * (1.0 + drift * t) * (1.0 + 0.03 * (t * 0.35 + phase).sin());
                let open = prev_close;
                prev_close = close;
                let volume = 1_000_000 + (seed.wrapping_add(i as u64 * 7919) % 500_000);
                PriceBar {
                    date,
                    open,
                    high: open.max(close) * 1.01,
                    low: open.min(close) * 0.99,
                    close,
                    volume,
                }
            })
            .collect()
    }
}

impl Default for FixturePrices {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PriceSource for FixturePrices {
    async fn daily_history(&self, ticker: &str, _range: &str) -> Result<PriceHistory> {
        Ok(self.series(ticker))
    }
}

/// Headline search built from the sample primary articles.
pub struct FixtureHeadlines {
    by_ticker: HashMap<String, Vec<Headline>>,
}

impl FixtureHeadlines {
    pub fn load(quality_sources: &[String]) -> Result<Self> {
        let data: SampleData =
            serde_json::from_str(SAMPLE_DATA).context("Embedded sample data is malformed")?;
        let mut by_ticker: HashMap<String, Vec<Headline>> = HashMap::new();
        for (ticker, raws) in data.exa.into_iter().chain(data.google_news) {
            let entry = by_ticker.entry(ticker).or_default();
            entry.extend(raws.into_iter().map(|raw| Headline {
                source: super::normalize::extract_source(raw.any_url(), quality_sources),
                url: raw.any_url().to_string(),
                title: raw.title.unwrap_or_default(),
                description: raw.snippet.or(raw.text).unwrap_or_default(),
                published_at: raw.published_date.or(raw.date).unwrap_or_default(),
            }));
        }
        Ok(Self { by_ticker })
    }
}

#[async_trait]
impl HeadlineSource for FixtureHeadlines {
    /// Matches when the query mentions one of the sample tickers.
    async fn headlines(&self, query: &str) -> Result<Vec<Headline>> {
        Ok(self
            .by_ticker
            .iter()
            .filter(|(ticker, _)| query.split_whitespace().any(|w| w == ticker.as_str()))
            .flat_map(|(_, h)| h.iter().cloned())
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sample_data_loads() {
        let f = Fixtures::load().unwrap();
        let names: Vec<String> = f.validation.iter().map(|v| v.name()).collect();
        assert_eq!(names, vec!["StockNewsAPI", "Polygon", "AlphaVantage"]);
        assert_eq!(f.search.len(), 2);
    }

    #[tokio::test]
    async fn test_fixture_search_known_and_unknown_ticker() {
        let f = Fixtures::load().unwrap();
        let exa = f.search[0].search("AAPL").await.unwrap();
        assert_eq!(exa.len(), 2);
        assert!(f.search[0].search("ZZZZ").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_fixture_validation_uses_provider_mapping() {
        let f = Fixtures::load().unwrap();
        let polygon = f.validation[1].fetch_validation_articles("TSLA").await.unwrap();
        assert_eq!(polygon.len(), 1);
        assert!(polygon[0].summary.is_none());
        assert!(polygon[0].description.is_some());
        assert_eq!(polygon[0].url, "https://polygon.io/news/tesla-delivery-record");
    }

    #[test]
    fn test_prices_deterministic_and_ascending() {
        let p = FixturePrices::new();
        let a = p.series("AAPL");
        assert_eq!(a.len(), SAMPLE_TRADING_DAYS);
        assert_eq!(a, p.series("AAPL"));
        assert!(a.windows(2).all(|w| w[0].date < w[1].date));
        assert!(a.iter().all(|b| b.low <= b.close && b.close <= b.high && b.low > 0.0));
        assert!(a.iter().all(|b| !matches!(b.date.weekday(), Weekday::Sat | Weekday::Sun)));
        assert_ne!(a[0].close, p.series("TSLA")[0].close);
    }

    #[test]
    fn test_prices_short_series() {
        assert_eq!(FixturePrices::new().with_days(5).series("X").len(), 5);
    }

    #[tokio::test]
    async fn test_fixture_headlines_match_ticker_word() {
        let h = FixtureHeadlines::load(&["ft.com".to_string()]).unwrap();
        let aapl = h.headlines("AAPL Apple Inc").await.unwrap();
        assert_eq!(aapl.len(), 3);
        assert!(aapl.iter().any(|x| x.source == "Ft"));
        assert!(h.headlines("Microsoft").await.unwrap().is_empty());
    }
}
