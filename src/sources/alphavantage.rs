//! Alpha Vantage news & sentiment.
//!
//! API: `https://www.alphavantage.co/query?function=NEWS_SENTIMENT`
//! Auth: `apikey` query param. Free tier: 25 req/day.
//!
//! An optional trust filter keeps only articles from a named outlet that
//! are strongly about the searched ticker. Strength is the ticker's
//! `relevance_score`, not its sentiment score.

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{Duration, Utc};
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Deserializer};
use tracing::debug;

use super::{http_client, require_key, ValidationSource};
use crate::types::ValidationArticle;

const DEFAULT_BASE_URL: &str = "https://www.alphavantage.co";

#[derive(Debug, Deserialize)]
struct FeedResponse {
    #[serde(default)]
    feed: Vec<FeedItem>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct FeedItem {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub summary: Option<String>,
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub time_published: String,
    #[serde(default)]
    pub source: String,
    #[serde(default)]
    pub overall_sentiment_label: Option<String>,
    #[serde(default)]
    pub ticker_sentiment: Vec<TickerSentiment>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct TickerSentiment {
    #[serde(default)]
    pub ticker: String,
    /// Sent as a string ("0.8") by the live API.
    #[serde(default, deserialize_with = "lenient_f64")]
    pub relevance_score: f64,
}

fn lenient_f64<'de, D: Deserializer<'de>>(de: D) -> Result<f64, D::Error> {
    let v = serde_json::Value::deserialize(de)?;
    Ok(match v {
        serde_json::Value::Number(n) => n.as_f64().unwrap_or(0.0),
        serde_json::Value::String(s) => s.trim().parse().unwrap_or(0.0),
        _ => 0.0,
    })
}

impl From<FeedItem> for ValidationArticle {
    fn from(item: FeedItem) -> Self {
        ValidationArticle {
            title: item.title,
            summary: item.summary,
            description: None,
            url: item.url,
            published: item.time_published,
        }
    }
}

/// Trusted-outlet filter settings.
#[derive(Debug, Clone)]
pub struct TrustFilter {
    pub sources: Vec<String>,
    pub min_relevance: f64,
}

impl TrustFilter {
    /// Keep `item` when its outlet is trusted and it carries a ticker entry
    /// for `ticker` with `|relevance_score| >= min_relevance`.
    pub fn accepts(&self, item: &FeedItem, ticker: &str) -> bool {
        if !self.sources.iter().any(|s| s == &item.source) {
            return false;
        }
        item.ticker_sentiment.iter().any(|ts| {
            !ts.ticker.is_empty()
                && ts.ticker == ticker
                && ts.relevance_score.abs() >= self.min_relevance
        })
    }

    pub fn apply(&self, items: Vec<FeedItem>, ticker: &str) -> Vec<FeedItem> {
        let before = items.len();
        let kept: Vec<FeedItem> = items.into_iter().filter(|i| self.accepts(i, ticker)).collect();
        debug!(ticker, removed = before - kept.len(), remaining = kept.len(), "Alpha Vantage trust filter");
        kept
    }
}

pub struct AlphaVantageNews {
    http: Client,
    api_key: Option<SecretString>,
    base_url: String,
    filter: Option<TrustFilter>,
}

impl AlphaVantageNews {
    pub fn new(api_key: Option<SecretString>) -> Result<Self> {
        Ok(Self {
            http: http_client("Alpha Vantage")?,
            api_key,
            base_url: DEFAULT_BASE_URL.to_string(),
            filter: None,
        })
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn with_trust_filter(mut self, filter: TrustFilter) -> Self {
        self.filter = Some(filter);
        self
    }
}

#[async_trait]
impl ValidationSource for AlphaVantageNews {
    fn name(&self) -> String {
        "AlphaVantage".to_string()
    }

    async fn fetch_validation_articles(&self, ticker: &str) -> Result<Vec<ValidationArticle>> {
        let key = require_key(&self.api_key, "Alpha Vantage")?;
        let now = Utc::now();
        let url = format!(
            "{}/query?function=NEWS_SENTIMENT&tickers={}&apikey={}&sort=RELEVANCE&time_from={}&time_to={}&limit=50",
            self.base_url,
            urlencoding::encode(ticker),
            urlencoding::encode(key.expose_secret()),
            (now - Duration::days(1)).format("%Y%m%dT%H%M"),
            now.format("%Y%m%dT%H%M"),
        );

        let data: FeedResponse = self
            .http
            .get(&url)
            .send()
            .await
            .context("Alpha Vantage request failed")?
            .error_for_status()
            .context("Alpha Vantage returned error status")?
            .json()
            .await
            .context("Failed to parse Alpha Vantage response")?;

        let items = match &self.filter {
            Some(filter) => filter.apply(data.feed, ticker),
            None => data.feed,
        };
        debug!(ticker, count = items.len(), "Alpha Vantage fetch complete");
        Ok(items.into_iter().map(ValidationArticle::from).collect())
    }
}
