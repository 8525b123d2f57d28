//! Provider adapters.
//!
//! Defines the provider traits and one implementation per external API.
//! Adapters are thin: they fetch, decode, and map into the shared types.
//! Failures surface as `anyhow::Error` and are absorbed by the callers,
//! so one dead provider never takes a run down.
//!
//! `fixtures` implements every trait from embedded sample data and is
//! swapped in instead of the live adapters when running without network.

pub mod alphavantage;
pub mod exa;
pub mod fixtures;
pub mod newsapi;
pub mod normalize;
pub mod polygon;
pub mod serpapi;
pub mod stocknews;
pub mod yahoo;

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

use crate::config::{AppConfig, ProviderMode};
use crate::types::{PriceHistory, ValidationArticle};

pub use normalize::RawArticle;

/// Default timeout applied to every provider client.
pub const HTTP_TIMEOUT_SECS: u64 = 15;

const USER_AGENT: &str = concat!("portfolio-newsletter/", env!("CARGO_PKG_VERSION"));

/// Build the HTTP client a provider uses.
pub fn http_client(provider: &str) -> Result<Client> {
    Client::builder()
        .timeout(Duration::from_secs(HTTP_TIMEOUT_SECS))
        .user_agent(USER_AGENT)
        .build()
        .with_context(|| format!("Failed to build {provider} HTTP client"))
}

/// A primary news provider searched for candidate articles.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait NewsSearch: Send + Sync {
    fn name(&self) -> String;

    /// Articles about `ticker` in the provider's own shape.
    async fn search(&self, ticker: &str) -> Result<Vec<RawArticle>>;
}

/// An independent provider consulted only to confirm candidates.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ValidationSource: Send + Sync {
    fn name(&self) -> String;

    /// Recent articles about `ticker`. An empty list is a normal answer.
    async fn fetch_validation_articles(&self, ticker: &str) -> Result<Vec<ValidationArticle>>;
}

/// Daily OHLCV history provider.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PriceSource: Send + Sync {
    /// Ascending daily bars for `ticker` covering `range` (e.g. `"3mo"`).
    async fn daily_history(&self, ticker: &str, range: &str) -> Result<PriceHistory>;
}

/// A headline search used to collect raw news text for a company.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait HeadlineSource: Send + Sync {
    async fn headlines(&self, query: &str) -> Result<Vec<newsapi::Headline>>;
}

// ---------------------------------------------------------------------------
// Wiring
// ---------------------------------------------------------------------------

/// Every provider a run needs, live or from fixtures.
pub struct ProviderSet {
    pub search: Vec<Arc<dyn NewsSearch>>,
    pub validation: Vec<Arc<dyn ValidationSource>>,
    pub prices: Arc<dyn PriceSource>,
    pub headlines: Arc<dyn HeadlineSource>,
}

impl ProviderSet {
    pub fn from_config(cfg: &AppConfig) -> Result<Self> {
        match cfg.newsletter.mode {
            ProviderMode::Fixtures => Self::fixtures(&cfg.news.quality_sources),
            ProviderMode::Live => Self::live(cfg),
        }
    }

    pub fn fixtures(quality_sources: &[String]) -> Result<Self> {
        info!("Using embedded sample data for all providers");
        let set = fixtures::Fixtures::load()?;
        Ok(Self {
            search: set.search,
            validation: set.validation,
            prices: Arc::new(fixtures::FixturePrices::new()),
            headlines: Arc::new(fixtures::FixtureHeadlines::load(quality_sources)?),
        })
    }

    pub fn live(cfg: &AppConfig) -> Result<Self> {
        let secret = |env: &str| AppConfig::resolve_secret(env);
        let quality = cfg.news.quality_sources.clone();
        let cc = &cfg.crosscheck;

        let mut alphavantage = alphavantage::AlphaVantageNews::new(secret(&cc.alphavantage_key_env))?;
        if cc.alphavantage_trusted_only {
            alphavantage = alphavantage.with_trust_filter(alphavantage::TrustFilter {
                sources: cc.trusted_sources.clone(),
                min_relevance: cc.alphavantage_min_relevance,
            });
        }

        Ok(Self {
            search: vec![
                Arc::new(exa::ExaSearch::new(secret(&cfg.news.exa_key_env), quality.clone())?),
                Arc::new(serpapi::GoogleNewsSearch::new(secret(&cfg.news.serpapi_key_env), quality)?),
            ],
            validation: vec![
                Arc::new(stocknews::StockNewsApi::new(secret(&cc.stocknews_key_env))?),
                Arc::new(polygon::PolygonNews::new(secret(&cc.polygon_key_env))?),
                Arc::new(alphavantage),
            ],
            prices: Arc::new(yahoo::YahooChart::new()?),
            headlines: Arc::new(newsapi::NewsApi::new(secret(&cfg.news.newsapi_key_env))?),
        })
    }
}

/// Fail with a uniform message when a provider's key is missing.
pub(crate) fn require_key<'k>(
    key: &'k Option<secrecy::SecretString>,
    provider: &str,
) -> Result<&'k secrecy::SecretString> {
    key.as_ref()
        .with_context(|| format!("{provider} API key not configured"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_http_client_builds() {
        assert!(http_client("test").is_ok());
    }

    #[test]
    fn test_fixture_provider_set() {
        let set = ProviderSet::fixtures(&[]).unwrap();
        assert_eq!(set.search.len(), 2);
        assert_eq!(set.validation.len(), 3);
    }

    #[test]
    fn test_live_provider_set_builds_without_keys() {
        let set = ProviderSet::live(&AppConfig::default()).unwrap();
        let names: Vec<String> = set.validation.iter().map(|v| v.name()).collect();
        assert_eq!(names, vec!["StockNewsAPI", "Polygon", "AlphaVantage"]);
    }

    #[test]
    fn test_require_key_missing() {
        let err = require_key(&None, "Polygon").unwrap_err();
        assert_eq!(err.to_string(), "Polygon API key not configured");
    }
}
