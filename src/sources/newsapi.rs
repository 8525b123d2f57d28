//! NewsAPI headline search.
//!
//! API: `https://newsapi.org/v2/everything`
//! Auth: `X-Api-Key` header. Free tier: 100 req/day.
//!
//! Feeds the `collect` command, which turns headlines into the raw-news
//! input consumed by the bullet summariser.

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{http_client, require_key, HeadlineSource};

const DEFAULT_BASE_URL: &str = "https://newsapi.org";

#[derive(Debug, Deserialize)]
struct NewsApiResponse {
    #[serde(default)]
    status: String,
    #[serde(default)]
    articles: Vec<NewsApiArticle>,
}

#[derive(Debug, Deserialize)]
struct NewsApiArticle {
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    url: Option<String>,
    #[serde(default)]
    source: Option<NewsApiSource>,
    #[serde(default, rename = "publishedAt")]
    published_at: Option<String>,
}

#[derive(Debug, Deserialize)]
struct NewsApiSource {
    #[serde(default)]
    name: Option<String>,
}

/// A headline with just the fields the newsletter needs.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Headline {
    pub title: String,
    pub description: String,
    pub source: String,
    pub url: String,
    pub published_at: String,
}

impl Headline {
    /// One line of raw news text: `"[source] title: description"`.
    pub fn as_line(&self) -> String {
        let mut line = format!("[{}] {}", self.source, self.title);
        if !self.description.is_empty() {
            line.push_str(": ");
            line.push_str(&self.description);
        }
        line
    }
}

impl From<NewsApiArticle> for Headline {
    fn from(a: NewsApiArticle) -> Self {
        Headline {
            title: a.title.unwrap_or_default(),
            description: a.description.unwrap_or_default(),
            source: a.source.and_then(|s| s.name).unwrap_or_else(|| "unknown".to_string()),
            url: a.url.unwrap_or_default(),
            published_at: a.published_at.unwrap_or_default(),
        }
    }
}

pub struct NewsApi {
    http: Client,
    api_key: Option<SecretString>,
    base_url: String,
}

impl NewsApi {
    pub fn new(api_key: Option<SecretString>) -> Result<Self> {
        Ok(Self {
            http: http_client("NewsAPI")?,
            api_key,
            base_url: DEFAULT_BASE_URL.to_string(),
        })
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }
}

#[async_trait]
impl HeadlineSource for NewsApi {
    async fn headlines(&self, query: &str) -> Result<Vec<Headline>> {
        let key = require_key(&self.api_key, "NewsAPI")?;
        let url = format!(
            "{}/v2/everything?q={}&sortBy=publishedAt&pageSize=10&language=en",
            self.base_url,
            urlencoding::encode(query),
        );

        let data: NewsApiResponse = self
            .http
            .get(&url)
            .header("X-Api-Key", key.expose_secret().as_str())
            .send()
            .await
            .context("NewsAPI request failed")?
            .error_for_status()
            .context("NewsAPI returned error status")?
            .json()
            .await
            .context("Failed to parse NewsAPI response")?;

        debug!(query, status = %data.status, count = data.articles.len(), "NewsAPI search complete");
        Ok(data.articles.into_iter().map(Headline::from).collect())
    }
}
