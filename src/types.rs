//! Shared types for the newsletter.
//!
//! These types form the data model used across all modules. Everything
//! here lives for one run only; nothing is mutated after construction
//! except the confirmation set built by the cross-checker.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

// ---------------------------------------------------------------------------
// Articles
// ---------------------------------------------------------------------------

/// A news article normalised from any primary (scrape) provider.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Article {
    pub title: String,
    pub snippet: String,
    pub url: String,
    /// Source label derived from the URL ("Reuters", "Ft", "Unknown", ...)
    pub source: String,
    /// Provider timestamp exactly as received
    pub published_date: String,
    pub ticker: String,
}

impl Article {
    /// Text compared during cross-checking: title and snippet joined by a space.
    pub fn comparison_text(&self) -> String {
        format!("{} {}", self.title, self.snippet)
    }

    /// Best-effort parse of `published_date`.
    pub fn published_at(&self) -> Option<DateTime<Utc>> {
        parse_timestamp(&self.published_date)
    }
}

/// An article from a validation provider.
///
/// Providers disagree on what they call the body text; `summary` wins
/// over `description` when both are present.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ValidationArticle {
    pub title: String,
    #[serde(default)]
    pub summary: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub published: String,
}

impl ValidationArticle {
    pub fn comparison_text(&self) -> String {
        let body = self
            .summary
            .as_deref()
            .or(self.description.as_deref())
            .unwrap_or("");
        format!("{} {}", self.title, body)
    }
}

/// All articles one validation provider returned for one ticker.
#[derive(Debug, Clone, Default)]
pub struct ValidationSet {
    pub name: String,
    pub articles: Vec<ValidationArticle>,
}

impl ValidationSet {
    pub fn new(name: impl Into<String>, articles: Vec<ValidationArticle>) -> Self {
        Self { name: name.into(), articles }
    }
}

/// A candidate article that at least one validation source confirmed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConfirmedArticle {
    #[serde(flatten)]
    pub article: Article,
    /// Names of the confirming sources. Never empty.
    pub confirmation_sources: BTreeSet<String>,
}

// ---------------------------------------------------------------------------
// Summaries
// ---------------------------------------------------------------------------

/// Overall tone of a ticker's news.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sentiment {
    Positive,
    #[default]
    Neutral,
    Negative,
}

impl Sentiment {
    /// Map a classifier label ("positive", "Bearish", "Somewhat-Bullish", ...)
    /// to a sentiment. Anything unrecognised is neutral.
    pub fn from_label(label: &str) -> Self {
        let l = label.to_lowercase();
        if l.contains("positive") || l.contains("bullish") {
            Sentiment::Positive
        } else if l.contains("negative") || l.contains("bearish") {
            Sentiment::Negative
        } else {
            Sentiment::Neutral
        }
    }
}

impl fmt::Display for Sentiment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Sentiment::Positive => write!(f, "positive"),
            Sentiment::Neutral => write!(f, "neutral"),
            Sentiment::Negative => write!(f, "negative"),
        }
    }
}

/// Final per-ticker output of the news pipeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TickerSummary {
    pub ticker: String,
    pub summary: String,
    pub sources: BTreeSet<String>,
    pub sentiment: Sentiment,
}

impl TickerSummary {
    pub const NO_NEWS: &'static str = "No validated news found for this ticker.";

    /// Summary for a ticker without any confirmed articles.
    pub fn empty(ticker: &str) -> Self {
        Self {
            ticker: ticker.to_string(),
            summary: Self::NO_NEWS.to_string(),
            sources: BTreeSet::new(),
            sentiment: Sentiment::Neutral,
        }
    }
}

/// Raw news entry for one ticker, input to the bullet summariser.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawNews {
    #[serde(default)]
    pub company_name: String,
    #[serde(default)]
    pub raw_info: String,
}

// ---------------------------------------------------------------------------
// Prices and metrics
// ---------------------------------------------------------------------------

/// One trading day.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PriceBar {
    pub date: NaiveDate,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: u64,
}

/// Daily bars in ascending date order.
pub type PriceHistory = Vec<PriceBar>;

/// The four headline statistics for one ticker. `None` means the history
/// was too short (or could not be fetched), never an error.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MetricsRow {
    pub ticker: String,
    pub volatility: Option<f64>,
    pub sma: Option<f64>,
    pub momentum: Option<f64>,
    pub volume_ratio: Option<f64>,
    /// Most recent close, used for the price/SMA ratio column.
    #[serde(default)]
    pub last_close: Option<f64>,
}

impl MetricsRow {
    /// Row for a ticker whose history could not be obtained.
    pub fn absent(ticker: &str) -> Self {
        Self { ticker: ticker.to_string(), ..Self::default() }
    }

    /// Last close divided by the 50-day SMA (>1.0 = trading above it).
    pub fn sma_ratio(&self) -> Option<f64> {
        match (self.last_close, self.sma) {
            (Some(close), Some(sma)) if sma != 0.0 => Some(close / sma),
            _ => None,
        }
    }
}

/// Price-change report for one ticker over a short window.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceChange {
    pub ticker: String,
    pub current_price: Option<f64>,
    pub percentage_change: Option<f64>,
    pub annualized_volatility: Option<f64>,
    pub data_points: usize,
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Parse the timestamp shapes providers use: RFC 3339, `YYYY-MM-DD`,
/// Alpha Vantage's `YYYYMMDDTHHMMSS` and SerpApi's `MM/DD/YYYY, HH:MM AM, +0000 UTC`.
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(dt) = DateTime::parse_from_rfc2822(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    for fmt in ["%Y%m%dT%H%M%S", "%Y%m%dT%H%M", "%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(raw, fmt) {
            return Some(naive.and_utc());
        }
    }
    if let Some(head) = raw.split(", +").next() {
        if let Ok(naive) = NaiveDateTime::parse_from_str(head, "%m/%d/%Y, %I:%M %p") {
            return Some(naive.and_utc());
        }
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
