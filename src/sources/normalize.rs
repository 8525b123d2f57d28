//! Article normalizer.
//!
//! Primary providers name their fields differently (Exa: `text`,
//! `publishedDate`; SerpApi: `link`, `snippet`, `date`). `RawArticle`
//! accepts every spelling and `normalize` folds it into an `Article`.

use serde::{Deserialize, Serialize};

use crate::types::Article;

/// A primary-provider article before normalization.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawArticle {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub snippet: Option<String>,
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub link: Option<String>,
    #[serde(default, alias = "publishedDate")]
    pub published_date: Option<String>,
    #[serde(default)]
    pub date: Option<String>,
}

impl RawArticle {
    /// The article's URL, whichever field carried it.
    pub fn any_url(&self) -> &str {
        self.url.as_deref().or(self.link.as_deref()).unwrap_or("")
    }
}

/// Fold a provider record into an `Article` for `ticker`.
///
/// snippet <- `snippet` | `text`, url <- `url` | `link`,
/// published <- `published_date` | `date`. Missing values become "".
pub fn normalize(raw: RawArticle, ticker: &str, quality_sources: &[String]) -> Article {
    let url = raw.any_url().to_string();
    let source = extract_source(&url, quality_sources);
    Article {
        title: raw.title.unwrap_or_default(),
        snippet: raw.snippet.or(raw.text).unwrap_or_default(),
        published_date: raw.published_date.or(raw.date).unwrap_or_default(),
        url,
        source,
        ticker: ticker.to_string(),
    }
}

/// Label for the first quality domain contained in `url`: the part before
/// the first dot, capitalised (`ft.com` -> `Ft`). Otherwise `Unknown`.
pub fn extract_source(url: &str, quality_sources: &[String]) -> String {
    if url.is_empty() {
        return "Unknown".to_string();
    }
    quality_sources
        .iter()
        .find(|domain| url.contains(domain.as_str()))
        .map(|domain| title_case(domain.split('.').next().unwrap_or(domain)))
        .unwrap_or_else(|| "Unknown".to_string())
}

/// True when `url` belongs to one of the quality domains.
pub fn is_quality(url: &str, quality_sources: &[String]) -> bool {
    quality_sources.iter().any(|domain| url.contains(domain.as_str()))
}

fn title_case(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
        None => String::new(),
    }
}
