//! Per-ticker summary and sentiment.
//!
//! Confirmed articles are folded into one text block, summarised by the
//! summary model, and the summary is classified by the sentiment model.
//! Either model failing degrades to a fixed sentence or neutral sentiment.

use std::collections::BTreeSet;
use std::sync::Arc;
use tracing::{debug, warn};

use crate::llm::InferenceClient;
use crate::types::{ConfirmedArticle, Sentiment, TickerSummary};

pub struct Summarizer {
    client: Option<Arc<dyn InferenceClient>>,
}

impl Summarizer {
    /// `None` runs without a model: every summary is the fallback sentence.
    pub fn new(client: Option<Arc<dyn InferenceClient>>) -> Self {
        Self { client }
    }

    pub async fn summarize_ticker(&self, ticker: &str, articles: &[ConfirmedArticle]) -> TickerSummary {
        if articles.is_empty() {
            return TickerSummary::empty(ticker);
        }

        let combined = combined_text(ticker, articles);
        let (summary, sentiment) = match &self.client {
            Some(client) => {
                let summary = match client.summarize(&combined).await {
                    Ok(s) => s,
                    Err(e) => {
                        warn!(ticker, error = %e, "Summary model failed, using fallback");
                        fallback_summary(ticker)
                    }
                };
                let sentiment = match client.classify_sentiment(&summary).await {
                    Ok(labels) => labels
                        .first()
                        .map(|top| Sentiment::from_label(&top.label))
                        .unwrap_or_default(),
                    Err(e) => {
                        warn!(ticker, error = %e, "Sentiment model failed, using neutral");
                        Sentiment::Neutral
                    }
                };
                (summary, sentiment)
            }
            None => (fallback_summary(ticker), Sentiment::Neutral),
        };

        let sources: BTreeSet<String> = articles
            .iter()
            .map(|a| a.article.source.clone())
            .filter(|s| !s.is_empty())
            .collect();
        debug!(ticker, %sentiment, sources = sources.len(), "Ticker summarised");

        TickerSummary { ticker: ticker.to_string(), summary, sources, sentiment }
    }
}

/// `News about {T}:` followed by one `title - snippet` line per article.
pub fn combined_text(ticker: &str, articles: &[ConfirmedArticle]) -> String {
    let mut text = format!("News about {ticker}:\n");
    for a in articles {
        text.push_str(&format!("{} - {}\n", a.article.title, a.article.snippet));
    }
    text
}

pub fn fallback_summary(ticker: &str) -> String {
    format!("Multiple news sources report developments regarding {ticker}.")
}
