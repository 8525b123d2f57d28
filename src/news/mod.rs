//! Newsletter news bullets.
//!
//! Without the model, every ticker gets the placeholder bullets. With it,
//! each ticker's raw news text is summarised by the chat model into 3-4
//! bullets. A ticker whose summarisation fails (or who has no input entry)
//! falls back to the placeholders; an entry with empty `raw_info` yields
//! no bullets at all.

use anyhow::{bail, Context, Result};
use serde::Deserialize;
use std::sync::Arc;
use tracing::{info, warn};

use crate::llm::prompts::Prompts;
use crate::llm::InferenceClient;
use crate::sources::HeadlineSource;
use crate::storage::{BulletOutput, RawNewsInput};
use crate::types::RawNews;

/// Placeholder bullets for `ticker`.
pub fn placeholder_bullets(ticker: &str) -> Vec<String> {
    vec![
        format!("{ticker} shows strong market performance in recent trading sessions"),
        "Analysts maintain positive outlook on fundamentals".to_string(),
        format!("{ticker} remains active in key strategic initiatives"),
    ]
}

pub fn placeholders_for(tickers: &[String]) -> BulletOutput {
    tickers.iter().map(|t| (t.clone(), placeholder_bullets(t))).collect()
}

#[derive(Deserialize)]
#[serde(untagged)]
enum BulletReply {
    Object { bullets: Vec<String> },
    List(Vec<String>),
}

/// Parse a model reply: `{"bullets": [...]}` or a bare JSON list, optionally
/// wrapped in a Markdown code fence.
pub fn parse_bullets(reply: &str) -> Result<Vec<String>> {
    let body = strip_code_fence(reply.trim());
    if body.is_empty() {
        bail!("empty model reply");
    }
    let parsed: BulletReply = serde_json::from_str(body).context("Model reply is not bullet JSON")?;
    let bullets = match parsed {
        BulletReply::Object { bullets } => bullets,
        BulletReply::List(list) => list,
    };
    Ok(bullets
        .into_iter()
        .map(|b| b.trim().to_string())
        .filter(|b| !b.is_empty())
        .collect())
}

fn strip_code_fence(text: &str) -> &str {
    let Some(rest) = text.strip_prefix("```") else {
        return text;
    };
    // drop an info string such as `json`
    let rest = match rest.find('\n') {
        Some(i) => &rest[i + 1..],
        None => rest,
    };
    rest.trim_end().strip_suffix("```").unwrap_or(rest).trim()
}

/// Produces the news section of the newsletter.
pub struct NewsBullets {
    client: Option<Arc<dyn InferenceClient>>,
    prompts: Prompts,
}

impl NewsBullets {
    pub fn new(client: Option<Arc<dyn InferenceClient>>) -> Result<Self> {
        let prompts = Prompts::new().context("Failed to load prompt templates")?;
        Ok(Self { client, prompts })
    }

    /// Bullets for every ticker. When `use_llm` is off or no model is
    /// configured, every ticker gets placeholders.
    pub async fn get_all_news(&self, tickers: &[String], use_llm: bool, input: &RawNewsInput) -> BulletOutput {
        let client = match (&self.client, use_llm) {
            (Some(client), true) => client,
            (None, true) => {
                warn!("LLM summarisation requested without a model, using placeholder bullets");
                return placeholders_for(tickers);
            }
            (_, false) => return placeholders_for(tickers),
        };

        let mut out = BulletOutput::new();
        for ticker in tickers {
            let bullets = match input.get(ticker) {
                None => {
                    warn!(ticker, "No raw news for ticker, using placeholder bullets");
                    placeholder_bullets(ticker)
                }
                Some(raw) if raw.raw_info.trim().is_empty() => Vec::new(),
                Some(raw) => {
                    let company = if raw.company_name.is_empty() { ticker.as_str() } else { raw.company_name.as_str() };
                    match self.summarise(client.as_ref(), company, &raw.raw_info).await {
                        Ok(bullets) => bullets,
                        Err(e) => {
                            warn!(ticker, error = %e, "News summarisation failed, using placeholder bullets");
                            placeholder_bullets(ticker)
                        }
                    }
                }
            };
            out.insert(ticker.clone(), bullets);
        }
        info!(tickers = out.len(), "News bullets ready");
        out
    }

    async fn summarise(&self, client: &dyn InferenceClient, company: &str, raw_info: &str) -> Result<Vec<String>> {
        let prompt = self
            .prompts
            .news_bullets(company, raw_info)
            .context("Failed to render news prompt")?;
        let reply = client.chat(&prompt).await?;
        parse_bullets(&reply)
    }
}

/// Headline search query for a ticker.
pub fn headline_query(ticker: &str) -> String {
    format!("{ticker} stock")
}

/// Build the raw-news input from headline searches, one line per headline.
/// A failed search leaves the ticker out.
pub async fn collect_raw_news(headlines: &dyn HeadlineSource, tickers: &[String]) -> RawNewsInput {
    let mut input = RawNewsInput::new();
    for ticker in tickers {
        match headlines.headlines(&headline_query(ticker)).await {
            Ok(found) => {
                let raw_info = found.iter().map(|h| h.as_line()).collect::<Vec<_>>().join("\n");
                info!(ticker, headlines = found.len(), "Headlines collected");
                input.insert(ticker.clone(), RawNews { company_name: ticker.clone(), raw_info });
            }
            Err(e) => warn!(ticker, error = %e, "Headline search failed"),
        }
    }
    input
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
