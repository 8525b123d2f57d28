//! HuggingFace inference.
//!
//! Chat goes through the OpenAI-compatible router
//! (`https://router.huggingface.co/v1/chat/completions`); summarisation and
//! classification use the task endpoints under `/hf-inference/models/{model}`.
//! Auth: bearer token. No retries: a failed call is the caller's to absorb.

use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

use super::{InferenceClient, LabelScore};
use crate::config::LlmConfig;

const DEFAULT_BASE_URL: &str = "https://router.huggingface.co";

/// Model calls can take far longer than plain API fetches.
const LLM_TIMEOUT_SECS: u64 = 120;

// ---------------------------------------------------------------------------
// API types
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage>,
    max_tokens: u32,
    temperature: f32,
}

#[derive(Debug, Serialize, Deserialize)]
struct ChatMessage {
    role: String,
    #[serde(default)]
    content: String,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    #[serde(default)]
    message: Option<ChatMessage>,
}

#[derive(Debug, Serialize)]
struct TaskRequest<'a> {
    inputs: &'a str,
}

#[derive(Debug, Deserialize)]
struct SummaryItem {
    #[serde(default)]
    summary_text: String,
}

/// Classification comes back either flat or nested one level per input.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ClassifyResponse {
    Nested(Vec<Vec<LabelScore>>),
    Flat(Vec<LabelScore>),
}

// ---------------------------------------------------------------------------
// Client
// ---------------------------------------------------------------------------

pub struct HuggingFaceClient {
    http: Client,
    token: SecretString,
    base_url: String,
    chat_model: String,
    summary_model: String,
    sentiment_model: String,
    max_tokens: u32,
    temperature: f32,
}

impl HuggingFaceClient {
    pub fn new(token: SecretString, cfg: &LlmConfig) -> Result<Self> {
        let http = Client::builder()
            .timeout(Duration::from_secs(LLM_TIMEOUT_SECS))
            .build()
            .context("Failed to build HuggingFace HTTP client")?;

        Ok(Self {
            http,
            token,
            base_url: DEFAULT_BASE_URL.to_string(),
            chat_model: cfg.chat_model.clone(),
            summary_model: cfg.summary_model.clone(),
            sentiment_model: cfg.sentiment_model.clone(),
            max_tokens: cfg.max_tokens,
            temperature: cfg.temperature,
        })
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    async fn post_task<T: for<'de> Deserialize<'de>>(&self, model: &str, text: &str) -> Result<T> {
        let url = format!("{}/hf-inference/models/{}", self.base_url, model);
        let response = self
            .http
            .post(&url)
            .bearer_auth(self.token.expose_secret())
            .json(&TaskRequest { inputs: text })
            .send()
            .await
            .with_context(|| format!("HuggingFace request to {model} failed"))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            bail!("HuggingFace {model} error {status}: {body}");
        }
        response
            .json()
            .await
            .with_context(|| format!("Failed to parse HuggingFace {model} response"))
    }
}

#[async_trait]
impl InferenceClient for HuggingFaceClient {
    async fn chat(&self, prompt: &str) -> Result<String> {
        let request = ChatRequest {
            model: &self.chat_model,
            messages: vec![ChatMessage { role: "user".to_string(), content: prompt.to_string() }],
            max_tokens: self.max_tokens,
            temperature: self.temperature,
        };

        let response = self
            .http
            .post(format!("{}/v1/chat/completions", self.base_url))
            .bearer_auth(self.token.expose_secret())
            .json(&request)
            .send()
            .await
            .context("HuggingFace chat request failed")?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            bail!("HuggingFace chat error {status}: {body}");
        }

        let body: ChatResponse = response.json().await.context("Failed to parse chat response")?;
        let text = body
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message)
            .map(|m| m.content)
            .unwrap_or_default();
        debug!(model = %self.chat_model, chars = text.len(), "Chat completion received");
        Ok(text)
    }

    async fn summarize(&self, text: &str) -> Result<String> {
        let items: Vec<SummaryItem> = self.post_task(&self.summary_model, text).await?;
        match items.into_iter().next() {
            Some(item) if !item.summary_text.trim().is_empty() => Ok(item.summary_text),
            _ => bail!("HuggingFace {} returned no summary", self.summary_model),
        }
    }

    async fn classify_sentiment(&self, text: &str) -> Result<Vec<LabelScore>> {
        let response: ClassifyResponse = self.post_task(&self.sentiment_model, text).await?;
        let mut labels = match response {
            ClassifyResponse::Nested(outer) => outer.into_iter().next().unwrap_or_default(),
            ClassifyResponse::Flat(flat) => flat,
        };
        labels.sort_by(|a, b| b.score.total_cmp(&a.score));
        Ok(labels)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::{Method::POST, MockServer};

    fn client(server: &MockServer) -> HuggingFaceClient {
        HuggingFaceClient::new(SecretString::new("hf_test".into()), &LlmConfig::default())
            .unwrap()
            .with_base_url(server.base_url())
    }

    #[tokio::test]
    async fn test_chat_returns_first_choice() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(POST).path("/v1/chat/completions");
            then.status(200).header("content-type", "application/json").body(
                r#"{"choices":[{"message":{"role":"assistant","content":"{\"bullets\":[\"a\"]}"}}]}"#,
            );
        });

        let text = client(&server).chat("hello").await.unwrap();
        mock.assert();
        assert_eq!(text, r#"{"bullets":["a"]}"#);
    }

    #[tokio::test]
    async fn test_chat_error_status() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(POST).path("/v1/chat/completions");
            then.status(401).body("invalid token");
        });
        let err = client(&server).chat("hello").await.unwrap_err();
        assert!(err.to_string().contains("401"));
    }

    #[tokio::test]
    async fn test_summarize_uses_summary_model() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(POST).path("/hf-inference/models/facebook/bart-large-cnn");
            then.status(200)
                .header("content-type", "application/json")
                .body(r#"[{"summary_text":"Apple beat estimates."}]"#);
        });

        let summary = client(&server).summarize("long text").await.unwrap();
        mock.assert();
        assert_eq!(summary, "Apple beat estimates.");
    }

    #[tokio::test]
    async fn test_empty_summary_is_error() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(POST).path("/hf-inference/models/facebook/bart-large-cnn");
            then.status(200).header("content-type", "application/json").body("[]");
        });
        assert!(client(&server).summarize("x").await.is_err());
    }

    #[tokio::test]
    async fn test_classify_nested_sorted() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(POST).path("/hf-inference/models/ProsusAI/finbert");
            then.status(200).header("content-type", "application/json").body(
                r#"[[{"label":"neutral","score":0.2},{"label":"positive","score":0.7},{"label":"negative","score":0.1}]]"#,
            );
        });

        let labels = client(&server).classify_sentiment("good").await.unwrap();
        assert_eq!(labels[0].label, "positive");
        assert_eq!(labels.len(), 3);
    }

    #[tokio::test]
    async fn test_classify_flat() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(POST).path("/hf-inference/models/ProsusAI/finbert");
            then.status(200)
                .header("content-type", "application/json")
                .body(r#"[{"label":"negative","score":0.9}]"#);
        });
        let labels = client(&server).classify_sentiment("bad").await.unwrap();
        assert_eq!(labels[0].label, "negative");
    }
}
