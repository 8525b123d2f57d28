//! Newsletter run: news bullets, metrics, render, deliver.

use chrono::{Local, NaiveDate};
use std::sync::Arc;
use tracing::{info, warn};

use crate::config::AppConfig;
use crate::delivery::{DeliveryOutcome, Mailer};
use crate::error::RunError;
use crate::metrics::MetricsExtractor;
use crate::news::NewsBullets;
use crate::render::Renderer;
use crate::storage::{self, BulletOutput, RawNewsInput};
use crate::types::MetricsRow;

pub struct NewsletterService {
    news: NewsBullets,
    metrics: MetricsExtractor,
    renderer: Renderer,
    mailer: Arc<dyn Mailer>,
    use_llm: bool,
    input_path: String,
}

/// Generated document plus what the run did with it.
#[derive(Debug, Clone)]
pub struct NewsletterRun {
    pub content: String,
    pub metrics: Vec<MetricsRow>,
    pub delivery: DeliveryOutcome,
}

impl NewsletterService {
    pub fn new(
        cfg: &AppConfig,
        news: NewsBullets,
        metrics: MetricsExtractor,
        mailer: Arc<dyn Mailer>,
    ) -> Result<Self, RunError> {
        Ok(Self {
            news,
            metrics,
            renderer: Renderer::new(cfg.metrics.clone(), cfg.newsletter.footer.clone())?,
            mailer,
            use_llm: cfg.use_llm(),
            input_path: cfg.news.input_path.clone(),
        })
    }

    /// Force LLM bullets on or off, regardless of the environment.
    pub fn with_llm(mut self, use_llm: bool) -> Self {
        self.use_llm = use_llm;
        self
    }

    fn raw_news(&self) -> RawNewsInput {
        if !self.use_llm {
            return RawNewsInput::new();
        }
        match storage::load_raw_news(&self.input_path) {
            Ok(input) => input,
            Err(e) => {
                warn!(path = %self.input_path, error = %e, "Raw news input unreadable, using placeholders");
                RawNewsInput::new()
            }
        }
    }

    /// Build the document without sending it.
    pub async fn build(&self, tickers: &[String], generated_on: NaiveDate) -> Result<(String, Vec<MetricsRow>), RunError> {
        let input = self.raw_news();
        let bullets = self.news.get_all_news(tickers, self.use_llm, &input).await;
        self.build_with_bullets(tickers, &bullets, generated_on).await
    }

    /// Build the document around bullets produced earlier (by `summarize`).
    /// Tickers missing from `bullets` render with no news items.
    pub async fn build_with_bullets(
        &self,
        tickers: &[String],
        bullets: &BulletOutput,
        generated_on: NaiveDate,
    ) -> Result<(String, Vec<MetricsRow>), RunError> {
        let rows = self.metrics.extract(tickers).await;
        let content = self.renderer.render(tickers, &bullets, &rows, generated_on)?;
        info!(tickers = tickers.len(), bytes = content.len(), "Newsletter rendered");
        Ok((content, rows))
    }

    /// Build the newsletter and send it to `recipients`. With no
    /// recipients the content is returned unsent. A delivery failure
    /// still hands back the generated content inside the error.
    pub async fn generate_newsletter(&self, tickers: &[String], recipients: &[String]) -> Result<NewsletterRun, RunError> {
        let (content, metrics) = self.build(tickers, Local::now().date_naive()).await?;

        if recipients.is_empty() {
            warn!("No recipients provided, newsletter not sent");
            return Ok(NewsletterRun { content, metrics, delivery: DeliveryOutcome::Skipped });
        }

        match self.mailer.send(&content, recipients).await {
            Ok(delivery) => {
                if let DeliveryOutcome::Sent { recipients: n } = delivery {
                    info!(recipients = n, "Newsletter sent");
                }
                Ok(NewsletterRun { content, metrics, delivery })
            }
            Err(source) => Err(RunError::Delivery { content, source }),
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EmailConfig;
    use crate::delivery::{GmailMailer, MockMailer};
    use crate::error::DeliveryError;
    use crate::sources::fixtures::FixturePrices;

    fn service(mailer: MockMailer) -> NewsletterService {
        let cfg = AppConfig::default();
        NewsletterService::new(
            &cfg,
            NewsBullets::new(None).unwrap(),
            MetricsExtractor::new(Arc::new(FixturePrices::new()), cfg.metrics.clone()),
            Arc::new(mailer),
        )
        .unwrap()
        .with_llm(false)
    }

    fn tickers() -> Vec<String> {
        vec!["AAPL".to_string(), "TSLA".to_string()]
    }

    #[tokio::test]
    async fn test_no_recipients_returns_content_unsent() {
        let mut mailer = MockMailer::new();
        mailer.expect_send().never();
        let run = service(mailer).generate_newsletter(&tickers(), &[]).await.unwrap();
        assert_eq!(run.delivery, DeliveryOutcome::Skipped);
        assert!(run.content.contains("AAPL shows strong market performance"));
        assert_eq!(run.metrics.len(), 2);
    }

    #[tokio::test]
    async fn test_sends_to_all_recipients() {
        let mut mailer = MockMailer::new();
        mailer
            .expect_send()
            .times(1)
            .withf(|html, recipients| html.contains("Portfolio Newsletter") && recipients.len() == 2)
            .returning(|_, r| Ok(DeliveryOutcome::Sent { recipients: r.len() }));
        let recipients = vec!["a@example.com".to_string(), "b@example.com".to_string()];
        let run = service(mailer).generate_newsletter(&tickers(), &recipients).await.unwrap();
        assert_eq!(run.delivery, DeliveryOutcome::Sent { recipients: 2 });
    }

    #[tokio::test]
    async fn test_delivery_failure_keeps_content() {
        let mut mailer = MockMailer::new();
        mailer.expect_send().returning(|_, _| {
            let source = "bad".parse::<lettre::Address>().unwrap_err();
            Err(DeliveryError::Address { address: "bad".into(), source })
        });
        let err = service(mailer)
            .generate_newsletter(&tickers(), &["bad".to_string()])
            .await
            .unwrap_err();
        assert!(err.content().unwrap().contains("Key Metrics"));
    }

    #[tokio::test]
    async fn test_missing_credentials_still_returns_content() {
        let cfg = AppConfig::default();
        let svc = NewsletterService::new(
            &cfg,
            NewsBullets::new(None).unwrap(),
            MetricsExtractor::new(Arc::new(FixturePrices::new()), cfg.metrics.clone()),
            Arc::new(GmailMailer::new(&EmailConfig::default(), None, None)),
        )
        .unwrap()
        .with_llm(false);
        let run = svc
            .generate_newsletter(&tickers(), &["a@example.com".to_string()])
            .await
            .unwrap();
        assert_eq!(run.delivery, DeliveryOutcome::Skipped);
        assert!(run.content.contains("Portfolio Newsletter"));
    }

    #[tokio::test]
    async fn test_build_with_saved_bullets() {
        let svc = service(MockMailer::new());
        let mut bullets = BulletOutput::new();
        bullets.insert("AAPL".into(), vec!["Apple raised its buyback".into()]);
        let day = NaiveDate::from_ymd_opt(2024, 11, 1).unwrap();
        let (html, rows) = svc.build_with_bullets(&tickers(), &bullets, day).await.unwrap();
        assert!(html.contains("Apple raised its buyback"));
        assert!(!html.contains("AAPL shows strong market performance"));
        assert_eq!(rows.len(), 2);
    }

    #[tokio::test]
    async fn test_build_is_deterministic_for_a_date() {
        let svc = service(MockMailer::new());
        let day = NaiveDate::from_ymd_opt(2024, 11, 1).unwrap();
        let (a, _) = svc.build(&tickers(), day).await.unwrap();
        let (b, _) = svc.build(&tickers(), day).await.unwrap();
        assert_eq!(a, b);
        assert!(a.contains("Generated on November 01, 2024"));
    }
}
