//! Full newsletter generation against fixture prices and a recording mailer.

use async_trait::async_trait;
use std::sync::{Arc, Mutex};

use portfolio_newsletter::config::{AppConfig, EmailConfig};
use portfolio_newsletter::delivery::{DeliveryOutcome, GmailMailer, Mailer};
use portfolio_newsletter::error::{DeliveryError, RunError};
use portfolio_newsletter::metrics::MetricsExtractor;
use portfolio_newsletter::news::NewsBullets;
use portfolio_newsletter::newsletter::NewsletterService;
use portfolio_newsletter::sources::ProviderSet;

#[derive(Default)]
struct RecordingMailer {
    sent: Mutex<Vec<(String, Vec<String>)>>,
    fail: bool,
}

#[async_trait]
impl Mailer for RecordingMailer {
    async fn send(&self, html: &str, recipients: &[String]) -> Result<DeliveryOutcome, DeliveryError> {
        if self.fail {
            let source = "nobody".parse::<lettre::Address>().unwrap_err();
            return Err(DeliveryError::Address { address: "nobody".into(), source });
        }
        self.sent.lock().unwrap().push((html.to_string(), recipients.to_vec()));
        Ok(DeliveryOutcome::Sent { recipients: recipients.len() })
    }
}

fn service(mailer: Arc<dyn Mailer>) -> NewsletterService {
    let cfg = AppConfig::default();
    let providers = ProviderSet::fixtures(&cfg.news.quality_sources).unwrap();
    NewsletterService::new(
        &cfg,
        NewsBullets::new(None).unwrap(),
        MetricsExtractor::new(providers.prices, cfg.metrics.clone()),
        mailer,
    )
    .unwrap()
    .with_llm(false)
}

fn tickers() -> Vec<String> {
    vec!["AAPL".to_string(), "GOOGL".to_string(), "TSLA".to_string()]
}

#[tokio::test]
async fn test_generate_and_send() {
    let mailer = Arc::new(RecordingMailer::default());
    let recipients = vec!["a@example.com".to_string()];
    let run = service(mailer.clone()).generate_newsletter(&tickers(), &recipients).await.unwrap();

    assert_eq!(run.delivery, DeliveryOutcome::Sent { recipients: 1 });
    let sent = mailer.sent.lock().unwrap();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].0, run.content);
    assert_eq!(sent[0].1, recipients);

    assert!(run.content.contains("Daily portfolio update for: AAPL, GOOGL, TSLA"));
    assert!(run.content.contains("GOOGL remains active in key strategic initiatives"));
    // every fixture history is long enough for all four metrics
    assert_eq!(run.metrics.len(), 3);
    assert!(run.metrics.iter().all(|r| r.sma.is_some() && r.volume_ratio.is_some()));
    assert!(!run.content.contains("N/A"));
}

#[tokio::test]
async fn test_no_recipients_is_not_sent() {
    let mailer = Arc::new(RecordingMailer::default());
    let run = service(mailer.clone()).generate_newsletter(&tickers(), &[]).await.unwrap();
    assert_eq!(run.delivery, DeliveryOutcome::Skipped);
    assert!(mailer.sent.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_delivery_failure_returns_content() {
    let mailer = Arc::new(RecordingMailer { fail: true, ..Default::default() });
    let err = service(mailer)
        .generate_newsletter(&tickers(), &["x@example.com".to_string()])
        .await
        .unwrap_err();
    assert!(matches!(err, RunError::Delivery { .. }));
    assert!(err.content().unwrap().contains("Portfolio Newsletter"));
}

#[tokio::test]
async fn test_missing_credentials_skips_delivery_but_keeps_content() {
    let mailer = Arc::new(GmailMailer::new(&EmailConfig::default(), None, None));
    let run = service(mailer)
        .generate_newsletter(&tickers(), &["a@example.com".to_string()])
        .await
        .unwrap();
    assert_eq!(run.delivery, DeliveryOutcome::Skipped);
    assert!(run.content.contains("Daily portfolio update for: AAPL, GOOGL, TSLA"));
    assert_eq!(run.metrics.len(), 3);
}
