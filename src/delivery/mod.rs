//! Email delivery.
//!
//! `Mailer` is the seam the orchestrator sends through. `GmailMailer`
//! delivers one HTML message to all recipients over implicit-TLS SMTP.
//! Missing credentials are logged and the send is skipped; every other
//! failure is a `DeliveryError`. Nothing is retried.

use async_trait::async_trait;
use lettre::message::{Mailbox, MultiPart, SinglePart};
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use secrecy::{ExposeSecret, SecretString};
use tracing::{error, info, warn};

use crate::config::{AppConfig, EmailConfig};
use crate::error::DeliveryError;

pub const CREDENTIAL_TEST_SUBJECT: &str = "Portfolio Newsletter - Credential Test";

/// What happened to a send request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeliveryOutcome {
    Sent { recipients: usize },
    /// Nothing was sent (credentials or recipients missing).
    Skipped,
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, html: &str, recipients: &[String]) -> Result<DeliveryOutcome, DeliveryError>;
}

/// Logs instead of sending. Used by `preview` and local runs.
pub struct DryRunMailer;

#[async_trait]
impl Mailer for DryRunMailer {
    async fn send(&self, html: &str, recipients: &[String]) -> Result<DeliveryOutcome, DeliveryError> {
        info!(recipients = recipients.len(), bytes = html.len(), "Dry run, newsletter not sent");
        Ok(DeliveryOutcome::Skipped)
    }
}

struct Account {
    user: String,
    password: SecretString,
}

pub struct GmailMailer {
    host: String,
    port: u16,
    subject: String,
    account: Option<Account>,
}

impl GmailMailer {
    /// Credentials are resolved from the environment variables the config names.
    pub fn from_config(cfg: &EmailConfig) -> Self {
        let user = AppConfig::resolve_env(&cfg.user_env);
        let password = AppConfig::resolve_secret(&cfg.password_env);
        Self::new(cfg, user, password)
    }

    pub fn new(cfg: &EmailConfig, user: Option<String>, password: Option<SecretString>) -> Self {
        let account = match (user, password) {
            (Some(user), Some(password)) => Some(Account { user, password }),
            _ => None,
        };
        Self {
            host: cfg.smtp_host.clone(),
            port: cfg.smtp_port,
            subject: cfg.subject.clone(),
            account,
        }
    }

    pub fn has_credentials(&self) -> bool {
        self.account.is_some()
    }

    fn transport(&self, account: &Account) -> Result<AsyncSmtpTransport<Tokio1Executor>, DeliveryError> {
        let creds = Credentials::new(account.user.clone(), account.password.expose_secret().clone());
        Ok(AsyncSmtpTransport::<Tokio1Executor>::relay(&self.host)?
            .port(self.port)
            .credentials(creds)
            .build())
    }

    /// Connect, authenticate and send a short test message to the account itself.
    pub async fn check_credentials(&self) -> Result<DeliveryOutcome, DeliveryError> {
        let Some(account) = &self.account else {
            error!("Email credentials not configured, cannot test them");
            return Ok(DeliveryOutcome::Skipped);
        };
        let transport = self.transport(account)?;
        connection_ok(transport.test_connection().await?, &self.host)?;
        info!(host = %self.host, port = self.port, "SMTP connection and login succeeded");

        let body = "<p>Your Gmail credentials work with the portfolio newsletter.</p>";
        let message = build_message(&account.user, &[account.user.clone()], CREDENTIAL_TEST_SUBJECT, body)?;
        transport.send(message).await?;
        info!(to = %account.user, "Credential test email sent");
        Ok(DeliveryOutcome::Sent { recipients: 1 })
    }
}

#[async_trait]
impl Mailer for GmailMailer {
    async fn send(&self, html: &str, recipients: &[String]) -> Result<DeliveryOutcome, DeliveryError> {
        let Some(account) = &self.account else {
            error!("Email credentials not configured, newsletter not sent");
            return Ok(DeliveryOutcome::Skipped);
        };
        if recipients.is_empty() {
            warn!("No recipients given, nothing to send");
            return Ok(DeliveryOutcome::Skipped);
        }

        let message = build_message(&account.user, recipients, &self.subject, html)?;
        self.transport(account)?.send(message).await?;
        info!(recipients = recipients.len(), "Email sent");
        Ok(DeliveryOutcome::Sent { recipients: recipients.len() })
    }
}

fn connection_ok(answered: bool, host: &str) -> Result<(), DeliveryError> {
    if answered {
        Ok(())
    } else {
        Err(DeliveryError::Unreachable { host: host.to_string() })
    }
}

fn mailbox(address: &str) -> Result<Mailbox, DeliveryError> {
    address.trim().parse::<Mailbox>().map_err(|source| DeliveryError::Address {
        address: address.to_string(),
        source,
    })
}

/// One `multipart/alternative` HTML message from `from` to every recipient.
pub fn build_message(from: &str, recipients: &[String], subject: &str, html: &str) -> Result<Message, DeliveryError> {
    let mut builder = Message::builder().from(mailbox(from)?).subject(subject);
    for r in recipients {
        builder = builder.to(mailbox(r)?);
    }
    let body = MultiPart::alternative().singlepart(SinglePart::html(html.to_string()));
    Ok(builder.multipart(body)?)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
