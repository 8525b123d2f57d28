//! Portfolio newsletter command-line entry point.
//!
//! Loads `.env` and configuration, initialises structured logging, wires
//! the providers (live or fixtures) and dispatches to a subcommand.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::sync::Arc;
use tracing::{error, info, warn};

use portfolio_newsletter::agents::NewsPipeline;
use portfolio_newsletter::config::{AppConfig, ProviderMode, RunSettings};
use portfolio_newsletter::delivery::{DeliveryOutcome, DryRunMailer, GmailMailer, Mailer};
use portfolio_newsletter::llm;
use portfolio_newsletter::metrics::MetricsExtractor;
use portfolio_newsletter::news::{self, NewsBullets};
use portfolio_newsletter::newsletter::NewsletterService;
use portfolio_newsletter::preview::{self, PreviewState};
use portfolio_newsletter::render;
use portfolio_newsletter::sources::ProviderSet;
use portfolio_newsletter::storage;

/// Tickers used by the local commands when none are configured.
const DEFAULT_TICKERS: &[&str] = &["AAPL", "GOOGL", "MSFT"];

#[derive(Parser, Debug)]
#[command(name = "newsletter")]
#[command(about = "Portfolio newsletter: ticker news, price metrics, HTML report by email", long_about = None)]
struct Cli {
    /// Path to the TOML configuration file
    #[arg(short, long, global = true, default_value = "config.toml")]
    config: String,

    /// Use embedded sample data instead of live providers
    #[arg(long, global = true)]
    fixtures: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Build the newsletter for $TICKERS and email it to $EMAIL_RECIPIENTS
    Run,
    /// Render the newsletter to a file and optionally serve it
    Preview {
        /// Comma-separated tickers (default: $TICKERS, then AAPL,GOOGL,MSFT)
        #[arg(short, long)]
        tickers: Option<String>,
        /// Output file (default from config)
        #[arg(short, long)]
        out: Option<String>,
        /// Serve the preview over HTTP after writing it
        #[arg(long)]
        serve: bool,
        /// Reuse the bullet output written by `summarize`
        #[arg(long)]
        saved_bullets: bool,
    },
    /// Print the key metrics table as Markdown
    Metrics {
        #[arg(short, long)]
        tickers: Option<String>,
    },
    /// Print price change and annualised volatility per ticker
    Changes {
        #[arg(short, long)]
        tickers: Option<String>,
    },
    /// Run the scrape, cross-check and summarise pipeline
    Pipeline {
        #[arg(short, long)]
        tickers: Option<String>,
        /// Write the ticker summaries as JSON
        #[arg(long)]
        summaries_out: Option<String>,
        /// Write a raw-news input file built from confirmed articles
        #[arg(long)]
        raw_news_out: Option<String>,
    },
    /// Turn the raw-news input file into newsletter bullets
    Summarize {
        #[arg(short, long)]
        tickers: Option<String>,
        /// Use the chat model even if USE_LLM_SUMMARIZATION is off
        #[arg(long)]
        llm: bool,
    },
    /// Collect headlines into the raw-news input file
    Collect {
        #[arg(short, long)]
        tickers: Option<String>,
    },
    /// Verify the Gmail credentials by sending a test email to the account
    CheckEmail,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (non-fatal if missing)
    let _ = dotenv::dotenv();

    init_logging();

    let cli = Cli::parse();
    let mut cfg = AppConfig::load_or_default(&cli.config)?;
    if cli.fixtures {
        cfg.newsletter.mode = ProviderMode::Fixtures;
    }
    info!(mode = ?cfg.newsletter.mode, config = %cli.config, "Portfolio newsletter starting");

    match cli.command {
        Command::Run => run(&cfg).await,
        Command::Preview { tickers, out, serve, saved_bullets } => {
            let tickers = ticker_list(&cfg, tickers);
            let out = out.unwrap_or_else(|| cfg.newsletter.preview_path.clone());
            preview_newsletter(&cfg, tickers, &out, serve, saved_bullets).await
        }
        Command::Metrics { tickers } => {
            let tickers = ticker_list(&cfg, tickers);
            let rows = metrics_extractor(&cfg)?.extract(&tickers).await;
            println!("{}", render::metrics_to_markdown(&rows, &cfg.metrics));
            Ok(())
        }
        Command::Changes { tickers } => {
            let tickers = ticker_list(&cfg, tickers);
            let changes = metrics_extractor(&cfg)?.price_changes(&tickers).await;
            for c in &changes {
                println!(
                    "{}: price {}, {} change, {} annualised volatility ({} data points)",
                    c.ticker,
                    fmt_opt(c.current_price, ""),
                    fmt_opt(c.percentage_change, "%"),
                    fmt_opt(c.annualized_volatility, ""),
                    c.data_points
                );
            }
            Ok(())
        }
        Command::Pipeline { tickers, summaries_out, raw_news_out } => {
            let tickers = ticker_list(&cfg, tickers);
            run_pipeline(&cfg, &tickers, summaries_out, raw_news_out).await
        }
        Command::Summarize { tickers, llm } => {
            let tickers = ticker_list(&cfg, tickers);
            summarize(&cfg, &tickers, llm || cfg.use_llm()).await
        }
        Command::Collect { tickers } => {
            let tickers = ticker_list(&cfg, tickers);
            let providers = ProviderSet::from_config(&cfg)?;
            let input = news::collect_raw_news(providers.headlines.as_ref(), &tickers).await;
            storage::save_raw_news(&input, &cfg.news.input_path)?;
            info!(path = %cfg.news.input_path, tickers = input.len(), "Raw news input written");
            Ok(())
        }
        Command::CheckEmail => {
            let mailer = GmailMailer::from_config(&cfg.email);
            match mailer.check_credentials().await? {
                DeliveryOutcome::Sent { .. } => info!("Email credentials OK"),
                DeliveryOutcome::Skipped => anyhow::bail!(
                    "set {} and {} to test email delivery",
                    cfg.email.user_env,
                    cfg.email.password_env
                ),
            }
            Ok(())
        }
    }
}

/// The scheduled job: both env lists are required before anything is fetched.
async fn run(cfg: &AppConfig) -> Result<()> {
    let settings = match RunSettings::from_env(&cfg.newsletter) {
        Ok(s) => s,
        Err(e) => {
            error!(error = %e, "Exiting.");
            return Err(e.into());
        }
    };
    info!(tickers = ?settings.tickers, recipients = settings.recipients.len(), "Generating newsletter");

    let service = newsletter_service(cfg, Arc::new(GmailMailer::from_config(&cfg.email)))?;
    match service.generate_newsletter(&settings.tickers, &settings.recipients).await {
        Ok(run) => {
            info!(chars = run.content.len(), delivery = ?run.delivery, "Job finished successfully.");
            Ok(())
        }
        Err(err) => {
            if let Some(content) = err.content() {
                // keep the generated document for inspection
                if let Err(e) = preview::write_preview(content, &cfg.newsletter.preview_path) {
                    warn!(error = %e, "Could not save undelivered newsletter");
                }
            }
            error!(error = %err, "Newsletter run failed");
            Err(err.into())
        }
    }
}

async fn preview_newsletter(
    cfg: &AppConfig,
    tickers: Vec<String>,
    out: &str,
    serve: bool,
    saved_bullets: bool,
) -> Result<()> {
    let service = newsletter_service(cfg, Arc::new(DryRunMailer))?;
    let today = chrono::Local::now().date_naive();
    let saved = if saved_bullets { storage::load_bullets(&cfg.news.output_path)? } else { None };
    let (html, metrics) = match saved {
        Some(bullets) => {
            info!(path = %cfg.news.output_path, "Using saved news bullets");
            service.build_with_bullets(&tickers, &bullets, today).await?
        }
        None => {
            if saved_bullets {
                warn!(path = %cfg.news.output_path, "No saved bullets, generating them");
            }
            service.build(&tickers, today).await?
        }
    };
    preview::write_preview(&html, out)?;

    if serve {
        let state = Arc::new(PreviewState::new(html, tickers, metrics));
        preview::serve(state, cfg.preview.port).await?;
    }
    Ok(())
}

async fn run_pipeline(
    cfg: &AppConfig,
    tickers: &[String],
    summaries_out: Option<String>,
    raw_news_out: Option<String>,
) -> Result<()> {
    let providers = ProviderSet::from_config(cfg)?;
    let inference = llm::client_from_config(&cfg.llm)?;
    let report = NewsPipeline::from_providers(cfg, &providers, inference).run(tickers).await;

    for s in &report.summaries {
        let sources: Vec<&str> = s.sources.iter().map(String::as_str).collect();
        println!("{} [{}] {}", s.ticker, s.sentiment, s.summary);
        if !sources.is_empty() {
            println!("    sources: {}", sources.join(", "));
        }
    }

    if let Some(path) = summaries_out {
        storage::save_summaries(&report.summaries, &path)?;
        info!(path = %path, "Ticker summaries written");
    }
    if let Some(path) = raw_news_out {
        storage::save_raw_news(&report.raw_news(), &path)?;
        info!(path = %path, "Raw news input written");
    }
    Ok(())
}

async fn summarize(cfg: &AppConfig, tickers: &[String], use_llm: bool) -> Result<()> {
    let client = if use_llm { llm::client_from_config(&cfg.llm)? } else { None };
    let input = if use_llm { storage::load_raw_news(&cfg.news.input_path)? } else { Default::default() };
    let bullets = NewsBullets::new(client)?.get_all_news(tickers, use_llm, &input).await;
    storage::save_bullets(&bullets, &cfg.news.output_path)?;
    println!("{}", serde_json::to_string_pretty(&bullets).context("Failed to format bullets")?);
    Ok(())
}

fn metrics_extractor(cfg: &AppConfig) -> Result<MetricsExtractor> {
    let providers = ProviderSet::from_config(cfg)?;
    Ok(MetricsExtractor::new(providers.prices, cfg.metrics.clone()))
}

fn newsletter_service(
    cfg: &AppConfig,
    mailer: Arc<dyn Mailer>,
) -> Result<NewsletterService> {
    let providers = ProviderSet::from_config(cfg)?;
    let use_llm = cfg.use_llm();
    let client = if use_llm { llm::client_from_config(&cfg.llm)? } else { None };
    let service = NewsletterService::new(
        cfg,
        NewsBullets::new(client)?,
        MetricsExtractor::new(providers.prices, cfg.metrics.clone()),
        mailer,
    )?;
    Ok(service.with_llm(use_llm))
}

fn ticker_list(cfg: &AppConfig, explicit: Option<String>) -> Vec<String> {
    explicit
        .map(|raw| portfolio_newsletter::config::split_list(&raw))
        .filter(|t| !t.is_empty())
        .unwrap_or_else(|| RunSettings::tickers_or(&cfg.newsletter, DEFAULT_TICKERS))
}

fn fmt_opt(value: Option<f64>, suffix: &str) -> String {
    value.map_or_else(|| render::NOT_AVAILABLE.to_string(), |v| format!("{v:.2}{suffix}"))
}

/// Initialise the `tracing` subscriber.
fn init_logging() {
    use tracing_subscriber::{fmt, EnvFilter};

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("portfolio_newsletter=info,newsletter=info"));

    let json_logging = std::env::var("NEWSLETTER_LOG_JSON").is_ok();

    if json_logging {
        fmt()
            .json()
            .with_env_filter(env_filter)
            .with_target(true)
            .with_thread_ids(true)
            .init();
    } else {
        fmt()
            .with_env_filter(env_filter)
            .with_target(true)
            .init();
    }
}
