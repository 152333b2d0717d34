//! AI Daily Digest — Binary Entrypoint
//! One scheduled pass: sweep tracked accounts, compile today's digest,
//! deliver it to subscribers, exit.

use anyhow::{Context, Result};
use chrono::Utc;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use ai_daily_digest::config::AppConfig;
use ai_daily_digest::store::FileStore;
use ai_daily_digest::{pipeline, GeminiSummarizer, SmtpMailer, TwitterFeedClient};

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().compact())
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env in local/dev; no-op in scheduled environments.
    let _ = dotenvy::dotenv();
    init_tracing();

    // Everything required must be present before the first side effect.
    let cfg = AppConfig::from_env().context("loading configuration")?;
    let store = FileStore::open(&cfg.store_path).context("opening document store")?;
    let feed = TwitterFeedClient::new(cfg.feed.bearer_token.clone());
    let mut summarizer = GeminiSummarizer::new(cfg.gemini.api_key.clone());
    if let Some(model) = &cfg.gemini.model {
        summarizer = summarizer.with_model(model);
    }
    let mailer = SmtpMailer::new(&cfg.smtp).context("building SMTP mailer")?;

    let report = pipeline::run_once(&store, &feed, &summarizer, &mailer, &cfg, Utc::now()).await?;

    tracing::info!(
        inserted = report.sweep.inserted,
        digest = report.digest.is_some(),
        sent = report.distribution.as_ref().map(|d| d.sent).unwrap_or(0),
        "run complete"
    );
    Ok(())
}
