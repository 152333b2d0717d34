// src/pipeline.rs
// One full scheduled pass: sweep -> compile -> distribute.

use chrono::{DateTime, Utc};
use metrics::gauge;

use crate::config::AppConfig;
use crate::digest::{self, summarizer::Summarizer, CompileConfig};
use crate::distribute::{self, DistributeReport};
use crate::ingest::{self, feed::FeedClient, SweepConfig, SweepReport};
use crate::notify::Mailer;
use crate::store::{Digest, DigestStore, PostPool, StoreError, SubscriberLedger};

#[derive(Debug, Default, Clone)]
pub struct RunReport {
    pub sweep: SweepReport,
    /// Today's digest, freshly compiled or reused from a prior run.
    pub digest: Option<Digest>,
    pub distribution: Option<DistributeReport>,
}

/// Run the pipeline once against a shared store. Distribution runs whenever
/// a digest exists for today's date — a cached digest still catches up
/// subscribers who joined since it was compiled.
pub async fn run_once<S>(
    store: &S,
    feed: &dyn FeedClient,
    summarizer: &dyn Summarizer,
    mailer: &dyn Mailer,
    cfg: &AppConfig,
    now: DateTime<Utc>,
) -> Result<RunReport, StoreError>
where
    S: PostPool + DigestStore + SubscriberLedger,
{
    let sweep_cfg = SweepConfig {
        accounts: cfg.accounts.clone(),
        per_account_cap: cfg.per_account_cap,
        lookback_days: cfg.lookback_days,
    };
    let sweep = ingest::run_sweep(feed, store, &sweep_cfg, now).await?;
    tracing::info!(
        inserted = sweep.inserted,
        skipped = sweep.skipped,
        failed_accounts = sweep.failed_accounts,
        rate_limited = sweep.rate_limited,
        "sweep finished"
    );

    let compile_cfg = CompileConfig {
        max_posts: cfg.max_posts,
        max_post_chars: cfg.max_post_chars,
    };
    let target_date = now.date_naive();
    let digest = digest::compile(store, store, summarizer, &compile_cfg, target_date).await?;

    let distribution = match &digest {
        Some(d) => {
            let dist = distribute::distribute(store, mailer, d).await?;
            tracing::info!(
                date = %d.date,
                sent = dist.sent,
                skipped = dist.skipped,
                failed = dist.failed,
                "distribution finished"
            );
            Some(dist)
        }
        None => {
            tracing::info!(date = %target_date, "no digest for today; distribution skipped");
            None
        }
    };

    gauge!("pipeline_last_run_ts").set(now.timestamp() as f64);
    Ok(RunReport {
        sweep,
        digest,
        distribution,
    })
}
