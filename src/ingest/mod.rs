// src/ingest/mod.rs
pub mod feed;

use chrono::{DateTime, Duration, Utc};
use metrics::{counter, describe_counter, describe_gauge};
use once_cell::sync::OnceCell;

use crate::ingest::feed::{FeedClient, FeedError};
use crate::store::{Post, PostPool, StoreError};

/// One-time metrics registration (so series show up on a scrape).
fn ensure_metrics_described() {
    static ONCE: OnceCell<()> = OnceCell::new();
    ONCE.get_or_init(|| {
        describe_counter!("sweep_posts_seen_total", "Posts returned by the feed API.");
        describe_counter!(
            "sweep_posts_inserted_total",
            "Posts newly inserted into the pool."
        );
        describe_counter!(
            "sweep_posts_skipped_total",
            "Posts skipped: outside window, unusable, or already pooled."
        );
        describe_counter!("sweep_account_errors_total", "Per-account fetch failures.");
        describe_counter!(
            "sweep_rate_limited_total",
            "Sweeps cut short by a feed rate-limit signal."
        );
        describe_gauge!("pipeline_last_run_ts", "Unix ts when the pipeline last ran.");
    });
}

/// Normalize post text: decode HTML entities, straighten curly quotes, trim.
/// Newlines are kept — the digest corpus collapses them where it needs to.
pub fn normalize_text(s: &str) -> String {
    let out = html_escape::decode_html_entities(s).to_string();
    out.replace(['\u{201C}', '\u{201D}', '\u{00AB}', '\u{00BB}'], "\"")
        .replace(['\u{2018}', '\u{2019}'], "'")
        .trim()
        .to_string()
}

/// Permalink for a pooled post, derived from author handle + post id.
pub fn post_url(author: &str, id: &str) -> String {
    format!("https://x.com/{author}/status/{id}")
}

#[derive(Debug, Clone)]
pub struct SweepConfig {
    /// Static list of tracked account handles.
    pub accounts: Vec<String>,
    /// Most-recent posts requested per account.
    pub per_account_cap: u32,
    /// Posts older than this many days (from "now") are ignored.
    pub lookback_days: i64,
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct SweepReport {
    pub inserted: usize,
    pub skipped: usize,
    pub failed_accounts: usize,
    /// The feed signalled quota exhaustion and the sweep stopped early.
    pub rate_limited: bool,
}

/// Fetch recent posts for every tracked account and insert the usable new
/// ones into the pool. A fetch failure skips that account only; a rate-limit
/// signal aborts the remainder of the sweep. Pool insertions are the only
/// side effect.
pub async fn run_sweep(
    feed: &dyn FeedClient,
    pool: &dyn PostPool,
    cfg: &SweepConfig,
    now: DateTime<Utc>,
) -> Result<SweepReport, StoreError> {
    ensure_metrics_described();

    let cutoff = now - Duration::days(cfg.lookback_days);
    let mut report = SweepReport::default();

    for account in &cfg.accounts {
        let posts = match feed.recent_posts(account, cfg.per_account_cap).await {
            Ok(v) => v,
            Err(FeedError::RateLimited) => {
                tracing::warn!(account = %account, "feed quota exhausted; stopping sweep early");
                counter!("sweep_rate_limited_total").increment(1);
                report.rate_limited = true;
                break;
            }
            Err(e) => {
                tracing::warn!(account = %account, error = ?e, "feed fetch failed; skipping account");
                counter!("sweep_account_errors_total").increment(1);
                report.failed_accounts += 1;
                continue;
            }
        };
        counter!("sweep_posts_seen_total").increment(posts.len() as u64);

        for p in posts {
            if p.id.is_empty() {
                report.skipped += 1;
                continue;
            }
            let Some(created_at) = p.created_at else {
                report.skipped += 1;
                continue;
            };
            if created_at < cutoff {
                report.skipped += 1;
                continue;
            }
            let post = Post {
                url: post_url(&p.author, &p.id),
                id: p.id,
                author: p.author,
                text: normalize_text(&p.text),
                created_at,
                consumed: false,
                discovered_at: now,
            };
            if pool.insert(post).await? {
                counter!("sweep_posts_inserted_total").increment(1);
                report.inserted += 1;
            } else {
                report.skipped += 1;
            }
        }
    }

    counter!("sweep_posts_skipped_total").increment(report.skipped as u64);
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_text_decodes_and_straightens_quotes() {
        let s = " \u{201C}AGI&nbsp;soon\u{201D} &amp; more\n  ";
        assert_eq!(normalize_text(s), "\"AGI\u{a0}soon\" & more");
    }

    #[test]
    fn normalize_text_keeps_newlines() {
        assert_eq!(normalize_text("a\nb"), "a\nb");
    }

    #[test]
    fn post_url_joins_author_and_id() {
        assert_eq!(
            post_url("karpathy", "17290"),
            "https://x.com/karpathy/status/17290"
        );
    }
}
