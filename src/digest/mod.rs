// src/digest/mod.rs
pub mod summarizer;

use chrono::{NaiveDate, Utc};
use metrics::{counter, describe_counter};
use once_cell::sync::OnceCell;

use crate::digest::summarizer::Summarizer;
use crate::store::{Digest, DigestStore, Post, PostPool, StoreError};

fn ensure_metrics_described() {
    static ONCE: OnceCell<()> = OnceCell::new();
    ONCE.get_or_init(|| {
        describe_counter!("digest_compiled_total", "Digests compiled and persisted.");
        describe_counter!(
            "digest_cache_hits_total",
            "Compile calls answered by an existing same-date digest."
        );
        describe_counter!(
            "digest_summarizer_failures_total",
            "Compile attempts dropped by a summarizer failure."
        );
    });
}

#[derive(Debug, Clone, Copy)]
pub struct CompileConfig {
    /// Newest unconsumed posts considered per digest.
    pub max_posts: usize,
    /// Per-post character cap inside the corpus.
    pub max_post_chars: usize,
}

impl Default for CompileConfig {
    fn default() -> Self {
        Self {
            max_posts: 50,
            max_post_chars: 500,
        }
    }
}

/// Compile the digest for `target_date`.
///
/// An existing digest for the date is returned unchanged with no side
/// effects. Otherwise the newest unconsumed posts are summarized and, on
/// success, the digest and its consumption marks are committed as one
/// batch. `Ok(None)` means no digest this round: either no material, or the
/// summarizer failed — in both cases nothing was persisted.
pub async fn compile(
    pool: &dyn PostPool,
    digests: &dyn DigestStore,
    summarizer: &dyn Summarizer,
    cfg: &CompileConfig,
    target_date: NaiveDate,
) -> Result<Option<Digest>, StoreError> {
    ensure_metrics_described();

    if let Some(existing) = digests.get(target_date).await? {
        counter!("digest_cache_hits_total").increment(1);
        tracing::info!(date = %target_date, "digest already exists; reusing");
        return Ok(Some(existing));
    }

    let mut posts = pool.unconsumed().await?;
    if posts.is_empty() {
        tracing::info!(date = %target_date, "no unconsumed posts; nothing to digest");
        return Ok(None);
    }
    posts.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    posts.truncate(cfg.max_posts);

    let corpus = build_corpus(&posts, cfg.max_post_chars);
    let html = match summarizer.summarize(&corpus).await {
        Ok(h) => h,
        Err(e) => {
            tracing::warn!(date = %target_date, error = ?e, "summarization failed; no digest this run");
            counter!("digest_summarizer_failures_total").increment(1);
            return Ok(None);
        }
    };

    let consumed_ids: Vec<String> = posts.iter().map(|p| p.id.clone()).collect();
    let digest = Digest {
        date: target_date,
        html,
        created_at: Utc::now(),
        source_count: posts.len(),
    };
    // commit is create-if-absent: under overlapping runs only the first
    // writer's digest lands and the loser gets it back here.
    let stored = digests.commit(digest, &consumed_ids).await?;
    counter!("digest_compiled_total").increment(1);
    tracing::info!(date = %target_date, sources = stored.source_count, "digest compiled");
    Ok(Some(stored))
}

/// One corpus line per post, in the order given: `author | url | text`,
/// newline runs collapsed to single spaces, text clipped to `max_chars`.
pub fn build_corpus(posts: &[Post], max_chars: usize) -> String {
    posts
        .iter()
        .map(|p| format!("{} | {} | {}", p.author, p.url, clip(&p.text, max_chars)))
        .collect::<Vec<_>>()
        .join("\n")
}

fn clip(text: &str, max_chars: usize) -> String {
    static RE_WS: OnceCell<regex::Regex> = OnceCell::new();
    let re_ws = RE_WS.get_or_init(|| regex::Regex::new(r"\s+").unwrap());
    let flat = re_ws.replace_all(text, " ");
    flat.trim().chars().take(max_chars).collect()
}
