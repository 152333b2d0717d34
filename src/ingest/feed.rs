// src/ingest/feed.rs
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Deserialize;

/// One post as reported by the feed API. The sweep decides what is usable;
/// the client only maps the wire shape.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeedPost {
    pub id: String,
    pub author: String,
    pub text: String,
    pub created_at: Option<DateTime<Utc>>,
}

#[derive(Debug, thiserror::Error)]
pub enum FeedError {
    /// Quota exhausted upstream; the sweep stops asking for more.
    #[error("feed rate limit exhausted")]
    RateLimited,
    #[error("feed request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("feed returned status {0}")]
    Status(reqwest::StatusCode),
}

#[async_trait]
pub trait FeedClient: Send + Sync {
    /// Up to `limit` most-recent posts for one account handle.
    async fn recent_posts(&self, handle: &str, limit: u32) -> Result<Vec<FeedPost>, FeedError>;
}

const DEFAULT_BASE_URL: &str = "https://api.twitter.com";

/// Recent-search client over the X API v2. App-only bearer auth.
pub struct TwitterFeedClient {
    http: reqwest::Client,
    bearer_token: String,
    base_url: String,
}

impl TwitterFeedClient {
    pub fn new(bearer_token: String) -> Self {
        let http = reqwest::Client::builder()
            .user_agent("ai-daily-digest/0.1 (+github.com/insightdata-space/ai-daily-digest)")
            .connect_timeout(Duration::from_secs(4))
            .timeout(Duration::from_secs(15))
            .build()
            .expect("reqwest client");
        Self {
            http,
            bearer_token,
            base_url: DEFAULT_BASE_URL.to_string(),
        }
    }

    pub fn with_base_url(mut self, base_url: &str) -> Self {
        self.base_url = base_url.trim_end_matches('/').to_string();
        self
    }
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    data: Option<Vec<ApiTweet>>,
    includes: Option<ApiIncludes>,
}

#[derive(Debug, Deserialize)]
struct ApiTweet {
    id: String,
    text: String,
    author_id: Option<String>,
    created_at: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ApiIncludes {
    users: Option<Vec<ApiUser>>,
}

#[derive(Debug, Deserialize)]
struct ApiUser {
    id: String,
    username: String,
}

#[async_trait]
impl FeedClient for TwitterFeedClient {
    async fn recent_posts(&self, handle: &str, limit: u32) -> Result<Vec<FeedPost>, FeedError> {
        let query = format!("from:{handle}");
        // The search endpoint rejects max_results outside 10..=100; request
        // the floor and truncate client-side when the cap is smaller.
        let max_results = limit.clamp(10, 100).to_string();

        let resp = self
            .http
            .get(format!("{}/2/tweets/search/recent", self.base_url))
            .bearer_auth(self.bearer_token.trim())
            .query(&[
                ("query", query.as_str()),
                ("max_results", max_results.as_str()),
                ("tweet.fields", "created_at,author_id"),
                ("expansions", "author_id"),
                ("user.fields", "username"),
            ])
            .send()
            .await?;

        let status = resp.status();
        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            return Err(FeedError::RateLimited);
        }
        if !status.is_success() {
            return Err(FeedError::Status(status));
        }

        let body: SearchResponse = resp.json().await?;
        let users = body
            .includes
            .and_then(|i| i.users)
            .unwrap_or_default();

        let mut out = Vec::new();
        for tweet in body.data.unwrap_or_default() {
            let author = tweet
                .author_id
                .as_deref()
                .and_then(|aid| users.iter().find(|u| u.id == aid))
                .map(|u| u.username.clone())
                .unwrap_or_else(|| handle.to_string());
            out.push(FeedPost {
                id: tweet.id,
                author,
                text: tweet.text,
                created_at: tweet
                    .created_at
                    .as_deref()
                    .and_then(|ts| DateTime::parse_from_rfc3339(ts).ok())
                    .map(|dt| dt.with_timezone(&Utc)),
            });
        }
        out.truncate(limit as usize);
        Ok(out)
    }
}
