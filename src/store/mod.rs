// src/store/mod.rs
// Record types + typed repository traits over the document store.
// Physical key/path construction stays behind these traits; callers only
// see the operations the pipeline needs.

pub mod file;
pub mod memory;

pub use file::FileStore;
pub use memory::MemoryStore;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// A fetched post in the pool. `id` is the dedup key; once inserted the
/// entry only ever changes by flipping `consumed`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Post {
    pub id: String,
    pub author: String,
    pub text: String,
    pub url: String,
    pub created_at: DateTime<Utc>,
    pub consumed: bool,
    pub discovered_at: DateTime<Utc>,
}

/// One digest per calendar date; immutable once written (first writer wins).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Digest {
    pub date: NaiveDate,
    pub html: String,
    pub created_at: DateTime<Utc>,
    pub source_count: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Subscriber {
    pub email: String,
    pub active: bool,
    pub last_received_date: Option<NaiveDate>,
    /// Provenance tag ("verified", "import", ...); informational only.
    pub source: String,
}

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("store io: {0}")]
    Io(#[from] std::io::Error),
    #[error("store codec: {0}")]
    Codec(#[from] serde_json::Error),
}

#[async_trait::async_trait]
pub trait PostPool: Send + Sync {
    /// Insert-if-absent keyed by `post.id`. Returns `false` when an entry
    /// with that id already exists (the entry is left untouched).
    async fn insert(&self, post: Post) -> Result<bool, StoreError>;

    /// All posts not yet consumed by a digest, in no particular order.
    async fn unconsumed(&self) -> Result<Vec<Post>, StoreError>;
}

#[async_trait::async_trait]
pub trait DigestStore: Send + Sync {
    async fn get(&self, date: NaiveDate) -> Result<Option<Digest>, StoreError>;

    /// Create-if-absent for `digest.date` plus consumption marks for
    /// `consumed_ids`, applied as one batch: either both land or neither
    /// does. When a digest for the date already exists the call mutates
    /// nothing and returns the existing digest.
    async fn commit(&self, digest: Digest, consumed_ids: &[String]) -> Result<Digest, StoreError>;
}

#[async_trait::async_trait]
pub trait SubscriberLedger: Send + Sync {
    async fn active(&self) -> Result<Vec<Subscriber>, StoreError>;

    /// Record a successful delivery. Unknown emails are ignored.
    async fn mark_received(&self, email: &str, date: NaiveDate) -> Result<(), StoreError>;

    /// Insert-if-absent keyed by email; used by the bulk import. Returns
    /// `false` when the subscriber already exists (left untouched).
    async fn upsert(&self, subscriber: Subscriber) -> Result<bool, StoreError>;
}
