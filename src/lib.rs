// src/lib.rs
// Public library surface for integration tests (and potential reuse).

pub mod config;
pub mod digest;
pub mod distribute;
pub mod ingest;
pub mod notify;
pub mod pipeline;
pub mod store;

// ---- Re-exports for stable public API ----
pub use crate::digest::summarizer::{GeminiSummarizer, Summarizer};
pub use crate::ingest::feed::{FeedClient, FeedError, FeedPost, TwitterFeedClient};
pub use crate::notify::{Mailer, SmtpMailer};
pub use crate::store::{
    Digest, DigestStore, FileStore, MemoryStore, Post, PostPool, StoreError, Subscriber,
    SubscriberLedger,
};
