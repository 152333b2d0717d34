// src/store/memory.rs
use std::collections::BTreeMap;
use std::sync::Mutex;

use chrono::NaiveDate;

use super::{Digest, DigestStore, Post, PostPool, StoreError, Subscriber, SubscriberLedger};

#[derive(Debug, Default)]
struct Collections {
    posts: BTreeMap<String, Post>,
    digests: BTreeMap<NaiveDate, Digest>,
    subscribers: BTreeMap<String, Subscriber>,
}

/// In-memory store for tests and local dry runs. One mutex guards all three
/// collections so `commit` applies its batch in a single critical section.
#[derive(Debug, Default)]
pub struct MemoryStore {
    inner: Mutex<Collections>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn post(&self, id: &str) -> Option<Post> {
        self.lock().posts.get(id).cloned()
    }

    pub fn post_count(&self) -> usize {
        self.lock().posts.len()
    }

    pub fn digest_count(&self) -> usize {
        self.lock().digests.len()
    }

    pub fn subscriber(&self, email: &str) -> Option<Subscriber> {
        self.lock().subscribers.get(email).cloned()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Collections> {
        self.inner.lock().expect("store mutex poisoned")
    }
}

#[async_trait::async_trait]
impl PostPool for MemoryStore {
    async fn insert(&self, post: Post) -> Result<bool, StoreError> {
        let mut g = self.lock();
        if g.posts.contains_key(&post.id) {
            return Ok(false);
        }
        g.posts.insert(post.id.clone(), post);
        Ok(true)
    }

    async fn unconsumed(&self) -> Result<Vec<Post>, StoreError> {
        Ok(self
            .lock()
            .posts
            .values()
            .filter(|p| !p.consumed)
            .cloned()
            .collect())
    }
}

#[async_trait::async_trait]
impl DigestStore for MemoryStore {
    async fn get(&self, date: NaiveDate) -> Result<Option<Digest>, StoreError> {
        Ok(self.lock().digests.get(&date).cloned())
    }

    async fn commit(&self, digest: Digest, consumed_ids: &[String]) -> Result<Digest, StoreError> {
        let mut g = self.lock();
        if let Some(existing) = g.digests.get(&digest.date) {
            return Ok(existing.clone());
        }
        for id in consumed_ids {
            if let Some(p) = g.posts.get_mut(id) {
                p.consumed = true;
            }
        }
        g.digests.insert(digest.date, digest.clone());
        Ok(digest)
    }
}

#[async_trait::async_trait]
impl SubscriberLedger for MemoryStore {
    async fn active(&self) -> Result<Vec<Subscriber>, StoreError> {
        Ok(self
            .lock()
            .subscribers
            .values()
            .filter(|s| s.active)
            .cloned()
            .collect())
    }

    async fn mark_received(&self, email: &str, date: NaiveDate) -> Result<(), StoreError> {
        if let Some(s) = self.lock().subscribers.get_mut(email) {
            s.last_received_date = Some(date);
        }
        Ok(())
    }

    async fn upsert(&self, subscriber: Subscriber) -> Result<bool, StoreError> {
        let mut g = self.lock();
        if g.subscribers.contains_key(&subscriber.email) {
            return Ok(false);
        }
        g.subscribers.insert(subscriber.email.clone(), subscriber);
        Ok(true)
    }
}
