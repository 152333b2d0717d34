// src/store/file.rs
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::{Digest, DigestStore, Post, PostPool, StoreError, Subscriber, SubscriberLedger};

/// On-disk document holding the three collections.
#[derive(Debug, Default, Serialize, Deserialize)]
struct Document {
    posts: BTreeMap<String, Post>,
    digests: BTreeMap<NaiveDate, Digest>,
    subscribers: BTreeMap<String, Subscriber>,
}

/// Document store backed by a single JSON file. Every mutation rewrites the
/// file through a `.tmp` sibling and `fs::rename`, so the digest commit
/// (digest + consumption marks) lands as one atomic replace — a crash can
/// never leave a digest without its marks or marks without their digest.
pub struct FileStore {
    path: PathBuf,
    inner: Mutex<Document>,
}

impl FileStore {
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let path = path.as_ref().to_path_buf();
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let doc = match fs::read_to_string(&path) {
            Ok(s) => serde_json::from_str(&s)?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Document::default(),
            Err(e) => return Err(e.into()),
        };
        Ok(Self {
            path,
            inner: Mutex::new(doc),
        })
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Document> {
        self.inner.lock().expect("store mutex poisoned")
    }

    fn persist(&self, doc: &Document) -> Result<(), StoreError> {
        let tmp = self.path.with_extension("json.tmp");
        let json = serde_json::to_string_pretty(doc)?;
        fs::write(&tmp, json)?;
        fs::rename(&tmp, &self.path)?;
        Ok(())
    }
}

#[async_trait::async_trait]
impl PostPool for FileStore {
    async fn insert(&self, post: Post) -> Result<bool, StoreError> {
        let mut g = self.lock();
        if g.posts.contains_key(&post.id) {
            return Ok(false);
        }
        g.posts.insert(post.id.clone(), post);
        self.persist(&g)?;
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
impl DigestStore for FileStore {
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
        self.persist(&g)?;
        Ok(digest)
    }
}

#[async_trait::async_trait]
impl SubscriberLedger for FileStore {
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
        let mut g = self.lock();
        if let Some(s) = g.subscribers.get_mut(email) {
            s.last_received_date = Some(date);
            self.persist(&g)?;
        }
        Ok(())
    }

    async fn upsert(&self, subscriber: Subscriber) -> Result<bool, StoreError> {
        let mut g = self.lock();
        if g.subscribers.contains_key(&subscriber.email) {
            return Ok(false);
        }
        g.subscribers.insert(subscriber.email.clone(), subscriber);
        self.persist(&g)?;
        Ok(true)
    }
}
