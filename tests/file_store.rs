// tests/file_store.rs
use chrono::{NaiveDate, TimeZone, Utc};

use ai_daily_digest::{
    Digest, DigestStore, FileStore, Post, PostPool, Subscriber, SubscriberLedger,
};

fn post(id: &str) -> Post {
    let ts = Utc.with_ymd_and_hms(2026, 8, 4, 9, 0, 0).unwrap();
    Post {
        id: id.to_string(),
        author: "sama".to_string(),
        text: format!("post {id}"),
        url: format!("https://x.com/sama/status/{id}"),
        created_at: ts,
        consumed: false,
        discovered_at: ts,
    }
}

fn digest(date: NaiveDate, html: &str) -> Digest {
    Digest {
        date,
        html: html.to_string(),
        created_at: Utc.with_ymd_and_hms(2026, 8, 5, 6, 0, 0).unwrap(),
        source_count: 1,
    }
}

fn date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 8, 5).unwrap()
}

#[tokio::test]
async fn state_survives_a_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("store.json");

    {
        let store = FileStore::open(&path).unwrap();
        assert!(store.insert(post("1")).await.unwrap());
        assert!(store.insert(post("2")).await.unwrap());
        store
            .upsert(Subscriber {
                email: "a@example.com".to_string(),
                active: true,
                last_received_date: None,
                source: "import".to_string(),
            })
            .await
            .unwrap();
        store
            .commit(digest(date(), "<html>v1</html>"), &["1".to_string()])
            .await
            .unwrap();
    }

    let reopened = FileStore::open(&path).unwrap();
    // The digest landed together with its consumption mark.
    let stored = reopened.get(date()).await.unwrap().unwrap();
    assert_eq!(stored.html, "<html>v1</html>");
    let unconsumed = reopened.unconsumed().await.unwrap();
    assert_eq!(unconsumed.len(), 1);
    assert_eq!(unconsumed[0].id, "2");
    assert_eq!(reopened.active().await.unwrap().len(), 1);
}

#[tokio::test]
async fn duplicate_insert_is_rejected_on_disk_too() {
    let dir = tempfile::tempdir().unwrap();
    let store = FileStore::open(dir.path().join("store.json")).unwrap();

    assert!(store.insert(post("1")).await.unwrap());
    assert!(!store.insert(post("1")).await.unwrap());
    assert_eq!(store.unconsumed().await.unwrap().len(), 1);
}

#[tokio::test]
async fn first_digest_writer_wins() {
    let dir = tempfile::tempdir().unwrap();
    let store = FileStore::open(dir.path().join("store.json")).unwrap();
    store.insert(post("1")).await.unwrap();
    store.insert(post("2")).await.unwrap();

    let first = store
        .commit(digest(date(), "<html>first</html>"), &["1".to_string()])
        .await
        .unwrap();
    // A competing commit for the same date changes nothing.
    let second = store
        .commit(digest(date(), "<html>second</html>"), &["2".to_string()])
        .await
        .unwrap();

    assert_eq!(first.html, "<html>first</html>");
    assert_eq!(second.html, "<html>first</html>");
    let unconsumed = store.unconsumed().await.unwrap();
    assert_eq!(unconsumed.len(), 1);
    assert_eq!(unconsumed[0].id, "2");
}

#[tokio::test]
async fn mark_received_persists() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("store.json");

    {
        let store = FileStore::open(&path).unwrap();
        store
            .upsert(Subscriber {
                email: "a@example.com".to_string(),
                active: true,
                last_received_date: None,
                source: "verified".to_string(),
            })
            .await
            .unwrap();
        store.mark_received("a@example.com", date()).await.unwrap();
    }

    let reopened = FileStore::open(&path).unwrap();
    let subs = reopened.active().await.unwrap();
    assert_eq!(subs[0].last_received_date, Some(date()));
}
