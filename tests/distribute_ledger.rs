// tests/distribute_ledger.rs
use std::collections::HashSet;
use std::sync::Mutex;

use anyhow::anyhow;
use async_trait::async_trait;
use chrono::{NaiveDate, TimeZone, Utc};

use ai_daily_digest::distribute::distribute;
use ai_daily_digest::{Digest, Mailer, MemoryStore, Subscriber, SubscriberLedger};

/// Mailer that records deliveries and can be told to fail for an address.
#[derive(Default)]
struct RecordingMailer {
    sent: Mutex<Vec<(String, String)>>,
    fail_for: HashSet<String>,
}

#[async_trait]
impl Mailer for RecordingMailer {
    async fn send(&self, to: &str, subject: &str, _html: &str) -> anyhow::Result<()> {
        if self.fail_for.contains(to) {
            return Err(anyhow!("smtp refused"));
        }
        self.sent
            .lock()
            .unwrap()
            .push((to.to_string(), subject.to_string()));
        Ok(())
    }
}

fn digest_for(date: NaiveDate) -> Digest {
    Digest {
        date,
        html: "<html>daily</html>".to_string(),
        created_at: Utc.with_ymd_and_hms(2026, 8, 5, 6, 0, 0).unwrap(),
        source_count: 3,
    }
}

fn date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 8, 5).unwrap()
}

async fn seed_subscriber(
    store: &MemoryStore,
    email: &str,
    active: bool,
    last: Option<NaiveDate>,
) {
    store
        .upsert(Subscriber {
            email: email.to_string(),
            active,
            last_received_date: last,
            source: "verified".to_string(),
        })
        .await
        .unwrap();
}

#[tokio::test]
async fn each_subscriber_gets_one_copy_per_digest_date() {
    let store = MemoryStore::new();
    seed_subscriber(&store, "a@example.com", true, None).await;
    let mailer = RecordingMailer::default();
    let digest = digest_for(date());

    let first = distribute(&store, &mailer, &digest).await.unwrap();
    let second = distribute(&store, &mailer, &digest).await.unwrap();

    assert_eq!(first.sent, 1);
    assert_eq!(second.sent, 0);
    assert_eq!(second.skipped, 1);
    assert_eq!(mailer.sent.lock().unwrap().len(), 1);
    assert_eq!(
        store.subscriber("a@example.com").unwrap().last_received_date,
        Some(date())
    );
}

#[tokio::test]
async fn late_joiner_is_caught_up_by_the_next_run() {
    let store = MemoryStore::new();
    let mailer = RecordingMailer::default();
    let digest = digest_for(date());
    distribute(&store, &mailer, &digest).await.unwrap();

    // Subscriber registers after the digest already exists.
    seed_subscriber(&store, "new@example.com", true, None).await;
    let report = distribute(&store, &mailer, &digest).await.unwrap();

    assert_eq!(report.sent, 1);
    let sent = mailer.sent.lock().unwrap();
    assert_eq!(sent[0].0, "new@example.com");
    assert_eq!(sent[0].1, "AI Daily Digest | 2026-08-05");
}

#[tokio::test]
async fn failed_send_leaves_the_ledger_untouched() {
    let store = MemoryStore::new();
    seed_subscriber(&store, "flaky@example.com", true, None).await;
    seed_subscriber(&store, "ok@example.com", true, None).await;
    let mut mailer = RecordingMailer::default();
    mailer.fail_for.insert("flaky@example.com".to_string());
    let digest = digest_for(date());

    let report = distribute(&store, &mailer, &digest).await.unwrap();

    assert_eq!(report.sent, 1);
    assert_eq!(report.failed, 1);
    assert_eq!(
        store
            .subscriber("flaky@example.com")
            .unwrap()
            .last_received_date,
        None
    );

    // Next run retries the failed subscriber only.
    let retry_mailer = RecordingMailer::default();
    let retry = distribute(&store, &retry_mailer, &digest).await.unwrap();
    assert_eq!(retry.sent, 1);
    assert_eq!(retry.skipped, 1);
    assert_eq!(
        retry_mailer.sent.lock().unwrap()[0].0,
        "flaky@example.com"
    );
}

#[tokio::test]
async fn inactive_subscribers_are_invisible() {
    let store = MemoryStore::new();
    seed_subscriber(&store, "gone@example.com", false, None).await;
    let mailer = RecordingMailer::default();

    let report = distribute(&store, &mailer, &digest_for(date())).await.unwrap();

    assert_eq!(report.sent + report.skipped + report.failed, 0);
    assert!(mailer.sent.lock().unwrap().is_empty());
}

#[tokio::test]
async fn a_new_date_is_delivered_over_an_old_mark() {
    let store = MemoryStore::new();
    let yesterday = NaiveDate::from_ymd_opt(2026, 8, 4).unwrap();
    seed_subscriber(&store, "a@example.com", true, Some(yesterday)).await;
    let mailer = RecordingMailer::default();

    let report = distribute(&store, &mailer, &digest_for(date())).await.unwrap();

    assert_eq!(report.sent, 1);
    assert_eq!(
        store.subscriber("a@example.com").unwrap().last_received_date,
        Some(date())
    );
}
