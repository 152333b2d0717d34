//! One-time bulk subscriber import: a JSON array of email addresses becomes
//! active subscribers with no delivery history, so the next run catches them
//! up with today's digest. Existing subscribers are left untouched.
//!
//! Usage: import_subscribers <emails.json>

use anyhow::{bail, Context, Result};
use std::path::PathBuf;

use ai_daily_digest::store::{FileStore, Subscriber, SubscriberLedger};

#[tokio::main]
async fn main() -> Result<()> {
    let _ = dotenvy::dotenv();
    tracing_subscriber::fmt().with_target(false).init();

    let Some(path) = std::env::args().nth(1) else {
        bail!("usage: import_subscribers <emails.json>");
    };
    let raw = std::fs::read_to_string(&path).with_context(|| format!("reading {path}"))?;
    let emails: Vec<String> = serde_json::from_str(&raw).context("parsing email list")?;

    let store_path = std::env::var("DIGEST_STORE_PATH")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("data/store.json"));
    let store = FileStore::open(&store_path).context("opening document store")?;

    let mut added = 0usize;
    let mut kept = 0usize;
    for email in emails {
        let email = email.trim().to_ascii_lowercase();
        if email.is_empty() {
            continue;
        }
        let inserted = store
            .upsert(Subscriber {
                email,
                active: true,
                last_received_date: None,
                source: "import".to_string(),
            })
            .await?;
        if inserted {
            added += 1;
        } else {
            kept += 1;
        }
    }

    println!("import done: {added} added, {kept} already present");
    Ok(())
}
