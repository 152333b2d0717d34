// src/distribute.rs
use chrono::NaiveDate;
use metrics::{counter, describe_counter};
use once_cell::sync::OnceCell;

use crate::notify::Mailer;
use crate::store::{Digest, StoreError, SubscriberLedger};

fn ensure_metrics_described() {
    static ONCE: OnceCell<()> = OnceCell::new();
    ONCE.get_or_init(|| {
        describe_counter!("mail_sent_total", "Digest emails delivered.");
        describe_counter!("mail_failed_total", "Digest email send failures.");
        describe_counter!(
            "mail_skipped_total",
            "Subscribers skipped: already received this digest date."
        );
    });
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct DistributeReport {
    pub sent: usize,
    pub skipped: usize,
    pub failed: usize,
}

pub fn digest_subject(date: NaiveDate) -> String {
    format!("AI Daily Digest | {date}")
}

/// Walk the active subscribers and deliver `digest` to everyone whose
/// last-received date differs from its date. The ledger is advanced only
/// after a successful send, so a failed subscriber stays eligible on the
/// next run. One subscriber failing never stops the walk.
pub async fn distribute(
    ledger: &dyn SubscriberLedger,
    mailer: &dyn Mailer,
    digest: &Digest,
) -> Result<DistributeReport, StoreError> {
    ensure_metrics_described();

    let subject = digest_subject(digest.date);
    let mut report = DistributeReport::default();

    for sub in ledger.active().await? {
        if sub.last_received_date == Some(digest.date) {
            counter!("mail_skipped_total").increment(1);
            report.skipped += 1;
            continue;
        }
        match mailer.send(&sub.email, &subject, &digest.html).await {
            Ok(()) => {
                ledger.mark_received(&sub.email, digest.date).await?;
                counter!("mail_sent_total").increment(1);
                report.sent += 1;
                tracing::info!(subscriber = %sub.email, date = %digest.date, "digest delivered");
            }
            Err(e) => {
                tracing::warn!(
                    subscriber = %sub.email,
                    date = %digest.date,
                    error = ?e,
                    "send failed; subscriber stays eligible for the next run"
                );
                counter!("mail_failed_total").increment(1);
                report.failed += 1;
            }
        }
    }

    Ok(report)
}
