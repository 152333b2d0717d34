pub mod email;

pub use email::SmtpMailer;

/// Outbound mail transport: send one HTML message to one recipient.
#[async_trait::async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, to: &str, subject: &str, html: &str) -> anyhow::Result<()>;
}
