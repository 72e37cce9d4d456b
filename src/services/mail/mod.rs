pub mod resend;

use async_trait::async_trait;

#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, from: &str, to: &str, subject: &str, html: &str) -> anyhow::Result<()>;
}
