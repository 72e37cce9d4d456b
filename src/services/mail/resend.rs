use anyhow::Context;
use async_trait::async_trait;

use super::Mailer;

pub struct ResendMailer {
    api_key: String,
    client: reqwest::Client,
}

impl ResendMailer {
    pub fn new(api_key: String) -> Self {
        Self {
            api_key,
            client: reqwest::Client::new(),
        }
    }
}

#[async_trait]
impl Mailer for ResendMailer {
    async fn send(&self, from: &str, to: &str, subject: &str, html: &str) -> anyhow::Result<()> {
        self.client
            .post("https://api.resend.com/emails")
            .bearer_auth(&self.api_key)
            .json(&serde_json::json!({
                "from": from,
                "to": [to],
                "subject": subject,
                "html": html,
            }))
            .send()
            .await
            .context("failed to send email")?
            .error_for_status()
            .context("Resend API returned error")?;

        Ok(())
    }
}
