//! Transactional mail client (Resend-compatible HTTP API).
//!
//! Without an API key the client degrades to a logging no-op, which keeps
//! local development and the integration tests offline.

use anyhow::{Context, Result};
use reqwest::Client;
use serde::Serialize;
use std::time::Duration;
use tracing::debug;

const MAIL_API: &str = "https://api.resend.com/emails";

#[derive(Debug, Serialize)]
struct SendRequest<'a> {
    from: &'a str,
    to: [&'a str; 1],
    subject: &'a str,
    html: &'a str,
}

#[derive(Clone)]
pub struct MailClient {
    client: Client,
    api_key: Option<String>,
    from: String,
}

impl MailClient {
    pub fn new(api_key: Option<String>, from: String) -> Result<Self> {
        let client = Client::builder()
            .user_agent("Theca/1.0")
            .timeout(Duration::from_secs(15))
            .build()
            .context("Failed to build mail HTTP client")?;

        Ok(Self {
            client,
            api_key,
            from,
        })
    }

    pub async fn send_verification_code(
        &self,
        email: &str,
        username: &str,
        code: &str,
    ) -> Result<()> {
        let html = format!(
            "<p>Hi {username},</p>\
             <p>Your Theca verification code is <strong>{code}</strong>.</p>\
             <p>If you did not create this account, you can ignore this email.</p>"
        );
        self.send(email, "Verify your Theca account", &html).await
    }

    pub async fn send_reset_link(&self, email: &str, username: &str, link: &str) -> Result<()> {
        let html = format!(
            "<p>Hi {username},</p>\
             <p><a href=\"{link}\">Reset your Theca password</a>. \
             The link is valid for 24 hours.</p>\
             <p>If you did not request a reset, you can ignore this email.</p>"
        );
        self.send(email, "Reset your Theca password", &html).await
    }

    async fn send(&self, to: &str, subject: &str, html: &str) -> Result<()> {
        let Some(api_key) = &self.api_key else {
            debug!(to, subject, "mail delivery disabled, skipping send");
            return Ok(());
        };

        let body = SendRequest {
            from: &self.from,
            to: [to],
            subject,
            html,
        };

        let response = self
            .client
            .post(MAIL_API)
            .bearer_auth(api_key)
            .json(&body)
            .send()
            .await
            .context("Mail API request failed")?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            anyhow::bail!("Mail API returned {status}: {text}");
        }

        debug!(to, subject, "mail accepted for delivery");
        Ok(())
    }
}
