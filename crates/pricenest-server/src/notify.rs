//! Outbound delivery of alert messages.
//!
//! Delivery is fire-and-forget: callers log a failed send and move on. There
//! are no retries here.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use pricenest_core::AppConfig;
use serde::Serialize;

/// Sends one message to one recipient.
#[async_trait]
pub trait Notifier: Send + Sync {
    /// # Errors
    ///
    /// Returns an error if the message could not be handed to the transport.
    async fn send(&self, recipient: &str, subject: &str, body: &str) -> anyhow::Result<()>;
}

#[derive(Debug, Serialize)]
struct WebhookMessage<'a> {
    recipient: &'a str,
    subject: &'a str,
    body: &'a str,
}

/// Posts each message as JSON to a relay endpoint (mail gateway, chat hook).
#[derive(Debug, Clone)]
pub struct WebhookNotifier {
    client: reqwest::Client,
    url: reqwest::Url,
}

impl WebhookNotifier {
    /// # Errors
    ///
    /// Returns an error if `url` does not parse or the HTTP client cannot be
    /// built.
    pub fn new(url: &str, timeout_secs: u64, user_agent: &str) -> anyhow::Result<Self> {
        let url = reqwest::Url::parse(url)
            .map_err(|e| anyhow::anyhow!("invalid notify webhook url \"{url}\": {e}"))?;
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .user_agent(user_agent)
            .build()?;
        Ok(Self { client, url })
    }
}

#[async_trait]
impl Notifier for WebhookNotifier {
    async fn send(&self, recipient: &str, subject: &str, body: &str) -> anyhow::Result<()> {
        self.client
            .post(self.url.clone())
            .json(&WebhookMessage {
                recipient,
                subject,
                body,
            })
            .send()
            .await?
            .error_for_status()?;

        tracing::info!(recipient, subject, "notification delivered");
        Ok(())
    }
}

/// Writes messages to the log instead of delivering them. Used when no
/// webhook is configured.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn send(&self, recipient: &str, subject: &str, body: &str) -> anyhow::Result<()> {
        tracing::info!(recipient, subject, body, "notification (log only)");
        Ok(())
    }
}

/// Picks the webhook notifier when `PRICENEST_NOTIFY_WEBHOOK_URL` is set and
/// falls back to [`LogNotifier`] otherwise.
///
/// # Errors
///
/// Returns an error if the configured webhook URL is invalid.
pub fn notifier_from_config(config: &AppConfig) -> anyhow::Result<Arc<dyn Notifier>> {
    match config.notify_webhook_url.as_deref() {
        Some(url) => Ok(Arc::new(WebhookNotifier::new(
            url,
            config.fetch_timeout_secs,
            &config.user_agent,
        )?)),
        None => {
            tracing::warn!("PRICENEST_NOTIFY_WEBHOOK_URL not set; alerts will only be logged");
            Ok(Arc::new(LogNotifier))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn webhook_posts_json_message() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/notify"))
            .and(body_json(serde_json::json!({
                "recipient": "buyer@example.com",
                "subject": "Price Dropped: iphone 15 is now ₹64,900",
                "body": "hello",
            })))
            .respond_with(ResponseTemplate::new(202))
            .expect(1)
            .mount(&server)
            .await;

        let notifier =
            WebhookNotifier::new(&format!("{}/notify", server.uri()), 5, "pricenest-test")
                .expect("notifier");
        notifier
            .send(
                "buyer@example.com",
                "Price Dropped: iphone 15 is now ₹64,900",
                "hello",
            )
            .await
            .expect("send should succeed");
    }

    #[tokio::test]
    async fn webhook_error_status_is_reported() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let notifier = WebhookNotifier::new(&server.uri(), 5, "pricenest-test").expect("notifier");
        let result = notifier.send("buyer@example.com", "subject", "body").await;
        assert!(result.is_err());
    }

    #[test]
    fn webhook_rejects_invalid_url() {
        assert!(WebhookNotifier::new("not a url", 5, "pricenest-test").is_err());
    }

    #[tokio::test]
    async fn log_notifier_always_succeeds() {
        LogNotifier
            .send("buyer@example.com", "subject", "body")
            .await
            .expect("log notifier never fails");
    }
}
