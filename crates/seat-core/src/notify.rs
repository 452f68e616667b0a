//! Telegram notifications.
//!
//! The watcher hands plain-text messages to a [`Notifier`]. The
//! [`TelegramNotifier`] POSTs them to the Bot API `sendMessage` method. Missing
//! credentials and delivery failures are logged and swallowed so a broken
//! notification channel never stops the watcher.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use tracing::{debug, info, warn};

use crate::config::{TelegramCredentials, DEFAULT_TELEGRAM_API};

pub const STARTUP_MESSAGE: &str =
    "✅ Airsoft Checker gestartet und überwacht jetzt die Teilnehmerzahl.";

/// Message sent when a reading below the threshold is observed.
pub fn slot_free_message(count: u64, threshold: u64, url: &str) -> String {
    format!("🎯 Ein Platz ist frei geworden! Aktuell {count}/{threshold} Teilnehmer.\n{url}")
}

/// Result of a single notification attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delivery {
    Sent,
    /// No credentials configured; nothing was sent.
    Skipped,
    Failed,
}

#[async_trait]
pub trait Notifier: Send + Sync {
    async fn notify(&self, message: &str) -> Delivery;
}

pub struct TelegramNotifier {
    client: Client,
    credentials: Option<TelegramCredentials>,
    api_base: String,
    timeout: Duration,
}

impl TelegramNotifier {
    pub fn new(client: Client, credentials: Option<TelegramCredentials>) -> Self {
        Self {
            client,
            credentials,
            api_base: DEFAULT_TELEGRAM_API.to_string(),
            timeout: Duration::from_secs(10),
        }
    }

    pub fn with_api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = api_base.into().trim_end_matches('/').to_string();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn has_credentials(&self) -> bool {
        self.credentials.is_some()
    }

    fn send_message_url(&self, bot_token: &str) -> String {
        format!("{}/bot{}/sendMessage", self.api_base, bot_token)
    }
}

#[async_trait]
impl Notifier for TelegramNotifier {
    async fn notify(&self, message: &str) -> Delivery {
        let Some(creds) = &self.credentials else {
            warn!("BOT_TOKEN or CHAT_ID is not set, skipping Telegram notification");
            return Delivery::Skipped;
        };

        let form = [("chat_id", creds.chat_id.as_str()), ("text", message)];
        let result = self
            .client
            .post(self.send_message_url(&creds.bot_token))
            .timeout(self.timeout)
            .form(&form)
            .send()
            .await;

        match result {
            Ok(resp) if resp.status().is_success() => {
                info!(chat_id = %creds.chat_id, "Telegram notification sent");
                Delivery::Sent
            }
            Ok(resp) => {
                let status = resp.status().as_u16();
                let body = resp.text().await.unwrap_or_default();
                warn!(status, body = %body, "Telegram API rejected the message");
                Delivery::Failed
            }
            Err(e) => {
                // reqwest includes the URL, which carries the token.
                let e = e.without_url();
                warn!(error = %e, "Failed to send Telegram notification");
                debug!(error = ?e, "Telegram delivery error detail");
                Delivery::Failed
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_string_contains, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn creds() -> Option<TelegramCredentials> {
        TelegramCredentials::from_values(Some("123:abc".into()), Some("-100777".into()))
    }

    #[test]
    fn slot_free_message_text() {
        assert_eq!(
            slot_free_message(40, 45, "https://example.com/event"),
            "🎯 Ein Platz ist frei geworden! Aktuell 40/45 Teilnehmer.\nhttps://example.com/event"
        );
    }

    #[test]
    fn api_base_trailing_slash_is_trimmed() {
        let n = TelegramNotifier::new(Client::new(), creds()).with_api_base("http://localhost:1/");
        assert_eq!(
            n.send_message_url("123:abc"),
            "http://localhost:1/bot123:abc/sendMessage"
        );
    }

    #[tokio::test]
    async fn sends_form_to_send_message() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/bot123:abc/sendMessage"))
            .and(body_string_contains("chat_id=-100777"))
            .and(body_string_contains("text=hello+world"))
            .respond_with(ResponseTemplate::new(200).set_body_string(r#"{"ok":true}"#))
            .expect(1)
            .mount(&server)
            .await;

        let notifier = TelegramNotifier::new(Client::new(), creds()).with_api_base(server.uri());
        assert_eq!(notifier.notify("hello world").await, Delivery::Sent);
    }

    #[tokio::test]
    async fn missing_credentials_make_no_request() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        let notifier = TelegramNotifier::new(Client::new(), None).with_api_base(server.uri());
        assert!(!notifier.has_credentials());
        for msg in ["", "hello", STARTUP_MESSAGE] {
            assert_eq!(notifier.notify(msg).await, Delivery::Skipped);
        }
    }

    #[tokio::test]
    async fn api_error_is_swallowed() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(401).set_body_string(r#"{"ok":false}"#))
            .mount(&server)
            .await;

        let notifier = TelegramNotifier::new(Client::new(), creds()).with_api_base(server.uri());
        assert_eq!(notifier.notify("hi").await, Delivery::Failed);
    }

    #[tokio::test]
    async fn network_error_is_swallowed() {
        let notifier = TelegramNotifier::new(Client::new(), creds())
            .with_api_base("http://127.0.0.1:1")
            .with_timeout(Duration::from_secs(2));
        assert_eq!(notifier.notify("hi").await, Delivery::Failed);
    }
}
