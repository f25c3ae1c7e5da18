use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use tracing::{debug, instrument};

use super::{AlertSink, Destination, Severity};
use crate::error::DeliveryError;

pub const TELEGRAM_API_URL: &str = "https://api.telegram.org";

#[derive(Debug, Serialize)]
struct SendMessage<'a> {
    chat_id: i64,
    text: &'a str,
}

/// Sends messages through the Telegram Bot API `sendMessage` method.
///
/// Destinations are numeric chat ids.
#[derive(Clone)]
pub struct TelegramSink {
    http: Client,
    endpoint: String,
}

impl TelegramSink {
    pub fn new(bot_token: &str) -> Result<Self, DeliveryError> {
        Self::with_api_url(TELEGRAM_API_URL, bot_token)
    }

    pub fn with_api_url(api_url: &str, bot_token: &str) -> Result<Self, DeliveryError> {
        let http = Client::builder()
            .timeout(Duration::from_secs(10))
            .pool_idle_timeout(Duration::from_secs(30))
            .build()?;

        let endpoint = format!(
            "{}/bot{}/sendMessage",
            api_url.trim_end_matches('/'),
            bot_token
        );

        Ok(Self { http, endpoint })
    }

    pub fn chat_id(destination: &Destination) -> Result<i64, DeliveryError> {
        destination
            .as_str()
            .trim()
            .parse()
            .map_err(|_| DeliveryError::InvalidDestination(destination.to_string()))
    }

    pub fn render(text: &str, severity: Severity) -> String {
        match severity {
            Severity::Alert => format!("[ALERT] {text}"),
            Severity::Info => text.to_string(),
        }
    }
}

#[async_trait]
impl AlertSink for TelegramSink {
    #[instrument(skip(self, text), level = "debug")]
    async fn deliver(
        &self,
        destination: &Destination,
        text: &str,
        severity: Severity,
    ) -> Result<(), DeliveryError> {
        let chat_id = Self::chat_id(destination)?;
        let text = Self::render(text, severity);

        let resp = self
            .http
            .post(&self.endpoint)
            .json(&SendMessage {
                chat_id,
                text: &text,
            })
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(DeliveryError::Rejected {
                status: status.as_u16(),
                body,
            });
        }

        debug!(len = text.len(), "telegram message sent");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chat_id_must_be_numeric() {
        assert_eq!(TelegramSink::chat_id(&Destination::new("-100123")).unwrap(), -100123);
        assert!(matches!(
            TelegramSink::chat_id(&Destination::new("console")),
            Err(DeliveryError::InvalidDestination(_))
        ));
    }

    #[test]
    fn alert_prefix_only_on_alerts() {
        assert_eq!(TelegramSink::render("x", Severity::Alert), "[ALERT] x");
        assert_eq!(TelegramSink::render("x", Severity::Info), "x");
    }

    #[tokio::test]
    async fn invalid_destination_fails_before_any_request() {
        let sink = TelegramSink::with_api_url("http://127.0.0.1:9", "token").unwrap();
        let err = sink
            .deliver(&Destination::new("not-a-chat"), "hi", Severity::Info)
            .await
            .unwrap_err();

        assert!(matches!(err, DeliveryError::InvalidDestination(_)));
    }
}
