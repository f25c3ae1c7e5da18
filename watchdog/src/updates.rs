//! Inbound operator messages from the Telegram Bot API (`getUpdates`
//! long polling).

use std::time::Duration;

use reqwest::Client;
use serde::Deserialize;
use tracing::{debug, instrument};

use crate::alert::Destination;
use crate::alert::telegram::TELEGRAM_API_URL;
use crate::error::PollError;

/// Seconds the server may hold a `getUpdates` request open.
pub const LONG_POLL_SECONDS: u64 = 30;

#[derive(Debug, Deserialize)]
struct UpdatesResponse {
    ok: bool,
    #[serde(default)]
    result: Vec<Update>,
    #[serde(default)]
    description: Option<String>,
}

#[derive(Clone, Debug, Deserialize)]
pub struct Update {
    pub update_id: i64,
    #[serde(default)]
    pub message: Option<Message>,
}

#[derive(Clone, Debug, Deserialize)]
pub struct Message {
    pub chat: Chat,
    #[serde(default)]
    pub text: Option<String>,
}

#[derive(Clone, Debug, Deserialize)]
pub struct Chat {
    pub id: i64,
}

/// A text message and the chat it came from.
#[derive(Clone, Debug, PartialEq)]
pub struct Inbound {
    pub from: Destination,
    pub text: String,
}

impl Update {
    /// Text messages only; edits, joins, stickers and the like are dropped.
    pub fn into_inbound(self) -> Option<Inbound> {
        let message = self.message?;
        let text = message.text?;
        if text.trim().is_empty() {
            return None;
        }

        Some(Inbound {
            from: Destination::new(message.chat.id.to_string()),
            text,
        })
    }
}

/// Long-polling reader that acknowledges each batch through the offset.
pub struct TelegramUpdates {
    http: Client,
    endpoint: String,
    offset: i64,
    poll_seconds: u64,
}

impl TelegramUpdates {
    pub fn new(bot_token: &str) -> Result<Self, PollError> {
        Self::with_api_url(TELEGRAM_API_URL, bot_token, LONG_POLL_SECONDS)
    }

    pub fn with_api_url(api_url: &str, bot_token: &str, poll_seconds: u64) -> Result<Self, PollError> {
        // the request timeout must outlast the server-side hold
        let http = Client::builder()
            .timeout(Duration::from_secs(poll_seconds + 10))
            .build()?;

        let endpoint = format!(
            "{}/bot{}/getUpdates",
            api_url.trim_end_matches('/'),
            bot_token
        );

        Ok(Self {
            http,
            endpoint,
            offset: 0,
            poll_seconds,
        })
    }

    pub fn offset(&self) -> i64 {
        self.offset
    }

    /// Move the offset past every update in `batch`.
    fn acknowledge(&mut self, batch: &[Update]) {
        if let Some(last) = batch.iter().map(|u| u.update_id).max() {
            self.offset = self.offset.max(last + 1);
        }
    }

    /// Wait for the next batch of text messages.
    #[instrument(skip(self), fields(offset = self.offset), level = "debug")]
    pub async fn next_batch(&mut self) -> Result<Vec<Inbound>, PollError> {
        let resp: UpdatesResponse = self
            .http
            .get(&self.endpoint)
            .query(&[
                ("offset", self.offset.to_string()),
                ("timeout", self.poll_seconds.to_string()),
                ("allowed_updates", r#"["message"]"#.to_string()),
            ])
            .send()
            .await?
            .json()
            .await?;

        let batch = Self::accept(resp)?;
        self.acknowledge(&batch);

        debug!(updates = batch.len(), next_offset = self.offset, "telegram updates received");
        Ok(batch.into_iter().filter_map(Update::into_inbound).collect())
    }

    fn accept(resp: UpdatesResponse) -> Result<Vec<Update>, PollError> {
        if !resp.ok {
            return Err(PollError::Api(
                resp.description.unwrap_or_else(|| "no description".to_string()),
            ));
        }
        Ok(resp.result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn response(body: &str) -> UpdatesResponse {
        serde_json::from_str(body).unwrap()
    }

    #[test]
    fn text_messages_become_inbound_commands() {
        let body = r#"{
            "ok": true,
            "result": [
                {"update_id": 7, "message": {"message_id": 1, "chat": {"id": -1001, "type": "group"}, "text": "/logon"}},
                {"update_id": 8, "message": {"message_id": 2, "chat": {"id": 55}, "sticker": {}}},
                {"update_id": 9, "edited_message": {"chat": {"id": 55}, "text": "status"}}
            ]
        }"#;

        let updates = TelegramUpdates::accept(response(body)).unwrap();
        assert_eq!(updates.len(), 3);

        let inbound: Vec<Inbound> = updates.into_iter().filter_map(Update::into_inbound).collect();
        assert_eq!(
            inbound,
            vec![Inbound {
                from: Destination::new("-1001"),
                text: "/logon".into(),
            }]
        );
    }

    #[test]
    fn offset_moves_past_the_highest_update() {
        let mut poller = TelegramUpdates::with_api_url("http://127.0.0.1:9", "t", 1).unwrap();
        assert_eq!(poller.offset(), 0);

        let batch = TelegramUpdates::accept(response(
            r#"{"ok": true, "result": [{"update_id": 12}, {"update_id": 10}]}"#,
        ))
        .unwrap();
        poller.acknowledge(&batch);
        assert_eq!(poller.offset(), 13);

        poller.acknowledge(&[]);
        assert_eq!(poller.offset(), 13);
    }

    #[test]
    fn api_failure_is_reported() {
        let err = TelegramUpdates::accept(response(
            r#"{"ok": false, "error_code": 401, "description": "Unauthorized"}"#,
        ))
        .unwrap_err();

        assert!(matches!(err, PollError::Api(ref d) if d == "Unauthorized"));
    }

    #[tokio::test]
    async fn unreachable_api_is_an_http_error() {
        let mut poller = TelegramUpdates::with_api_url("http://127.0.0.1:9", "t", 0).unwrap();

        assert!(matches!(poller.next_batch().await, Err(PollError::Http(_))));
        assert_eq!(poller.offset(), 0);
    }
}
