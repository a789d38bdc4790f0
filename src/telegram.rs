use anyhow::{Context, Result};
use serde::Deserialize;
use std::time::Duration;

use crate::config::Config;
use crate::error::FatalError;

const BASE_URL: &str = "https://api.telegram.org";

/// Envelope of a `getUpdates` response.
///
/// On failure Telegram sets `ok` to false and reports `error_code`; on
/// success `result` carries the updates in server order.
#[derive(Debug, Deserialize)]
pub struct PollResponse {
    pub ok: bool,
    #[serde(default)]
    pub result: Vec<Update>,
    #[serde(default)]
    pub error_code: i64,
}

/// One update: an id plus the message it carries.
///
/// Telegram omits fields freely (service messages, edits, stickers), so
/// everything below the id falls back to its default instead of failing the
/// whole batch.
#[derive(Debug, Clone, Deserialize)]
pub struct Update {
    pub update_id: i64,
    #[serde(default)]
    pub message: Message,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Message {
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub message_id: i64,
    #[serde(default)]
    pub from: User,
    #[serde(default)]
    pub chat: Chat,
    #[serde(default)]
    pub date: i64,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct User {
    #[serde(default)]
    pub id: i64,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    #[serde(default)]
    pub username: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Chat {
    #[serde(default)]
    pub id: i64,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    #[serde(default)]
    pub username: String,
}

/// Thin client over the two Bot API endpoints the bot uses. Each stage owns
/// its own instance; there is no shared state behind it.
pub struct TelegramClient {
    client: reqwest::Client,
    base: String,
}

impl TelegramClient {
    /// Client for the long-poll stage. The request deadline sits slightly
    /// above the negotiated poll timeout so a hung long poll cannot stall
    /// the loop forever.
    pub fn for_polling(config: &Config) -> Self {
        Self::with_timeout(config, Duration::from_secs(config.poll_timeout() + 10))
    }

    /// Client for the send stage, with a short fixed deadline.
    pub fn for_sending(config: &Config) -> Self {
        Self::with_timeout(config, Duration::from_secs(30))
    }

    fn with_timeout(config: &Config, timeout: Duration) -> Self {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .expect("reqwest client");
        Self {
            client,
            base: format!("{}/bot{}", BASE_URL, config.api_key),
        }
    }

    /// Build the `getUpdates` URL for one poll. A malformed URL means the
    /// token or timeout cannot form a valid request at all, which no retry
    /// will fix.
    pub fn poll_url(&self, offset: i64, timeout: u64) -> Result<reqwest::Url, FatalError> {
        let raw = format!(
            "{}/getUpdates?offset={}&timeout={}",
            self.base, offset, timeout
        );
        reqwest::Url::parse(&raw).map_err(|e| FatalError::InvalidPollUrl(e.to_string()))
    }

    /// Issue one long poll. Decoding and classification of the body happen
    /// in the poller.
    pub async fn fetch(&self, url: reqwest::Url) -> reqwest::Result<reqwest::Response> {
        self.client.get(url).send().await
    }

    /// Post one reply, form-encoded the way `sendMessage` accepts it.
    pub async fn send_message(&self, chat_id: i64, text: &str) -> Result<()> {
        let url = format!("{}/sendMessage", self.base);
        self.client
            .post(&url)
            .form(&[("chat_id", chat_id.to_string()), ("text", text.to_string())])
            .send()
            .await
            .context("Failed to send message")?;
        Ok(())
    }
}
