//! 📱 Telegram Notification Sink
//!
//! Ships each rendered alert to the configured chat: media first
//! (photo / video / animation per the alert's media reference), then
//! the Markdown caption with link previews disabled.

use crate::alert::{MediaRef, RenderedAlert};
use crate::error::DeliveryError;
use async_trait::async_trait;
use reqwest::Client;
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;

/// Minimum delay between messages (Telegram rate limits)
const MIN_MESSAGE_DELAY_MS: u64 = 100;

/// Where completed alerts go. The scheduler only knows this trait; the
/// Telegram client below is the shipped implementation.
#[async_trait]
pub trait NotificationSink: Send + Sync {
    async fn deliver(&self, alert: &RenderedAlert) -> Result<(), DeliveryError>;
}

/// Telegram Bot API client for a single destination chat.
pub struct TelegramClient {
    client: Client,
    bot_token: String,
    chat_id: String,
    /// Rate limiting: last message timestamp
    last_message_time: Arc<RwLock<std::time::Instant>>,
}

impl TelegramClient {
    pub fn new(bot_token: &str, chat_id: &str) -> Result<Self, DeliveryError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(10))
            .build()?;

        Ok(TelegramClient {
            client,
            bot_token: bot_token.to_string(),
            chat_id: chat_id.to_string(),
            last_message_time: Arc::new(RwLock::new(std::time::Instant::now())),
        })
    }

    /// Send a raw text message with Markdown formatting.
    pub async fn send_message(&self, text: &str) -> Result<(), DeliveryError> {
        let payload = json!({
            "chat_id": self.chat_id,
            "text": text,
            "parse_mode": "Markdown",
            "disable_web_page_preview": true
        });
        self.api_post("sendMessage", payload).await
    }

    /// Send the alert's media attachment. Uploaded handles replay as
    /// animations (that is how they were captured upstream).
    pub async fn send_media(&self, media: &MediaRef) -> Result<(), DeliveryError> {
        let (method, payload) = match media {
            MediaRef::Upload(file_id) => (
                "sendAnimation",
                json!({"chat_id": self.chat_id, "animation": file_id}),
            ),
            MediaRef::Animation(url) => (
                "sendAnimation",
                json!({"chat_id": self.chat_id, "animation": url}),
            ),
            MediaRef::Video(url) => ("sendVideo", json!({"chat_id": self.chat_id, "video": url})),
            MediaRef::Photo(url) => ("sendPhoto", json!({"chat_id": self.chat_id, "photo": url})),
        };
        self.api_post(method, payload).await
    }

    async fn api_post(&self, method: &str, payload: Value) -> Result<(), DeliveryError> {
        self.rate_limit().await;

        let url = format!("https://api.telegram.org/bot{}/{}", self.bot_token, method);
        let response = self.client.post(&url).json(&payload).send().await?;

        if !response.status().is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(DeliveryError::Api(error_text));
        }

        Ok(())
    }

    async fn rate_limit(&self) {
        let mut last_time = self.last_message_time.write().await;
        let elapsed = last_time.elapsed();
        if elapsed.as_millis() < MIN_MESSAGE_DELAY_MS as u128 {
            let wait = Duration::from_millis(MIN_MESSAGE_DELAY_MS - elapsed.as_millis() as u64);
            tokio::time::sleep(wait).await;
        }
        *last_time = std::time::Instant::now();
    }
}

#[async_trait]
impl NotificationSink for TelegramClient {
    async fn deliver(&self, alert: &RenderedAlert) -> Result<(), DeliveryError> {
        if let Some(media) = &alert.media {
            self.send_media(media).await?;
        }
        self.send_message(&alert.text).await
    }
}
