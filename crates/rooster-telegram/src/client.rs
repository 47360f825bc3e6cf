//! Telegram Bot API client — long polling + message sending.

use std::pin::Pin;
use std::task::{Context, Poll};

use async_trait::async_trait;
use futures::stream::Stream;

use rooster_core::config::TelegramConfig;
use rooster_core::error::{Result, RoosterError};
use rooster_core::traits::Transport;
use rooster_core::types::ChatId;

use crate::updates::{TelegramApiResponse, TelegramEvent, TelegramUpdate, TelegramUser};

/// Telegram Bot API client. Sending is `&self`; polling consumes the
/// client via `start_polling`.
pub struct TelegramClient {
    config: TelegramConfig,
    client: reqwest::Client,
    last_update_id: i64,
}

impl TelegramClient {
    pub fn new(config: TelegramConfig) -> Self {
        Self {
            config,
            client: reqwest::Client::new(),
            last_update_id: 0,
        }
    }

    fn api_url(&self, method: &str) -> String {
        format!(
            "https://api.telegram.org/bot{}/{}",
            self.config.bot_token, method
        )
    }

    /// Get bot info — used as the boot-time connectivity check.
    pub async fn get_me(&self) -> Result<TelegramUser> {
        let response = self
            .client
            .get(self.api_url("getMe"))
            .send()
            .await
            .map_err(|e| RoosterError::Transport(format!("getMe failed: {e}")))?;
        let body: TelegramApiResponse<TelegramUser> = response
            .json()
            .await
            .map_err(|e| RoosterError::Transport(format!("invalid getMe response: {e}")))?;
        body.result
            .ok_or_else(|| RoosterError::Transport("no bot info".into()))
    }

    /// Fetch pending updates using long polling.
    pub async fn get_updates(&mut self) -> Result<Vec<TelegramUpdate>> {
        let response = self
            .client
            .get(self.api_url("getUpdates"))
            .query(&[
                ("offset", (self.last_update_id + 1).to_string()),
                ("timeout", "30".into()),
                (
                    "allowed_updates",
                    "[\"message\",\"my_chat_member\"]".into(),
                ),
            ])
            .send()
            .await
            .map_err(|e| RoosterError::Transport(format!("getUpdates failed: {e}")))?;

        let body: TelegramApiResponse<Vec<TelegramUpdate>> = response
            .json()
            .await
            .map_err(|e| RoosterError::Transport(format!("invalid updates response: {e}")))?;

        if !body.ok {
            return Err(RoosterError::Transport(format!(
                "Telegram API error: {}",
                body.description.unwrap_or_default()
            )));
        }

        let updates = body.result.unwrap_or_default();
        if let Some(last) = updates.last() {
            self.last_update_id = last.update_id;
        }
        Ok(updates)
    }

    /// Send a text message.
    pub async fn send_message(&self, chat_id: i64, text: &str) -> Result<()> {
        let body = serde_json::json!({
            "chat_id": chat_id,
            "text": text,
        });
        self.call("sendMessage", &body).await
    }

    /// Send a photo by URL with a caption.
    pub async fn send_photo_url(&self, chat_id: i64, photo_url: &str, caption: &str) -> Result<()> {
        let body = serde_json::json!({
            "chat_id": chat_id,
            "photo": photo_url,
            "caption": caption,
        });
        self.call("sendPhoto", &body).await
    }

    async fn call(&self, method: &str, body: &serde_json::Value) -> Result<()> {
        let response = self
            .client
            .post(self.api_url(method))
            .json(body)
            .timeout(std::time::Duration::from_secs(10))
            .send()
            .await
            .map_err(|e| RoosterError::Transport(format!("{method} failed: {e}")))?;

        let result: TelegramApiResponse<serde_json::Value> = response
            .json()
            .await
            .map_err(|e| RoosterError::Transport(format!("invalid {method} response: {e}")))?;

        if !result.ok {
            return Err(RoosterError::Transport(format!(
                "{method} rejected: {}",
                result.description.unwrap_or_default()
            )));
        }
        Ok(())
    }

    /// Start the polling loop — returns a stream of engine events.
    pub fn start_polling(self) -> TelegramEventStream {
        let (tx, rx) = tokio::sync::mpsc::unbounded_channel();

        tokio::spawn(async move {
            let mut client = self;
            tracing::info!("Telegram polling loop started");

            loop {
                match client.get_updates().await {
                    Ok(updates) => {
                        for update in updates {
                            if let Some(event) = update.into_event()
                                && tx.send(event).is_err()
                            {
                                tracing::info!("polling stopped (receiver dropped)");
                                return;
                            }
                        }
                    }
                    Err(e) => {
                        tracing::error!("Telegram polling error: {e}");
                        tokio::time::sleep(std::time::Duration::from_secs(5)).await;
                    }
                }

                tokio::time::sleep(std::time::Duration::from_secs(
                    client.config.poll_interval,
                ))
                .await;
            }
        });

        TelegramEventStream { rx }
    }
}

/// Stream of engine events produced by the polling task.
pub struct TelegramEventStream {
    rx: tokio::sync::mpsc::UnboundedReceiver<TelegramEvent>,
}

impl Stream for TelegramEventStream {
    type Item = TelegramEvent;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.rx.poll_recv(cx)
    }
}

impl Unpin for TelegramEventStream {}

#[async_trait]
impl Transport for TelegramClient {
    async fn send_text(&self, chat_id: ChatId, text: &str) -> Result<()> {
        self.send_message(chat_id.0, text).await
    }

    async fn send_photo(&self, chat_id: ChatId, image_url: &str, caption: &str) -> Result<()> {
        self.send_photo_url(chat_id.0, image_url, caption).await
    }
}
