// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Telegram Bot API client and fire-and-forget broadcasts.
//!
//! Broadcasts run on a detached task. The caller gets no result; each failed
//! delivery is reported to a [`DeliverySink`] instead.

use std::sync::Arc;
use std::time::Duration;

use reqwest::Client;
use serde::Deserialize;
use serde_json::json;

#[derive(Debug, thiserror::Error)]
pub enum TelegramError {
    #[error("Telegram request failed: {0}")]
    Request(String),

    #[error("Telegram rejected the message: {0}")]
    Rejected(String),
}

/// Minimal Bot API client.
#[derive(Clone)]
pub struct TelegramGateway {
    base_url: String,
    bot_token: String,
    http: Client,
}

impl std::fmt::Debug for TelegramGateway {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TelegramGateway")
            .field("base_url", &self.base_url)
            .finish_non_exhaustive()
    }
}

#[derive(Deserialize)]
struct BotApiResponse {
    ok: bool,
    #[serde(default)]
    description: Option<String>,
}

impl TelegramGateway {
    pub fn new(
        base_url: impl Into<String>,
        bot_token: impl Into<String>,
    ) -> Result<Self, TelegramError> {
        let http = Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .map_err(|e| TelegramError::Request(format!("failed to build HTTP client: {e}")))?;
        Ok(Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            bot_token: bot_token.into(),
            http,
        })
    }

    /// Send an HTML-formatted message to one chat.
    pub async fn send_message(&self, chat_id: i64, text: &str) -> Result<(), TelegramError> {
        let response = self
            .http
            .post(format!("{}/bot{}/sendMessage", self.base_url, self.bot_token))
            .json(&json!({ "chat_id": chat_id, "text": text, "parse_mode": "HTML" }))
            .send()
            .await
            // The URL embeds the token; keep it out of the error text.
            .map_err(|e| TelegramError::Request(e.without_url().to_string()))?;

        let status = response.status();
        let body: BotApiResponse = response.json().await.map_err(|e| {
            TelegramError::Request(format!("invalid response ({status}): {}", e.without_url()))
        })?;

        if !body.ok {
            return Err(TelegramError::Rejected(
                body.description.unwrap_or_else(|| status.to_string()),
            ));
        }
        Ok(())
    }
}

/// Receives broadcast delivery failures.
pub trait DeliverySink: Send + Sync + 'static {
    fn delivery_failed(&self, chat_id: i64, error: &TelegramError);
}

/// Default sink: one `tracing` warning per failed delivery.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl DeliverySink for TracingSink {
    fn delivery_failed(&self, chat_id: i64, error: &TelegramError) {
        tracing::warn!(chat_id, error = %error, "Broadcast delivery failed");
    }
}

/// Fans a message out to many chats on a detached task.
#[derive(Clone)]
pub struct Broadcaster {
    gateway: TelegramGateway,
    sink: Arc<dyn DeliverySink>,
}

impl Broadcaster {
    pub fn new(gateway: TelegramGateway, sink: Arc<dyn DeliverySink>) -> Self {
        Self { gateway, sink }
    }

    /// Start sending `text` to every chat and return immediately.
    pub fn broadcast(&self, chat_ids: Vec<i64>, text: String) -> tokio::task::JoinHandle<()> {
        let gateway = self.gateway.clone();
        let sink = self.sink.clone();
        tokio::spawn(async move {
            let total = chat_ids.len();
            let mut failed = 0usize;
            for chat_id in chat_ids {
                if let Err(e) = gateway.send_message(chat_id, &text).await {
                    failed += 1;
                    sink.delivery_failed(chat_id, &e);
                }
            }
            tracing::info!(total, failed, "Broadcast finished");
        })
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use std::sync::Mutex;

    use super::*;

    /// Sink that remembers failed chat ids.
    #[derive(Default)]
    pub(crate) struct RecordingSink {
        pub(crate) failed: Mutex<Vec<i64>>,
    }

    impl DeliverySink for RecordingSink {
        fn delivery_failed(&self, chat_id: i64, _error: &TelegramError) {
            self.failed.lock().unwrap().push(chat_id);
        }
    }

    #[tokio::test]
    async fn failed_deliveries_reach_the_sink() {
        let gateway = TelegramGateway::new("http://127.0.0.1:9", "123:secret").unwrap();
        let sink = Arc::new(RecordingSink::default());
        let broadcaster = Broadcaster::new(gateway, sink.clone());

        let handle = broadcaster.broadcast(vec![1, 2, 3], "hello".into());
        tokio::time::timeout(Duration::from_secs(30), handle)
            .await
            .unwrap()
            .unwrap();

        assert_eq!(*sink.failed.lock().unwrap(), vec![1, 2, 3]);
    }

    #[tokio::test]
    async fn errors_do_not_leak_the_bot_token() {
        let gateway = TelegramGateway::new("http://127.0.0.1:9", "123:secret").unwrap();
        let err = gateway.send_message(1, "hi").await.unwrap_err();
        assert!(!err.to_string().contains("secret"));
    }
}
