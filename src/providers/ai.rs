// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! OpenAI chat-completions client for news summaries.

use std::time::Duration;

use reqwest::Client;
use serde::{Deserialize, Serialize};

const SUMMARY_MODEL: &str = "gpt-4o-mini";

const SUMMARY_PROMPT: &str = "You are a helpful assistant. Summarize the following news article \
in 2-3 concise sentences. Reply only with the summary, no additional text.";

#[derive(Debug, thiserror::Error)]
pub enum AiError {
    #[error("AI summaries are not configured")]
    NotConfigured,

    #[error("AI request failed: {0}")]
    Request(String),

    #[error("AI response was invalid: {0}")]
    InvalidResponse(String),
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage>,
}

#[derive(Serialize, Deserialize)]
struct ChatMessage {
    role: String,
    content: String,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

#[derive(Clone)]
pub struct AiGateway {
    base_url: String,
    api_key: Option<String>,
    http: Client,
}

impl std::fmt::Debug for AiGateway {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AiGateway")
            .field("base_url", &self.base_url)
            .field("configured", &self.is_configured())
            .finish()
    }
}

impl AiGateway {
    pub fn new(base_url: impl Into<String>, api_key: Option<String>) -> Result<Self, AiError> {
        let http = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| AiError::Request(format!("failed to build HTTP client: {e}")))?;
        Ok(Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.filter(|k| !k.trim().is_empty()),
            http,
        })
    }

    pub fn is_configured(&self) -> bool {
        self.api_key.is_some()
    }

    /// Summarize an article in two or three sentences.
    pub async fn summarize(&self, title: &str, content: &str) -> Result<String, AiError> {
        let api_key = self.api_key.as_deref().ok_or(AiError::NotConfigured)?;

        let request = ChatRequest {
            model: SUMMARY_MODEL,
            messages: vec![
                ChatMessage {
                    role: "system".into(),
                    content: SUMMARY_PROMPT.into(),
                },
                ChatMessage {
                    role: "user".into(),
                    content: format!("Title: {title}\n\n{content}"),
                },
            ],
        };

        let response = self
            .http
            .post(format!("{}/v1/chat/completions", self.base_url))
            .bearer_auth(api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| AiError::Request(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(AiError::Request(format!("completions returned {status}: {body}")));
        }

        let chat: ChatResponse = response
            .json()
            .await
            .map_err(|e| AiError::InvalidResponse(e.to_string()))?;

        chat.choices
            .into_iter()
            .next()
            .map(|choice| choice.message.content.trim().to_string())
            .filter(|summary| !summary.is_empty())
            .ok_or_else(|| AiError::InvalidResponse("no choices returned".into()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn unconfigured_gateway_refuses() {
        let gateway = AiGateway::new("http://127.0.0.1:9", Some("  ".into())).unwrap();
        assert!(!gateway.is_configured());
        assert!(matches!(
            gateway.summarize("t", "c").await,
            Err(AiError::NotConfigured)
        ));
    }

    #[test]
    fn response_parses_first_choice() {
        let chat: ChatResponse = serde_json::from_str(
            r#"{"choices":[{"message":{"role":"assistant","content":" Short. "}}]}"#,
        )
        .unwrap();
        assert_eq!(chat.choices[0].message.content.trim(), "Short.");
    }
}
