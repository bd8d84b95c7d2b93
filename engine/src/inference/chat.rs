//! HuggingFace router chat-completions client.
//!
//! Speaks the OpenAI-style `/v1/chat/completions` wire format. HTTP 503
//! is mapped to `InferenceError::ModelWarming` (the endpoint returns it
//! while a cold model loads); 400/401/404 map to the non-retryable
//! client-error class. Retry policy lives with the caller, not here.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde_json::{json, Value};

use super::{ChatBackend, InferenceError, Result};
use crate::config::ChatConfig;

pub struct HfChatClient {
    config: ChatConfig,
    api_token: String,
    client: Client,
}

impl HfChatClient {
    pub fn new(config: ChatConfig, api_token: String) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .unwrap_or_default();
        Self {
            config,
            api_token,
            client,
        }
    }
}

#[async_trait]
impl ChatBackend for HfChatClient {
    async fn complete(&self, system: &str, user: &str) -> Result<String> {
        let payload = json!({
            "model": self.config.model,
            "messages": [
                { "role": "system", "content": system },
                { "role": "user", "content": user },
            ],
            "max_tokens": 800,
            "temperature": 0.7,
            "top_p": 0.9,
        });

        tracing::debug!(model = %self.config.model, "Sending chat completion request");

        let response = self
            .client
            .post(&self.config.api_url)
            .header("Authorization", format!("Bearer {}", self.api_token))
            .header("Content-Type", "application/json")
            .json(&payload)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    InferenceError::Timeout
                } else if e.is_connect() {
                    InferenceError::Unavailable(e.to_string())
                } else {
                    InferenceError::NetworkError(e.to_string())
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let code = status.as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(match code {
                503 => InferenceError::ModelWarming,
                400 | 401 | 404 => InferenceError::ClientError { status: code, body },
                _ => InferenceError::Unavailable(format!("{}: {}", status, body)),
            });
        }

        let data: Value = response
            .json()
            .await
            .map_err(|e| InferenceError::ParseError(e.to_string()))?;

        extract_completion_text(&data)
    }
}

/// Pull the assistant text out of a chat-completions response body.
fn extract_completion_text(data: &Value) -> Result<String> {
    data.get("choices")
        .and_then(|c| c.as_array())
        .and_then(|c| c.first())
        .and_then(|choice| choice.get("message"))
        .and_then(|m| m.get("content"))
        .and_then(|c| c.as_str())
        .map(|s| s.to_string())
        .ok_or_else(|| InferenceError::ParseError("no choices in response".into()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_extract_completion_text() {
        let data = json!({
            "choices": [
                { "message": { "role": "assistant", "content": "привет" } }
            ]
        });
        assert_eq!(extract_completion_text(&data).unwrap(), "привет");
    }

    #[test]
    fn test_extract_rejects_empty_choices() {
        let data = json!({ "choices": [] });
        assert!(extract_completion_text(&data).is_err());

        let data = json!({ "error": "bad request" });
        assert!(extract_completion_text(&data).is_err());
    }
}
