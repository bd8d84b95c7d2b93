//! HuggingFace sentence-transformer embedding client.
//!
//! The inference endpoint has been observed to answer in three shapes:
//! a list of vectors (one per input), a single flat vector (one input),
//! and a list of objects carrying an `embedding` field. All three are
//! normalized to `Vec<Vec<f32>>` here so callers never see the
//! difference.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde_json::{json, Value};

use super::{EmbeddingBackend, InferenceError, Result};
use crate::config::EmbeddingConfig;

pub struct HfEmbeddingClient {
    config: EmbeddingConfig,
    api_token: String,
    client: Client,
}

impl HfEmbeddingClient {
    pub fn new(config: EmbeddingConfig, api_token: String) -> Self {
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
impl EmbeddingBackend for HfEmbeddingClient {
    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        let payload = json!({
            "inputs": texts,
            "options": { "wait_for_model": true },
        });

        tracing::debug!("Requesting embeddings for {} texts", texts.len());

        let response = self
            .client
            .post(&self.config.api_url)
            .header("Authorization", format!("Bearer {}", self.api_token))
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
            let body = response.text().await.unwrap_or_default();
            if status.as_u16() == 401 || status.as_u16() == 403 {
                return Err(InferenceError::AuthenticationFailed(body));
            }
            return Err(InferenceError::Unavailable(format!(
                "{}: {}",
                status, body
            )));
        }

        let data: Value = response
            .json()
            .await
            .map_err(|e| InferenceError::ParseError(e.to_string()))?;

        normalize_embedding_response(&data)
    }
}

/// Normalize the three observed response shapes into list-of-vectors.
pub fn normalize_embedding_response(data: &Value) -> Result<Vec<Vec<f32>>> {
    let items = data
        .as_array()
        .ok_or_else(|| InferenceError::ParseError("embedding response is not an array".into()))?;

    if items.is_empty() {
        return Ok(Vec::new());
    }

    // Shape 1: list of vectors
    if items.iter().all(|v| v.is_array()) {
        return items.iter().map(parse_vector).collect();
    }

    // Shape 2: one flat vector of numbers
    if items.iter().all(|v| v.is_number()) {
        return Ok(vec![parse_vector(data)?]);
    }

    // Shape 3: list of objects with an `embedding` field
    if items.iter().all(|v| v.get("embedding").is_some()) {
        return items
            .iter()
            .map(|v| parse_vector(v.get("embedding").unwrap_or(&Value::Null)))
            .collect();
    }

    Err(InferenceError::ParseError(
        "unrecognized embedding response shape".into(),
    ))
}

fn parse_vector(value: &Value) -> Result<Vec<f32>> {
    let nums = value
        .as_array()
        .ok_or_else(|| InferenceError::ParseError("embedding entry is not an array".into()))?;
    nums.iter()
        .map(|n| {
            n.as_f64()
                .map(|f| f as f32)
                .ok_or_else(|| InferenceError::ParseError("embedding value is not numeric".into()))
        })
        .collect()
}
