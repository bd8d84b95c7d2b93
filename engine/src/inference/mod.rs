//! Inference Capability Abstraction Layer
//!
//! This module provides a common interface for the two remote inference
//! capabilities the engine consumes: text embeddings (for the similarity
//! classifier) and chat completions (for generative route composition).
//! Both are defined as traits so tests can substitute scripted fakes and
//! the composer's retry logic can be exercised without network access.

use async_trait::async_trait;

pub mod chat;
pub mod embedding;

pub use chat::HfChatClient;
pub use embedding::HfEmbeddingClient;

/// Result type for inference operations
pub type Result<T> = std::result::Result<T, InferenceError>;

/// Errors that can occur during inference calls.
///
/// The variants double as retry classes: `ModelWarming` is retryable with
/// backoff, `ClientError` aborts immediately, `Timeout` retries without
/// backoff, everything else counts as "no usable response" for the
/// current attempt.
#[derive(Debug, thiserror::Error)]
pub enum InferenceError {
    #[error("Capability unavailable: {0}")]
    Unavailable(String),

    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    #[error("Model is warming up")]
    ModelWarming,

    #[error("Client error ({status}): {body}")]
    ClientError { status: u16, body: String },

    #[error("Network error: {0}")]
    NetworkError(String),

    #[error("Timeout")]
    Timeout,

    #[error("Parse error: {0}")]
    ParseError(String),
}

/// Text-embedding capability.
///
/// Input order is preserved: the i-th output vector embeds the i-th input
/// string. All vectors in one response share the same dimension.
#[async_trait]
pub trait EmbeddingBackend: Send + Sync {
    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>>;
}

/// Generative-text capability.
///
/// Returns the raw assistant text; the caller is responsible for
/// extracting any structured payload from it.
#[async_trait]
pub trait ChatBackend: Send + Sync {
    async fn complete(&self, system: &str, user: &str) -> Result<String>;
}
