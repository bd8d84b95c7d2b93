//! Engine error types
//!
//! Deliberately small: upstream inference failures never surface here.
//! The classifier absorbs them into empty classifications and the
//! composer into a fallback route, so the only hard failures a caller
//! can see are bad input, bad configuration, and a broken catalog.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum EngineError {
    /// Bad or missing configuration, including absent credentials.
    #[error("Configuration error: {0}")]
    Config(String),

    /// The request itself is unusable.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// The place catalog could not be loaded or is empty.
    #[error("Catalog error: {0}")]
    Catalog(String),

    /// Unexpected internal failure.
    #[error("Internal error: {0}")]
    Internal(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl EngineError {
    /// True when the caller, not the service, caused the failure.
    pub fn is_input_error(&self) -> bool {
        matches!(self, EngineError::InvalidInput(_))
    }
}
