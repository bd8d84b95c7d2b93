//! Configuration management
//!
//! This module handles loading, validation, and management of the Progulka
//! configuration. Configuration is stored in TOML format at
//! ~/.progulka/config.toml.
//!
//! # Configuration Sections
//!
//! - **core**: Log level and catalog file path
//! - **classifier**: Strategy selection and selection thresholds
//! - **inference**: Embedding and chat endpoint settings
//! - **server**: HTTP bind address
//! - **bot**: Telegram bot enablement and mini-app URL
//!
//! API tokens are never stored in the config file: `HF_API_TOKEN` and
//! `TELEGRAM_BOT_TOKEN` are read from the environment.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::EngineError;

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    /// Core engine settings
    #[serde(default)]
    pub core: CoreConfig,

    /// Classifier strategy and thresholds
    #[serde(default)]
    pub classifier: ClassifierConfig,

    /// Remote inference endpoints
    #[serde(default)]
    pub inference: InferenceConfig,

    /// HTTP server settings
    #[serde(default)]
    pub server: ServerConfig,

    /// Telegram bot settings
    #[serde(default)]
    pub bot: BotConfig,
}

/// Core engine configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CoreConfig {
    /// Log level (error, warn, info, debug, trace)
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Path to the place catalog CSV file
    #[serde(default = "default_catalog_path")]
    pub catalog_path: PathBuf,
}

/// Classification strategy selection
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClassifierConfig {
    /// Strategy: "embedding" or "lexical"
    #[serde(default = "default_strategy")]
    pub strategy: String,

    /// Minimum cosine similarity for a category to count as a match
    #[serde(default = "default_similarity_threshold")]
    pub similarity_threshold: f32,

    /// Lower bound on returned categories (filled from the sorted list
    /// even below the threshold)
    #[serde(default = "default_min_categories")]
    pub min_categories: usize,

    /// Upper bound on returned categories
    #[serde(default = "default_max_categories")]
    pub max_categories: usize,
}

/// Remote inference configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct InferenceConfig {
    /// Embedding endpoint settings
    #[serde(default)]
    pub embedding: EmbeddingConfig,

    /// Chat-completions endpoint settings
    #[serde(default)]
    pub chat: ChatConfig,
}

/// Embedding endpoint configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbeddingConfig {
    /// Full URL of the sentence-transformer inference endpoint
    #[serde(default = "default_embedding_url")]
    pub api_url: String,

    /// Request timeout in seconds
    #[serde(default = "default_embedding_timeout")]
    pub timeout_secs: u64,
}

/// Chat-completions endpoint configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatConfig {
    /// Full URL of the chat-completions endpoint
    #[serde(default = "default_chat_url")]
    pub api_url: String,

    /// Model identifier
    #[serde(default = "default_chat_model")]
    pub model: String,

    /// Request timeout in seconds
    #[serde(default = "default_chat_timeout")]
    pub timeout_secs: u64,

    /// Maximum generation attempts before falling back
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    /// Base backoff in seconds while the model warms up; attempt N waits
    /// N times this long
    #[serde(default = "default_warmup_backoff")]
    pub warmup_backoff_secs: u64,
}

/// HTTP server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Bind host
    #[serde(default = "default_host")]
    pub host: String,

    /// Bind port
    #[serde(default = "default_port")]
    pub port: u16,
}

/// Telegram bot configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BotConfig {
    /// Run the bot alongside the HTTP server
    #[serde(default)]
    pub enabled: bool,

    /// Mini-app URL opened by the inline keyboard button
    #[serde(default = "default_webapp_url")]
    pub webapp_url: String,
    // Note: bot token comes from TELEGRAM_BOT_TOKEN, not from config
}

// Default value functions
fn default_log_level() -> String {
    "info".to_string()
}

fn default_catalog_path() -> PathBuf {
    PathBuf::from("dataset.csv")
}

fn default_strategy() -> String {
    "embedding".to_string()
}

fn default_similarity_threshold() -> f32 {
    0.3
}

fn default_min_categories() -> usize {
    2
}

fn default_max_categories() -> usize {
    5
}

fn default_embedding_url() -> String {
    "https://router.huggingface.co/hf-inference/models/sentence-transformers/paraphrase-multilingual-MiniLM-L12-v2"
        .to_string()
}

fn default_embedding_timeout() -> u64 {
    30
}

fn default_chat_url() -> String {
    "https://router.huggingface.co/v1/chat/completions".to_string()
}

fn default_chat_model() -> String {
    "IlyaGusev/saiga_llama3_8b:featherless-ai".to_string()
}

fn default_chat_timeout() -> u64 {
    120
}

fn default_max_attempts() -> u32 {
    3
}

fn default_warmup_backoff() -> u64 {
    30
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    10000
}

fn default_webapp_url() -> String {
    "https://anansypineapple.github.io/miniApp-maps/".to_string()
}

impl Default for CoreConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            catalog_path: default_catalog_path(),
        }
    }
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            strategy: default_strategy(),
            similarity_threshold: default_similarity_threshold(),
            min_categories: default_min_categories(),
            max_categories: default_max_categories(),
        }
    }
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            api_url: default_embedding_url(),
            timeout_secs: default_embedding_timeout(),
        }
    }
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            api_url: default_chat_url(),
            model: default_chat_model(),
            timeout_secs: default_chat_timeout(),
            max_attempts: default_max_attempts(),
            warmup_backoff_secs: default_warmup_backoff(),
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

impl Default for BotConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            webapp_url: default_webapp_url(),
        }
    }
}

impl Config {
    /// Load configuration from the default location
    /// (~/.progulka/config.toml), creating a default file if none exists.
    pub fn load_or_create() -> Result<Self, EngineError> {
        let config_path = Self::default_config_path()?;

        if config_path.exists() {
            Self::load_from_path(&config_path)
        } else {
            Self::create_default(&config_path)
        }
    }

    /// Load configuration from a specific path.
    pub fn load_from_path(path: &Path) -> Result<Self, EngineError> {
        let contents = fs::read_to_string(path)
            .map_err(|e| EngineError::Config(format!("Failed to read config file: {}", e)))?;

        let config: Config = toml::from_str(&contents)
            .map_err(|e| EngineError::Config(format!("Failed to parse config: {}", e)))?;

        config.validate()?;
        Ok(config)
    }

    /// Create a default configuration and save it to `path`.
    fn create_default(path: &Path) -> Result<Self, EngineError> {
        let config = Config::default();

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .map_err(|e| EngineError::Config(format!("Failed to create config dir: {}", e)))?;
        }

        let contents = toml::to_string_pretty(&config)
            .map_err(|e| EngineError::Config(format!("Failed to serialize config: {}", e)))?;
        fs::write(path, contents)
            .map_err(|e| EngineError::Config(format!("Failed to write config file: {}", e)))?;

        tracing::info!("Created default configuration at {}", path.display());
        Ok(config)
    }

    /// Default config file location: ~/.progulka/config.toml
    pub fn default_config_path() -> Result<PathBuf, EngineError> {
        let home = dirs::home_dir()
            .ok_or_else(|| EngineError::Config("Could not determine home directory".to_string()))?;
        Ok(home.join(".progulka").join("config.toml"))
    }

    /// Validate field values that serde cannot check on its own.
    pub fn validate(&self) -> Result<(), EngineError> {
        match self.classifier.strategy.as_str() {
            "embedding" | "lexical" => {}
            other => {
                return Err(EngineError::Config(format!(
                    "Unknown classifier strategy '{}' (expected 'embedding' or 'lexical')",
                    other
                )));
            }
        }

        if self.classifier.min_categories == 0
            || self.classifier.min_categories > self.classifier.max_categories
        {
            return Err(EngineError::Config(format!(
                "Invalid category bounds: min={}, max={}",
                self.classifier.min_categories, self.classifier.max_categories
            )));
        }

        if self.inference.chat.max_attempts == 0 {
            return Err(EngineError::Config(
                "inference.chat.max_attempts must be at least 1".to_string(),
            ));
        }

        Ok(())
    }
}

/// Read the HuggingFace API token from the environment.
///
/// Missing token is a configuration error, fatal at startup.
pub fn hf_api_token() -> Result<String, EngineError> {
    std::env::var("HF_API_TOKEN")
        .map_err(|_| EngineError::Config("HF_API_TOKEN is not set".to_string()))
}

/// Read the Telegram bot token from the environment.
pub fn telegram_bot_token() -> Result<String, EngineError> {
    std::env::var("TELEGRAM_BOT_TOKEN")
        .map_err(|_| EngineError::Config("TELEGRAM_BOT_TOKEN is not set".to_string()))
}
