//! Telegram Bot Integration
//!
//! The bot is a thin front door: every interaction answers with an
//! inline button that opens the web mini-app, where the actual route
//! requests happen over the HTTP API.

pub mod telegram;

pub use telegram::TelegramBot;
