//! Long-polling Telegram client.
//!
//! Talks to the Bot API directly over reqwest. The bot has exactly one
//! job: greet the user and hand them the mini-app button. Route
//! generation never flows through Telegram messages.

use anyhow::Result;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{error, info};

const GREETING: &str = "Привет, друг! Нажми кнопку ниже чтобы запустить приложение!";
const NUDGE: &str = "Чтобы начать работу необходимо запустить приложение!";
const BUTTON_LABEL: &str = "Открыть приложение";

/// A button that opens a Telegram web app.
#[derive(Serialize)]
struct InlineKeyboardButton {
    text: String,
    web_app: WebAppInfo,
}

#[derive(Serialize)]
struct WebAppInfo {
    url: String,
}

#[derive(Serialize)]
struct InlineKeyboardMarkup {
    inline_keyboard: Vec<Vec<InlineKeyboardButton>>,
}

#[derive(Deserialize, Debug)]
struct Update {
    update_id: i64,
    message: Option<Message>,
}

#[derive(Deserialize, Debug)]
struct Message {
    chat: Chat,
    text: Option<String>,
}

#[derive(Deserialize, Debug)]
struct Chat {
    id: i64,
}

#[derive(Deserialize, Debug)]
struct GetUpdatesResponse {
    ok: bool,
    result: Option<Vec<Update>>,
}

pub struct TelegramBot {
    token: String,
    webapp_url: String,
    client: Client,
}

impl TelegramBot {
    pub fn new(token: String, webapp_url: String) -> Self {
        Self {
            token,
            webapp_url,
            client: Client::builder()
                .timeout(Duration::from_secs(60))
                .build()
                .unwrap_or_default(),
        }
    }

    /// Start the long-polling loop.
    ///
    /// This will block the current task. Should be spawned in a
    /// background tokio::task.
    pub async fn start_polling(&self) -> Result<()> {
        info!("Starting Telegram bot long-polling loop...");
        let mut offset = 0;

        loop {
            match self.get_updates(offset).await {
                Ok(updates) => {
                    for update in updates {
                        offset = update.update_id + 1;
                        if let Some(msg) = update.message {
                            self.handle_message(&msg).await;
                        }
                    }
                }
                Err(e) => {
                    error!("Failed to fetch Telegram updates: {}", e);
                    tokio::time::sleep(Duration::from_secs(5)).await;
                }
            }
        }
    }

    async fn get_updates(&self, offset: i64) -> Result<Vec<Update>> {
        let url = format!(
            "https://api.telegram.org/bot{}/getUpdates?offset={}&timeout=30",
            self.token, offset
        );

        let response = self
            .client
            .get(&url)
            .send()
            .await?
            .json::<GetUpdatesResponse>()
            .await?;

        if !response.ok {
            return Err(anyhow::anyhow!("Telegram API returned ok=false"));
        }

        Ok(response.result.unwrap_or_default())
    }

    async fn handle_message(&self, msg: &Message) {
        let Some(text) = &msg.text else {
            return;
        };

        let reply = if text.starts_with("/start") {
            GREETING
        } else {
            NUDGE
        };

        if let Err(e) = self.send_with_keyboard(msg.chat.id, reply).await {
            error!("Failed to send reply to {}: {}", msg.chat.id, e);
        }
    }

    /// Send `text` with the single mini-app button attached.
    async fn send_with_keyboard(&self, chat_id: i64, text: &str) -> Result<()> {
        let url = format!("https://api.telegram.org/bot{}/sendMessage", self.token);

        let keyboard = InlineKeyboardMarkup {
            inline_keyboard: vec![vec![InlineKeyboardButton {
                text: BUTTON_LABEL.to_string(),
                web_app: WebAppInfo {
                    url: self.webapp_url.clone(),
                },
            }]],
        };

        let body = serde_json::json!({
            "chat_id": chat_id,
            "text": text,
            "reply_markup": keyboard,
        });

        self.client.post(&url).json(&body).send().await?;
        Ok(())
    }
}
