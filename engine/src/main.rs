// Progulka route engine
// Main entry point for the progulka binary

use std::sync::Arc;

use clap::Parser;
use progulka_engine::bot::TelegramBot;
use progulka_engine::catalog::load_catalog;
use progulka_engine::classifier::{Classifier, ClassifyOptions, EmbeddingClassifier, LexicalClassifier};
use progulka_engine::cli::{Cli, Command};
use progulka_engine::config::{hf_api_token, telegram_bot_token, Config};
use progulka_engine::engine::RouteEngine;
use progulka_engine::inference::HfEmbeddingClient;
use progulka_engine::server;
use progulka_engine::taxonomy::label_or_generic;
use progulka_engine::telemetry::{init_telemetry, init_telemetry_with_level};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Basic telemetry first, before config is loaded
    init_telemetry();

    let config = if let Some(config_path) = &cli.config {
        Config::load_from_path(config_path)?
    } else {
        Config::load_or_create()?
    };

    // Swap in the configured level now that config is known (CLI flag wins)
    let level = cli.log.as_deref().unwrap_or(&config.core.log_level);
    init_telemetry_with_level(level);

    tracing::info!("Progulka v{}", env!("CARGO_PKG_VERSION"));

    match cli.command {
        Command::Serve => serve(config).await,
        Command::Classify { query } => classify(config, &query).await,
        Command::Doctor => doctor(config).await,
    }
}

async fn serve(config: Config) -> anyhow::Result<()> {
    let engine = Arc::new(RouteEngine::init(config.clone()).await?);

    if config.bot.enabled {
        let token = telegram_bot_token()?;
        let bot = TelegramBot::new(token, config.bot.webapp_url.clone());
        tokio::spawn(async move {
            if let Err(e) = bot.start_polling().await {
                tracing::error!("Telegram bot stopped: {}", e);
            }
        });
    }

    server::serve(engine, &config.server).await?;
    Ok(())
}

async fn classify(config: Config, query: &str) -> anyhow::Result<()> {
    let classifier: Box<dyn Classifier> = match config.classifier.strategy.as_str() {
        "lexical" => Box::new(LexicalClassifier),
        _ => {
            let token = hf_api_token()?;
            let backend = Arc::new(HfEmbeddingClient::new(config.inference.embedding.clone(), token));
            Box::new(EmbeddingClassifier::init(backend).await)
        }
    };

    let opts = ClassifyOptions::from(&config.classifier);
    let scores = classifier.classify(query, &opts).await;

    if scores.is_empty() {
        println!("No categories matched.");
        return Ok(());
    }

    println!("Categories for '{}':", query);
    for score in scores {
        match score.confidence {
            Some(confidence) => println!(
                "  {:2}  {}  (similarity {:.3})",
                score.category_id,
                label_or_generic(score.category_id),
                confidence
            ),
            None => println!(
                "  {:2}  {}",
                score.category_id,
                label_or_generic(score.category_id)
            ),
        }
    }
    Ok(())
}

async fn doctor(config: Config) -> anyhow::Result<()> {
    println!("Progulka diagnostics");
    println!();

    // Credential check against the whoami endpoint
    match hf_api_token() {
        Ok(token) => {
            let client = reqwest::Client::new();
            let response = client
                .get("https://huggingface.co/api/whoami")
                .header("Authorization", format!("Bearer {}", token))
                .timeout(std::time::Duration::from_secs(10))
                .send()
                .await;
            match response {
                Ok(r) if r.status().is_success() => println!("  HF_API_TOKEN: valid"),
                Ok(r) => println!("  HF_API_TOKEN: rejected ({})", r.status()),
                Err(e) => println!("  HF_API_TOKEN: check failed ({})", e),
            }
        }
        Err(_) => println!("  HF_API_TOKEN: not set"),
    }

    match telegram_bot_token() {
        Ok(_) => println!("  TELEGRAM_BOT_TOKEN: set"),
        Err(_) => println!(
            "  TELEGRAM_BOT_TOKEN: not set{}",
            if config.bot.enabled { " (bot is enabled!)" } else { "" }
        ),
    }

    // Catalog check
    match load_catalog(&config.core.catalog_path) {
        Ok(places) => {
            let categorized = places.iter().filter(|p| p.category_id.is_some()).count();
            println!(
                "  Catalog {}: {} places ({} categorized)",
                config.core.catalog_path.display(),
                places.len(),
                categorized
            );
        }
        Err(e) => println!(
            "  Catalog {}: {}",
            config.core.catalog_path.display(),
            e
        ),
    }

    println!("  Classifier strategy: {}", config.classifier.strategy);
    println!("  Chat model: {}", config.inference.chat.model);
    Ok(())
}
