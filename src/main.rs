use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use telebot::{Config, FnResponder};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,telebot=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Welcome to Telebot!");

    // Load configuration
    let config_path = std::env::args()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("settings.toml"));

    info!("Loading configuration from: {}", config_path.display());
    let config = Config::load(&config_path)
        .with_context(|| format!("Failed to load config from {}", config_path.display()))?;

    // A minimal responder; real bots plug their own logic in here.
    let responder = Arc::new(FnResponder(|text: &str| -> Result<String> {
        match text.trim() {
            "/ping" => Ok("pong".to_string()),
            other => Ok(format!("You said: {other}")),
        }
    }));

    telebot::run(config, responder).await?;

    Ok(())
}
