mod config;
mod names;
mod ping;
mod platform;
mod recipient;
mod scheduler;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::sync::Mutex;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::Config;
use crate::platform::telegram::TelegramClient;
use crate::scheduler::daily::DailyPing;
use crate::scheduler::Scheduler;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,lunchping=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let config_path = std::env::args()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("lunchping.toml"));

    info!("Loading configuration from: {}", config_path.display());
    let config = Config::load(&config_path)
        .with_context(|| format!("Failed to load config from {}", config_path.display()))?;
    let tz = config.schedule.tz()?;

    let webhook = config.telegram.webhook_endpoint()?;
    info!("Configuration loaded successfully");
    info!(
        "  Ping at: {:02}:{:02} {}",
        config.schedule.hour, config.schedule.minute, tz
    );
    info!("  Reset hour: {}", config.schedule.reset_hour);
    info!("  No-ping days: {:?}", config.schedule.no_ping_days);
    info!("  Names file: {}", config.schedule.names_file.display());
    info!("  Webhook host: {}", webhook.host_str().unwrap_or("-"));

    let client = TelegramClient::new(&config.telegram)?;
    let daily = Arc::new(Mutex::new(DailyPing::new(
        config.schedule.clone(),
        Arc::new(client),
    )));

    let mut scheduler = Scheduler::new().await?;
    scheduler.add_lunch_ping(daily, tz).await?;
    scheduler.start().await?;

    info!("Lunch ping bot is running");
    tokio::signal::ctrl_c()
        .await
        .context("Failed to listen for shutdown signal")?;

    info!("Shutdown requested");
    scheduler.shutdown().await?;
    info!("Bye");

    Ok(())
}
