//! CLI parser and config loading.

use anyhow::Result;
use clap::{Parser, Subcommand};

use crate::config::BotConfig;

#[derive(Parser)]
#[command(name = "mistral-gateway")]
#[command(about = "Telegram chatbot gateway backed by Mistral AI", long_about = None)]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run in polling mode with the HTTP API (token can override BOT_TOKEN).
    Run {
        #[arg(short, long)]
        token: Option<String>,
    },
    /// Run the HTTP API alone; Telegram delivers updates to POST /update.
    Serve,
    /// Manage the Telegram webhook registration.
    Webhook {
        #[command(subcommand)]
        command: WebhookCommands,
    },
}

#[derive(Subcommand)]
pub enum WebhookCommands {
    /// Register the webhook at {PUBLIC_BASE_URL}/update.
    Setup {
        /// Overrides PUBLIC_BASE_URL.
        #[arg(long)]
        base_url: Option<String>,
    },
    /// Delete the current webhook registration.
    Delete,
    /// Show the current webhook status.
    Status,
}

/// Load BotConfig from environment. If `token` is provided it overrides BOT_TOKEN.
pub fn load_config(token: Option<String>) -> Result<BotConfig> {
    BotConfig::load(token)
}
