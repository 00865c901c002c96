use anyhow::Result;
use std::env;

use crate::completion::{DEFAULT_MISTRAL_BASE_URL, DEFAULT_MISTRAL_MODEL};
use crate::relay::DEFAULT_HISTORY_LIMIT;

/// Gateway configuration, loaded from environment variables.
pub struct BotConfig {
    pub bot_token: String,
    pub mistral_api_key: String,
    pub mistral_base_url: String,
    pub mistral_model: String,
    /// Conversation store backend: `memory` | `sled`.
    pub storage_backend: String,
    /// Path of the sled database directory. Used when `storage_backend == "sled"`.
    pub sled_path: String,
    /// How many recent messages the relay feeds back as context.
    pub history_limit: i64,
    pub port: u16,
    /// Public HTTPS base URL of this deployment; webhook registration points
    /// Telegram at `{public_base_url}/update`.
    pub public_base_url: Option<String>,
    pub log_file: Option<String>,
    /// Optional Telegram Bot API base URL. When set, bot requests go to this URL
    /// (used in tests to point at a mock server).
    /// Env: `TELEGRAM_API_URL` or `TELOXIDE_API_URL`.
    pub telegram_api_url: Option<String>,
}

impl BotConfig {
    /// Loads configuration from environment variables.
    /// If `token` is given it overrides `BOT_TOKEN`.
    pub fn load(token: Option<String>) -> Result<Self> {
        let bot_token = match token {
            Some(token) => token,
            None => env::var("BOT_TOKEN")
                .or_else(|_| env::var("TELEGRAM_BOT_TOKEN"))
                .map_err(|_| anyhow::anyhow!("BOT_TOKEN not set"))?,
        };
        let mistral_api_key = env::var("MISTRAL_API_KEY").unwrap_or_default();
        let mistral_base_url = env::var("MISTRAL_BASE_URL")
            .unwrap_or_else(|_| DEFAULT_MISTRAL_BASE_URL.to_string());
        let mistral_model =
            env::var("MISTRAL_MODEL").unwrap_or_else(|_| DEFAULT_MISTRAL_MODEL.to_string());
        let storage_backend = env::var("STORAGE_BACKEND").unwrap_or_else(|_| "memory".to_string());
        let sled_path = env::var("SLED_PATH").unwrap_or_else(|_| "./data/conversations".to_string());
        let history_limit = env::var("HISTORY_LIMIT")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(DEFAULT_HISTORY_LIMIT);
        let port = env::var("PORT")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(3000);
        let public_base_url = env::var("PUBLIC_BASE_URL").ok();
        let log_file = env::var("LOG_FILE").ok();
        let telegram_api_url = env::var("TELEGRAM_API_URL")
            .or_else(|_| env::var("TELOXIDE_API_URL"))
            .ok();

        Ok(Self {
            bot_token,
            mistral_api_key,
            mistral_base_url,
            mistral_model,
            storage_backend,
            sled_path,
            history_limit,
            port,
            public_base_url,
            log_file,
            telegram_api_url,
        })
    }

    /// Checks that everything the relay pipeline needs is present.
    /// Webhook management commands only need the bot token and skip this.
    pub fn validate(&self) -> Result<()> {
        if self.bot_token.is_empty() {
            anyhow::bail!("BOT_TOKEN must not be empty");
        }
        if self.mistral_api_key.is_empty() {
            anyhow::bail!("MISTRAL_API_KEY not set");
        }
        Ok(())
    }
}
