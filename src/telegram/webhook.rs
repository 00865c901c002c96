//! Webhook registration against the Telegram Bot API.
//!
//! Registration is idempotent: when the current webhook already points at the
//! target URL it is left alone. Transient failures are retried a few times
//! before giving up.

use std::time::Duration;

use teloxide::prelude::*;
use teloxide::types::AllowedUpdate;
use tracing::{info, instrument, warn};

use crate::error::{GatewayError, Result};

/// Route that receives webhook updates; appended to the public base URL.
pub const WEBHOOK_PATH: &str = "/update";

const SETUP_ATTEMPTS: usize = 3;
const RETRY_DELAY: Duration = Duration::from_millis(500);

/// Current webhook registration, as reported by Telegram.
#[derive(Debug)]
pub struct WebhookStatus {
    pub url: Option<String>,
    pub pending_update_count: u32,
    pub last_error_message: Option<String>,
}

/// Builds the full webhook URL for a public base URL.
pub fn webhook_url(public_base_url: &str) -> Result<reqwest::Url> {
    let joined = format!("{}{}", public_base_url.trim_end_matches('/'), WEBHOOK_PATH);
    reqwest::Url::parse(&joined)
        .map_err(|e| GatewayError::Config(format!("invalid public base URL {joined:?}: {e}")))
}

/// Points the Telegram webhook at `{public_base_url}/update`.
/// Returns a human-readable description of what happened.
#[instrument(skip(bot))]
pub async fn register(bot: &Bot, public_base_url: &str) -> Result<String> {
    let target = webhook_url(public_base_url)?;

    match bot.get_webhook_info().await {
        Ok(info) if info.url.as_ref() == Some(&target) => {
            info!(url = %target, "webhook already registered");
            return Ok(format!("webhook already registered at {target}"));
        }
        Ok(info) => {
            if let Some(current) = info.url {
                info!(current = %current, "replacing existing webhook");
            }
        }
        Err(e) => warn!(error = %e, "could not fetch current webhook info"),
    }

    let mut last_error = String::new();
    for attempt in 1..=SETUP_ATTEMPTS {
        let request = bot
            .set_webhook(target.clone())
            .allowed_updates(vec![AllowedUpdate::Message, AllowedUpdate::CallbackQuery]);
        match request.await {
            Ok(_) => {
                info!(url = %target, attempt, "webhook registered");
                return Ok(format!("webhook registered at {target}"));
            }
            Err(e) => {
                warn!(error = %e, attempt, "webhook registration attempt failed");
                last_error = e.to_string();
                if attempt < SETUP_ATTEMPTS {
                    tokio::time::sleep(RETRY_DELAY).await;
                }
            }
        }
    }

    Err(GatewayError::Telegram(format!(
        "webhook registration failed after {SETUP_ATTEMPTS} attempts: {last_error}"
    )))
}

/// Removes the current webhook registration, if any.
#[instrument(skip(bot))]
pub async fn unregister(bot: &Bot) -> Result<()> {
    bot.delete_webhook()
        .await
        .map_err(|e| GatewayError::Telegram(e.to_string()))?;
    info!("webhook deleted");
    Ok(())
}

/// Fetches the current webhook registration.
pub async fn status(bot: &Bot) -> Result<WebhookStatus> {
    let info = bot
        .get_webhook_info()
        .await
        .map_err(|e| GatewayError::Telegram(e.to_string()))?;
    Ok(WebhookStatus {
        url: info.url.map(|url| url.to_string()),
        pending_update_count: info.pending_update_count,
        last_error_message: info.last_error_message,
    })
}
