//! Wraps teloxide::Bot behind the [`Outbound`] port. Production replies go out
//! through Telegram; tests substitute a recording implementation.

use async_trait::async_trait;
use teloxide::prelude::*;
use teloxide::types::{CallbackQuery, ChatAction, ChatId};

use crate::dispatch::Outbound;
use crate::error::{GatewayError, Result};

/// Thin adapter from the dispatch-facing [`Outbound`] port to teloxide.
pub struct TelegramSender {
    bot: Bot,
}

impl TelegramSender {
    pub fn new(bot: Bot) -> Self {
        Self { bot }
    }

    /// Returns the underlying teloxide Bot for direct API use when needed.
    pub fn inner(&self) -> &Bot {
        &self.bot
    }
}

#[async_trait]
impl Outbound for TelegramSender {
    async fn send_text(&self, chat_id: i64, text: &str) -> Result<()> {
        self.bot
            .send_message(ChatId(chat_id), text.to_string())
            .await
            .map_err(|e| GatewayError::Telegram(e.to_string()))?;
        Ok(())
    }

    async fn send_typing(&self, chat_id: i64) -> Result<()> {
        self.bot
            .send_chat_action(ChatId(chat_id), ChatAction::Typing)
            .await
            .map_err(|e| GatewayError::Telegram(e.to_string()))?;
        Ok(())
    }

    async fn ack_callback(&self, query: &CallbackQuery) -> Result<()> {
        self.bot
            .answer_callback_query(query.id.clone())
            .await
            .map_err(|e| GatewayError::Telegram(e.to_string()))?;
        Ok(())
    }
}
