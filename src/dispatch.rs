//! Inbound dispatch: classifies a Telegram update as command, free text, or
//! callback interaction and routes it.
//!
//! Free text goes through the [`ConversationRelay`]; commands are static string
//! dispatch against a fixed vocabulary; callback interactions map a fixed `data`
//! tag to a canned reply. Replies leave through the [`Outbound`] port in every
//! delivery mode; a webhook HTTP response body is not a Telegram reply, so the
//! webhook path must send explicitly just like polling does.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use teloxide::types::{CallbackQuery, Message as TgMessage, Update, UpdateKind};
use tokio::sync::RwLock;
use tracing::{debug, error, info, instrument};

use crate::error::Result;
use crate::relay::ConversationRelay;
use crate::storage::ConversationStore;

const DEFAULT_USERNAME: &str = "user";

pub const WELCOME_TEXT: &str = "Hi! I am your AI assistant powered by Mistral AI. How can I help you today?\n\n\
Use /chat to start a conversation with me\n\
Use /reset to clear our conversation history\n\
Use /help to see all available commands";

pub const CHAT_MODE_TEXT: &str =
    "Chat mode enabled! You can now talk to me directly. What would you like to discuss?";

pub const RESET_DONE_TEXT: &str = "Your conversation history has been reset.";

pub const RESET_FAILED_TEXT: &str =
    "Sorry, I could not clear your conversation history. Please try again.";

pub const HELP_TEXT: &str = "Available commands:\n\n\
/start - Start the conversation and show the menu\n\
/chat - Start chatting with the AI\n\
/reset - Reset your conversation history\n\
/help - Show this help message";

pub const FEEDBACK_POSITIVE_TAG: &str = "feedback_positive";
pub const FEEDBACK_NEGATIVE_TAG: &str = "feedback_negative";

pub const FEEDBACK_POSITIVE_REPLY: &str = "Thanks for the positive feedback!";
pub const FEEDBACK_NEGATIVE_REPLY: &str =
    "I am sorry the answer was not helpful. How can I do better?";

/// Outbound side of the transport: how replies reach the chat.
/// Production uses [`crate::telegram::TelegramSender`]; tests record calls.
#[async_trait]
pub trait Outbound: Send + Sync {
    async fn send_text(&self, chat_id: i64, text: &str) -> Result<()>;
    async fn send_typing(&self, chat_id: i64) -> Result<()>;
    async fn ack_callback(&self, query: &CallbackQuery) -> Result<()>;
}

/// The fixed command vocabulary. Anything else is ignored.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BotCommand {
    Start,
    Chat,
    Reset,
    Help,
}

impl BotCommand {
    /// Parses `/name` or `/name@BotName` (arguments after whitespace are
    /// ignored). Returns None for anything outside the vocabulary.
    pub fn parse(text: &str) -> Option<Self> {
        let first = text.split_whitespace().next()?;
        let name = first.strip_prefix('/')?;
        let name = name.split('@').next().unwrap_or(name);
        match name {
            "start" => Some(BotCommand::Start),
            "chat" => Some(BotCommand::Chat),
            "reset" => Some(BotCommand::Reset),
            "help" => Some(BotCommand::Help),
            _ => None,
        }
    }
}

/// Routes platform updates. Owns the per-chat chat-mode flags (presentational
/// only; free text is relayed regardless of the flag).
pub struct InboundDispatch {
    relay: Arc<ConversationRelay>,
    store: Arc<dyn ConversationStore>,
    outbound: Arc<dyn Outbound>,
    chat_mode: RwLock<HashMap<i64, bool>>,
}

impl InboundDispatch {
    pub fn new(
        relay: Arc<ConversationRelay>,
        store: Arc<dyn ConversationStore>,
        outbound: Arc<dyn Outbound>,
    ) -> Self {
        Self {
            relay,
            store,
            outbound,
            chat_mode: RwLock::new(HashMap::new()),
        }
    }

    /// Whether the chat has been marked as chatting (display-only state).
    pub async fn is_chat_mode(&self, chat_id: i64) -> bool {
        self.chat_mode.read().await.get(&chat_id).copied().unwrap_or(false)
    }

    async fn enable_chat_mode(&self, chat_id: i64) {
        let mut modes = self.chat_mode.write().await;
        if !modes.get(&chat_id).copied().unwrap_or(false) {
            modes.insert(chat_id, true);
            info!(chat_id, "chat mode enabled");
        }
    }

    /// Entry point for raw updates (webhook delivery). Unsupported update kinds
    /// are skipped without error.
    pub async fn handle_update(&self, update: &Update) {
        match &update.kind {
            UpdateKind::Message(message) => self.handle_message(message).await,
            UpdateKind::CallbackQuery(query) => self.handle_callback(query).await,
            _ => debug!(update_id = ?update.id, "skipping unsupported update kind"),
        }
    }

    /// Classifies a message as command or free text and routes it.
    #[instrument(skip(self, message))]
    pub async fn handle_message(&self, message: &TgMessage) {
        let text = match message.text() {
            Some(text) => text,
            None => {
                debug!(chat_id = message.chat.id.0, "ignoring non-text message");
                return;
            }
        };
        let chat_id = message.chat.id.0;
        let username = message
            .from
            .as_ref()
            .and_then(|user| user.username.clone())
            .unwrap_or_else(|| DEFAULT_USERNAME.to_string());

        if text.starts_with('/') {
            match BotCommand::parse(text) {
                Some(command) => self.handle_command(chat_id, command).await,
                None => info!(chat_id, command = %text, "ignoring unrecognized command"),
            }
        } else {
            self.handle_free_text(chat_id, &username, text).await;
        }
    }

    async fn handle_command(&self, chat_id: i64, command: BotCommand) {
        info!(chat_id, ?command, "handling command");
        let reply = match command {
            BotCommand::Start => WELCOME_TEXT,
            BotCommand::Chat => {
                self.enable_chat_mode(chat_id).await;
                CHAT_MODE_TEXT
            }
            BotCommand::Reset => match self.store.reset_conversation(chat_id).await {
                Ok(()) => RESET_DONE_TEXT,
                Err(e) => {
                    // The one persistence failure the user must see: a swallowed
                    // reset would leave history they believe is gone.
                    error!(error = %e, chat_id, "failed to reset conversation");
                    RESET_FAILED_TEXT
                }
            },
            BotCommand::Help => HELP_TEXT,
        };
        if let Err(e) = self.outbound.send_text(chat_id, reply).await {
            error!(error = %e, chat_id, "failed to deliver command reply");
        }
    }

    async fn handle_free_text(&self, chat_id: i64, username: &str, text: &str) {
        self.enable_chat_mode(chat_id).await;

        if let Err(e) = self.outbound.send_typing(chat_id).await {
            debug!(error = %e, chat_id, "typing action failed");
        }

        let reply = self.relay.process_message(chat_id, username, text).await;

        if let Err(e) = self.outbound.send_text(chat_id, &reply).await {
            error!(error = %e, chat_id, "failed to deliver reply");
        }
    }

    /// Answers a callback interaction with its canned reply; unknown tags no-op.
    #[instrument(skip(self, query))]
    pub async fn handle_callback(&self, query: &CallbackQuery) {
        if let Err(e) = self.outbound.ack_callback(query).await {
            debug!(error = %e, "failed to ack callback query");
        }

        let chat_id = match query.message.as_ref() {
            Some(message) => message.chat().id.0,
            None => {
                debug!("callback query without message, nothing to reply to");
                return;
            }
        };

        let reply = match query.data.as_deref() {
            Some(FEEDBACK_POSITIVE_TAG) => FEEDBACK_POSITIVE_REPLY,
            Some(FEEDBACK_NEGATIVE_TAG) => FEEDBACK_NEGATIVE_REPLY,
            other => {
                debug!(chat_id, tag = ?other, "ignoring unknown callback tag");
                return;
            }
        };
        if let Err(e) = self.outbound.send_text(chat_id, reply).await {
            error!(error = %e, chat_id, "failed to deliver callback reply");
        }
    }
}
