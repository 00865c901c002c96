//! # mistral-gateway
//!
//! Telegram chatbot gateway backed by the Mistral AI completion API. An inbound
//! update (long-polling or webhook) is classified by [`dispatch::InboundDispatch`];
//! free text flows through [`relay::ConversationRelay`], which persists the
//! exchange in a pluggable [`storage::ConversationStore`] and calls
//! [`completion::MistralClient`] with bounded conversation context. Both delivery
//! modes share the HTTP API in [`http`].

pub mod cli;
pub mod completion;
pub mod components;
pub mod config;
pub mod dispatch;
pub mod error;
pub mod http;
pub mod logger;
pub mod relay;
pub mod runner;
pub mod storage;
pub mod telegram;

pub use cli::{load_config, Cli, Commands, WebhookCommands};

pub use completion::{
    ChatTurn, CompletionClient, CompletionError, MistralClient, TurnRole,
};
pub use components::{build_bot, build_components, create_store, GatewayComponents};
pub use config::BotConfig;
pub use dispatch::{BotCommand, InboundDispatch, Outbound};
pub use error::{GatewayError, Result};
pub use http::{create_router, AppState, SendRequest, SendResponse};
pub use logger::init_tracing;
pub use relay::{ConversationRelay, DEFAULT_HISTORY_LIMIT};
pub use runner::{run_gateway, serve_webhook};
pub use storage::{
    ConversationStore, InMemoryStore, SenderRole, SledStore, StorageError, StoredMessage,
};
pub use telegram::{Poller, TelegramSender};
