//! Component factory: builds the gateway's pieces from config.
//! Isolates assembly logic from the runner and the CLI.

use anyhow::Result;
use std::sync::Arc;
use teloxide::Bot;
use tracing::{error, info};

use crate::completion::{CompletionClient, MistralClient};
use crate::config::BotConfig;
use crate::dispatch::{InboundDispatch, Outbound};
use crate::relay::ConversationRelay;
use crate::storage::{ConversationStore, InMemoryStore, SledStore};
use crate::telegram::TelegramSender;

/// Everything the runner and the HTTP state need, produced by the factory.
pub struct GatewayComponents {
    pub store: Arc<dyn ConversationStore>,
    pub completion: Arc<dyn CompletionClient>,
    pub bot: Bot,
    pub relay: Arc<ConversationRelay>,
    pub dispatch: Arc<InboundDispatch>,
}

/// Creates the conversation store selected by config.
pub fn create_store(config: &BotConfig) -> Result<Arc<dyn ConversationStore>> {
    match config.storage_backend.as_str() {
        "sled" => {
            info!(path = %config.sled_path, "using sled conversation store");
            let store = SledStore::new(&config.sled_path).map_err(|e| {
                error!(error = %e, path = %config.sled_path, "failed to open sled store");
                anyhow::anyhow!("failed to open sled store: {}", e)
            })?;
            Ok(Arc::new(store))
        }
        _ => {
            info!("using in-memory conversation store");
            Ok(Arc::new(InMemoryStore::new()))
        }
    }
}

/// Creates the teloxide Bot, honoring an optional API URL override (tests point
/// this at a mock server).
pub fn build_bot(config: &BotConfig) -> Bot {
    let bot = Bot::new(config.bot_token.clone());
    match &config.telegram_api_url {
        Some(url) => match reqwest::Url::parse(url) {
            Ok(url) => bot.set_api_url(url),
            Err(e) => {
                error!(error = %e, url = %url, "invalid TELEGRAM_API_URL, using default");
                bot
            }
        },
        None => bot,
    }
}

/// Builds all components: store, completion client, bot, relay, dispatch.
pub fn build_components(config: &BotConfig) -> Result<GatewayComponents> {
    let store = create_store(config)?;

    let completion: Arc<dyn CompletionClient> = Arc::new(
        MistralClient::new(config.mistral_api_key.clone())?
            .with_base_url(config.mistral_base_url.clone())
            .with_model(config.mistral_model.clone()),
    );

    let bot = build_bot(config);
    let outbound: Arc<dyn Outbound> = Arc::new(TelegramSender::new(bot.clone()));

    let relay = Arc::new(
        ConversationRelay::new(store.clone(), completion.clone())
            .with_history_limit(config.history_limit),
    );
    let dispatch = Arc::new(InboundDispatch::new(relay.clone(), store.clone(), outbound));

    Ok(GatewayComponents {
        store,
        completion,
        bot,
        relay,
        dispatch,
    })
}
