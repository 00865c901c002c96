//! AWS Lambda entry point: serves the gateway router behind API Gateway.
//! Built with `--features lambda`.

use std::sync::Arc;

use mistral_gateway::{build_components, create_router, AppState, BotConfig};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), lambda_http::Error> {
    // Stdout-only structured logs for CloudWatch.
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_ansi(false)
        .init();

    let config = BotConfig::load(None)?;
    config.validate()?;

    let components = build_components(&config)?;
    let state = Arc::new(AppState {
        relay: components.relay.clone(),
        dispatch: components.dispatch.clone(),
        bot: components.bot.clone(),
        public_base_url: config.public_base_url.clone(),
    });

    lambda_http::run(create_router(state)).await
}
