//! Process lifecycle: validate config, init logging, build components, run the
//! HTTP server (and the polling loop in polling mode) until shutdown.

use anyhow::Result;
use std::sync::Arc;
use tracing::{info, instrument};

use crate::components::build_components;
use crate::config::BotConfig;
use crate::http::{create_router, AppState};
use crate::logger::init_tracing;
use crate::telegram::Poller;

fn app_state(components: &crate::components::GatewayComponents, config: &BotConfig) -> Arc<AppState> {
    Arc::new(AppState {
        relay: components.relay.clone(),
        dispatch: components.dispatch.clone(),
        bot: components.bot.clone(),
        public_base_url: config.public_base_url.clone(),
    })
}

async fn shutdown_signal() {
    let _ = tokio::signal::ctrl_c().await;
    info!("shutdown signal received");
}

/// Polling mode: long-polls Telegram for updates and serves the HTTP API.
#[instrument(skip(config))]
pub async fn run_gateway(config: BotConfig) -> Result<()> {
    config.validate()?;
    init_tracing(config.log_file.as_deref())?;

    info!(
        storage_backend = %config.storage_backend,
        model = %config.mistral_model,
        port = config.port,
        "initializing gateway (polling mode)"
    );

    let components = build_components(&config)?;
    let state = app_state(&components, &config);
    let app = create_router(state);

    let poller = Poller::start(components.bot.clone(), components.dispatch.clone());

    let listener = tokio::net::TcpListener::bind(("0.0.0.0", config.port)).await?;
    info!(port = config.port, "gateway listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    poller.stop().await;
    info!("gateway stopped");
    Ok(())
}

/// Webhook mode: serves the HTTP API alone; Telegram pushes updates to
/// `POST /update`. Registration happens via `POST /webhook` or the CLI.
#[instrument(skip(config))]
pub async fn serve_webhook(config: BotConfig) -> Result<()> {
    config.validate()?;
    init_tracing(config.log_file.as_deref())?;

    info!(
        storage_backend = %config.storage_backend,
        model = %config.mistral_model,
        port = config.port,
        "initializing gateway (webhook mode)"
    );
    if config.public_base_url.is_none() {
        info!("PUBLIC_BASE_URL not set; register the webhook manually or via the CLI");
    }

    let components = build_components(&config)?;
    let state = app_state(&components, &config);
    let app = create_router(state);

    let listener = tokio::net::TcpListener::bind(("0.0.0.0", config.port)).await?;
    info!(port = config.port, "gateway listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("gateway stopped");
    Ok(())
}
