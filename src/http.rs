//! HTTP surface of the gateway.
//!
//! `POST /send` drives the relay directly, `POST /update` receives webhook
//! deliveries, `GET /health` is the liveness probe, and `POST /webhook`
//! (re-)registers the Telegram webhook. Malformed JSON is the only request that
//! earns a non-2xx on the update route; everything else is handled or skipped
//! with a 200 so Telegram does not re-deliver.

use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use teloxide::types::Update;
use teloxide::Bot;

use crate::dispatch::InboundDispatch;
use crate::relay::ConversationRelay;
use crate::telegram::webhook;

/// Shared state behind the router.
pub struct AppState {
    pub relay: Arc<ConversationRelay>,
    pub dispatch: Arc<InboundDispatch>,
    pub bot: Bot,
    pub public_base_url: Option<String>,
}

/// Builds the API router with all routes.
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/send", post(send_message))
        .route("/update", post(receive_update))
        .route("/webhook", post(register_webhook))
        .with_state(state)
}

async fn health_check() -> impl IntoResponse {
    Json(serde_json::json!({"status": "ok"}))
}

/// Request body for `POST /send`.
#[derive(Debug, Deserialize)]
pub struct SendRequest {
    pub chat_id: i64,
    pub username: String,
    pub message: String,
}

/// Response body for `POST /send`.
#[derive(Debug, Serialize)]
pub struct SendResponse {
    pub response: String,
}

async fn send_message(
    State(state): State<Arc<AppState>>,
    Json(request): Json<SendRequest>,
) -> Json<SendResponse> {
    let response = state
        .relay
        .process_message(request.chat_id, &request.username, &request.message)
        .await;
    Json(SendResponse { response })
}

/// Webhook delivery endpoint: a raw Telegram update in the body.
async fn receive_update(
    State(state): State<Arc<AppState>>,
    Json(update): Json<Update>,
) -> Json<serde_json::Value> {
    state.dispatch.handle_update(&update).await;
    Json(serde_json::json!({"status": "ok"}))
}

/// Administrative: registers the webhook at `{PUBLIC_BASE_URL}/update`.
async fn register_webhook(
    State(state): State<Arc<AppState>>,
) -> Result<Json<serde_json::Value>, (StatusCode, String)> {
    let base_url = state.public_base_url.as_deref().ok_or((
        StatusCode::BAD_REQUEST,
        "PUBLIC_BASE_URL is not configured".to_string(),
    ))?;
    let detail = webhook::register(&state.bot, base_url)
        .await
        .map_err(|e| (StatusCode::BAD_GATEWAY, e.to_string()))?;
    Ok(Json(serde_json::json!({"status": "ok", "detail": detail})))
}
