//! HTTP API tests: drives the router in-process with tower's oneshot.

use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use teloxide::Bot;
use tower::ServiceExt;

use mistral_gateway::{
    create_router, AppState, ConversationRelay, ConversationStore, InMemoryStore, InboundDispatch,
};

mod common;
use common::{RecordingOutbound, StubCompletion};

struct TestGateway {
    store: Arc<dyn ConversationStore>,
    outbound: Arc<RecordingOutbound>,
    app: axum::Router,
}

fn gateway(reply: &str) -> TestGateway {
    let store: Arc<dyn ConversationStore> = Arc::new(InMemoryStore::new());
    let completion = StubCompletion::new(reply);
    let outbound = RecordingOutbound::new();

    let relay = Arc::new(ConversationRelay::new(store.clone(), completion));
    let dispatch = Arc::new(InboundDispatch::new(
        relay.clone(),
        store.clone(),
        outbound.clone(),
    ));

    let state = Arc::new(AppState {
        relay,
        dispatch,
        bot: Bot::new("123456:TEST"),
        public_base_url: None,
    });

    TestGateway {
        store,
        outbound,
        app: create_router(state),
    }
}

fn json_post(uri: &str, body: serde_json::Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

async fn body_json(response: axum::response::Response) -> serde_json::Value {
    let bytes = axum::body::to_bytes(response.into_body(), 64 * 1024)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn test_health_returns_ok() {
    let gateway = gateway("unused");

    let response = gateway
        .app
        .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await, serde_json::json!({"status": "ok"}));
}

#[tokio::test]
async fn test_send_relays_and_persists_the_exchange() {
    let gateway = gateway("Hello Bob!");

    let response = gateway
        .app
        .oneshot(json_post(
            "/send",
            serde_json::json!({"chat_id": 42, "username": "bob", "message": "Hi"}),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        body_json(response).await,
        serde_json::json!({"response": "Hello Bob!"})
    );

    let messages = gateway.store.get_conversation(42, 10).await;
    assert_eq!(messages.len(), 2);
    assert_eq!(messages[0].content, "Hi");
    assert_eq!(messages[1].content, "Hello Bob!");
}

#[tokio::test]
async fn test_update_routes_free_text_and_sends_explicitly() {
    let gateway = gateway("the answer");

    let update = serde_json::json!({
        "update_id": 10,
        "message": {
            "message_id": 100,
            "date": 1_700_000_000,
            "chat": {"id": 55, "type": "private", "first_name": "Test"},
            "from": {"id": 7, "is_bot": false, "first_name": "Test", "username": "tester"},
            "text": "what is rust?",
        }
    });

    let response = gateway.app.oneshot(json_post("/update", update)).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await, serde_json::json!({"status": "ok"}));
    // The webhook response body is not the reply; it must go out as a send call.
    assert_eq!(gateway.outbound.sent(), vec![(55, "the answer".to_string())]);
}

#[tokio::test]
async fn test_update_with_unsupported_kind_is_skipped_gracefully() {
    let gateway = gateway("unused");

    let update = serde_json::json!({
        "update_id": 11,
        "edited_message": {
            "message_id": 101,
            "date": 1_700_000_000,
            "edit_date": 1_700_000_100,
            "chat": {"id": 55, "type": "private", "first_name": "Test"},
            "from": {"id": 7, "is_bot": false, "first_name": "Test"},
            "text": "edited text",
        }
    });

    let response = gateway.app.oneshot(json_post("/update", update)).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert!(gateway.outbound.sent().is_empty());
}

#[tokio::test]
async fn test_update_rejects_malformed_json() {
    let gateway = gateway("unused");

    let response = gateway
        .app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/update")
                .header("content-type", "application/json")
                .body(Body::from("{ this is not json"))
                .unwrap(),
        )
        .await
        .unwrap();

    assert!(response.status().is_client_error());
}

#[tokio::test]
async fn test_webhook_registration_requires_configuration() {
    let gateway = gateway("unused");

    let response = gateway
        .app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/webhook")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}
