use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use http_body_util::BodyExt;
use relay_core::{EventType, InMemoryEventSink, NormalizedEvent};
use relay_ingress_whatsapp::{AppState, build_router};
use serde_json::{Value, json};
use tower::ServiceExt;

const VERIFY_TOKEN: &str = "myWebhookToken123";

fn router(sink: Arc<InMemoryEventSink>) -> axum::Router {
    build_router(AppState::new(VERIFY_TOKEN, sink))
}

async fn body_string(response: axum::response::Response) -> String {
    let bytes = response
        .into_body()
        .collect()
        .await
        .expect("collect")
        .to_bytes();
    String::from_utf8(bytes.to_vec()).unwrap()
}

fn post_webhook(payload: &Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/webhook")
        .header("content-type", "application/json")
        .body(Body::from(payload.to_string()))
        .unwrap()
}

async fn wait_for_events(sink: &InMemoryEventSink, expected: usize) -> Vec<NormalizedEvent> {
    let mut seen = Vec::new();
    for _ in 0..200 {
        seen.extend(sink.take().await);
        if seen.len() >= expected {
            break;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    seen
}

#[tokio::test]
async fn handshake_echoes_challenge() {
    let app = router(Arc::default());
    let response = app
        .oneshot(
            Request::builder()
                .uri("/webhook?hub.mode=subscribe&hub.verify_token=myWebhookToken123&hub.challenge=1158201444")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_string(response).await, "1158201444");
}

#[tokio::test]
async fn handshake_rejects_wrong_token_or_mode() {
    for uri in [
        "/webhook?hub.mode=subscribe&hub.verify_token=nope&hub.challenge=secret-challenge",
        "/webhook?hub.mode=unsubscribe&hub.verify_token=myWebhookToken123&hub.challenge=secret-challenge",
        "/webhook?hub.verify_token=myWebhookToken123&hub.challenge=secret-challenge",
        "/webhook?hub.mode=subscribe&hub.challenge=secret-challenge",
    ] {
        let response = router(Arc::default())
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::FORBIDDEN, "{uri}");
        assert!(!body_string(response).await.contains("secret-challenge"));
    }
}

#[tokio::test]
async fn delivery_is_acknowledged_and_forwarded_in_background() {
    let sink = Arc::new(InMemoryEventSink::default());
    let payload = json!({
        "object": "whatsapp_business_account",
        "entry": [{"id": "waba", "changes": [{"field": "messages", "value": {
            "messaging_product": "whatsapp",
            "messages": [
                {"type": "text", "text": {"body": "hi"}, "from": "123", "id": "m1", "timestamp": 1700000000},
                {"type": "image", "image": {"id": "media-1"}, "from": "123", "id": "i1", "timestamp": 1700000001},
                {"type": "reaction", "reaction": {"emoji": "👍", "message_id": "m0"}, "from": "123", "id": "r1", "timestamp": 1700000002}
            ]
        }}]}]
    });

    let response = router(sink.clone())
        .oneshot(post_webhook(&payload))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert!(response.headers().contains_key("x-request-id"));

    let events = wait_for_events(&sink, 2).await;
    assert_eq!(events.len(), 2);
    assert_eq!(events[0].event_type, EventType::Text);
    assert_eq!(events[0].content, "hi");
    assert_eq!(events[0].message_id, "m1");
    assert_eq!(events[0].from, "123");
    assert_eq!(events[1].event_type, EventType::Reaction);
    assert_eq!(events[1].message_id, "m0");
}

#[tokio::test]
async fn foreign_objects_are_not_found() {
    let sink = Arc::new(InMemoryEventSink::default());
    let payload = json!({
        "object": "page",
        "entry": [{"changes": [{"value": {"messages": [
            {"type": "text", "text": {"body": "hi"}, "from": "1", "id": "m1", "timestamp": "1700000000"}
        ]}}]}]
    });
    let response = router(sink.clone())
        .oneshot(post_webhook(&payload))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    tokio::time::sleep(Duration::from_millis(50)).await;
    assert!(sink.take().await.is_empty());
}

#[tokio::test]
async fn non_string_object_is_not_found() {
    let sink = Arc::new(InMemoryEventSink::default());
    for payload in [json!({"object": 123, "entry": []}), json!({"object": {"x": 1}})] {
        let response = router(sink.clone())
            .oneshot(post_webhook(&payload))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND, "{payload}");
    }

    tokio::time::sleep(Duration::from_millis(50)).await;
    assert!(sink.take().await.is_empty());
}

#[tokio::test]
async fn invalid_json_is_rejected_before_processing() {
    let response = router(Arc::default())
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/webhook")
                .header("content-type", "application/json")
                .body(Body::from("{not json"))
                .unwrap(),
        )
        .await
        .unwrap();
    assert!(response.status().is_client_error());
}

#[tokio::test]
async fn healthz_and_request_ids() {
    let response = router(Arc::default())
        .oneshot(
            Request::builder()
                .uri("/healthz")
                .header("x-request-id", "rid-42")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NO_CONTENT);
    let rid = response.headers()["x-request-id"].to_str().unwrap();
    assert_ne!(rid, "rid-42");
    assert!(uuid::Uuid::parse_str(rid).is_ok());
}
