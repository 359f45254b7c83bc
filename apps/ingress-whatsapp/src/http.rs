use std::sync::Arc;

use axum::{
    Extension, Json, Router,
    extract::{Query, State},
    http::StatusCode,
    middleware,
    response::IntoResponse,
    routing::get,
};
use relay_core::{EventSink, WebhookBody, extract, extract_statuses};
use relay_telemetry::record_webhook_delivery;
use serde::Deserialize;
use tracing::Instrument;

use crate::reqid::{RequestId, with_request_id};

#[derive(Clone)]
pub struct AppState {
    verify_token: Arc<str>,
    sink: Arc<dyn EventSink>,
}

impl AppState {
    pub fn new(verify_token: impl Into<String>, sink: Arc<dyn EventSink>) -> Self {
        Self {
            verify_token: Arc::from(verify_token.into()),
            sink,
        }
    }
}

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/webhook", get(verify).post(receive))
        .route("/healthz", get(healthz))
        .layer(middleware::from_fn(with_request_id))
        .with_state(state)
}

#[derive(Deserialize)]
struct VerifyQs {
    #[serde(rename = "hub.mode")]
    mode: Option<String>,
    #[serde(rename = "hub.challenge")]
    challenge: Option<String>,
    #[serde(rename = "hub.verify_token")]
    token: Option<String>,
}

async fn verify(State(state): State<AppState>, Query(q): Query<VerifyQs>) -> impl IntoResponse {
    if q.mode.as_deref() == Some("subscribe") && q.token.as_deref() == Some(&*state.verify_token)
    {
        tracing::info!("webhook subscription verified");
        (StatusCode::OK, q.challenge.unwrap_or_default())
    } else {
        tracing::warn!(mode = ?q.mode, "webhook verification rejected");
        (StatusCode::FORBIDDEN, "Forbidden".to_string())
    }
}

/// Acknowledges the delivery first, then extracts and forwards its events on
/// a detached task. Events still in flight are lost if the process stops.
async fn receive(
    State(state): State<AppState>,
    Extension(request_id): Extension<RequestId>,
    Json(body): Json<WebhookBody>,
) -> StatusCode {
    if tracing::enabled!(tracing::Level::DEBUG) {
        let raw = serde_json::to_string(&body).unwrap_or_default();
        tracing::debug!(request_id = %request_id.0, payload = %raw, "incoming webhook");
    }

    if !body.is_whatsapp() {
        record_webhook_delivery(false);
        tracing::warn!(
            request_id = %request_id.0,
            object = ?body.object,
            "webhook for unexpected object ignored"
        );
        return StatusCode::NOT_FOUND;
    }
    record_webhook_delivery(true);

    let span = tracing::info_span!("webhook.process", request_id = %request_id.0);
    let sink = state.sink.clone();
    tokio::spawn(
        async move {
            process_delivery(sink.as_ref(), &body).await;
        }
        .instrument(span),
    );

    StatusCode::OK
}

/// Logs delivery receipts and hands every extracted event to the sink, one
/// at a time, in document order.
pub async fn process_delivery(sink: &dyn EventSink, body: &WebhookBody) {
    for status in extract_statuses(body) {
        tracing::info!(
            message_id = %status.message_id,
            status = %status.delivery_state,
            recipient = %status.recipient,
            timestamp = %status.timestamp,
            "whatsapp status update"
        );
    }

    let events = extract(body);
    if events.is_empty() {
        tracing::debug!("no forwardable events in delivery");
        return;
    }
    for event in &events {
        sink.forward(event).await;
    }
}

async fn healthz() -> impl IntoResponse {
    StatusCode::NO_CONTENT
}
