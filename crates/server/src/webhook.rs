use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::State,
    http::{HeaderMap, StatusCode},
    routing::post,
    Router,
};
use rentquote_line::{
    DialogueHandler, LineReplyClient, SignatureVerifier, WebhookPayload, SIGNATURE_HEADER,
};
use tracing::{info, info_span, warn, Instrument};

#[derive(Clone)]
pub struct WebhookState {
    pub handler: Arc<DialogueHandler>,
    pub verifier: Arc<SignatureVerifier>,
    pub reply_client: Arc<dyn LineReplyClient>,
}

pub fn router(state: WebhookState) -> Router {
    Router::new().route("/webhook", post(receive)).with_state(state)
}

/// Acknowledges a verified delivery immediately; replies go out on spawned tasks.
async fn receive(State(state): State<WebhookState>, headers: HeaderMap, body: Bytes) -> StatusCode {
    let signature = headers.get(SIGNATURE_HEADER).and_then(|value| value.to_str().ok());
    if let Err(error) = state.verifier.verify(&body, signature) {
        warn!(
            event_name = "line.webhook.signature_rejected",
            error = %error,
            "rejecting unsigned webhook delivery"
        );
        return StatusCode::UNAUTHORIZED;
    }

    let payload: WebhookPayload = match serde_json::from_slice(&body) {
        Ok(payload) => payload,
        Err(error) => {
            warn!(
                event_name = "line.webhook.payload_rejected",
                error = %error,
                "webhook body is not a LINE payload"
            );
            return StatusCode::BAD_REQUEST;
        }
    };

    info!(
        event_name = "line.webhook.received",
        events = payload.events.len(),
        "webhook delivery accepted"
    );

    for event in &payload.events {
        let span = info_span!(
            "line_event",
            correlation_id = %event.correlation_id(),
            kind = event.kind()
        );
        let Some(reply) = span.in_scope(|| state.handler.handle(event)) else {
            continue;
        };

        let client = Arc::clone(&state.reply_client);
        tokio::spawn(
            async move {
                if let Err(error) = client.reply(&reply).await {
                    warn!(event_name = "line.reply.failed", error = %error, "reply was not delivered");
                }
            }
            .instrument(span),
        );
    }

    StatusCode::OK
}
