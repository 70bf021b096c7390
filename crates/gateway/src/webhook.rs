//! The inbound webhook endpoint.
//!
//! One POST carries one batch of events. Events are processed concurrently
//! with no ordering guarantee; the response waits for every event to reach a
//! terminal outcome and reports them as a JSON array. A bad event drops
//! alone — only a bad envelope fails the call.

use {
    axum::{
        body::Bytes,
        extract::State,
        http::{HeaderMap, StatusCode},
        response::{IntoResponse, Json, Response},
    },
    futures::future::join_all,
    secrecy::ExposeSecret,
    tracing::{debug, warn},
};

use liaison_platform::{WebhookEnvelope, verify_signature};

use crate::{dispatch::dispatch_event, state::AppState};

/// Header carrying the platform's base64 HMAC-SHA256 body signature.
pub const SIGNATURE_HEADER: &str = "x-signature";

pub async fn webhook_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    // Signature check runs on the exact bytes received, before parsing.
    if let Some(secret) = &state.channel_secret {
        let provided = headers
            .get(SIGNATURE_HEADER)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default();
        if verify_signature(secret.expose_secret(), &body, provided).is_err() {
            warn!("webhook signature mismatch");
            return (StatusCode::UNAUTHORIZED, "invalid signature").into_response();
        }
    } else {
        debug!("no channel secret configured; skipping signature check");
    }

    let envelope: WebhookEnvelope = match serde_json::from_slice(&body) {
        Ok(envelope) => envelope,
        Err(err) => {
            warn!(error = %err, "malformed webhook body");
            return (StatusCode::BAD_REQUEST, "invalid webhook body").into_response();
        },
    };

    if envelope.events.is_empty() {
        warn!("webhook carried no events");
        return (StatusCode::BAD_REQUEST, "no events found in request").into_response();
    }

    let outcomes = join_all(
        envelope
            .events
            .iter()
            .map(|event| dispatch_event(&state, event)),
    )
    .await;

    Json(outcomes).into_response()
}
