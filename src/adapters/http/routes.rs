//! Webhook routes.

use axum::body::Bytes;
use axum::extract::{DefaultBodyLimit, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::post;
use axum::Router;
use tower_http::trace::TraceLayer;

use super::error::ApiError;
use super::state::AppState;
use crate::application::handlers::WebhookError;

/// Webhook bodies above this size are refused before any processing.
const MAX_WEBHOOK_BODY_BYTES: usize = 64 * 1024;

const STRIPE_SIGNATURE_HEADER: &str = "Stripe-Signature";
const TALLY_SIGNATURE_HEADER: &str = "Tally-Signature";

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/webhooks/stripe", post(stripe_webhook))
        .route("/webhooks/tally", post(tally_webhook))
        .layer(DefaultBodyLimit::max(MAX_WEBHOOK_BODY_BYTES))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn stripe_webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let signature = header_str(&headers, STRIPE_SIGNATURE_HEADER);
    webhook_response(state.payment_webhook.handle(&body, signature).await)
}

async fn tally_webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let signature = header_str(&headers, TALLY_SIGNATURE_HEADER);
    webhook_response(state.form_webhook.handle(&body, signature).await)
}

fn header_str<'h>(headers: &'h HeaderMap, name: &str) -> &'h str {
    headers
        .get(name)
        .and_then(|value| value.to_str().ok())
        .unwrap_or("")
}

/// Map a handler outcome onto the wire contract: acknowledged deliveries
/// answer 200, rejected ones 400 with a JSON error body.
fn webhook_response(outcome: Result<(), WebhookError>) -> Response {
    match outcome {
        Ok(()) => (StatusCode::OK, "OK").into_response(),
        Err(WebhookError::Rejected(cause)) => ApiError::bad_request("webhook rejected")
            .with_cause(cause)
            .into_response(),
        Err(WebhookError::MalformedPayload(detail)) => {
            (StatusCode::OK, detail).into_response()
        }
    }
}
