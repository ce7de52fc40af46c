use axum::body::Bytes;
use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use shared::models::InvoiceWebhookRequest;

use crate::core::ServerState;
use crate::orders::{OrderError, reconcile_invoice};

const CALLBACK_TOKEN_HEADER: &str = "x-callback-token";

/// POST /webhooks/xendit/invoice
pub async fn receive_invoice(
    State(state): State<ServerState>,
    headers: HeaderMap,
    body: Bytes,
) -> StatusCode {
    if let Some(expected) = state.config.xendit_callback_token.as_deref() {
        let provided = headers
            .get(CALLBACK_TOKEN_HEADER)
            .and_then(|v| v.to_str().ok());
        if provided != Some(expected) {
            tracing::warn!("Invoice webhook rejected: bad callback token");
            return StatusCode::UNAUTHORIZED;
        }
    }

    let delivery: InvoiceWebhookRequest = match serde_json::from_slice(&body) {
        Ok(d) => d,
        Err(e) => {
            tracing::warn!(error = %e, "Failed to parse invoice webhook body");
            return StatusCode::BAD_REQUEST;
        }
    };

    match reconcile_invoice(&state.pool, &delivery, shared::util::now_millis()).await {
        Ok(outcome) => {
            tracing::debug!(external_id = %delivery.external_id, outcome = ?outcome, "Invoice webhook handled");
            StatusCode::OK
        }
        Err(OrderError::InvalidArgument(msg)) => {
            tracing::warn!(external_id = %delivery.external_id, error = %msg, "Invoice webhook rejected");
            StatusCode::BAD_REQUEST
        }
        Err(e) => {
            tracing::error!(external_id = %delivery.external_id, error = %e, "Invoice webhook processing failed");
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }
}
