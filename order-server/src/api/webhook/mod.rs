//! Payment gateway callbacks
//!
//! Responses are bare status codes: 200 processed (or stale, ignored),
//! 400 malformed, 401 bad callback token, 500 processing failure.

mod handler;

use axum::{Router, routing::post};

use crate::core::ServerState;

pub fn router() -> Router<ServerState> {
    Router::new().route("/webhooks/xendit/invoice", post(handler::receive_invoice))
}
