//! API routes
//!
//! - [`health`] - liveness check
//! - [`orders`] - checkout, order detail, status changes (JWT)
//! - [`webhook`] - payment gateway callbacks

pub mod health;
pub mod orders;
pub mod webhook;

use axum::Router;
use tower_http::trace::TraceLayer;

use crate::core::ServerState;

/// Build a router with all routes registered (no middleware, no state)
pub fn build_router() -> Router<ServerState> {
    Router::new()
        .merge(health::router())
        .merge(orders::router())
        .merge(webhook::router())
}

/// Fully configured application, used by the server and by router tests
pub fn router(state: ServerState) -> Router {
    build_router()
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
