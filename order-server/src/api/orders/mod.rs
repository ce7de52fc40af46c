//! Order API Module
//!
//! | Path | Method | Description |
//! |------|--------|-------------|
//! | /api/orders | POST | Place an order and issue its invoice |
//! | /api/orders/{id} | GET | Order detail (owner or admin) |
//! | /api/orders/{id}/status | PUT | Status change |

mod handler;

use axum::{
    Router,
    routing::{get, post, put},
};

use crate::core::ServerState;

pub fn router() -> Router<ServerState> {
    Router::new().nest("/api/orders", routes())
}

fn routes() -> Router<ServerState> {
    Router::new()
        .route("/", post(handler::create))
        .route("/{id}", get(handler::get_by_id))
        .route("/{id}/status", put(handler::update_status))
}
