//! Shared types for the order platform
//!
//! Common types used by the order server and its clients: the unified
//! error system, order/product models, request/response DTOs and small
//! utilities.

pub mod error;
pub mod models;
pub mod util;

// Re-exports
pub use axum::Json;
pub use http;
pub use serde::{Deserialize, Serialize};

pub use models::{Order, OrderItem, OrderStatus, Product};
