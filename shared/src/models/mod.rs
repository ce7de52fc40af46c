//! Data models
//!
//! Shared between order-server and its clients (via API).
//! DB row types use `#[cfg_attr(feature = "db", derive(sqlx::FromRow))]`.
//! All IDs are `i64` (SQLite INTEGER PRIMARY KEY), timestamps are epoch millis.

pub mod order;
pub mod product;

// Re-exports
pub use order::*;
pub use product::*;
