//! Order Server
//!
//! Checkout, payment reconciliation and order status management over SQLite,
//! with Xendit as the payment gateway.
//!
//! # Modules
//!
//! - [`core`] - configuration, state, background tasks, HTTP server
//! - [`db`] - connection pool, migrations, repository functions
//! - [`gateway`] - payment gateway client
//! - [`orders`] - order domain: checkout, state machine, webhook reconciliation, task queue
//! - [`auth`] - JWT verification
//! - [`api`] - HTTP routes

pub mod api;
pub mod auth;
pub mod core;
pub mod db;
pub mod gateway;
pub mod orders;
pub mod utils;

pub use crate::core::{Config, Server, ServerState};
