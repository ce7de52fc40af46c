use crate::db::repository::RepoError;
use crate::gateway::GatewayError;
use shared::OrderStatus;
use shared::error::{AppError, ErrorCode};
use thiserror::Error;

/// Order domain errors
#[derive(Debug, Error)]
pub enum OrderError {
    #[error("Order not found: {0}")]
    OrderNotFound(i64),

    #[error("Numbering module not found: {0}")]
    NumberingNotFound(String),

    #[error("Product not found: {0}")]
    ProductNotFound(i64),

    #[error("Product {0} has an invalid price")]
    InvalidPrice(i64),

    #[error("Order has no products")]
    EmptyOrder,

    #[error("Invalid status transition: {from} -> {to}")]
    InvalidTransition { from: OrderStatus, to: OrderStatus },

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    #[error("Admin role required: {0}")]
    AdminRequired(String),

    #[error("Order status changed concurrently: {0}")]
    Conflict(i64),

    #[error("Payment gateway error: {0}")]
    Gateway(#[from] GatewayError),

    #[error("Storage error: {0}")]
    Database(#[from] RepoError),

    #[error("Internal error: {0}")]
    Internal(String),
}

pub type OrderResult<T> = Result<T, OrderError>;

impl From<sqlx::Error> for OrderError {
    fn from(err: sqlx::Error) -> Self {
        OrderError::Database(err.into())
    }
}

impl From<OrderError> for AppError {
    fn from(err: OrderError) -> Self {
        match err {
            OrderError::OrderNotFound(id) => {
                AppError::with_message(ErrorCode::OrderNotFound, format!("Order {id} not found"))
                    .with_detail("order_id", id)
            }
            OrderError::ProductNotFound(id) => AppError::with_message(
                ErrorCode::InvalidRequest,
                format!("Product {id} does not exist"),
            )
            .with_detail("product_id", id),
            OrderError::InvalidPrice(id) => AppError::with_message(
                ErrorCode::ProductInvalidPrice,
                format!("Product {id} cannot be ordered at its current price"),
            )
            .with_detail("product_id", id),
            OrderError::EmptyOrder => AppError::new(ErrorCode::OrderEmpty),
            OrderError::InvalidTransition { from, to } => AppError::with_message(
                ErrorCode::OrderInvalidTransition,
                format!("Cannot change order status from {from} to {to}"),
            )
            .with_detail("from", from.as_str())
            .with_detail("to", to.as_str()),
            OrderError::InvalidArgument(msg) => AppError::invalid_request(msg),
            OrderError::PermissionDenied(msg) => AppError::permission_denied(msg),
            OrderError::AdminRequired(msg) => AppError::with_message(ErrorCode::AdminRequired, msg),
            OrderError::Conflict(id) => AppError::conflict(format!(
                "Order {id} was modified concurrently, reload and retry"
            ))
            .with_detail("order_id", id),
            // Server-side failures: log the cause, return a generic message
            OrderError::NumberingNotFound(module) => {
                tracing::error!(module = %module, "Numbering counter row missing");
                AppError::new(ErrorCode::NumberingNotFound)
            }
            OrderError::Gateway(e) => {
                tracing::error!(error = %e, "Payment gateway call failed");
                AppError::new(ErrorCode::PaymentGatewayError)
            }
            OrderError::Database(e) => {
                tracing::error!(error = %e, "Order storage failed");
                AppError::new(ErrorCode::DatabaseError)
            }
            OrderError::Internal(msg) => {
                tracing::error!(error = %msg, "Order processing failed");
                AppError::new(ErrorCode::InternalError)
            }
        }
    }
}
