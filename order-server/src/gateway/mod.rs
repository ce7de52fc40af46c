//! Payment gateway client
//!
//! The order workflow only talks to [`PaymentGateway`]; [`XenditClient`] is
//! the production implementation. Invoice creation is idempotent on the
//! external id (the order id) on the gateway side.

mod xendit;

pub use xendit::XenditClient;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// One invoice line shown on the hosted payment page
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InvoiceLine {
    pub name: String,
    pub price: f64,
    pub quantity: i64,
}

/// Invoice creation parameters
#[derive(Debug, Clone, PartialEq)]
pub struct InvoiceRequest {
    /// Local reference echoed back in the payment webhook
    pub external_id: String,
    pub amount: f64,
    pub payer_name: String,
    pub currency: String,
    pub success_redirect_url: String,
    pub items: Vec<InvoiceLine>,
}

/// Invoice issued by the gateway
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Invoice {
    pub id: String,
    pub invoice_url: String,
}

#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("gateway request failed: {0}")]
    Transport(String),

    #[error("gateway request timed out")]
    Timeout,

    #[error("gateway rejected request ({status}): {message}")]
    Rejected { status: u16, message: String },

    #[error("unexpected gateway response: {0}")]
    Decode(String),

    /// Request could not be built; nothing was sent
    #[error("invalid gateway request: {0}")]
    InvalidRequest(String),
}

impl From<reqwest::Error> for GatewayError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            GatewayError::Timeout
        } else if err.is_decode() {
            GatewayError::Decode(err.to_string())
        } else {
            GatewayError::Transport(err.to_string())
        }
    }
}

#[async_trait]
pub trait PaymentGateway: Send + Sync {
    /// Issue a hosted invoice for an order
    async fn create_invoice(&self, request: &InvoiceRequest) -> Result<Invoice, GatewayError>;

    /// Expire an issued invoice so it can no longer be paid
    async fn expire_invoice(&self, invoice_id: &str) -> Result<(), GatewayError>;
}
