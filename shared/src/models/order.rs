//! Order Model

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use validator::Validate;

/// Order status code
///
/// `Canceled` and `Done` are declared and persisted in the status table
/// but no transition produces them.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "lowercase")]
#[cfg_attr(feature = "db", derive(sqlx::Type))]
#[cfg_attr(feature = "db", sqlx(rename_all = "lowercase"))]
pub enum OrderStatus {
    #[default]
    Unpaid,
    Paid,
    Shipped,
    Completed,
    Canceled,
    Done,
}

impl OrderStatus {
    pub const ALL: [OrderStatus; 6] = [
        OrderStatus::Unpaid,
        OrderStatus::Paid,
        OrderStatus::Shipped,
        OrderStatus::Completed,
        OrderStatus::Canceled,
        OrderStatus::Done,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Unpaid => "unpaid",
            OrderStatus::Paid => "paid",
            OrderStatus::Shipped => "shipped",
            OrderStatus::Completed => "completed",
            OrderStatus::Canceled => "canceled",
            OrderStatus::Done => "done",
        }
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Unknown status code string
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown order status code: {0}")]
pub struct UnknownStatusCode(pub String);

impl FromStr for OrderStatus {
    type Err = UnknownStatusCode;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        OrderStatus::ALL
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| UnknownStatusCode(s.to_string()))
    }
}

/// Order entity (row of `orders`)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct Order {
    pub id: i64,
    /// Human-readable number, `ORD-<yyyy><8-digit seq>`
    pub number: String,
    pub user_id: i64,
    pub status: OrderStatus,
    pub user_full_name: String,
    pub address: String,
    pub phone_number: String,
    pub notes: Option<String>,
    /// Total in currency unit, fixed at creation
    pub total: f64,
    pub expired_at: i64,
    pub invoice_id: Option<String>,
    pub invoice_url: Option<String>,
    pub paid_at: Option<i64>,
    pub payment_method: Option<String>,
    pub payment_channel: Option<String>,
    pub created_at: i64,
    pub created_by: String,
    pub updated_at: Option<i64>,
    pub updated_by: Option<String>,
}

/// Order line item with a product snapshot (row of `order_item`)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct OrderItem {
    pub id: i64,
    pub order_id: i64,
    pub product_id: i64,
    pub product_name: String,
    pub product_image: Option<String>,
    /// Unit price at order time
    pub product_price: f64,
    pub quantity: i64,
    pub subtotal: f64,
    pub created_at: i64,
}

/// Order with its items
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderDetail {
    #[serde(flatten)]
    pub order: Order,
    pub items: Vec<OrderItem>,
}

// =============================================================================
// API DTOs
// =============================================================================

/// One requested cart line
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct OrderProductLine {
    #[validate(range(min = 1, message = "product_id must be positive"))]
    pub product_id: i64,
    #[validate(range(min = 1, max = 9999, message = "quantity must be between 1 and 9999"))]
    pub quantity: i64,
}

/// Checkout request
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CreateOrderRequest {
    #[validate(length(min = 1, max = 255, message = "full_name must be 1-255 characters"))]
    pub full_name: String,
    #[validate(length(min = 1, message = "address is required"))]
    pub address: String,
    #[validate(length(min = 1, max = 20, message = "phone_number must be 1-20 characters"))]
    pub phone_number: String,
    #[validate(length(max = 1000, message = "notes must be at most 1000 characters"))]
    pub notes: Option<String>,
    #[validate(length(min = 1, message = "products must not be empty"), nested)]
    pub products: Vec<OrderProductLine>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateOrderResponse {
    pub order_id: i64,
}

/// Status change request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateOrderStatusRequest {
    pub new_status_code: OrderStatus,
}

/// Invoice callback body posted by the payment gateway
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InvoiceWebhookRequest {
    pub external_id: String,
    #[serde(default)]
    pub payment_method: Option<String>,
    #[serde(default)]
    pub payment_channel: Option<String>,
}
