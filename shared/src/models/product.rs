//! Product Model

use serde::{Deserialize, Serialize};

/// Catalog product, the source of order item snapshots
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct Product {
    pub id: i64,
    pub name: String,
    /// Unit price in currency unit
    pub price: f64,
    pub image_url: Option<String>,
    pub is_deleted: bool,
}
