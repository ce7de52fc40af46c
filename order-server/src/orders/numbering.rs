//! Order number allocation

use super::error::{OrderError, OrderResult};
use crate::db::repository::{RepoError, numbering};
use sqlx::SqliteConnection;

/// Numbering module for orders
pub const ORDER_MODULE: &str = "order";

/// `ORD-<yyyy><8-digit seq>`, e.g. `ORD-202500000001`
pub fn format_order_number(year: i32, seq: i64) -> String {
    format!("ORD-{year:04}{seq:08}")
}

/// Allocate the next order number inside the caller's transaction
pub async fn next_order_number(conn: &mut SqliteConnection, now: i64) -> OrderResult<String> {
    let seq = numbering::next(&mut *conn, ORDER_MODULE)
        .await
        .map_err(|e| match e {
            RepoError::NotFound(_) => OrderError::NumberingNotFound(ORDER_MODULE.to_string()),
            other => OrderError::Database(other),
        })?;
    Ok(format_order_number(shared::util::year_of_millis(now), seq))
}
