//! Order Repository
//!
//! Status writes are compare-and-set on the status the caller observed;
//! a `false` return means someone else moved the order first.

use super::RepoResult;
use shared::models::{Order, OrderItem, OrderStatus};
use sqlx::{Executor, Sqlite, SqliteConnection};

const ORDER_SELECT: &str = "SELECT id, number, user_id, status, user_full_name, address, phone_number, notes, total, expired_at, invoice_id, invoice_url, paid_at, payment_method, payment_channel, created_at, created_by, updated_at, updated_by FROM orders";

const ITEM_SELECT: &str = "SELECT id, order_id, product_id, product_name, product_image, product_price, quantity, subtotal, created_at FROM order_item";

/// Row data for a new order
#[derive(Debug, Clone)]
pub struct NewOrder<'a> {
    pub number: &'a str,
    pub user_id: i64,
    pub status: OrderStatus,
    pub user_full_name: &'a str,
    pub address: &'a str,
    pub phone_number: &'a str,
    pub notes: Option<&'a str>,
    pub total: f64,
    pub expired_at: i64,
    pub created_at: i64,
    pub created_by: &'a str,
}

/// Row data for a new order line (product snapshot)
#[derive(Debug, Clone)]
pub struct NewOrderItem<'a> {
    pub order_id: i64,
    pub product_id: i64,
    pub product_name: &'a str,
    pub product_image: Option<&'a str>,
    pub product_price: f64,
    pub quantity: i64,
    pub subtotal: f64,
    pub created_at: i64,
}

/// Gateway payment confirmation fields
#[derive(Debug, Clone)]
pub struct PaymentStamp<'a> {
    pub paid_at: i64,
    pub payment_method: Option<&'a str>,
    pub payment_channel: Option<&'a str>,
}

pub async fn insert<'e, E>(executor: E, data: &NewOrder<'_>) -> RepoResult<i64>
where
    E: Executor<'e, Database = Sqlite>,
{
    let id = sqlx::query_scalar::<_, i64>(
        "INSERT INTO orders (number, user_id, status, user_full_name, address, phone_number, notes, total, expired_at, created_at, created_by) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?) RETURNING id",
    )
    .bind(data.number)
    .bind(data.user_id)
    .bind(data.status)
    .bind(data.user_full_name)
    .bind(data.address)
    .bind(data.phone_number)
    .bind(data.notes)
    .bind(data.total)
    .bind(data.expired_at)
    .bind(data.created_at)
    .bind(data.created_by)
    .fetch_one(executor)
    .await?;
    Ok(id)
}

pub async fn insert_item<'e, E>(executor: E, item: &NewOrderItem<'_>) -> RepoResult<i64>
where
    E: Executor<'e, Database = Sqlite>,
{
    let id = sqlx::query_scalar::<_, i64>(
        "INSERT INTO order_item (order_id, product_id, product_name, product_image, product_price, quantity, subtotal, created_at) VALUES (?, ?, ?, ?, ?, ?, ?, ?) RETURNING id",
    )
    .bind(item.order_id)
    .bind(item.product_id)
    .bind(item.product_name)
    .bind(item.product_image)
    .bind(item.product_price)
    .bind(item.quantity)
    .bind(item.subtotal)
    .bind(item.created_at)
    .fetch_one(executor)
    .await?;
    Ok(id)
}

pub async fn find_by_id<'e, E>(executor: E, id: i64) -> RepoResult<Option<Order>>
where
    E: Executor<'e, Database = Sqlite>,
{
    let sql = format!("{ORDER_SELECT} WHERE id = ?");
    let order = sqlx::query_as::<_, Order>(&sql)
        .bind(id)
        .fetch_optional(executor)
        .await?;
    Ok(order)
}

pub async fn find_items<'e, E>(executor: E, order_id: i64) -> RepoResult<Vec<OrderItem>>
where
    E: Executor<'e, Database = Sqlite>,
{
    let sql = format!("{ITEM_SELECT} WHERE order_id = ? ORDER BY id");
    let items = sqlx::query_as::<_, OrderItem>(&sql)
        .bind(order_id)
        .fetch_all(executor)
        .await?;
    Ok(items)
}

/// Write the gateway invoice onto an order that has none yet
pub async fn attach_invoice<'e, E>(
    executor: E,
    id: i64,
    invoice_id: &str,
    invoice_url: &str,
) -> RepoResult<bool>
where
    E: Executor<'e, Database = Sqlite>,
{
    let rows = sqlx::query(
        "UPDATE orders SET invoice_id = ?, invoice_url = ? WHERE id = ? AND invoice_id IS NULL",
    )
    .bind(invoice_id)
    .bind(invoice_url)
    .bind(id)
    .execute(executor)
    .await?;
    Ok(rows.rows_affected() == 1)
}

/// Compare-and-set status change
pub async fn update_status<'e, E>(
    executor: E,
    id: i64,
    expected: OrderStatus,
    status: OrderStatus,
    updated_by: &str,
    now: i64,
) -> RepoResult<bool>
where
    E: Executor<'e, Database = Sqlite>,
{
    let rows = sqlx::query(
        "UPDATE orders SET status = ?, updated_at = ?, updated_by = ? WHERE id = ? AND status = ?",
    )
    .bind(status)
    .bind(now)
    .bind(updated_by)
    .bind(id)
    .bind(expected)
    .execute(executor)
    .await?;
    Ok(rows.rows_affected() == 1)
}

/// Compare-and-set transition to `paid` with the gateway's payment details.
///
/// `paid_at` keeps the first confirmation; method/channel keep their old
/// value when the delivery omits them.
pub async fn mark_paid<'e, E>(
    executor: E,
    id: i64,
    expected: OrderStatus,
    stamp: &PaymentStamp<'_>,
    updated_by: &str,
    now: i64,
) -> RepoResult<bool>
where
    E: Executor<'e, Database = Sqlite>,
{
    let rows = sqlx::query(
        "UPDATE orders SET status = ?, paid_at = COALESCE(paid_at, ?), payment_method = COALESCE(?, payment_method), payment_channel = COALESCE(?, payment_channel), updated_at = ?, updated_by = ? WHERE id = ? AND status = ?",
    )
    .bind(OrderStatus::Paid)
    .bind(stamp.paid_at)
    .bind(stamp.payment_method)
    .bind(stamp.payment_channel)
    .bind(now)
    .bind(updated_by)
    .bind(id)
    .bind(expected)
    .execute(executor)
    .await?;
    Ok(rows.rows_affected() == 1)
}

/// Remove an order that never received an invoice, with its items
pub async fn delete_provisional(conn: &mut SqliteConnection, id: i64) -> RepoResult<bool> {
    sqlx::query(
        "DELETE FROM order_item WHERE order_id IN (SELECT id FROM orders WHERE id = ? AND invoice_id IS NULL AND status = ?)",
    )
    .bind(id)
    .bind(OrderStatus::Unpaid)
    .execute(&mut *conn)
    .await?;

    let rows = sqlx::query("DELETE FROM orders WHERE id = ? AND invoice_id IS NULL AND status = ?")
        .bind(id)
        .bind(OrderStatus::Unpaid)
        .execute(&mut *conn)
        .await?;
    Ok(rows.rows_affected() == 1)
}

/// Unpaid orders created before `created_before` that still have no invoice
pub async fn find_orphan_ids<'e, E>(executor: E, created_before: i64) -> RepoResult<Vec<i64>>
where
    E: Executor<'e, Database = Sqlite>,
{
    let ids = sqlx::query_scalar::<_, i64>(
        "SELECT id FROM orders WHERE invoice_id IS NULL AND status = ? AND created_at < ? ORDER BY id",
    )
    .bind(OrderStatus::Unpaid)
    .bind(created_before)
    .fetch_all(executor)
    .await?;
    Ok(ids)
}
