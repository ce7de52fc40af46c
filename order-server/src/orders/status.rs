//! Order status state machine
//!
//! ```text
//! unpaid ──► paid ──► shipped ──► completed
//!    └──────────────────────────────▲
//! ```
//!
//! `canceled` and `done` have no incoming edge. Every write is a
//! compare-and-set on the status observed at load, so two actors racing on
//! the same order cannot silently overwrite each other.

use super::error::{OrderError, OrderResult};
use crate::db::repository::order;
use shared::models::{Order, OrderDetail, OrderStatus};
use sqlx::SqlitePool;

/// Who is asking for a transition
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Actor {
    Buyer { user_id: i64, name: String },
    Admin { user_id: i64, name: String },
    /// Payment gateway webhook
    Gateway,
}

/// updated_by value for gateway-applied changes
pub const SYSTEM_ACTOR: &str = "System";

impl Actor {
    pub fn is_admin(&self) -> bool {
        matches!(self, Actor::Admin { .. })
    }

    /// Value written to `updated_by`
    pub fn display_name(&self) -> &str {
        match self {
            Actor::Buyer { name, .. } | Actor::Admin { name, .. } => name,
            Actor::Gateway => SYSTEM_ACTOR,
        }
    }

    fn can_access(&self, order: &Order) -> bool {
        match self {
            Actor::Admin { .. } | Actor::Gateway => true,
            Actor::Buyer { user_id, .. } => *user_id == order.user_id,
        }
    }
}

/// Destinations reachable from `from`
pub fn allowed_targets(from: OrderStatus) -> &'static [OrderStatus] {
    match from {
        OrderStatus::Unpaid => &[OrderStatus::Paid, OrderStatus::Completed],
        OrderStatus::Paid => &[OrderStatus::Shipped],
        OrderStatus::Shipped => &[OrderStatus::Completed],
        OrderStatus::Completed | OrderStatus::Canceled | OrderStatus::Done => &[],
    }
}

fn requires_admin(from: OrderStatus, to: OrderStatus) -> bool {
    matches!(
        (from, to),
        (OrderStatus::Unpaid, OrderStatus::Paid) | (OrderStatus::Paid, OrderStatus::Shipped)
    )
}

/// Result of a permitted transition check
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    /// Write the new status
    Apply,
    /// Order already holds the requested status (idempotent re-delivery)
    AlreadyApplied,
}

/// Decide whether `actor` may move `order` to `to`.
///
/// Buyer/admin: ownership first, then the table, then role rules.
/// Gateway: may only confirm payment, from `unpaid`; repeating it on a
/// `paid` order is a no-op, anything later is stale.
pub fn check_transition(actor: &Actor, order: &Order, to: OrderStatus) -> OrderResult<Transition> {
    let from = order.status;

    if let Actor::Gateway = actor {
        return match (from, to) {
            (OrderStatus::Unpaid, OrderStatus::Paid) => Ok(Transition::Apply),
            (OrderStatus::Paid, OrderStatus::Paid) => Ok(Transition::AlreadyApplied),
            _ => Err(OrderError::InvalidTransition { from, to }),
        };
    }

    if !actor.can_access(order) {
        return Err(OrderError::PermissionDenied(format!(
            "Order {} belongs to another user",
            order.id
        )));
    }

    if !allowed_targets(from).contains(&to) {
        return Err(OrderError::InvalidTransition { from, to });
    }

    if requires_admin(from, to) && !actor.is_admin() {
        return Err(OrderError::AdminRequired(format!(
            "Only administrators can change an order from {from} to {to}"
        )));
    }

    Ok(Transition::Apply)
}

async fn load(pool: &SqlitePool, order_id: i64) -> OrderResult<Order> {
    order::find_by_id(pool, order_id)
        .await?
        .ok_or(OrderError::OrderNotFound(order_id))
}

/// Buyer/admin status change
pub async fn update_status(
    pool: &SqlitePool,
    actor: &Actor,
    order_id: i64,
    to: OrderStatus,
) -> OrderResult<()> {
    let current = load(pool, order_id).await?;

    if check_transition(actor, &current, to)? == Transition::AlreadyApplied {
        return Ok(());
    }

    let now = shared::util::now_millis();
    let written = order::update_status(
        pool,
        order_id,
        current.status,
        to,
        actor.display_name(),
        now,
    )
    .await?;
    if !written {
        return Err(OrderError::Conflict(order_id));
    }

    tracing::info!(
        order_id,
        from = %current.status,
        status = %to,
        actor = actor.display_name(),
        "Order status updated"
    );
    Ok(())
}

/// Order with items, visible to its owner and administrators
pub async fn get_order_detail(
    pool: &SqlitePool,
    actor: &Actor,
    order_id: i64,
) -> OrderResult<OrderDetail> {
    let order = load(pool, order_id).await?;
    if !actor.can_access(&order) {
        return Err(OrderError::PermissionDenied(format!(
            "Order {order_id} belongs to another user"
        )));
    }
    let items = order::find_items(pool, order_id).await?;
    Ok(OrderDetail { order, items })
}
