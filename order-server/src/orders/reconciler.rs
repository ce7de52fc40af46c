//! Webhook reconciler
//!
//! Applies the gateway's payment confirmation through the same transition
//! check as any other actor, so a late delivery cannot move a shipped or
//! completed order back to `paid`.

use super::error::{OrderError, OrderResult};
use super::status::{Actor, SYSTEM_ACTOR, Transition, check_transition};
use crate::db::repository::order::{self, PaymentStamp};
use shared::models::{InvoiceWebhookRequest, OrderStatus};
use sqlx::SqlitePool;

/// What a delivery did to the order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReconcileOutcome {
    /// unpaid → paid
    Paid,
    /// Re-delivery for an order already paid; payment details refreshed if missing
    AlreadyPaid,
    /// Order moved past `paid`; nothing written
    Stale { status: OrderStatus },
}

/// Parse the external reference as an order id (positive integer only)
pub fn parse_external_id(external_id: &str) -> OrderResult<i64> {
    match external_id.trim().parse::<i64>() {
        Ok(id) if id > 0 => Ok(id),
        _ => Err(OrderError::InvalidArgument(format!(
            "Invalid external id: {external_id:?}"
        ))),
    }
}

pub async fn reconcile_invoice(
    pool: &SqlitePool,
    delivery: &InvoiceWebhookRequest,
    now: i64,
) -> OrderResult<ReconcileOutcome> {
    let order_id = parse_external_id(&delivery.external_id)?;
    let current = order::find_by_id(pool, order_id)
        .await?
        .ok_or(OrderError::OrderNotFound(order_id))?;

    let transition = match check_transition(&Actor::Gateway, &current, OrderStatus::Paid) {
        Ok(t) => t,
        Err(OrderError::InvalidTransition { from, .. }) => {
            tracing::warn!(order_id, status = %from, "Ignoring stale payment confirmation");
            return Ok(ReconcileOutcome::Stale { status: from });
        }
        Err(e) => return Err(e),
    };

    let stamp = PaymentStamp {
        paid_at: now,
        payment_method: delivery.payment_method.as_deref(),
        payment_channel: delivery.payment_channel.as_deref(),
    };
    let written =
        order::mark_paid(pool, order_id, current.status, &stamp, SYSTEM_ACTOR, now).await?;
    if !written {
        return Err(OrderError::Conflict(order_id));
    }

    let outcome = match transition {
        Transition::Apply => ReconcileOutcome::Paid,
        Transition::AlreadyApplied => ReconcileOutcome::AlreadyPaid,
    };
    tracing::info!(
        order_id,
        number = %current.number,
        payment_method = ?delivery.payment_method,
        payment_channel = ?delivery.payment_channel,
        outcome = ?outcome,
        "Payment confirmation applied"
    );
    Ok(outcome)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_external_id() {
        assert_eq!(parse_external_id("42").unwrap(), 42);
        assert_eq!(parse_external_id(" 7 ").unwrap(), 7);
        for bad in ["", "abc", "0", "-3", "4.2", "ORD-202500000001"] {
            assert!(
                matches!(parse_external_id(bad), Err(OrderError::InvalidArgument(_))),
                "{bad} should be rejected"
            );
        }
    }
}
