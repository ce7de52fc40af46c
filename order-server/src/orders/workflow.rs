//! Order creation workflow
//!
//! 1. Short local transaction: allocate the number, price the cart against
//!    the live catalog, insert the order (`unpaid`, no invoice) and its
//!    snapshot items.
//! 2. Gateway call outside any transaction, external id = order id.
//! 3. Short second transaction writes the invoice back.
//!
//! Failures after step 1 are compensated: the provisional order is deleted
//! and, if an invoice was already issued, an `ExpireInvoice` task is queued.
//! A crash between steps 1 and 3 is cleaned up by the orphan sweep.

use super::error::{OrderError, OrderResult};
use super::money::{MAX_QUANTITY, is_valid_price, line_subtotal, order_total, to_f64};
use super::numbering::next_order_number;
use super::task_queue::{OrderTask, TaskQueue};
use crate::db::repository::{order, product};
use crate::gateway::{Invoice, InvoiceLine, InvoiceRequest, PaymentGateway};
use rust_decimal::Decimal;
use shared::models::{CreateOrderRequest, OrderStatus, Product};
use sqlx::SqlitePool;
use std::collections::HashMap;
use std::sync::Arc;

/// Checkout parameters taken from configuration
#[derive(Debug, Clone)]
pub struct CheckoutSettings {
    pub currency: String,
    /// Base of the success redirect, `{frontend_url}/checkout/{id}/success`
    pub frontend_url: String,
    pub expiry_hours: i64,
}

impl CheckoutSettings {
    pub fn success_url(&self, order_id: i64) -> String {
        format!(
            "{}/checkout/{order_id}/success",
            self.frontend_url.trim_end_matches('/')
        )
    }
}

/// Authenticated buyer placing the order
#[derive(Debug, Clone, Copy)]
pub struct Buyer<'a> {
    pub user_id: i64,
    pub full_name: &'a str,
}

struct PricedLine<'p> {
    product: &'p Product,
    quantity: i64,
    subtotal: Decimal,
}

/// Order committed by step 1, not yet invoiced
struct ProvisionalOrder {
    id: i64,
    number: String,
    total: f64,
    lines: Vec<InvoiceLine>,
}

#[derive(Clone)]
pub struct OrderWorkflow {
    pool: SqlitePool,
    gateway: Arc<dyn PaymentGateway>,
    tasks: TaskQueue,
    settings: CheckoutSettings,
}

impl OrderWorkflow {
    pub fn new(
        pool: SqlitePool,
        gateway: Arc<dyn PaymentGateway>,
        tasks: TaskQueue,
        settings: CheckoutSettings,
    ) -> Self {
        Self {
            pool,
            gateway,
            tasks,
            settings,
        }
    }

    /// Create an order and its payment invoice, returning the order id
    pub async fn create_order(
        &self,
        buyer: Buyer<'_>,
        request: &CreateOrderRequest,
    ) -> OrderResult<i64> {
        let now = shared::util::now_millis();
        let provisional = self.persist_provisional(buyer, request, now).await?;
        let order_id = provisional.id;

        let invoice_request = InvoiceRequest {
            external_id: order_id.to_string(),
            amount: provisional.total,
            payer_name: buyer.full_name.to_string(),
            currency: self.settings.currency.clone(),
            success_redirect_url: self.settings.success_url(order_id),
            items: provisional.lines,
        };

        let invoice = match self.gateway.create_invoice(&invoice_request).await {
            Ok(invoice) => invoice,
            Err(e) => {
                tracing::warn!(order_id, number = %provisional.number, error = %e, "Invoice creation failed, discarding order");
                self.discard(order_id).await;
                return Err(OrderError::Gateway(e));
            }
        };

        if let Err(e) = self.attach_invoice(order_id, &invoice).await {
            tracing::error!(order_id, invoice_id = %invoice.id, error = %e, "Failed to attach invoice, compensating");
            self.discard(order_id).await;
            let task = OrderTask::ExpireInvoice {
                invoice_id: invoice.id.clone(),
            };
            if let Err(qe) = self.tasks.enqueue(&task).await {
                tracing::error!(invoice_id = %invoice.id, error = %qe, "Failed to queue invoice expiry");
            }
            return Err(e);
        }

        tracing::info!(
            order_id,
            number = %provisional.number,
            invoice_id = %invoice.id,
            total = provisional.total,
            "Order created"
        );
        Ok(order_id)
    }

    async fn persist_provisional(
        &self,
        buyer: Buyer<'_>,
        request: &CreateOrderRequest,
        now: i64,
    ) -> OrderResult<ProvisionalOrder> {
        if request.products.is_empty() {
            return Err(OrderError::EmptyOrder);
        }
        if let Some(line) = request
            .products
            .iter()
            .find(|l| !(1..=MAX_QUANTITY).contains(&l.quantity))
        {
            return Err(OrderError::InvalidArgument(format!(
                "Quantity for product {} must be between 1 and {MAX_QUANTITY}",
                line.product_id
            )));
        }

        let mut tx = self.pool.begin().await?;

        let number = next_order_number(&mut tx, now).await?;

        let mut ids: Vec<i64> = request.products.iter().map(|l| l.product_id).collect();
        ids.sort_unstable();
        ids.dedup();
        let products = product::find_active_by_ids(&mut *tx, &ids).await?;
        let catalog: HashMap<i64, &Product> = products.iter().map(|p| (p.id, p)).collect();

        let priced = request
            .products
            .iter()
            .map(|line| {
                let product = catalog
                    .get(&line.product_id)
                    .copied()
                    .ok_or(OrderError::ProductNotFound(line.product_id))?;
                if !is_valid_price(product.price) {
                    return Err(OrderError::InvalidPrice(product.id));
                }
                Ok::<_, OrderError>(PricedLine {
                    product,
                    quantity: line.quantity,
                    subtotal: line_subtotal(product.price, line.quantity)?,
                })
            })
            .collect::<OrderResult<Vec<_>>>()?;

        let total = order_total(priced.iter().map(|l| l.subtotal))?;
        let expired_at = now + shared::util::hours_to_millis(self.settings.expiry_hours);

        let order_id = order::insert(
            &mut *tx,
            &order::NewOrder {
                number: &number,
                user_id: buyer.user_id,
                status: OrderStatus::Unpaid,
                user_full_name: &request.full_name,
                address: &request.address,
                phone_number: &request.phone_number,
                notes: request.notes.as_deref(),
                total,
                expired_at,
                created_at: now,
                created_by: buyer.full_name,
            },
        )
        .await?;

        for line in &priced {
            order::insert_item(
                &mut *tx,
                &order::NewOrderItem {
                    order_id,
                    product_id: line.product.id,
                    product_name: &line.product.name,
                    product_image: line.product.image_url.as_deref(),
                    product_price: line.product.price,
                    quantity: line.quantity,
                    subtotal: to_f64(line.subtotal),
                    created_at: now,
                },
            )
            .await?;
        }

        tx.commit().await?;

        let lines = priced
            .iter()
            .map(|l| InvoiceLine {
                name: l.product.name.clone(),
                price: l.product.price,
                quantity: l.quantity,
            })
            .collect();

        tracing::debug!(order_id, number = %number, total, "Provisional order committed");
        Ok(ProvisionalOrder {
            id: order_id,
            number,
            total,
            lines,
        })
    }

    async fn attach_invoice(&self, order_id: i64, invoice: &Invoice) -> OrderResult<()> {
        let mut tx = self.pool.begin().await?;
        let attached =
            order::attach_invoice(&mut *tx, order_id, &invoice.id, &invoice.invoice_url).await?;
        if !attached {
            return Err(OrderError::Internal(format!(
                "Order {order_id} no longer awaits an invoice"
            )));
        }
        tx.commit().await?;
        Ok(())
    }

    /// Best effort: a leftover order is removed by the orphan sweep
    async fn discard(&self, order_id: i64) {
        match self.delete_provisional(order_id).await {
            Ok(true) => tracing::info!(order_id, "Provisional order discarded"),
            Ok(false) => tracing::debug!(order_id, "Provisional order already gone"),
            Err(e) => tracing::error!(order_id, error = %e, "Failed to discard provisional order"),
        }
    }

    async fn delete_provisional(&self, order_id: i64) -> OrderResult<bool> {
        let mut tx = self.pool.begin().await?;
        let removed = order::delete_provisional(&mut tx, order_id).await?;
        tx.commit().await?;
        Ok(removed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_success_url() {
        let settings = CheckoutSettings {
            currency: "IDR".into(),
            frontend_url: "https://shop.test/".into(),
            expiry_hours: 24,
        };
        assert_eq!(settings.success_url(42), "https://shop.test/checkout/42/success");
    }
}
