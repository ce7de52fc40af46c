//! Orphan sweep
//!
//! An order is committed before its invoice is requested. If the process
//! dies in between, the order is left unpaid with no invoice; nobody can pay
//! it, so it is discarded after a grace period.

use super::error::OrderResult;
use crate::db::repository::order;
use sqlx::SqlitePool;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// Age after which an invoice-less unpaid order is discarded
pub const ORPHAN_GRACE: Duration = Duration::from_secs(10 * 60);
const SWEEP_INTERVAL: Duration = Duration::from_secs(5 * 60);

/// Delete orphans created before `now - ORPHAN_GRACE`; returns how many went
pub async fn sweep_orphans(pool: &SqlitePool, now: i64) -> OrderResult<usize> {
    let cutoff = now - ORPHAN_GRACE.as_millis() as i64;
    let ids = order::find_orphan_ids(pool, cutoff).await?;

    let mut removed = 0;
    for id in ids {
        let mut tx = pool.begin().await?;
        if order::delete_provisional(&mut *tx, id).await? {
            tx.commit().await?;
            tracing::warn!(order_id = id, "Discarded orphan order without invoice");
            removed += 1;
        }
    }
    Ok(removed)
}

/// Periodic sweep loop
pub async fn run(pool: SqlitePool, shutdown: CancellationToken) {
    tracing::info!("Orphan sweep started");
    let mut interval = tokio::time::interval(SWEEP_INTERVAL);

    loop {
        tokio::select! {
            _ = shutdown.cancelled() => {
                tracing::info!("Orphan sweep shutting down");
                break;
            }
            _ = interval.tick() => {
                match sweep_orphans(&pool, shared::util::now_millis()).await {
                    Ok(0) => {}
                    Ok(n) => tracing::info!(count = n, "Orphan sweep removed orders"),
                    Err(e) => tracing::error!(error = %e, "Orphan sweep failed"),
                }
            }
        }
    }
}
