//! Durable background task queue
//!
//! Side effects that must not be lost (gateway compensation) are written to
//! `pending_task` first, then the worker is poked over an mpsc channel. A
//! full or closed channel only delays processing until the next periodic
//! scan.

use super::error::{OrderError, OrderResult};
use crate::db::repository::pending_task;
use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;
use tokio::sync::mpsc;

/// Wake-up channel capacity
const NOTIFY_CAPACITY: usize = 256;

/// Background task payload
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum OrderTask {
    /// Expire an invoice whose local order was discarded
    ExpireInvoice { invoice_id: String },
}

impl OrderTask {
    pub fn kind(&self) -> &'static str {
        match self {
            OrderTask::ExpireInvoice { .. } => "expire_invoice",
        }
    }
}

#[derive(Clone)]
pub struct TaskQueue {
    pool: SqlitePool,
    notify: mpsc::Sender<i64>,
}

impl TaskQueue {
    /// Queue plus the receiver the worker listens on
    pub fn new(pool: SqlitePool) -> (Self, mpsc::Receiver<i64>) {
        let (notify, rx) = mpsc::channel(NOTIFY_CAPACITY);
        (Self { pool, notify }, rx)
    }

    /// Persist a task and wake the worker
    pub async fn enqueue(&self, task: &OrderTask) -> OrderResult<i64> {
        let payload = serde_json::to_string(task)
            .map_err(|e| OrderError::Internal(format!("Failed to encode task: {e}")))?;
        let now = shared::util::now_millis();
        let id = pending_task::enqueue(&self.pool, task.kind(), &payload, now).await?;

        if let Err(e) = self.notify.try_send(id) {
            tracing::debug!(task_id = id, error = %e, "Task worker not notified, periodic scan will pick it up");
        }
        tracing::info!(task_id = id, kind = task.kind(), "Background task queued");
        Ok(id)
    }
}
