//! Task Worker - drains the pending_task queue
//!
//! Due tasks run on a TaskQueue notification or a periodic scan. Failures
//! retry with exponential backoff; past the attempt limit a task goes DEAD
//! and is requeued on the next startup.

use super::task_queue::OrderTask;
use crate::db::repository::pending_task::{self, PendingTask};
use crate::gateway::PaymentGateway;
use sqlx::SqlitePool;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

/// Attempts before a task is moved to DEAD
pub const MAX_ATTEMPTS: i64 = 5;
const RETRY_BASE_DELAY_SECS: u64 = 5;
const RETRY_MAX_DELAY_SECS: u64 = 60;
const QUEUE_SCAN_INTERVAL_SECS: u64 = 30;
const SCAN_BATCH: i64 = 50;

/// Exponential backoff: base * 2^retry_count, capped
pub fn retry_delay(retry_count: i64) -> Duration {
    let exp = retry_count.clamp(0, 16) as u32;
    Duration::from_secs((RETRY_BASE_DELAY_SECS * 2u64.pow(exp)).min(RETRY_MAX_DELAY_SECS))
}

pub struct TaskWorker {
    pool: SqlitePool,
    gateway: Arc<dyn PaymentGateway>,
}

impl TaskWorker {
    pub fn new(pool: SqlitePool, gateway: Arc<dyn PaymentGateway>) -> Self {
        Self { pool, gateway }
    }

    /// Run until `shutdown` fires
    pub async fn run(self, mut notify_rx: mpsc::Receiver<i64>, shutdown: CancellationToken) {
        tracing::info!("TaskWorker started");

        match pending_task::revive_dead(&self.pool, shared::util::now_millis()).await {
            Ok(0) => {}
            Ok(n) => tracing::info!(count = n, "Revived dead tasks to pending queue"),
            Err(e) => tracing::error!(error = %e, "Failed to revive dead tasks"),
        }

        let mut scan_interval =
            tokio::time::interval(Duration::from_secs(QUEUE_SCAN_INTERVAL_SECS));

        loop {
            tokio::select! {
                _ = shutdown.cancelled() => {
                    tracing::info!("TaskWorker shutting down");
                    break;
                }
                msg = notify_rx.recv() => {
                    match msg {
                        Some(task_id) => {
                            tracing::debug!(task_id, "Task notification received");
                            self.process_due().await;
                        }
                        None => {
                            tracing::info!("Task channel closed, shutting down TaskWorker");
                            break;
                        }
                    }
                }
                _ = scan_interval.tick() => {
                    self.process_due().await;
                }
            }
        }
    }

    /// Process every task whose backoff has elapsed; returns how many ran
    pub async fn process_due(&self) -> usize {
        let now = shared::util::now_millis();
        let due = match pending_task::find_due(&self.pool, now, SCAN_BATCH).await {
            Ok(tasks) => tasks,
            Err(e) => {
                tracing::error!(error = %e, "Failed to load pending tasks");
                return 0;
            }
        };

        let count = due.len();
        for task in due {
            self.process(task).await;
        }
        count
    }

    async fn process(&self, task: PendingTask) {
        let result = match serde_json::from_str::<OrderTask>(&task.payload) {
            Ok(order_task) => self.execute(&order_task).await,
            Err(e) => {
                // Undecodable payloads never succeed on retry
                tracing::error!(task_id = task.id, kind = %task.kind, error = %e, "Undecodable task payload");
                self.bury(&task, &format!("undecodable payload: {e}")).await;
                return;
            }
        };

        match result {
            Ok(()) => {
                tracing::info!(task_id = task.id, kind = %task.kind, "Background task completed");
                if let Err(e) = pending_task::complete(&self.pool, task.id).await {
                    tracing::error!(task_id = task.id, error = %e, "Failed to remove completed task");
                }
            }
            Err(error) => self.record_failure(&task, &error).await,
        }
    }

    async fn execute(&self, task: &OrderTask) -> Result<(), String> {
        match task {
            OrderTask::ExpireInvoice { invoice_id } => self
                .gateway
                .expire_invoice(invoice_id)
                .await
                .map_err(|e| e.to_string()),
        }
    }

    async fn record_failure(&self, task: &PendingTask, error: &str) {
        let attempts = task.retry_count + 1;
        if attempts >= MAX_ATTEMPTS {
            tracing::error!(
                task_id = task.id,
                kind = %task.kind,
                attempts,
                error = %error,
                "Max attempts exceeded, moving task to dead letter"
            );
            self.bury(task, error).await;
            return;
        }

        let now = shared::util::now_millis();
        let delay = retry_delay(task.retry_count);
        let next_attempt_at = now + delay.as_millis() as i64;
        tracing::warn!(
            task_id = task.id,
            kind = %task.kind,
            attempts,
            retry_in_secs = delay.as_secs(),
            error = %error,
            "Background task failed, will retry"
        );
        if let Err(e) =
            pending_task::mark_failed(&self.pool, task.id, error, next_attempt_at, now).await
        {
            tracing::error!(task_id = task.id, error = %e, "Failed to record task failure");
        }
    }

    async fn bury(&self, task: &PendingTask, error: &str) {
        let now = shared::util::now_millis();
        if let Err(e) = pending_task::move_to_dead(&self.pool, task.id, error, now).await {
            tracing::error!(task_id = task.id, error = %e, "Failed to move task to dead letter");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::DbService;
    use crate::gateway::{GatewayError, Invoice, InvoiceRequest};
    use async_trait::async_trait;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicBool, Ordering};

    #[derive(Default)]
    struct ExpireRecorder {
        fail: AtomicBool,
        expired: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl PaymentGateway for ExpireRecorder {
        async fn create_invoice(&self, _: &InvoiceRequest) -> Result<Invoice, GatewayError> {
            Err(GatewayError::Transport("not used".into()))
        }

        async fn expire_invoice(&self, invoice_id: &str) -> Result<(), GatewayError> {
            if self.fail.load(Ordering::SeqCst) {
                return Err(GatewayError::Timeout);
            }
            self.expired.lock().unwrap().push(invoice_id.to_string());
            Ok(())
        }
    }

    async fn enqueue_expire(pool: &SqlitePool, invoice_id: &str) -> i64 {
        let payload = serde_json::to_string(&OrderTask::ExpireInvoice {
            invoice_id: invoice_id.to_string(),
        })
        .unwrap();
        pending_task::enqueue(pool, "expire_invoice", &payload, 0)
            .await
            .unwrap()
    }

    #[test]
    fn test_retry_delay_backoff() {
        assert_eq!(retry_delay(0), Duration::from_secs(5));
        assert_eq!(retry_delay(1), Duration::from_secs(10));
        assert_eq!(retry_delay(3), Duration::from_secs(40));
        assert_eq!(retry_delay(4), Duration::from_secs(60));
        assert_eq!(retry_delay(100), Duration::from_secs(60));
    }

    #[tokio::test]
    async fn test_successful_task_is_removed() {
        let db = DbService::in_memory().await.unwrap();
        let gateway = Arc::new(ExpireRecorder::default());
        let worker = TaskWorker::new(db.pool.clone(), gateway.clone());

        let id = enqueue_expire(&db.pool, "inv-1").await;
        assert_eq!(worker.process_due().await, 1);

        assert_eq!(*gateway.expired.lock().unwrap(), vec!["inv-1".to_string()]);
        assert!(pending_task::find_by_id(&db.pool, id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_failed_task_backs_off() {
        let db = DbService::in_memory().await.unwrap();
        let gateway = Arc::new(ExpireRecorder::default());
        gateway.fail.store(true, Ordering::SeqCst);
        let worker = TaskWorker::new(db.pool.clone(), gateway.clone());

        let id = enqueue_expire(&db.pool, "inv-1").await;
        assert_eq!(worker.process_due().await, 1);

        let row = pending_task::find_by_id(&db.pool, id).await.unwrap().unwrap();
        assert_eq!(row.retry_count, 1);
        assert_eq!(row.status, pending_task::STATUS_PENDING);
        assert!(row.last_error.unwrap().contains("timed out"));
        // Not picked up again inside the backoff window
        assert_eq!(worker.process_due().await, 0);
    }

    #[tokio::test]
    async fn test_exhausted_task_goes_dead() {
        let db = DbService::in_memory().await.unwrap();
        let gateway = Arc::new(ExpireRecorder::default());
        gateway.fail.store(true, Ordering::SeqCst);
        let worker = TaskWorker::new(db.pool.clone(), gateway.clone());

        let id = enqueue_expire(&db.pool, "inv-1").await;
        sqlx::query("UPDATE pending_task SET retry_count = ? WHERE id = ?")
            .bind(MAX_ATTEMPTS - 1)
            .bind(id)
            .execute(&db.pool)
            .await
            .unwrap();

        worker.process_due().await;

        let row = pending_task::find_by_id(&db.pool, id).await.unwrap().unwrap();
        assert_eq!(row.status, pending_task::STATUS_DEAD);
        assert_eq!(row.retry_count, MAX_ATTEMPTS);
    }

    #[tokio::test]
    async fn test_undecodable_payload_goes_dead() {
        let db = DbService::in_memory().await.unwrap();
        let worker = TaskWorker::new(db.pool.clone(), Arc::new(ExpireRecorder::default()));

        let id = pending_task::enqueue(&db.pool, "mystery", "{not json", 0)
            .await
            .unwrap();
        worker.process_due().await;

        let row = pending_task::find_by_id(&db.pool, id).await.unwrap().unwrap();
        assert_eq!(row.status, pending_task::STATUS_DEAD);
    }

    #[tokio::test]
    async fn test_run_revives_dead_and_stops_on_cancel() {
        let db = DbService::in_memory().await.unwrap();
        let gateway = Arc::new(ExpireRecorder::default());
        let id = enqueue_expire(&db.pool, "inv-9").await;
        pending_task::move_to_dead(&db.pool, id, "boom", 0).await.unwrap();

        let (_tx, rx) = mpsc::channel(4);
        let shutdown = CancellationToken::new();
        let worker = TaskWorker::new(db.pool.clone(), gateway.clone());
        let handle = tokio::spawn(worker.run(rx, shutdown.clone()));

        // The first interval tick scans immediately
        for _ in 0..50 {
            if !gateway.expired.lock().unwrap().is_empty() {
                break;
            }
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
        shutdown.cancel();
        handle.await.unwrap();

        assert_eq!(*gateway.expired.lock().unwrap(), vec!["inv-9".to_string()]);
        assert!(pending_task::find_by_id(&db.pool, id).await.unwrap().is_none());
    }
}
