//! Server state shared by all handlers

use super::config::Config;
use super::error::Result;
use super::tasks::{BackgroundTasks, TaskKind};
use crate::auth::{JwtConfig, JwtService};
use crate::db::DbService;
use crate::gateway::{PaymentGateway, XenditClient};
use crate::orders::{CheckoutSettings, OrderWorkflow, TaskQueue, TaskWorker, sweep};
use sqlx::SqlitePool;
use std::sync::Arc;
use tokio::sync::mpsc;

/// Default lifetime of issued tokens, in minutes
const TOKEN_EXPIRATION_MINUTES: i64 = 24 * 60;

#[derive(Clone)]
pub struct ServerState {
    pub config: Config,
    pub pool: SqlitePool,
    pub gateway: Arc<dyn PaymentGateway>,
    pub jwt_service: Arc<JwtService>,
    pub tasks: TaskQueue,
    pub workflow: OrderWorkflow,
}

impl ServerState {
    /// Wire state from already-built collaborators; returns the task
    /// notification receiver for [`ServerState::start_background_tasks`]
    pub fn new(
        config: Config,
        pool: SqlitePool,
        gateway: Arc<dyn PaymentGateway>,
    ) -> (Self, mpsc::Receiver<i64>) {
        let (tasks, task_rx) = TaskQueue::new(pool.clone());
        let jwt_service = Arc::new(JwtService::with_config(JwtConfig {
            secret: config.jwt_secret.clone(),
            expiration_minutes: TOKEN_EXPIRATION_MINUTES,
        }));
        let settings = CheckoutSettings {
            currency: config.payment_currency.clone(),
            frontend_url: config.frontend_url.clone(),
            expiry_hours: config.order_expiry_hours,
        };
        let workflow = OrderWorkflow::new(pool.clone(), gateway.clone(), tasks.clone(), settings);

        let state = Self {
            config,
            pool,
            gateway,
            jwt_service,
            tasks,
            workflow,
        };
        (state, task_rx)
    }

    /// Initialize: database, then payment gateway, then state
    pub async fn initialize(config: &Config) -> Result<(Self, mpsc::Receiver<i64>)> {
        let db = DbService::new(&config.database_url).await?;
        let gateway = XenditClient::new(
            config.xendit_base_url.clone(),
            config.xendit_secret_key.clone(),
            config.gateway_timeout,
        )?;
        if config.xendit_callback_token.is_none() {
            tracing::warn!("XENDIT_CALLBACK_TOKEN not set, webhook deliveries are not authenticated");
        }
        Ok(Self::new(config.clone(), db.pool, Arc::new(gateway)))
    }

    /// Start the task queue worker and the orphan order sweep
    pub fn start_background_tasks(&self, task_rx: mpsc::Receiver<i64>) -> BackgroundTasks {
        let mut tasks = BackgroundTasks::new();
        let token = tasks.shutdown_token();

        let worker = TaskWorker::new(self.pool.clone(), self.gateway.clone());
        tasks.spawn(
            "task_worker",
            TaskKind::Worker,
            worker.run(task_rx, token.clone()),
        );
        tasks.spawn(
            "orphan_sweep",
            TaskKind::Periodic,
            sweep::run(self.pool.clone(), token),
        );

        tracing::info!("Background tasks registered: {}", tasks.len());
        tasks
    }

    pub fn get_jwt_service(&self) -> Arc<JwtService> {
        self.jwt_service.clone()
    }
}
