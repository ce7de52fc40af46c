//! Shared fixtures: scripted payment gateway, in-memory database, tokens

#![allow(dead_code)]

use async_trait::async_trait;
use axum::Router;
use axum::body::Body;
use http::{Request, Response};
use http_body_util::BodyExt;
use order_server::auth::Role;
use order_server::core::{Config, ServerState};
use order_server::db::DbService;
use order_server::gateway::{GatewayError, Invoice, InvoiceRequest, PaymentGateway};
use serde_json::Value;
use sqlx::SqlitePool;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::mpsc;
use tower::ServiceExt;

pub const JWT_SECRET: &str = "integration-test-secret-0123456789abcdef";

/// In-process gateway double: records every call, can be told to fail
#[derive(Default)]
pub struct MockGateway {
    pub fail_create: AtomicBool,
    /// When set, every invoice gets this id
    pub fixed_invoice_id: Mutex<Option<String>>,
    pub created: Mutex<Vec<InvoiceRequest>>,
    pub expired: Mutex<Vec<String>>,
}

impl MockGateway {
    pub fn fail_next_creates(&self, fail: bool) {
        self.fail_create.store(fail, Ordering::SeqCst);
    }

    pub fn create_calls(&self) -> Vec<InvoiceRequest> {
        self.created.lock().unwrap().clone()
    }
}

#[async_trait]
impl PaymentGateway for MockGateway {
    async fn create_invoice(&self, request: &InvoiceRequest) -> Result<Invoice, GatewayError> {
        self.created.lock().unwrap().push(request.clone());
        if self.fail_create.load(Ordering::SeqCst) {
            return Err(GatewayError::Rejected {
                status: 503,
                message: "gateway unavailable".to_string(),
            });
        }
        let id = self
            .fixed_invoice_id
            .lock()
            .unwrap()
            .clone()
            .unwrap_or_else(|| format!("inv-{}", request.external_id));
        Ok(Invoice {
            invoice_url: format!("https://checkout.test/{id}"),
            id,
        })
    }

    async fn expire_invoice(&self, invoice_id: &str) -> Result<(), GatewayError> {
        self.expired.lock().unwrap().push(invoice_id.to_string());
        Ok(())
    }
}

pub struct TestApp {
    pub state: ServerState,
    pub pool: SqlitePool,
    pub gateway: Arc<MockGateway>,
    pub task_rx: mpsc::Receiver<i64>,
}

pub fn test_config() -> Config {
    let mut config = Config::from_lookup(|_| None).unwrap();
    config.jwt_secret = JWT_SECRET.to_string();
    config.frontend_url = "https://shop.test".to_string();
    config
}

pub async fn setup() -> TestApp {
    setup_with(test_config()).await
}

pub async fn setup_with(config: Config) -> TestApp {
    let db = DbService::in_memory().await.unwrap();
    with_pool(config, db.pool).await
}

pub async fn with_pool(config: Config, pool: SqlitePool) -> TestApp {
    let gateway = Arc::new(MockGateway::default());
    let (state, task_rx) = ServerState::new(config, pool.clone(), gateway.clone());
    TestApp {
        state,
        pool,
        gateway,
        task_rx,
    }
}

impl TestApp {
    pub fn router(&self) -> Router {
        order_server::api::router(self.state.clone())
    }

    pub fn token(&self, user_id: i64, full_name: &str, role: Role) -> String {
        self.state
            .jwt_service
            .generate_token(user_id, full_name, role)
            .unwrap()
    }

    pub async fn seed_product(&self, id: i64, name: &str, price: f64) {
        seed_product(&self.pool, id, name, price).await;
    }

    pub async fn order_status(&self, id: i64) -> String {
        sqlx::query_scalar("SELECT status FROM orders WHERE id = ?")
            .bind(id)
            .fetch_one(&self.pool)
            .await
            .unwrap()
    }

    pub async fn count(&self, table: &str) -> i64 {
        sqlx::query_scalar(&format!("SELECT COUNT(*) FROM {table}"))
            .fetch_one(&self.pool)
            .await
            .unwrap()
    }
}

pub async fn seed_product(pool: &SqlitePool, id: i64, name: &str, price: f64) {
    sqlx::query("INSERT INTO product (id, name, price, image_url) VALUES (?, ?, ?, ?)")
        .bind(id)
        .bind(name)
        .bind(price)
        .bind(format!("https://cdn.test/{id}.png"))
        .execute(pool)
        .await
        .unwrap();
}

/// Send one request through the router, returning status and JSON body (Null when empty)
pub async fn send(router: Router, request: Request<Body>) -> (http::StatusCode, Value) {
    let response: Response<Body> = router.oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(Value::Null)
    };
    (status, body)
}

pub fn json_request(method: &str, uri: &str, token: Option<&str>, body: &Value) -> Request<Body> {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header(http::header::CONTENT_TYPE, "application/json");
    if let Some(token) = token {
        builder = builder.header(http::header::AUTHORIZATION, format!("Bearer {token}"));
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

pub fn get_request(uri: &str, token: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().method("GET").uri(uri);
    if let Some(token) = token {
        builder = builder.header(http::header::AUTHORIZATION, format!("Bearer {token}"));
    }
    builder.body(Body::empty()).unwrap()
}
