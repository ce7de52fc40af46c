//! Xendit invoice API via REST (no SDK dependency)

use super::{GatewayError, Invoice, InvoiceRequest, PaymentGateway};
use async_trait::async_trait;
use reqwest::Url;
use serde_json::json;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct XenditClient {
    http: reqwest::Client,
    base_url: Url,
    secret_key: String,
}

impl XenditClient {
    pub fn new(
        base_url: impl AsRef<str>,
        secret_key: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, GatewayError> {
        let base_url = base_url.as_ref();
        let base_url = Url::parse(base_url).map_err(|e| {
            GatewayError::InvalidRequest(format!("invalid base url {base_url:?}: {e}"))
        })?;
        if base_url.cannot_be_a_base() {
            return Err(GatewayError::InvalidRequest(format!(
                "base url {base_url} cannot carry a path"
            )));
        }
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .connect_timeout(timeout)
            .build()?;
        Ok(Self {
            http,
            base_url,
            secret_key: secret_key.into(),
        })
    }

    /// Base url plus `segments`, each percent-encoded as a single path segment
    fn endpoint(&self, segments: &[&str]) -> Result<Url, GatewayError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| {
                GatewayError::InvalidRequest(format!(
                    "base url {} cannot carry a path",
                    self.base_url
                ))
            })?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    fn invoice_body(request: &InvoiceRequest) -> serde_json::Value {
        json!({
            "external_id": request.external_id,
            "amount": request.amount,
            "currency": request.currency,
            "customer": { "given_names": request.payer_name },
            "success_redirect_url": request.success_redirect_url,
            "items": request.items,
        })
    }

    async fn check(resp: reqwest::Response) -> Result<reqwest::Response, GatewayError> {
        let status = resp.status();
        if status.is_success() {
            return Ok(resp);
        }
        let message = resp.text().await.unwrap_or_default();
        Err(GatewayError::Rejected {
            status: status.as_u16(),
            message,
        })
    }
}

#[async_trait]
impl PaymentGateway for XenditClient {
    async fn create_invoice(&self, request: &InvoiceRequest) -> Result<Invoice, GatewayError> {
        let resp = self
            .http
            .post(self.endpoint(&["v2", "invoices"])?)
            .basic_auth(&self.secret_key, None::<&str>)
            .json(&Self::invoice_body(request))
            .send()
            .await?;

        let body: serde_json::Value = Self::check(resp).await?.json().await?;

        match (body["id"].as_str(), body["invoice_url"].as_str()) {
            (Some(id), Some(url)) if !id.is_empty() && !url.is_empty() => Ok(Invoice {
                id: id.to_string(),
                invoice_url: url.to_string(),
            }),
            _ => Err(GatewayError::Decode(format!(
                "invoice response missing id/invoice_url: {body}"
            ))),
        }
    }

    async fn expire_invoice(&self, invoice_id: &str) -> Result<(), GatewayError> {
        if invoice_id.trim().is_empty() {
            return Err(GatewayError::InvalidRequest(
                "invoice id must not be empty".into(),
            ));
        }
        let resp = self
            .http
            .post(self.endpoint(&["invoices", invoice_id, "expire!"])?)
            .basic_auth(&self.secret_key, None::<&str>)
            .send()
            .await?;
        Self::check(resp).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gateway::InvoiceLine;
    use axum::extract::{Path, State};
    use axum::{Json, Router, http::StatusCode, routing::post};
    use std::sync::{Arc, Mutex};

    fn sample_request() -> InvoiceRequest {
        InvoiceRequest {
            external_id: "42".to_string(),
            amount: 100.0,
            payer_name: "Budi".to_string(),
            currency: "IDR".to_string(),
            success_redirect_url: "http://shop.test/checkout/42/success".to_string(),
            items: vec![InvoiceLine {
                name: "Kopi".to_string(),
                price: 50.0,
                quantity: 2,
            }],
        }
    }

    /// Serve `router` on an ephemeral local port, returning its base url
    async fn serve(router: Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });
        format!("http://{addr}")
    }

    #[test]
    fn test_invoice_body_shape() {
        let body = XenditClient::invoice_body(&sample_request());
        assert_eq!(body["external_id"], "42");
        assert_eq!(body["amount"], 100.0);
        assert_eq!(body["currency"], "IDR");
        assert_eq!(body["customer"]["given_names"], "Budi");
        assert_eq!(body["items"][0]["name"], "Kopi");
        assert_eq!(body["items"][0]["quantity"], 2);
    }

    #[tokio::test]
    async fn test_create_invoice_parses_response() {
        let router = Router::new().route(
            "/v2/invoices",
            post(|Json(body): Json<serde_json::Value>| async move {
                Json(json!({
                    "id": format!("inv-{}", body["external_id"].as_str().unwrap_or("")),
                    "invoice_url": "https://checkout.test/inv",
                    "status": "PENDING",
                }))
            }),
        );
        let base = serve(router).await;
        let client = XenditClient::new(base, "sk_test", Duration::from_secs(5)).unwrap();

        let invoice = client.create_invoice(&sample_request()).await.unwrap();
        assert_eq!(invoice.id, "inv-42");
        assert_eq!(invoice.invoice_url, "https://checkout.test/inv");
    }

    #[tokio::test]
    async fn test_create_invoice_maps_rejection() {
        let router = Router::new().route(
            "/v2/invoices",
            post(|| async { (StatusCode::BAD_REQUEST, "API_VALIDATION_ERROR") }),
        );
        let base = serve(router).await;
        let client = XenditClient::new(base, "sk_test", Duration::from_secs(5)).unwrap();

        let err = client.create_invoice(&sample_request()).await.unwrap_err();
        match err {
            GatewayError::Rejected { status, message } => {
                assert_eq!(status, 400);
                assert_eq!(message, "API_VALIDATION_ERROR");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_expire_invoice_hits_expire_endpoint() {
        let router = Router::new().route(
            "/invoices/{id}/expire!",
            post(|| async { Json(json!({ "status": "EXPIRED" })) }),
        );
        let base = serve(router).await;
        let client = XenditClient::new(base, "sk_test", Duration::from_secs(5)).unwrap();

        client.expire_invoice("inv-42").await.unwrap();
    }

    #[tokio::test]
    async fn test_expire_invoice_rejects_blank_id_before_sending() {
        let hits = Arc::new(Mutex::new(0usize));
        let router = Router::new()
            .fallback(|State(hits): State<Arc<Mutex<usize>>>| async move {
                *hits.lock().unwrap() += 1;
                StatusCode::OK
            })
            .with_state(hits.clone());
        let base = serve(router).await;
        let client = XenditClient::new(base, "sk_test", Duration::from_secs(5)).unwrap();

        for blank in ["", "   "] {
            assert!(matches!(
                client.expire_invoice(blank).await,
                Err(GatewayError::InvalidRequest(_))
            ));
        }
        assert_eq!(*hits.lock().unwrap(), 0);
    }

    #[tokio::test]
    async fn test_expire_invoice_encodes_id_as_one_segment() {
        let seen = Arc::new(Mutex::new(Vec::<String>::new()));
        let router = Router::new()
            .route(
                "/invoices/{id}/expire!",
                post(
                    |State(seen): State<Arc<Mutex<Vec<String>>>>, Path(id): Path<String>| async move {
                        seen.lock().unwrap().push(id);
                        Json(json!({ "status": "EXPIRED" }))
                    },
                ),
            )
            .with_state(seen.clone());
        let base = serve(router).await;
        let client = XenditClient::new(base, "sk_test", Duration::from_secs(5)).unwrap();

        client.expire_invoice("a/b?c").await.unwrap();
        client.expire_invoice("../v2/invoices").await.unwrap();
        assert_eq!(*seen.lock().unwrap(), vec!["a/b?c", "../v2/invoices"]);
    }

    #[tokio::test]
    async fn test_base_url_path_prefix_is_kept() {
        let router = Router::new().route(
            "/xendit/v2/invoices",
            post(|| async {
                Json(json!({ "id": "inv-1", "invoice_url": "https://checkout.test/inv-1" }))
            }),
        );
        let base = format!("{}/xendit/", serve(router).await);
        let client = XenditClient::new(base, "sk_test", Duration::from_secs(5)).unwrap();

        let invoice = client.create_invoice(&sample_request()).await.unwrap();
        assert_eq!(invoice.id, "inv-1");
    }

    #[test]
    fn test_new_rejects_malformed_base_url() {
        assert!(matches!(
            XenditClient::new("not a url", "sk_test", Duration::from_secs(5)),
            Err(GatewayError::InvalidRequest(_))
        ));
    }
}
