//! `AppError` and the `ApiResponse` envelope

use super::category::ErrorCategory;
use super::codes::ErrorCode;
use axum::Json;
use axum::response::{IntoResponse, Response};
use http::StatusCode;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use thiserror::Error;

/// Field or context name → value attached to an error
pub type ErrorDetails = HashMap<String, Value>;

/// Error surfaced to API callers: a code, a message and optional details
#[derive(Debug, Clone, Error)]
#[error("{message}")]
pub struct AppError {
    pub code: ErrorCode,
    pub message: String,
    pub details: Option<ErrorDetails>,
}

impl AppError {
    /// Error carrying the code's default message
    pub fn new(code: ErrorCode) -> Self {
        Self::with_message(code, code.message())
    }

    pub fn with_message(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            details: None,
        }
    }

    pub fn with_detail(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.details
            .get_or_insert_with(HashMap::new)
            .insert(key.into(), value.into());
        self
    }

    pub fn http_status(&self) -> StatusCode {
        self.code.http_status()
    }

    pub fn validation(msg: impl Into<String>) -> Self {
        Self::with_message(ErrorCode::ValidationFailed, msg)
    }

    pub fn invalid_request(msg: impl Into<String>) -> Self {
        Self::with_message(ErrorCode::InvalidRequest, msg)
    }

    pub fn not_authenticated() -> Self {
        Self::new(ErrorCode::NotAuthenticated)
    }

    pub fn invalid_token(msg: impl Into<String>) -> Self {
        Self::with_message(ErrorCode::TokenInvalid, msg)
    }

    pub fn token_expired() -> Self {
        Self::new(ErrorCode::TokenExpired)
    }

    pub fn permission_denied(msg: impl Into<String>) -> Self {
        Self::with_message(ErrorCode::PermissionDenied, msg)
    }

    /// Order changed under the caller between read and write
    pub fn conflict(msg: impl Into<String>) -> Self {
        Self::with_message(ErrorCode::OrderStatusConflict, msg)
    }

    pub fn database(msg: impl Into<String>) -> Self {
        Self::with_message(ErrorCode::DatabaseError, msg)
    }
}

/// Field-level validation failures: one detail per field, messages joined by `; `
impl From<validator::ValidationErrors> for AppError {
    fn from(errors: validator::ValidationErrors) -> Self {
        use validator::ValidationErrorsKind;

        let details = errors
            .errors()
            .iter()
            .map(|(field, kind)| {
                let message = match kind {
                    ValidationErrorsKind::Field(field_errors) => field_errors
                        .iter()
                        .map(|e| {
                            e.message
                                .as_ref()
                                .map_or_else(|| e.code.to_string(), |m| m.to_string())
                        })
                        .collect::<Vec<_>>()
                        .join("; "),
                    ValidationErrorsKind::Struct(_) | ValidationErrorsKind::List(_) => {
                        format!("{field} contains invalid entries")
                    }
                };
                (field.to_string(), Value::String(message))
            })
            .collect();

        Self {
            code: ErrorCode::ValidationFailed,
            message: "Request validation failed".to_string(),
            details: Some(details),
        }
    }
}

/// Response envelope: `{ code, message, data?, details? }`, `code = 0` on success
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<u16>,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<ErrorDetails>,
}

const OK_MESSAGE: &str = "OK";

impl<T> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        Self {
            code: Some(ErrorCode::Success.code()),
            message: OK_MESSAGE.to_string(),
            data: Some(data),
            details: None,
        }
    }

    /// HTTP status matching `code`; unknown codes are treated as server errors
    fn status(&self) -> StatusCode {
        match self.code {
            None | Some(0) => StatusCode::OK,
            Some(code) => ErrorCode::try_from(code)
                .map(|c| c.http_status())
                .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR),
        }
    }
}

impl ApiResponse<()> {
    /// Success without a payload
    pub fn ok() -> Self {
        Self {
            code: Some(ErrorCode::Success.code()),
            message: OK_MESSAGE.to_string(),
            data: None,
            details: None,
        }
    }

    pub fn error(err: &AppError) -> Self {
        Self {
            code: Some(err.code.code()),
            message: err.message.clone(),
            data: None,
            details: err.details.clone(),
        }
    }
}

pub type AppResult<T> = Result<T, AppError>;

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        if self.code.category() == ErrorCategory::System {
            tracing::error!(code = %self.code, message = %self.message, "System error");
        }
        (self.http_status(), Json(ApiResponse::<()>::error(&self))).into_response()
    }
}

impl<T: Serialize> IntoResponse for ApiResponse<T> {
    fn into_response(self) -> Response {
        (self.status(), Json(self)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use validator::Validate;

    #[test]
    fn test_new_uses_default_message() {
        let err = AppError::new(ErrorCode::OrderNotFound);
        assert_eq!(err.message, "Order not found");
        assert!(err.details.is_none());
        assert_eq!(err.to_string(), "Order not found");
    }

    #[test]
    fn test_details_accumulate() {
        let err = AppError::invalid_request("Product 9 does not exist")
            .with_detail("product_id", 9)
            .with_detail("line", 2);

        assert_eq!(err.code, ErrorCode::InvalidRequest);
        let details = err.details.unwrap();
        assert_eq!(details["product_id"], 9);
        assert_eq!(details["line"], 2);
    }

    #[test]
    fn test_constructors_pick_codes() {
        assert_eq!(AppError::validation("x").code, ErrorCode::ValidationFailed);
        assert_eq!(AppError::not_authenticated().code, ErrorCode::NotAuthenticated);
        assert_eq!(AppError::invalid_token("x").code, ErrorCode::TokenInvalid);
        assert_eq!(AppError::token_expired().code, ErrorCode::TokenExpired);
        assert_eq!(AppError::permission_denied("x").code, ErrorCode::PermissionDenied);
        assert_eq!(AppError::conflict("x").code, ErrorCode::OrderStatusConflict);
        assert_eq!(AppError::database("x").code, ErrorCode::DatabaseError);
    }

    #[derive(Validate)]
    struct Checkout {
        #[validate(length(min = 1, message = "address is required"))]
        address: String,
        #[validate(range(min = 1, max = 9999))]
        quantity: i64,
    }

    #[test]
    fn test_validation_errors_become_field_details() {
        let errors = Checkout {
            address: String::new(),
            quantity: 0,
        }
        .validate()
        .unwrap_err();

        let err = AppError::from(errors);
        assert_eq!(err.code, ErrorCode::ValidationFailed);
        let details = err.details.unwrap();
        assert_eq!(details["address"], "address is required");
        assert_eq!(details["quantity"], "range");
    }

    #[test]
    fn test_success_envelope() {
        let json = serde_json::to_value(ApiResponse::success(42)).unwrap();
        assert_eq!(json["code"], 0);
        assert_eq!(json["message"], "OK");
        assert_eq!(json["data"], 42);
        assert!(json.get("details").is_none());

        let json = serde_json::to_value(ApiResponse::<()>::ok()).unwrap();
        assert!(json.get("data").is_none());
    }

    #[test]
    fn test_error_envelope() {
        let err = AppError::new(ErrorCode::AdminRequired).with_detail("order_id", 7);
        let response = ApiResponse::<()>::error(&err);

        assert_eq!(response.code, Some(2003));
        assert_eq!(response.message, "Administrator role is required");
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
        assert_eq!(response.details.unwrap()["order_id"], 7);
    }

    #[test]
    fn test_unknown_code_is_server_error() {
        let response: ApiResponse<()> =
            serde_json::from_str(r#"{"code":4999,"message":"?"}"#).unwrap();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn test_into_response_status() {
        let response = AppError::new(ErrorCode::OrderNotFound).into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        let response = ApiResponse::success("done").into_response();
        assert_eq!(response.status(), StatusCode::OK);
    }
}
