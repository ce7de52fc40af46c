//! HTTP status code mapping for error codes

use super::codes::ErrorCode;
use http::StatusCode;

impl ErrorCode {
    /// HTTP status a response carrying this code is sent with
    pub fn http_status(&self) -> StatusCode {
        match self {
            Self::Success => StatusCode::OK,

            Self::OrderNotFound => StatusCode::NOT_FOUND,

            Self::OrderStatusConflict => StatusCode::CONFLICT,

            Self::NotAuthenticated | Self::TokenExpired | Self::TokenInvalid => {
                StatusCode::UNAUTHORIZED
            }

            Self::PermissionDenied | Self::AdminRequired => StatusCode::FORBIDDEN,

            // A missing numbering row is server state, not a caller error
            Self::InternalError
            | Self::DatabaseError
            | Self::NumberingNotFound
            | Self::PaymentGatewayError => StatusCode::INTERNAL_SERVER_ERROR,

            Self::ValidationFailed
            | Self::InvalidRequest
            | Self::OrderEmpty
            | Self::OrderInvalidTransition
            | Self::ProductInvalidPrice => StatusCode::BAD_REQUEST,
        }
    }
}
