//! Authentication
//!
//! Tokens are issued by the account service; this server only verifies them.
//! - [`JwtService`] - HS256 token verification
//! - [`CurrentUser`] - authenticated caller (axum extractor)

pub mod extractor;
pub mod jwt;

pub use jwt::{Claims, CurrentUser, JwtConfig, JwtError, JwtService, Role};
