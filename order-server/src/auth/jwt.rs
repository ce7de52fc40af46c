//! JWT token service

use crate::orders::{Actor, Buyer};
use chrono::{Duration, Utc};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// JWT settings
#[derive(Debug, Clone)]
pub struct JwtConfig {
    /// HMAC secret
    pub secret: String,
    /// Token lifetime in minutes, used when issuing
    pub expiration_minutes: i64,
}

/// Account role
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Role {
    Admin,
    Customer,
}

/// Claims carried by a token
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// User id
    pub sub: String,
    pub full_name: String,
    pub role: Role,
    pub exp: i64,
    pub iat: i64,
}

#[derive(Error, Debug)]
pub enum JwtError {
    #[error("invalid token: {0}")]
    InvalidToken(String),

    #[error("token expired")]
    ExpiredToken,

    #[error("invalid signature")]
    InvalidSignature,

    #[error("token generation failed: {0}")]
    GenerationFailed(String),
}

#[derive(Clone)]
pub struct JwtService {
    config: JwtConfig,
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
}

impl std::fmt::Debug for JwtService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JwtService")
            .field("expiration_minutes", &self.config.expiration_minutes)
            .finish_non_exhaustive()
    }
}

impl JwtService {
    pub fn with_config(config: JwtConfig) -> Self {
        let encoding_key = EncodingKey::from_secret(config.secret.as_bytes());
        let decoding_key = DecodingKey::from_secret(config.secret.as_bytes());
        Self {
            config,
            encoding_key,
            decoding_key,
        }
    }

    /// Issue a token (account service and tests)
    pub fn generate_token(
        &self,
        user_id: i64,
        full_name: &str,
        role: Role,
    ) -> Result<String, JwtError> {
        let now = Utc::now();
        let expiration = now + Duration::minutes(self.config.expiration_minutes);
        let claims = Claims {
            sub: user_id.to_string(),
            full_name: full_name.to_string(),
            role,
            exp: expiration.timestamp(),
            iat: now.timestamp(),
        };
        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|e| JwtError::GenerationFailed(e.to_string()))
    }

    /// Verify and decode a token
    pub fn validate_token(&self, token: &str) -> Result<Claims, JwtError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_required_spec_claims(&["sub", "exp"]);

        let token_data = decode::<Claims>(token, &self.decoding_key, &validation).map_err(|e| {
            match e.kind() {
                ErrorKind::ExpiredSignature => JwtError::ExpiredToken,
                ErrorKind::InvalidSignature => JwtError::InvalidSignature,
                _ => JwtError::InvalidToken(e.to_string()),
            }
        })?;

        Ok(token_data.claims)
    }

    /// Bearer token from an `Authorization` header value
    pub fn extract_from_header(header: &str) -> Option<&str> {
        header.strip_prefix("Bearer ")
    }
}

/// Authenticated caller, built from token claims
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CurrentUser {
    pub id: i64,
    pub full_name: String,
    pub role: Role,
}

impl TryFrom<Claims> for CurrentUser {
    type Error = JwtError;

    fn try_from(claims: Claims) -> Result<Self, Self::Error> {
        let id = claims
            .sub
            .parse::<i64>()
            .map_err(|_| JwtError::InvalidToken(format!("non-numeric subject: {}", claims.sub)))?;
        Ok(Self {
            id,
            full_name: claims.full_name,
            role: claims.role,
        })
    }
}

impl CurrentUser {
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }

    /// Status-machine actor for this user
    pub fn actor(&self) -> Actor {
        let name = self.full_name.clone();
        match self.role {
            Role::Admin => Actor::Admin {
                user_id: self.id,
                name,
            },
            Role::Customer => Actor::Buyer {
                user_id: self.id,
                name,
            },
        }
    }

    pub fn buyer(&self) -> Buyer<'_> {
        Buyer {
            user_id: self.id,
            full_name: &self.full_name,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn service(secret: &str) -> JwtService {
        JwtService::with_config(JwtConfig {
            secret: secret.to_string(),
            expiration_minutes: 60,
        })
    }

    #[test]
    fn test_jwt_generation_and_validation() {
        let jwt = service("test-secret-at-least-32-bytes-long!!");
        let token = jwt.generate_token(12, "Budi Santoso", Role::Customer).unwrap();

        let claims = jwt.validate_token(&token).unwrap();
        assert_eq!(claims.sub, "12");
        assert_eq!(claims.full_name, "Budi Santoso");
        assert_eq!(claims.role, Role::Customer);

        let user = CurrentUser::try_from(claims).unwrap();
        assert_eq!(user.id, 12);
        assert!(!user.is_admin());
    }

    #[test]
    fn test_wrong_secret_rejected() {
        let token = service("secret-one-secret-one-secret-one!!")
            .generate_token(1, "A", Role::Admin)
            .unwrap();
        let err = service("secret-two-secret-two-secret-two!!")
            .validate_token(&token)
            .unwrap_err();
        assert!(matches!(err, JwtError::InvalidSignature));
    }

    #[test]
    fn test_expired_token_rejected() {
        let jwt = service("test-secret-at-least-32-bytes-long!!");
        let now = Utc::now().timestamp();
        let claims = Claims {
            sub: "1".into(),
            full_name: "A".into(),
            role: Role::Customer,
            exp: now - 3600,
            iat: now - 7200,
        };
        let token = encode(&Header::new(Algorithm::HS256), &claims, &jwt.encoding_key).unwrap();
        assert!(matches!(jwt.validate_token(&token), Err(JwtError::ExpiredToken)));
    }

    #[test]
    fn test_garbage_token_rejected() {
        let jwt = service("test-secret-at-least-32-bytes-long!!");
        assert!(matches!(
            jwt.validate_token("not-a-jwt"),
            Err(JwtError::InvalidToken(_))
        ));
    }

    #[test]
    fn test_role_serialization() {
        assert_eq!(serde_json::to_string(&Role::Admin).unwrap(), "\"ADMIN\"");
        assert_eq!(
            serde_json::from_str::<Role>("\"CUSTOMER\"").unwrap(),
            Role::Customer
        );
    }

    #[test]
    fn test_actor_mapping() {
        let admin = CurrentUser {
            id: 1,
            full_name: "Admin".into(),
            role: Role::Admin,
        };
        assert!(admin.actor().is_admin());

        let buyer = CurrentUser {
            id: 2,
            full_name: "Budi".into(),
            role: Role::Customer,
        };
        assert_eq!(
            buyer.actor(),
            Actor::Buyer {
                user_id: 2,
                name: "Budi".into()
            }
        );
        assert_eq!(buyer.buyer().full_name, "Budi");
    }

    #[test]
    fn test_extract_from_header() {
        assert_eq!(JwtService::extract_from_header("Bearer abc"), Some("abc"));
        assert_eq!(JwtService::extract_from_header("Basic abc"), None);
    }
}
