//! Server configuration (environment variables, `.env` loaded by main)

use super::error::ServerError;
use std::ops::RangeInclusive;
use std::time::Duration;

/// Accepted `ORDER_EXPIRY_HOURS`: one hour up to one year
const ORDER_EXPIRY_HOURS_RANGE: RangeInclusive<u64> = 1..=8760;

#[derive(Debug, Clone)]
pub struct Config {
    /// SQLite database url
    pub database_url: String,
    pub http_port: u16,
    /// Environment: development | staging | production
    pub environment: String,
    /// HMAC secret for bearer tokens
    pub jwt_secret: String,
    /// Xendit API secret key
    pub xendit_secret_key: String,
    pub xendit_base_url: String,
    /// When set, webhook deliveries must carry it in `x-callback-token`
    pub xendit_callback_token: Option<String>,
    pub payment_currency: String,
    /// Success redirect base, `{frontend_url}/checkout/{id}/success`
    pub frontend_url: String,
    pub order_expiry_hours: i64,
    pub gateway_timeout: Duration,
    pub log_level: String,
    pub log_dir: Option<String>,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, ServerError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Load configuration through `lookup` (env var name → value)
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ServerError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |name: &str| lookup(name).filter(|v| !v.is_empty());
        let parsed = |name: &str, default: u64| -> Result<u64, ServerError> {
            match var(name) {
                Some(raw) => raw
                    .parse()
                    .map_err(|_| ServerError::Config(format!("{name} must be a number, got {raw:?}"))),
                None => Ok(default),
            }
        };

        let environment = var("ENVIRONMENT").unwrap_or_else(|| "development".into());

        let http_port = u16::try_from(parsed("HTTP_PORT", 8080)?)
            .map_err(|_| ServerError::Config("HTTP_PORT out of range".into()))?;
        let order_expiry_hours = parsed("ORDER_EXPIRY_HOURS", 24)?;
        if !ORDER_EXPIRY_HOURS_RANGE.contains(&order_expiry_hours) {
            return Err(ServerError::Config(format!(
                "ORDER_EXPIRY_HOURS must be between {} and {}, got {order_expiry_hours}",
                ORDER_EXPIRY_HOURS_RANGE.start(),
                ORDER_EXPIRY_HOURS_RANGE.end()
            )));
        }
        let order_expiry_hours = i64::try_from(order_expiry_hours)
            .map_err(|_| ServerError::Config("ORDER_EXPIRY_HOURS out of range".into()))?;
        let gateway_timeout = Duration::from_secs(parsed("GATEWAY_TIMEOUT_SECS", 15)?);

        Ok(Self {
            database_url: var("DATABASE_URL").unwrap_or_else(|| "sqlite:data/orders.db".into()),
            http_port,
            jwt_secret: require_secret(&lookup, "JWT_SECRET", &environment)?,
            xendit_secret_key: require_secret(&lookup, "XENDIT_SECRET_KEY", &environment)?,
            xendit_base_url: var("XENDIT_BASE_URL")
                .unwrap_or_else(|| "https://api.xendit.co".into()),
            xendit_callback_token: var("XENDIT_CALLBACK_TOKEN"),
            payment_currency: var("PAYMENT_CURRENCY").unwrap_or_else(|| "IDR".into()),
            frontend_url: var("FRONTEND_URL").unwrap_or_else(|| "http://localhost:3000".into()),
            order_expiry_hours,
            gateway_timeout,
            log_level: var("LOG_LEVEL").unwrap_or_else(|| "info".into()),
            log_dir: var("LOG_DIR"),
            environment,
        })
    }

    pub fn is_development(&self) -> bool {
        self.environment == "development"
    }
}

/// Secret env var: must be set and non-empty outside development.
fn require_secret<F>(lookup: &F, name: &str, environment: &str) -> Result<String, ServerError>
where
    F: Fn(&str) -> Option<String>,
{
    match lookup(name).filter(|v| !v.is_empty()) {
        Some(v) => Ok(v),
        None if environment == "development" => Ok(format!("dev-{name}-not-for-production")),
        None => Err(ServerError::Config(format!(
            "{name} must be set in {environment} environment"
        ))),
    }
}
