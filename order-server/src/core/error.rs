use thiserror::Error;

/// Startup and runtime errors
#[derive(Error, Debug)]
pub enum ServerError {
    #[error("configuration error: {0}")]
    Config(String),

    #[error("database initialization failed: {0}")]
    Database(#[from] shared::error::AppError),

    #[error("payment gateway initialization failed: {0}")]
    Gateway(#[from] crate::gateway::GatewayError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, ServerError>;
