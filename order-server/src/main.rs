use order_server::utils::init_logger_with_file;
use order_server::{Config, Server};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let _ = dotenvy::dotenv();

    let config = Config::from_env()?;
    init_logger_with_file(
        Some(&config.log_level),
        !config.is_development(),
        config.log_dir.as_deref(),
    );

    tracing::info!(environment = %config.environment, "Starting order-server");

    Server::new(config).run().await?;
    Ok(())
}
