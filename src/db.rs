use crate::config::DatabaseConfig;
use crate::error::{AppError, AppResult};
use sqlx::{
    postgres::{PgConnectOptions, PgPoolOptions},
    ConnectOptions, PgPool,
};
use std::str::FromStr;
use std::time::Duration;
use tokio::task::JoinHandle;

/// Shared database handle for the route groups
#[derive(Clone, Debug)]
pub struct Database {
    pub pool: PgPool,
}

impl Database {
    /// Create a pool without opening a connection yet
    pub fn connect_lazy(config: &DatabaseConfig) -> AppResult<Self> {
        let options = PgConnectOptions::from_str(&config.url)
            .map_err(|e| AppError::Configuration(format!("Invalid database URL: {}", e)))?
            .disable_statement_logging();

        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .min_connections(config.min_connections)
            .acquire_timeout(Duration::from_secs(config.acquire_timeout_seconds))
            .connect_lazy_with(options);

        Ok(Self { pool })
    }

    /// Open a first connection in the background and log the outcome.
    ///
    /// Startup does not wait on the returned handle.
    pub fn spawn_connect(&self) -> JoinHandle<()> {
        let pool = self.pool.clone();

        tokio::spawn(async move {
            match ping(&pool).await {
                Ok(()) => tracing::info!("Database connected"),
                Err(e) => tracing::error!("Database connection failed: {}", e),
            }
        })
    }
}

async fn ping(pool: &PgPool) -> AppResult<()> {
    sqlx::query("SELECT 1").execute(pool).await?;
    Ok(())
}
