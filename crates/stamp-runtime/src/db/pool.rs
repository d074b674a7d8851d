use std::time::Duration;

use sqlx::postgres::{PgPool, PgPoolOptions};

use stamp_core::config::DatabaseConfig;
use stamp_core::error::{Result, StampError};

/// Database connection wrapper providing connection pooling.
#[derive(Clone)]
pub struct Database {
    pool: PgPool,
}

impl Database {
    /// Create a new database connection from configuration.
    pub async fn from_config(config: &DatabaseConfig) -> Result<Self> {
        if !config.is_configured() {
            return Err(StampError::Config(
                "No database url configured ([database] url)".into(),
            ));
        }

        let pool = PgPoolOptions::new()
            .max_connections(config.pool_size.max(1))
            .acquire_timeout(Duration::from_secs(config.pool_timeout_secs))
            .connect(&config.url)
            .await
            .map_err(|e| StampError::Database(format!("Failed to connect: {}", e)))?;

        Ok(Self { pool })
    }

    /// Get the pool.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Close all connections.
    pub async fn close(&self) {
        self.pool.close().await;
    }
}
