//! Sources of the runner's applied-migrations list.

use std::future::Future;
use std::path::Path;
use std::pin::Pin;

use sqlx::PgPool;
use stamp_core::config::DatabaseConfig;
use stamp_core::error::{Result, StampError};
use tracing::debug;

/// Reports the filenames the runner has already applied.
pub trait AppliedMigrations: Send + Sync {
    fn applied_filenames(&self) -> Pin<Box<dyn Future<Output = Result<Vec<String>>> + Send + '_>>;
}

/// Reads the runner's bookkeeping table, `schema_migrations(filename)` by default.
pub struct PgAppliedMigrations {
    pool: PgPool,
    sql: String,
}

impl PgAppliedMigrations {
    pub fn new(pool: PgPool, table: &str, column: &str) -> Result<Self> {
        Ok(Self {
            pool,
            sql: select_sql(table, column)?,
        })
    }

    pub fn from_config(pool: PgPool, config: &DatabaseConfig) -> Result<Self> {
        Self::new(pool, &config.applied_table, &config.applied_column)
    }
}

impl AppliedMigrations for PgAppliedMigrations {
    fn applied_filenames(&self) -> Pin<Box<dyn Future<Output = Result<Vec<String>>> + Send + '_>> {
        Box::pin(async move {
            let rows: Vec<(String,)> = sqlx::query_as(&self.sql)
                .fetch_all(&self.pool)
                .await?;

            debug!("{} applied migrations reported", rows.len());
            Ok(rows.into_iter().map(|(name,)| name).collect())
        })
    }
}

/// A fixed list, e.g. read from a file exported by the runner.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StaticApplied(pub Vec<String>);

impl StaticApplied {
    /// One filename per line; blank lines and `#` comments are ignored.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Ok(Self::parse(&content))
    }

    pub fn parse(content: &str) -> Self {
        Self(
            content
                .lines()
                .map(str::trim)
                .filter(|line| !line.is_empty() && !line.starts_with('#'))
                .map(str::to_string)
                .collect(),
        )
    }
}

impl AppliedMigrations for StaticApplied {
    fn applied_filenames(&self) -> Pin<Box<dyn Future<Output = Result<Vec<String>>> + Send + '_>> {
        Box::pin(async move { Ok(self.0.clone()) })
    }
}

fn select_sql(table: &str, column: &str) -> Result<String> {
    for ident in [table, column] {
        if !is_identifier(ident) {
            return Err(StampError::Config(format!("Invalid SQL identifier: {}", ident)));
        }
    }
    Ok(format!("SELECT {} FROM {}", column, table))
}

/// `name` or `schema.name`, each part `[A-Za-z_][A-Za-z0-9_]*`.
fn is_identifier(value: &str) -> bool {
    !value.is_empty()
        && value.split('.').all(|part| {
            let mut chars = part.chars();
            matches!(chars.next(), Some(c) if c.is_ascii_alphabetic() || c == '_')
                && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
        })
}
