use serde::{Deserialize, Serialize};

/// Database configuration for reading applied migrations.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// Connection URL. Empty means no database is configured.
    #[serde(default)]
    pub url: String,

    /// Connection pool size.
    #[serde(default = "default_pool_size")]
    pub pool_size: u32,

    /// Pool checkout timeout in seconds.
    #[serde(default = "default_pool_timeout")]
    pub pool_timeout_secs: u64,

    /// Table the runner records applied migrations in.
    #[serde(default = "default_applied_table")]
    pub applied_table: String,

    /// Column holding the applied migration filename.
    #[serde(default = "default_applied_column")]
    pub applied_column: String,
}

impl DatabaseConfig {
    /// Whether a connection URL was configured.
    pub fn is_configured(&self) -> bool {
        !self.url.trim().is_empty()
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: String::new(),
            pool_size: default_pool_size(),
            pool_timeout_secs: default_pool_timeout(),
            applied_table: default_applied_table(),
            applied_column: default_applied_column(),
        }
    }
}

fn default_pool_size() -> u32 {
    1
}

fn default_pool_timeout() -> u64 {
    30
}

fn default_applied_table() -> String {
    "schema_migrations".to_string()
}

fn default_applied_column() -> String {
    "filename".to_string()
}
