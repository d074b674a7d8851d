mod database;

pub use database::DatabaseConfig;

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::error::{Result, StampError};

/// Default configuration file name.
pub const DEFAULT_CONFIG_FILE: &str = "stamp.toml";

/// Root configuration for stamp.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StampConfig {
    /// Migration directory configuration.
    #[serde(default)]
    pub migrations: MigrationsConfig,

    /// Database holding the applied-migrations table.
    #[serde(default)]
    pub database: DatabaseConfig,

    /// External migration runner.
    #[serde(default)]
    pub runner: RunnerConfig,

    /// Schema dump hook run before migrating.
    #[serde(default)]
    pub dump: DumpConfig,
}

impl StampConfig {
    /// Load configuration from a TOML file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())
            .map_err(|e| StampError::Config(format!("Failed to read config file: {}", e)))?;

        Self::parse_toml(&content)
    }

    /// Load configuration from a file if it exists, otherwise use defaults.
    pub fn load_or_default(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if path.exists() {
            debug!("Loading configuration from {:?}", path);
            Self::from_file(path)
        } else {
            debug!("No configuration at {:?}, using defaults", path);
            Ok(Self::default())
        }
    }

    /// Parse configuration from a TOML string.
    pub fn parse_toml(content: &str) -> Result<Self> {
        // Substitute environment variables
        let content = substitute_env_vars(content);

        toml::from_str(&content)
            .map_err(|e| StampError::Config(format!("Failed to parse config: {}", e)))
    }
}

/// Migration directory configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MigrationsConfig {
    /// Directory holding the migration files.
    #[serde(default = "default_migrations_dir")]
    pub dir: PathBuf,
}

impl Default for MigrationsConfig {
    fn default() -> Self {
        Self {
            dir: default_migrations_dir(),
        }
    }
}

fn default_migrations_dir() -> PathBuf {
    PathBuf::from("db/migrations")
}

/// External migration runner configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RunnerConfig {
    /// Program and arguments. `{dir}`, `{target}` and `{current}` are substituted.
    #[serde(default)]
    pub command: Vec<String>,

    /// Let the runner continue when applied migrations have no file.
    #[serde(default)]
    pub allow_missing_files: bool,
}

/// Schema dump hook configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DumpConfig {
    /// Program and arguments; empty disables the hook.
    #[serde(default)]
    pub command: Vec<String>,
}

/// Substitute environment variables in the format ${VAR_NAME}.
fn substitute_env_vars(content: &str) -> String {
    let mut result = content.to_string();
    let Ok(re) = regex_lite::Regex::new(r"\$\{([A-Z_][A-Z0-9_]*)\}") else {
        return result;
    };

    for cap in re.captures_iter(content) {
        let var_name = &cap[1];
        if let Ok(value) = std::env::var(var_name) {
            result = result.replace(&cap[0], &value);
        }
    }

    result
}
