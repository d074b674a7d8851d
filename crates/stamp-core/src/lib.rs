pub mod config;
pub mod error;

pub use config::{DatabaseConfig, DumpConfig, MigrationsConfig, RunnerConfig, StampConfig};
pub use error::{Result, StampError};
