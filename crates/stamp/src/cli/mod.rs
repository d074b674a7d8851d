mod check;
mod find;
mod list;
mod new;
mod output;
mod rename;
mod run;

pub use check::CheckCommand;
pub use find::FindCommand;
pub use list::ListCommand;
pub use new::NewCommand;
pub use rename::{QueryArgs, RenameAction};
pub use run::{RollbackCommand, RunCommand};

use anyhow::Result;
use clap::{Parser, Subcommand};
use console::style;
use std::path::PathBuf;
use tracing::debug;

use stamp_core::config::{StampConfig, DEFAULT_CONFIG_FILE};
use stamp_core::error::StampError;
use stamp_runtime::MigrationRegistry;

/// stamp - timestamped migration files
#[derive(Parser)]
#[command(name = "stamp")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Configuration file path.
    #[arg(short, long, default_value = DEFAULT_CONFIG_FILE, global = true)]
    pub config: String,

    /// Migrations directory (overrides the config file).
    #[arg(short, long, global = true)]
    pub migrations_dir: Option<PathBuf>,

    /// Log debug output to stderr.
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

/// CLI commands.
#[derive(Subcommand)]
pub enum Commands {
    /// Create a new migration.
    #[command(alias = "create")]
    New(NewCommand),

    /// Find migrations by name or version.
    Find(FindCommand),

    /// Change the version of a migration to now.
    Reversion(QueryArgs),

    /// Disable a migration.
    Disable(QueryArgs),

    /// Enable a disabled migration.
    Enable(QueryArgs),

    /// Show all migrations.
    List(ListCommand),

    /// Compare applied migrations with existing files.
    Check(CheckCommand),

    /// Run migrations through the configured runner.
    Run(RunCommand),

    /// Roll the database back N steps.
    Rollback(RollbackCommand),
}

/// Configuration and registry shared by all commands.
pub struct Context {
    pub config: StampConfig,
    pub registry: MigrationRegistry,
}

impl Context {
    pub fn new(config: StampConfig, migrations_dir: Option<PathBuf>) -> Self {
        let dir = migrations_dir.unwrap_or_else(|| config.migrations.dir.clone());
        Self {
            registry: MigrationRegistry::new(dir),
            config,
        }
    }
}

impl Cli {
    /// Execute the CLI command.
    pub async fn execute(self) -> Result<()> {
        let log_level = if self.verbose { "debug" } else { "warn" };
        tracing_subscriber::fmt()
            .with_env_filter(std::env::var("RUST_LOG").unwrap_or_else(|_| log_level.to_string()))
            .with_writer(std::io::stderr)
            .init();

        // Load .env if present
        dotenvy::dotenv().ok();

        let config = StampConfig::load_or_default(&self.config)?;
        let ctx = Context::new(config, self.migrations_dir);
        debug!("Using migrations directory {:?}", ctx.registry.dir());

        match self.command {
            Commands::New(cmd) => cmd.execute(&ctx),
            Commands::Find(cmd) => cmd.execute(&ctx),
            Commands::Reversion(args) => RenameAction::Reversion.execute(&ctx, &args),
            Commands::Disable(args) => RenameAction::Disable.execute(&ctx, &args),
            Commands::Enable(args) => RenameAction::Enable.execute(&ctx, &args),
            Commands::List(cmd) => cmd.execute(&ctx),
            Commands::Check(cmd) => cmd.execute(&ctx).await,
            Commands::Run(cmd) => cmd.execute(&ctx).await,
            Commands::Rollback(cmd) => cmd.execute(&ctx).await,
        }
    }
}

/// Render a failed command for stderr.
///
/// User mistakes (unknown query, already disabled, ...) get one line; anything
/// else keeps the full cause chain.
pub fn report(err: &anyhow::Error) -> String {
    match err.downcast_ref::<StampError>() {
        Some(stamp_err) if stamp_err.is_user_error() => {
            format!("{} {}", style("✗").red().bold(), stamp_err)
        }
        _ => format!("{} {:?}", style("Error:").red().bold(), err),
    }
}
