//! Hand-off to the external migration runner.
//!
//! stamp never executes migration content itself. A [`RunPlan`] is passed to
//! a [`MigrationRunner`]; the stock implementation spawns a configured command.

use std::future::Future;
use std::pin::Pin;

use stamp_core::config::{DumpConfig, RunnerConfig};
use stamp_core::error::{Result, StampError};
use tokio::process::Command;
use tracing::{debug, info};

use super::plan::RunPlan;

/// Something that applies migrations up to a plan's target.
pub trait MigrationRunner: Send + Sync {
    fn run<'a>(&'a self, plan: &'a RunPlan) -> Pin<Box<dyn Future<Output = Result<()>> + Send + 'a>>;
}

/// Runs an external program, e.g. `sequel -m {dir} -M {target} $DATABASE_URL`.
///
/// Placeholders `{dir}`, `{target}` and `{current}` are replaced in every
/// argument. The plan is also exported as `STAMP_*` environment variables.
#[derive(Debug, Clone)]
pub struct CommandRunner {
    command: Vec<String>,
}

impl CommandRunner {
    pub fn new(command: Vec<String>) -> Self {
        Self { command }
    }

    pub fn from_config(config: &RunnerConfig) -> Self {
        Self::new(config.command.clone())
    }

    /// The argv for `plan`, placeholders substituted.
    pub fn render(&self, plan: &RunPlan) -> Result<Vec<String>> {
        if self.command.is_empty() {
            return Err(StampError::Config(
                "No migration runner configured ([runner] command)".into(),
            ));
        }

        let dir = plan.dir.display().to_string();
        let current = plan.current.map(|c| c.to_string()).unwrap_or_default();

        Ok(self
            .command
            .iter()
            .map(|arg| {
                arg.replace("{dir}", &dir)
                    .replace("{target}", plan.target.as_arg())
                    .replace("{current}", &current)
            })
            .collect())
    }

    fn env(plan: &RunPlan) -> Vec<(&'static str, String)> {
        vec![
            ("STAMP_MIGRATIONS_DIR", plan.dir.display().to_string()),
            ("STAMP_TARGET", plan.target.as_arg().to_string()),
            (
                "STAMP_CURRENT",
                plan.current.map(|c| c.to_string()).unwrap_or_default(),
            ),
            (
                "STAMP_ALLOW_MISSING_FILES",
                plan.allow_missing_files.to_string(),
            ),
        ]
    }
}

impl MigrationRunner for CommandRunner {
    fn run<'a>(&'a self, plan: &'a RunPlan) -> Pin<Box<dyn Future<Output = Result<()>> + Send + 'a>> {
        Box::pin(async move {
            let argv = self.render(plan)?;
            info!("Running migrations to {} with {:?}", plan.target, argv);
            run_command(&argv, &Self::env(plan)).await
        })
    }
}

/// Optional command run before migrating, typically a schema dump.
#[derive(Debug, Clone, Default)]
pub struct DumpHook {
    command: Vec<String>,
}

impl DumpHook {
    pub fn new(command: Vec<String>) -> Self {
        Self { command }
    }

    pub fn from_config(config: &DumpConfig) -> Self {
        Self::new(config.command.clone())
    }

    pub fn is_configured(&self) -> bool {
        !self.command.is_empty()
    }

    /// Run the hook. Returns `false` when no command is configured.
    pub async fn invoke(&self) -> Result<bool> {
        if !self.is_configured() {
            debug!("No dump command configured, skipping");
            return Ok(false);
        }
        run_command(&self.command, &[]).await?;
        Ok(true)
    }
}

async fn run_command(argv: &[String], env: &[(&'static str, String)]) -> Result<()> {
    let Some((program, args)) = argv.split_first() else {
        return Err(StampError::Config("Empty command".into()));
    };

    let status = Command::new(program)
        .args(args)
        .envs(env.iter().map(|(k, v)| (*k, v.as_str())))
        .status()
        .await
        .map_err(|e| StampError::Runner(format!("Failed to start {}: {}", program, e)))?;

    if !status.success() {
        return Err(StampError::Runner(format!("{} exited with {}", program, status)));
    }

    debug!("{} finished", program);
    Ok(())
}
