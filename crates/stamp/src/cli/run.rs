use anyhow::Result;
use clap::Parser;
use console::style;

use stamp_runtime::{CommandRunner, DumpHook, MigrationRunner, RunPlan, Target};

use super::Context;

/// Run migrations through the configured runner.
#[derive(Parser)]
pub struct RunCommand {
    /// Target migration (name or version); `0` migrates all the way down.
    pub target: Option<String>,

    /// Version the database is currently at.
    pub current: Option<String>,

    /// Allow applied migrations whose files are missing (`IGNORE=1` also works).
    #[arg(long, env = "IGNORE", value_parser = clap::builder::BoolishValueParser::new())]
    pub ignore_missing: bool,
}

impl RunCommand {
    pub async fn execute(self, ctx: &Context) -> Result<()> {
        let allow_missing = self.ignore_missing || ctx.config.runner.allow_missing_files;
        let plan = ctx.registry.plan_run(
            self.target.as_deref(),
            self.current.as_deref(),
            allow_missing,
        )?;

        dump_schema(ctx).await?;

        println!("  {} {}", style("→").dim(), describe(&plan, self.current.as_deref()));
        CommandRunner::from_config(&ctx.config.runner).run(&plan).await?;
        println!("  {} Migrations complete", style("✓").green());
        Ok(())
    }
}

/// Roll the database back N steps.
#[derive(Parser)]
pub struct RollbackCommand {
    /// Number of migrations to roll back.
    #[arg(default_value = "1", allow_hyphen_values = true)]
    pub step: i64,
}

impl RollbackCommand {
    pub async fn execute(self, ctx: &Context) -> Result<()> {
        let mut plan = ctx.registry.plan_rollback(self.step)?;
        plan.allow_missing_files = ctx.config.runner.allow_missing_files;

        dump_schema(ctx).await?;

        CommandRunner::from_config(&ctx.config.runner).run(&plan).await?;

        let name = plan
            .resolved
            .as_ref()
            .map(|r| r.basename())
            .unwrap_or_else(|| plan.target.to_string());
        println!("  {} Rolled back to {}", style("✓").green(), style(name).cyan());
        Ok(())
    }
}

async fn dump_schema(ctx: &Context) -> Result<()> {
    let hook = DumpHook::from_config(&ctx.config.dump);
    if hook.invoke().await? {
        println!("  {} Schema dumped", style("✓").green());
    }
    Ok(())
}

fn describe(plan: &RunPlan, current: Option<&str>) -> String {
    match (&plan.target, &plan.resolved) {
        (Target::Latest, _) => "Migrating to latest".to_string(),
        (Target::Zero, _) => "Migrating all the way down".to_string(),
        (Target::Version(version), resolved) => format!(
            "Migrating from {} to {}",
            current.unwrap_or("current"),
            resolved
                .as_ref()
                .map(|r| r.basename())
                .unwrap_or_else(|| version.clone())
        ),
    }
}
