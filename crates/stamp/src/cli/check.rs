use anyhow::Result;
use clap::Parser;
use console::style;
use std::path::PathBuf;

use stamp_runtime::{AppliedMigrations, Database, PgAppliedMigrations, StaticApplied};

use super::output::print_record;
use super::Context;

/// Compare applied migrations with existing files.
#[derive(Parser)]
pub struct CheckCommand {
    /// Read applied filenames from this file (one per line) instead of the database.
    #[arg(long)]
    pub applied_file: Option<PathBuf>,
}

impl CheckCommand {
    pub async fn execute(self, ctx: &Context) -> Result<()> {
        let applied = match &self.applied_file {
            Some(path) => StaticApplied::from_file(path)?.applied_filenames().await?,
            None => {
                let db = Database::from_config(&ctx.config.database).await?;
                let source = PgAppliedMigrations::from_config(db.pool().clone(), &ctx.config.database)?;
                let applied = source.applied_filenames().await;
                db.close().await;
                applied?
            }
        };

        let result = ctx.registry.reconcile(applied.as_slice())?;

        if result.is_clean() {
            println!(
                "{} Applied migrations match existing files",
                style("✓").green()
            );
            return Ok(());
        }

        if !result.only_applied.is_empty() {
            println!("{}", style("Applied, but not existing").yellow());
            for record in &result.only_applied {
                print_record(record);
            }
            if !result.only_existing.is_empty() {
                println!();
            }
        }

        if !result.only_existing.is_empty() {
            println!("{}", style("Existing, but not applied").yellow());
            for record in &result.only_existing {
                print_record(record);
            }
        }

        Ok(())
    }
}
