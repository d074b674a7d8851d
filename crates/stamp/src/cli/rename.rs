use anyhow::Result;
use clap::Args;
use console::style;

use super::output::display_path;
use super::Context;

/// A migration name or version (any unique part of the filename).
#[derive(Args)]
pub struct QueryArgs {
    pub query: String,
}

/// Renaming commands that act on exactly one migration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenameAction {
    Reversion,
    Disable,
    Enable,
}

impl RenameAction {
    pub fn execute(self, ctx: &Context, args: &QueryArgs) -> Result<()> {
        let (record, verb) = match self {
            Self::Reversion => (ctx.registry.reversion(&args.query)?, "reversioned"),
            Self::Disable => (ctx.registry.disable(&args.query)?, "disabled"),
            Self::Enable => (ctx.registry.enable(&args.query)?, "enabled"),
        };

        println!(
            "{} Migration {} {}.",
            style("✓").green(),
            style(display_path(&record)).cyan(),
            verb
        );
        Ok(())
    }
}
