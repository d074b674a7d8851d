use anyhow::Result;
use clap::Parser;

use stamp_runtime::Filter;

use super::output::print_record;
use super::Context;

/// Find migrations by name or version.
#[derive(Parser)]
pub struct FindCommand {
    /// Any part of the filename; `*` matches anything.
    pub query: String,

    /// Only consider enabled migrations.
    #[arg(long, conflicts_with = "disabled_only")]
    pub enabled_only: bool,

    /// Only consider disabled migrations.
    #[arg(long)]
    pub disabled_only: bool,

    /// Show every match instead of requiring a unique one.
    #[arg(long)]
    pub all: bool,
}

impl FindCommand {
    fn filter(&self) -> Filter {
        Filter {
            enabled: !self.disabled_only,
            disabled: !self.enabled_only,
        }
    }

    pub fn execute(self, ctx: &Context) -> Result<()> {
        let records = if self.all {
            ctx.registry.find(&self.query, self.filter())?
        } else {
            ctx.registry
                .find_one(&self.query, self.filter())?
                .into_iter()
                .collect()
        };

        if records.is_empty() {
            anyhow::bail!("No migration matches '{}'", self.query);
        }

        for record in &records {
            print_record(record);
        }
        Ok(())
    }
}
