use anyhow::Result;
use clap::Parser;
use console::style;

use super::output::print_record;
use super::Context;

/// Show all migrations.
#[derive(Parser)]
pub struct ListCommand {
    /// Print the migrations as JSON.
    #[arg(long)]
    pub json: bool,
}

impl ListCommand {
    pub fn execute(self, ctx: &Context) -> Result<()> {
        let records = ctx.registry.list()?;

        if self.json {
            println!("{}", serde_json::to_string_pretty(&records)?);
            return Ok(());
        }

        if records.is_empty() {
            println!(
                "{} No migrations found in {}",
                style("ℹ").blue(),
                ctx.registry.dir().display()
            );
            return Ok(());
        }

        for record in &records {
            print_record(record);
        }
        Ok(())
    }
}
