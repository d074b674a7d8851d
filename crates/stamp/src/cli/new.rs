use anyhow::{Context as _, Result};
use clap::Parser;
use console::style;
use std::path::PathBuf;

use super::output::display_path;
use super::Context;

/// Create a new migration.
#[derive(Parser)]
pub struct NewCommand {
    /// Migration name; several words are joined with spaces.
    #[arg(required = true, num_args = 1..)]
    pub name: Vec<String>,

    /// Migration body to wrap instead of the default `change` block.
    #[arg(long, conflicts_with = "content_file")]
    pub content: Option<String>,

    /// Read the migration body from a file.
    #[arg(long)]
    pub content_file: Option<PathBuf>,
}

impl NewCommand {
    pub fn execute(self, ctx: &Context) -> Result<()> {
        let content = match &self.content_file {
            Some(path) => Some(
                std::fs::read_to_string(path)
                    .with_context(|| format!("Failed to read {}", path.display()))?,
            ),
            None => self.content.clone(),
        };

        let record = ctx
            .registry
            .create(&self.name.join(" "), content.as_deref())?;

        println!(
            "{} Migration {} created.",
            style("✓").green(),
            style(display_path(&record)).cyan()
        );
        Ok(())
    }
}
