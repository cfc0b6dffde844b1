//! `orchboard sections` — parse the orchestrator file locally.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;

use orchboard_core::{document, Section};
use orchboard_daemon::config::DEFAULT_FILE;

/// Arguments for `orchboard sections`.
#[derive(Args, Debug)]
pub struct SectionsArgs {
    #[arg(long, env = "ORCHBOARD_FILE", default_value = DEFAULT_FILE)]
    pub file: PathBuf,

    /// Emit the section set as JSON.
    #[arg(long)]
    pub json: bool,
}

impl SectionsArgs {
    pub fn run(self) -> Result<()> {
        let sections = document::snapshot(&self.file);

        if self.json {
            println!(
                "{}",
                serde_json::to_string_pretty(&sections).context("failed to render sections JSON")?
            );
            return Ok(());
        }

        for section in Section::ALL {
            println!("{}", format!("== {} ==", section.key()).bold().cyan());
            let body = sections.get(section);
            if body.is_empty() {
                println!("{}", "(empty)".dimmed());
            } else {
                println!("{body}");
            }
            println!();
        }
        Ok(())
    }
}
