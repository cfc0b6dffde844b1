//! `orchboard claims` — tabulate the Active Claims section.

use std::path::PathBuf;

use anyhow::Result;
use clap::Args;
use tabled::{settings::Style, Table, Tabled};

use orchboard_core::{document, listed_claims, ClaimRecord};
use orchboard_daemon::config::DEFAULT_FILE;

/// Arguments for `orchboard claims`.
#[derive(Args, Debug)]
pub struct ClaimsArgs {
    #[arg(long, env = "ORCHBOARD_FILE", default_value = DEFAULT_FILE)]
    pub file: PathBuf,
}

#[derive(Tabled)]
struct ClaimRow {
    #[tabled(rename = "task")]
    task_id: String,
    agent: String,
    #[tabled(rename = "start (utc)")]
    start_utc: String,
    eta: String,
    scope: String,
    branch: String,
}

impl From<ClaimRecord> for ClaimRow {
    fn from(record: ClaimRecord) -> Self {
        Self {
            task_id: record.task_id,
            agent: record.agent,
            start_utc: record.start_utc,
            eta: record.eta,
            scope: record.scope,
            branch: record.branch,
        }
    }
}

impl ClaimsArgs {
    pub fn run(self) -> Result<()> {
        let sections = document::snapshot(&self.file);
        let rows: Vec<ClaimRow> = listed_claims(&sections).into_iter().map(Into::into).collect();

        if rows.is_empty() {
            println!("No active claims in {}.", self.file.display());
            return Ok(());
        }

        let mut table = Table::new(rows);
        table.with(Style::rounded());
        println!("{table}");
        Ok(())
    }
}
