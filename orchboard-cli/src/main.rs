//! Orchboard — live dashboard for a shared agents orchestrator file.
//!
//! # Usage
//!
//! ```text
//! orchboard serve [--file <path>] [--host <ip>] [--port <port>] [--token <secret>] [--poll-ms <ms>]
//! orchboard sections [--file <path>] [--json]
//! orchboard claims [--file <path>]
//! orchboard claim --task-id CP-1 --agent <name> --start-utc <t> --eta <t> --scope <s> --branch <b>
//! ```

mod commands;

use anyhow::Result;
use clap::{Parser, Subcommand};

use commands::{
    claim::ClaimArgs, claims::ClaimsArgs, sections::SectionsArgs, serve::ServeArgs,
};

// ---------------------------------------------------------------------------
// CLI entry point
// ---------------------------------------------------------------------------

#[derive(Parser, Debug)]
#[command(
    name = "orchboard",
    version,
    about = "Live dashboard and claim desk for a shared agents orchestrator file",
    long_about = None,
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run the dashboard server in the foreground.
    Serve(ServeArgs),

    /// Parse the orchestrator file and print its sections.
    Sections(SectionsArgs),

    /// List claims currently recorded in Active Claims.
    Claims(ClaimsArgs),

    /// Submit a claim to a running dashboard server.
    Claim(ClaimArgs),
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    match cli.command {
        Commands::Serve(args) => args.run(),
        Commands::Sections(args) => args.run(),
        Commands::Claims(args) => args.run(),
        Commands::Claim(args) => args.run(),
    }
}
