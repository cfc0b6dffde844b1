//! `orchboard claim` — submit a claim to a running dashboard.

use anyhow::{bail, Context, Result};
use clap::Args;
use colored::Colorize;

use orchboard_core::ClaimRequest;
use orchboard_daemon::ClaimResponse;

/// Arguments for `orchboard claim`.
#[derive(Args, Debug)]
pub struct ClaimArgs {
    /// Base URL of the dashboard server.
    #[arg(long, env = "ORCHBOARD_URL", default_value = "http://127.0.0.1:5000")]
    pub url: String,

    /// Shared claim secret.
    #[arg(long, env = "ORCHBOARD_CLAIM_TOKEN", hide_env_values = true, default_value = "")]
    pub token: String,

    /// Task identifier, e.g. `CP-42`.
    #[arg(long)]
    pub task_id: String,

    #[arg(long)]
    pub agent: String,

    #[arg(long)]
    pub start_utc: String,

    #[arg(long)]
    pub eta: String,

    #[arg(long)]
    pub scope: String,

    #[arg(long)]
    pub branch: String,
}

impl ClaimArgs {
    pub fn run(self) -> Result<()> {
        let endpoint = format!("{}/api/claim", self.url.trim_end_matches('/'));
        let request = ClaimRequest {
            token: self.token,
            task_id: self.task_id,
            agent: self.agent,
            start_utc: self.start_utc,
            eta: self.eta,
            scope: self.scope,
            branch: self.branch,
        };

        let (status, response) = match ureq::post(&endpoint).send_json(&request) {
            Ok(response) => (response.status(), response),
            Err(ureq::Error::Status(code, response)) => (code, response),
            Err(err) => {
                return Err(err).with_context(|| format!("failed to reach {endpoint}"));
            }
        };
        let body: ClaimResponse = response
            .into_json()
            .with_context(|| format!("unexpected response from {endpoint} (HTTP {status})"))?;

        if body.ok {
            println!("{} claimed {}", "✓".green(), request.task_id.trim());
            return Ok(());
        }

        let reason = body.error.unwrap_or_else(|| "unknown error".to_string());
        bail!("claim rejected (HTTP {status}): {reason}");
    }
}
