//! `orchboard serve` — watcher + dashboard server in the foreground.

use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Args;

use orchboard_daemon::config::{DEFAULT_FILE, DEFAULT_HOST, DEFAULT_PORT, POLL_INTERVAL};
use orchboard_daemon::{start_blocking, ServerConfig};

/// Arguments for `orchboard serve`.
#[derive(Args, Debug)]
pub struct ServeArgs {
    /// Orchestrator file to tail and mutate.
    #[arg(long, env = "ORCHBOARD_FILE", default_value = DEFAULT_FILE)]
    pub file: PathBuf,

    /// Address to bind.
    #[arg(long, env = "ORCHBOARD_HOST", default_value_t = DEFAULT_HOST)]
    pub host: IpAddr,

    #[arg(long, env = "PORT", default_value_t = DEFAULT_PORT)]
    pub port: u16,

    /// Shared secret required by claim submissions.
    #[arg(long, env = "ORCHBOARD_CLAIM_TOKEN", hide_env_values = true)]
    pub token: Option<String>,

    /// Poll interval in milliseconds.
    #[arg(long, env = "ORCHBOARD_POLL_MS", default_value_t = POLL_INTERVAL.as_millis() as u64)]
    pub poll_ms: u64,
}

impl ServeArgs {
    pub fn run(self) -> Result<()> {
        let config = ServerConfig::new(self.file)
            .with_bind(SocketAddr::new(self.host, self.port))
            .with_claim_token(self.token)
            .with_poll_interval(Duration::from_millis(self.poll_ms));
        start_blocking(config).context("dashboard exited with error")
    }
}
