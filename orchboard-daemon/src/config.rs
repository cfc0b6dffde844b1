use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_FILE: &str = "AGENTS_ORCHESTRATOR.txt";
pub const DEFAULT_PORT: u16 = 5000;
pub const DEFAULT_HOST: IpAddr = IpAddr::V4(Ipv4Addr::LOCALHOST);
pub const POLL_INTERVAL: Duration = Duration::from_millis(1500);
pub const MIN_POLL_INTERVAL: Duration = Duration::from_millis(1);

/// Viewers that fall further behind than this skip ahead.
pub const BROADCAST_CAPACITY: usize = 64;

/// Runtime settings for the dashboard server.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Coordination file being tailed and mutated.
    pub file: PathBuf,
    pub bind: SocketAddr,
    /// Shared secret for claim submission; `None` rejects every claim.
    pub claim_token: Option<String>,
    pub poll_interval: Duration,
}

impl ServerConfig {
    pub fn new(file: impl Into<PathBuf>) -> Self {
        Self {
            file: file.into(),
            bind: SocketAddr::new(DEFAULT_HOST, DEFAULT_PORT),
            claim_token: None,
            poll_interval: POLL_INTERVAL,
        }
    }

    pub fn with_bind(mut self, bind: SocketAddr) -> Self {
        self.bind = bind;
        self
    }

    /// Empty tokens count as unset.
    pub fn with_claim_token(mut self, token: Option<String>) -> Self {
        self.claim_token = token.filter(|t| !t.is_empty());
        self
    }

    /// Intervals below [`MIN_POLL_INTERVAL`] are raised to it.
    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval.max(MIN_POLL_INTERVAL);
        self
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self::new(DEFAULT_FILE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_poll_interval_is_clamped() {
        let config = ServerConfig::default().with_poll_interval(Duration::ZERO);
        assert_eq!(config.poll_interval, MIN_POLL_INTERVAL);

        let config = ServerConfig::default().with_poll_interval(Duration::from_millis(250));
        assert_eq!(config.poll_interval, Duration::from_millis(250));
    }

    #[test]
    fn empty_claim_token_counts_as_unset() {
        let config = ServerConfig::default().with_claim_token(Some(String::new()));
        assert!(config.claim_token.is_none());
        let config = ServerConfig::default().with_claim_token(Some("s".into()));
        assert_eq!(config.claim_token.as_deref(), Some("s"));
    }
}
