//! Deployment-server connection and polling configuration.

use std::time::Duration;

/// Retry budget for polling a remote task.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollPolicy {
    /// Number of status checks before giving up.
    pub max_retries: u32,
    /// Delay between two status checks.
    pub interval: Duration,
}

impl PollPolicy {
    pub const fn new(max_retries: u32, interval: Duration) -> Self {
        Self {
            max_retries,
            interval,
        }
    }

    /// Policy for a single deployment task: 20 checks, 30 seconds apart.
    pub const fn task_default() -> Self {
        Self::new(20, Duration::from_secs(30))
    }

    /// Policy for every deployment of a release: 10 checks, 60 seconds apart.
    pub const fn release_default() -> Self {
        Self::new(10, Duration::from_secs(60))
    }

    /// Total time budget, `max_retries × interval`.
    pub fn budget(&self) -> Duration {
        self.interval.saturating_mul(self.max_retries)
    }
}

/// Deployment-server configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeployServerConfig {
    /// Base URL of the deployment server
    pub server_url: String,
    /// API key sent with every request
    pub api_key: String,
    pub task_poll: PollPolicy,
    pub release_poll: PollPolicy,
}

impl Default for DeployServerConfig {
    fn default() -> Self {
        let mut task_poll = PollPolicy::task_default();
        if let Some(retries) = env_parse::<u32>("DEPLOY_POLL_RETRIES") {
            task_poll.max_retries = retries;
        }
        if let Some(secs) = env_parse::<u64>("DEPLOY_POLL_INTERVAL_SECS") {
            task_poll.interval = Duration::from_secs(secs);
        }

        DeployServerConfig {
            server_url: std::env::var("DEPLOY_SERVER_URL")
                .unwrap_or_else(|_| "http://localhost:8065".to_string()),
            api_key: std::env::var("DEPLOY_SERVER_API_KEY").unwrap_or_default(),
            task_poll,
            release_poll: PollPolicy::release_default(),
        }
    }
}

impl DeployServerConfig {
    /// Create a config from environment variables
    ///
    /// Reads:
    /// - DEPLOY_SERVER_URL (default: "http://localhost:8065")
    /// - DEPLOY_SERVER_API_KEY (default: empty)
    /// - DEPLOY_POLL_RETRIES (single-task poll retries, default: 20)
    /// - DEPLOY_POLL_INTERVAL_SECS (single-task poll interval, default: 30)
    pub fn from_env() -> Self {
        Self::default()
    }

    /// Create a config for a specific server with default poll policies
    pub fn new(server_url: &str, api_key: &str) -> Self {
        DeployServerConfig {
            server_url: server_url.to_string(),
            api_key: api_key.to_string(),
            task_poll: PollPolicy::task_default(),
            release_poll: PollPolicy::release_default(),
        }
    }

    pub fn with_api_key(mut self, api_key: &str) -> Self {
        self.api_key = api_key.to_string();
        self
    }

    pub fn with_task_poll(mut self, policy: PollPolicy) -> Self {
        self.task_poll = policy;
        self
    }

    pub fn with_release_poll(mut self, policy: PollPolicy) -> Self {
        self.release_poll = policy;
        self
    }
}

fn env_parse<T: std::str::FromStr>(key: &str) -> Option<T> {
    std::env::var(key).ok().and_then(|v| v.trim().parse().ok())
}
