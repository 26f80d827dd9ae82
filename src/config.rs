//! Client configuration
//!
//! Everything that is fixed at construction time: credentials, upstream
//! hosts, connection pool bounds, rate-limit gate thresholds and the backoff
//! schedule. Loadable from YAML, with environment overrides for secrets.

use crate::error::{Error, Result};
use crate::types::{ABNORMAL_USED_THRESHOLD, REQUEST_REMAINING_BUFFER};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Environment variable holding the OAuth client id
pub const ENV_CLIENT_ID: &str = "REDDIT_CLIENT_ID";
/// Environment variable holding the OAuth client secret
pub const ENV_CLIENT_SECRET: &str = "REDDIT_CLIENT_SECRET";
/// Environment variable holding the shared store URL
pub const ENV_REDIS_URL: &str = "REDIS_URL";

// ============================================================================
// Top-Level Config
// ============================================================================

/// Complete client configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientConfig {
    /// OAuth application client id
    #[serde(default)]
    pub client_id: String,

    /// OAuth application client secret
    #[serde(default)]
    pub client_secret: String,

    /// Base URL for authenticated API calls
    #[serde(default = "default_oauth_base_url")]
    pub oauth_base_url: String,

    /// Base URL for the token endpoint
    #[serde(default = "default_www_base_url")]
    pub www_base_url: String,

    /// User agent sent with every request
    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// Redis URL for the shared rate-limit store
    #[serde(default)]
    pub redis_url: Option<String>,

    /// Connection pool configuration
    #[serde(default)]
    pub transport: TransportConfig,

    /// Total connection budget. When set, the pool bounds are derived from
    /// it with [`TransportConfig::from_conn_limit`] and the bounds in
    /// `transport` are ignored; its timeouts still apply.
    #[serde(default)]
    pub conn_limit: Option<usize>,

    /// Rate-limit gate configuration
    #[serde(default)]
    pub gate: GateConfig,

    /// Backoff schedule in milliseconds
    #[serde(default = "default_backoff_ms")]
    pub backoff_ms: Vec<u64>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            client_id: String::new(),
            client_secret: String::new(),
            oauth_base_url: default_oauth_base_url(),
            www_base_url: default_www_base_url(),
            user_agent: default_user_agent(),
            redis_url: None,
            transport: TransportConfig::default(),
            conn_limit: None,
            gate: GateConfig::default(),
            backoff_ms: default_backoff_ms(),
        }
    }
}

fn default_oauth_base_url() -> String {
    "https://oauth.reddit.com".to_string()
}

fn default_www_base_url() -> String {
    "https://www.reddit.com".to_string()
}

fn default_user_agent() -> String {
    format!("reddit-gate/{}", env!("CARGO_PKG_VERSION"))
}

fn default_backoff_ms() -> Vec<u64> {
    vec![4_000, 8_000, 16_000]
}

impl ClientConfig {
    /// Create a new config builder
    pub fn builder() -> ClientConfigBuilder {
        ClientConfigBuilder::default()
    }

    /// Parse a config from YAML
    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        let config: Self = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    /// Load a config from a YAML file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|e| {
            Error::config(format!("Failed to read {}: {e}", path.display()))
        })?;
        Self::from_yaml_str(&contents)
    }

    /// Apply `REDDIT_CLIENT_ID`, `REDDIT_CLIENT_SECRET` and `REDIS_URL`
    #[must_use]
    pub fn with_env_overrides(mut self) -> Self {
        if let Ok(id) = std::env::var(ENV_CLIENT_ID) {
            self.client_id = id;
        }
        if let Ok(secret) = std::env::var(ENV_CLIENT_SECRET) {
            self.client_secret = secret;
        }
        if let Ok(url) = std::env::var(ENV_REDIS_URL) {
            self.redis_url = Some(url);
        }
        self
    }

    /// Check values that would otherwise fail at request time
    pub fn validate(&self) -> Result<()> {
        url::Url::parse(&self.oauth_base_url)?;
        url::Url::parse(&self.www_base_url)?;
        if self.gate.safety_buffer < 0.0 {
            return Err(Error::config("gate.safety_buffer must not be negative"));
        }
        Ok(())
    }

    /// Pool bounds the transport is built with
    pub fn pool_config(&self) -> TransportConfig {
        match self.conn_limit {
            Some(limit) => TransportConfig {
                idle_timeout_seconds: self.transport.idle_timeout_seconds,
                response_header_timeout_seconds: self.transport.response_header_timeout_seconds,
                ..TransportConfig::from_conn_limit(limit)
            },
            None => self.transport.clone(),
        }
    }

    /// Backoff schedule as durations
    pub fn backoff_schedule(&self) -> Vec<Duration> {
        self.backoff_ms
            .iter()
            .copied()
            .map(Duration::from_millis)
            .collect()
    }
}

/// Builder for client config
#[derive(Default)]
pub struct ClientConfigBuilder {
    config: ClientConfig,
}

impl ClientConfigBuilder {
    /// Set OAuth application credentials
    pub fn credentials(mut self, id: impl Into<String>, secret: impl Into<String>) -> Self {
        self.config.client_id = id.into();
        self.config.client_secret = secret.into();
        self
    }

    /// Point authenticated calls at a different host
    pub fn oauth_base_url(mut self, url: impl Into<String>) -> Self {
        self.config.oauth_base_url = url.into();
        self
    }

    /// Point the token endpoint at a different host
    pub fn www_base_url(mut self, url: impl Into<String>) -> Self {
        self.config.www_base_url = url.into();
        self
    }

    /// Set user agent
    pub fn user_agent(mut self, agent: impl Into<String>) -> Self {
        self.config.user_agent = agent.into();
        self
    }

    /// Set the shared store URL
    pub fn redis_url(mut self, url: impl Into<String>) -> Self {
        self.config.redis_url = Some(url.into());
        self
    }

    /// Set transport bounds
    pub fn transport(mut self, transport: TransportConfig) -> Self {
        self.config.transport = transport;
        self
    }

    /// Derive pool bounds from a total connection budget
    pub fn conn_limit(mut self, limit: usize) -> Self {
        self.config.conn_limit = Some(limit);
        self
    }

    /// Set gate thresholds
    pub fn gate(mut self, gate: GateConfig) -> Self {
        self.config.gate = gate;
        self
    }

    /// Replace the backoff schedule
    pub fn backoff(mut self, schedule: &[Duration]) -> Self {
        self.config.backoff_ms = schedule.iter().map(|d| d.as_millis() as u64).collect();
        self
    }

    /// Build the config
    pub fn build(self) -> ClientConfig {
        self.config
    }
}

// ============================================================================
// Transport
// ============================================================================

/// Connection pool bounds, process-wide
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransportConfig {
    /// Maximum idle connections across all hosts
    #[serde(default = "default_max_idle")]
    pub max_idle: usize,

    /// Maximum concurrent connections per host
    #[serde(default = "default_max_conns_per_host")]
    pub max_conns_per_host: usize,

    /// Maximum idle connections per host
    #[serde(default = "default_max_idle")]
    pub max_idle_per_host: usize,

    /// Idle connection timeout in seconds
    #[serde(default = "default_idle_timeout")]
    pub idle_timeout_seconds: u64,

    /// Time allowed for the response headers to arrive, in seconds
    #[serde(default = "default_response_header_timeout")]
    pub response_header_timeout_seconds: u64,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            max_idle: default_max_idle(),
            max_conns_per_host: default_max_conns_per_host(),
            max_idle_per_host: default_max_idle(),
            idle_timeout_seconds: default_idle_timeout(),
            response_header_timeout_seconds: default_response_header_timeout(),
        }
    }
}

fn default_max_idle() -> usize {
    25
}

fn default_max_conns_per_host() -> usize {
    100
}

fn default_idle_timeout() -> u64 {
    60
}

fn default_response_header_timeout() -> u64 {
    5
}

impl TransportConfig {
    /// Derive pool bounds from a single connection budget.
    ///
    /// The budget is shared by 100 upstream hosts; a quarter of each host's
    /// share may sit idle. Every bound is at least 1.
    pub fn from_conn_limit(conn_limit: usize) -> Self {
        let per_host = (conn_limit / 100).max(1);
        let idle = (conn_limit / 4 / 100).max(1);
        Self {
            max_idle: idle,
            max_conns_per_host: per_host,
            max_idle_per_host: idle,
            ..Self::default()
        }
    }

    /// Idle connection timeout
    pub fn idle_timeout(&self) -> Duration {
        Duration::from_secs(self.idle_timeout_seconds)
    }

    /// Time allowed for response headers to arrive
    pub fn response_header_timeout(&self) -> Duration {
        Duration::from_secs(self.response_header_timeout_seconds)
    }
}

// ============================================================================
// Rate-Limit Gate
// ============================================================================

/// What the gate does when the shared store cannot be read
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StoreFailurePolicy {
    /// Report the store outage; the request is not sent
    #[default]
    FailClosed,
    /// Log the outage and treat the account as not throttled
    FailOpen,
}

/// Rate-limit gate thresholds
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GateConfig {
    /// Remaining quota at or below which a cool-down is recorded
    #[serde(default = "default_safety_buffer")]
    pub safety_buffer: f64,

    /// Used count above which usage is recorded as abnormal
    #[serde(default = "default_abnormal_used_threshold")]
    pub abnormal_used_threshold: i64,

    /// Behaviour when the store is unreachable during the pre-check
    #[serde(default)]
    pub on_store_failure: StoreFailurePolicy,
}

impl Default for GateConfig {
    fn default() -> Self {
        Self {
            safety_buffer: default_safety_buffer(),
            abnormal_used_threshold: default_abnormal_used_threshold(),
            on_store_failure: StoreFailurePolicy::default(),
        }
    }
}

fn default_safety_buffer() -> f64 {
    REQUEST_REMAINING_BUFFER
}

fn default_abnormal_used_threshold() -> i64 {
    ABNORMAL_USED_THRESHOLD
}
