use crate::fetch::RetryPolicy;
use crate::health::Thresholds;
use serde::Deserialize;
use std::time::Duration;

/// Main configuration structure for Source-Watch
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub fetch: FetchConfig,
    #[serde(default)]
    pub health: HealthConfig,
    pub output: OutputConfig,
    #[serde(default, rename = "source")]
    pub sources: Vec<SourceEntry>,
}

/// HTTP fetch behavior shared by every adapter
#[derive(Debug, Clone, Deserialize)]
pub struct FetchConfig {
    /// User-Agent header sent with every request
    #[serde(rename = "user-agent")]
    pub user_agent: String,

    /// Timeout for a single attempt (seconds)
    #[serde(rename = "timeout-secs", default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Retries after the first failed attempt
    #[serde(rename = "max-retries", default = "default_max_retries")]
    pub max_retries: u32,

    /// Base delay before the first retry (milliseconds)
    #[serde(rename = "retry-backoff-ms", default = "default_retry_backoff_ms")]
    pub retry_backoff_ms: u64,

    /// Growth factor applied to the delay on each further retry
    #[serde(rename = "backoff-factor", default = "default_backoff_factor")]
    pub backoff_factor: f64,

    /// Upper bound for a single retry delay (milliseconds)
    #[serde(rename = "max-backoff-ms", default)]
    pub max_backoff_ms: Option<u64>,

    /// Number of sources fetched at the same time
    #[serde(
        rename = "max-concurrent-sources",
        default = "default_max_concurrent_sources"
    )]
    pub max_concurrent_sources: usize,
}

impl FetchConfig {
    /// Builds the retry policy used by the resilient fetcher
    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            timeout: Duration::from_secs(self.timeout_secs),
            max_retries: self.max_retries,
            backoff: Duration::from_millis(self.retry_backoff_ms),
            factor: self.backoff_factor,
            max_delay: self.max_backoff_ms.map(Duration::from_millis),
        }
    }
}

/// Streak thresholds for alerting
#[derive(Debug, Clone, Deserialize)]
pub struct HealthConfig {
    /// Consecutive failed runs before a failure alert (0 disables)
    #[serde(rename = "failure-threshold", default = "default_failure_threshold")]
    pub failure_threshold: u32,

    /// Consecutive runs without new items before a zero-new alert (0 disables)
    #[serde(rename = "zero-new-threshold", default = "default_zero_new_threshold")]
    pub zero_new_threshold: u32,
}

impl HealthConfig {
    pub fn thresholds(&self) -> Thresholds {
        Thresholds {
            failure: self.failure_threshold,
            zero_new: self.zero_new_threshold,
        }
    }
}

impl Default for HealthConfig {
    fn default() -> Self {
        Self {
            failure_threshold: default_failure_threshold(),
            zero_new_threshold: default_zero_new_threshold(),
        }
    }
}

/// Output configuration
#[derive(Debug, Clone, Deserialize)]
pub struct OutputConfig {
    /// Path to the persisted JSON index
    #[serde(rename = "index-path")]
    pub index_path: String,

    /// Path to the SQLite database of seen item identities
    #[serde(rename = "seen-db-path")]
    pub seen_db_path: String,

    /// Optional JSON-lines file receiving every new item
    #[serde(rename = "items-path", default)]
    pub items_path: Option<String>,
}

/// One catalog entry as written in the config file
///
/// The `config` table stays untyped here; it is converted into a typed
/// per-kind configuration when the registry is built.
#[derive(Debug, Clone, Deserialize)]
pub struct SourceEntry {
    pub id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub homepage: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub config: toml::Table,
}

fn default_timeout_secs() -> u64 {
    20
}

fn default_max_retries() -> u32 {
    2
}

fn default_retry_backoff_ms() -> u64 {
    1000
}

fn default_backoff_factor() -> f64 {
    2.0
}

fn default_max_concurrent_sources() -> usize {
    4
}

fn default_failure_threshold() -> u32 {
    3
}

fn default_zero_new_threshold() -> u32 {
    5
}
