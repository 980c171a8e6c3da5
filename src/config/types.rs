use serde::Deserialize;
use std::time::Duration;

/// Main configuration structure for Page Inspector
///
/// Every section is optional; a missing section falls back to its defaults.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub fetcher: FetcherConfig,
    #[serde(default)]
    pub validator: ValidatorConfig,
    #[serde(rename = "user-agent", default)]
    pub user_agent: UserAgentConfig,
    #[serde(default)]
    pub output: OutputConfig,
}

/// Target page fetch configuration
#[derive(Debug, Clone, Deserialize)]
pub struct FetcherConfig {
    /// Connection and read timeout for the page fetch (seconds)
    #[serde(rename = "timeout-secs", default = "default_fetch_timeout")]
    pub timeout_secs: u64,

    /// Maximum redirect hops followed for the page fetch
    #[serde(rename = "max-redirects", default = "default_fetch_redirects")]
    pub max_redirects: usize,
}

impl FetcherConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl Default for FetcherConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_fetch_timeout(),
            max_redirects: default_fetch_redirects(),
        }
    }
}

/// Link validation configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ValidatorConfig {
    /// Maximum number of link probes in flight at once
    #[serde(rename = "max-concurrent-probes", default = "default_concurrency")]
    pub max_concurrent_probes: usize,

    /// Timeout for a single link probe (seconds)
    #[serde(rename = "probe-timeout-secs", default = "default_probe_timeout")]
    pub probe_timeout_secs: u64,

    /// Maximum redirect hops followed by a probe before the link counts as broken
    #[serde(rename = "max-redirects", default = "default_probe_redirects")]
    pub max_redirects: usize,

    /// Global deadline for validating all links of one page (seconds)
    #[serde(rename = "deadline-secs", default = "default_deadline")]
    pub deadline_secs: u64,
}

impl ValidatorConfig {
    pub fn probe_timeout(&self) -> Duration {
        Duration::from_secs(self.probe_timeout_secs)
    }

    pub fn deadline(&self) -> Duration {
        Duration::from_secs(self.deadline_secs)
    }
}

impl Default for ValidatorConfig {
    fn default() -> Self {
        Self {
            max_concurrent_probes: default_concurrency(),
            probe_timeout_secs: default_probe_timeout(),
            max_redirects: default_probe_redirects(),
            deadline_secs: default_deadline(),
        }
    }
}

/// User agent identification configuration
#[derive(Debug, Clone, Deserialize)]
pub struct UserAgentConfig {
    /// Name of the analyzer as sent in the User-Agent header
    #[serde(default = "default_agent_name")]
    pub name: String,

    /// Version sent alongside the name
    #[serde(default = "default_agent_version")]
    pub version: String,
}

impl UserAgentConfig {
    /// Formats the User-Agent header value (`Name/Version`)
    pub fn header_value(&self) -> String {
        format!("{}/{}", self.name, self.version)
    }
}

impl Default for UserAgentConfig {
    fn default() -> Self {
        Self {
            name: default_agent_name(),
            version: default_agent_version(),
        }
    }
}

/// Output configuration
#[derive(Debug, Clone, Deserialize)]
pub struct OutputConfig {
    /// Path to the SQLite database file holding job results
    #[serde(rename = "database-path", default = "default_database_path")]
    pub database_path: String,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            database_path: default_database_path(),
        }
    }
}

fn default_fetch_timeout() -> u64 {
    15
}

fn default_fetch_redirects() -> usize {
    10
}

fn default_concurrency() -> usize {
    16
}

fn default_probe_timeout() -> u64 {
    8
}

fn default_probe_redirects() -> usize {
    5
}

fn default_deadline() -> u64 {
    60
}

fn default_agent_name() -> String {
    "PageInspector".to_string()
}

fn default_agent_version() -> String {
    env!("CARGO_PKG_VERSION").to_string()
}

fn default_database_path() -> String {
    "page-inspector.db".to_string()
}
