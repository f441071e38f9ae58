use crate::ConfigError;
use serde::Deserialize;
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

/// Main configuration structure for Payer-Scout
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub crawler: CrawlerConfig,
    #[serde(default)]
    pub discovery: DiscoveryConfig,
    #[serde(rename = "user-agent", default)]
    pub user_agent: UserAgentConfig,
    #[serde(default)]
    pub output: OutputConfig,
    #[serde(rename = "payer", default)]
    pub payers: Vec<PayerEntry>,
}

/// Which page renderer the crawl sessions use
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FetcherKind {
    /// Headless Chromium, executes page scripts before reading the DOM
    #[default]
    Browser,
    /// Plain HTTP GET, for static sites
    Http,
}

/// Crawler budgets and pacing
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct CrawlerConfig {
    /// Maximum link depth from the seed URLs
    pub max_depth: u32,

    /// Hard ceiling on the number of URLs fetched per organization
    pub max_urls: usize,

    /// Wall-clock budget per organization (seconds)
    pub max_duration_secs: u64,

    /// Minimum pause between consecutive fetches (milliseconds)
    pub politeness_delay_ms: u64,

    /// Per-page render timeout (seconds)
    pub page_timeout_secs: u64,

    /// Extra wait after the document reports ready (milliseconds)
    pub settle_delay_ms: u64,

    /// Renderer used by the crawl sessions
    pub fetcher: FetcherKind,

    /// Number of organizations crawled at the same time
    pub max_concurrent_sessions: usize,
}

impl Default for CrawlerConfig {
    fn default() -> Self {
        Self {
            max_depth: 2,
            max_urls: 50,
            max_duration_secs: 300,
            politeness_delay_ms: 1000,
            page_timeout_secs: 30,
            settle_delay_ms: 1500,
            fetcher: FetcherKind::Browser,
            max_concurrent_sessions: 2,
        }
    }
}

impl CrawlerConfig {
    pub fn max_duration(&self) -> Duration {
        Duration::from_secs(self.max_duration_secs)
    }

    pub fn politeness_delay(&self) -> Duration {
        Duration::from_millis(self.politeness_delay_ms)
    }

    pub fn page_timeout(&self) -> Duration {
        Duration::from_secs(self.page_timeout_secs)
    }

    pub fn settle_delay(&self) -> Duration {
        Duration::from_millis(self.settle_delay_ms)
    }
}

/// Seed discovery settings
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct DiscoveryConfig {
    /// Probe the fixed portal templates for each payer
    pub enabled: bool,

    /// Timeout for each HEAD probe (seconds)
    pub probe_timeout_secs: u64,

    /// Scan the payer homepage for provider-related links
    pub scan_homepage: bool,

    /// Maximum number of seeds handed to a crawl session
    pub max_seeds: usize,

    /// Number of state-specific URL guesses enqueued at depth 1
    pub state_candidates: usize,
}

impl Default for DiscoveryConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            probe_timeout_secs: 10,
            scan_homepage: true,
            max_seeds: 5,
            state_candidates: 0,
        }
    }
}

/// User agent identification configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct UserAgentConfig {
    /// Name of the crawler
    pub crawler_name: String,

    /// Version of the crawler
    pub crawler_version: String,

    /// URL with information about the crawler
    pub contact_url: String,

    /// Email address for crawler-related contact
    pub contact_email: String,
}

impl Default for UserAgentConfig {
    fn default() -> Self {
        Self {
            crawler_name: "PayerScout".to_string(),
            crawler_version: env!("CARGO_PKG_VERSION").to_string(),
            contact_url: "https://example.org/payer-scout".to_string(),
            contact_email: "crawler@example.org".to_string(),
        }
    }
}

impl UserAgentConfig {
    /// Formats the user agent header: `Name/Version (+ContactURL; ContactEmail)`
    pub fn header_value(&self) -> String {
        format!(
            "{}/{} (+{}; {})",
            self.crawler_name, self.crawler_version, self.contact_url, self.contact_email
        )
    }
}

/// Output configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct OutputConfig {
    /// Path to the JSON Lines result file (one object per organization)
    pub results_path: String,

    /// Path to the markdown coverage summary
    pub summary_path: String,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            results_path: "./discovery.jsonl".to_string(),
            summary_path: "./coverage.md".to_string(),
        }
    }
}

/// Crawl tier of a payer, used to run part of the registry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    High,
    #[default]
    Medium,
    Low,
}

impl Priority {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::High => "high",
            Self::Medium => "medium",
            Self::Low => "low",
        }
    }
}

impl FromStr for Priority {
    type Err = ConfigError;

    /// Case-insensitive; an empty cell means the default tier
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "high" => Ok(Self::High),
            "" | "medium" => Ok(Self::Medium),
            "low" => Ok(Self::Low),
            other => Err(ConfigError::Validation(format!(
                "priority must be high, medium or low, got '{}'",
                other
            ))),
        }
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One organization from the payer registry
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct PayerEntry {
    /// Organization name, used as the report key
    pub name: String,

    /// Registrable domain (e.g. "anthem.com")
    pub base_domain: String,

    /// Provider portal known ahead of time; always the first seed
    #[serde(default)]
    pub known_portal: Option<String>,

    /// Additional seed URLs appended after discovery
    #[serde(default)]
    pub seeds: Vec<String>,

    #[serde(default)]
    pub priority: Priority,
}
