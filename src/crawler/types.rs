//! Data records produced and consumed by a crawl session

use crate::config::CrawlerConfig;
use crate::relevance::DocumentTopic;
use crate::state::{CrawlState, Termination};
use crate::url::AllowedDomainSet;
use crate::ConfigError;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::BTreeSet;
use std::time::Duration;
use thiserror::Error;
use url::Url;

/// A URL waiting in the frontier
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CrawlTask {
    pub url: Url,

    /// Link distance from the seed that led here (seeds are 0)
    pub depth: u32,

    /// Topical score of the link that produced this task
    pub score: u32,
}

impl CrawlTask {
    pub fn seed(url: Url) -> Self {
        Self {
            url,
            depth: 0,
            score: 0,
        }
    }
}

/// Rendered page handed back by a [`Fetcher`](super::Fetcher)
#[derive(Debug, Clone)]
pub struct FetchedPage {
    /// URL after redirects
    pub final_url: Url,
    pub html: String,
}

/// Why a single fetch failed
///
/// None of these stop the crawl.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FetchFailure {
    #[error("timed out")]
    Timeout,

    #[error("network error: {0}")]
    NetworkError(String),

    #[error("blocked with HTTP status {status}")]
    Blocked { status: u16 },
}

impl FetchFailure {
    pub fn kind(&self) -> &'static str {
        match self {
            FetchFailure::Timeout => "timeout",
            FetchFailure::NetworkError(_) => "network_error",
            FetchFailure::Blocked { .. } => "blocked",
        }
    }
}

/// A visited URL whose fetch failed
#[derive(Debug, Clone, Serialize)]
pub struct FailedFetch {
    pub url: Url,
    pub kind: &'static str,
    pub detail: String,
}

impl FailedFetch {
    pub fn new(url: Url, failure: &FetchFailure) -> Self {
        Self {
            url,
            kind: failure.kind(),
            detail: failure.to_string(),
        }
    }
}

/// A candidate document found during the crawl
#[derive(Debug, Clone, Serialize)]
pub struct DiscoveredDocument {
    pub url: Url,

    /// Page the link was found on
    pub source_page: Url,
    pub anchor_text: String,

    /// State codes and/or `regional_unspecified`; empty means none
    pub regional_tags: BTreeSet<String>,

    /// Depth of the page the link was found on
    #[serde(rename = "depth")]
    pub discovery_depth: u32,
    pub topics: BTreeSet<DocumentTopic>,
}

/// Per-organization coverage summary
#[derive(Debug, Clone, Default, Serialize)]
pub struct CoverageReport {
    pub organization: String,

    /// State codes seen on visited pages and discovered documents
    pub states_covered: BTreeSet<String>,
    pub total_documents: usize,

    /// Successfully fetched pages
    pub total_pages_visited: usize,
    pub elapsed_seconds: f64,
}

/// Everything a finished session hands back
#[derive(Debug, Clone, Serialize)]
pub struct CrawlResult {
    pub organization: String,
    pub status: CrawlState,
    pub termination: Termination,
    pub discovered_documents: Vec<DiscoveredDocument>,

    /// Every URL fetched (or attempted), in visit order
    pub urls_visited: Vec<Url>,
    pub failed_fetches: Vec<FailedFetch>,
    pub coverage: CoverageReport,
    pub crawled_at: DateTime<Utc>,
}

/// Limits applied to one session
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CrawlBudget {
    pub max_depth: u32,
    pub max_urls: usize,
    pub max_duration: Duration,
    pub politeness_delay: Duration,
    pub page_timeout: Duration,
}

impl Default for CrawlBudget {
    fn default() -> Self {
        Self::from(&CrawlerConfig::default())
    }
}

impl From<&CrawlerConfig> for CrawlBudget {
    fn from(config: &CrawlerConfig) -> Self {
        Self {
            max_depth: config.max_depth,
            max_urls: config.max_urls,
            max_duration: config.max_duration(),
            politeness_delay: config.politeness_delay(),
            page_timeout: config.page_timeout(),
        }
    }
}

/// Inputs of a session: who is crawled, from where, and within which hosts
#[derive(Debug, Clone)]
pub struct CrawlPlan {
    pub organization: String,
    pub seeds: Vec<Url>,
    pub allowed: AllowedDomainSet,

    /// Guessed URLs enqueued at depth 1 after the seeds
    pub extra_tasks: Vec<Url>,
}

impl CrawlPlan {
    pub fn new(organization: impl Into<String>, seeds: Vec<Url>, allowed: AllowedDomainSet) -> Self {
        Self {
            organization: organization.into(),
            seeds,
            allowed,
            extra_tasks: Vec::new(),
        }
    }

    pub fn with_extra_tasks(mut self, urls: Vec<Url>) -> Self {
        self.extra_tasks = urls;
        self
    }

    /// Checks that the plan can start: a non-empty domain set and at least
    /// one seed inside it
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.allowed.is_empty() {
            return Err(ConfigError::EmptyDomainSet(self.organization.clone()));
        }
        if !self.seeds.iter().any(|seed| self.allowed.allows(seed)) {
            return Err(ConfigError::EmptySeeds(self.organization.clone()));
        }
        Ok(())
    }
}
