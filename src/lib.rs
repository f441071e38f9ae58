//! Payer-Scout: regional, breadth-first discovery of payer provider documents
//!
//! This crate crawls healthcare-payer websites from a handful of seed URLs,
//! follows topically relevant links under domain and depth limits, and
//! collects candidate documents (mostly PDFs) tagged with the US states they
//! appear to cover.

pub mod config;
pub mod crawler;
pub mod output;
pub mod relevance;
pub mod state;
pub mod url;

use thiserror::Error;

/// Errors that stop a payer from being crawled
///
/// Per-page failures never surface here; they are recorded in the
/// [`CrawlResult`] as failed fetches.
#[derive(Debug, Error)]
pub enum ScoutError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("URL parse error: {0}")]
    UrlParse(#[from] ::url::ParseError),

    #[error("HTTP client error: {0}")]
    Reqwest(#[from] reqwest::Error),

    #[error("Browser error: {0}")]
    Browser(String),

    #[error("Crawl cancelled {0}")]
    Cancelled(String),

    #[error("Crawl task failed: {0}")]
    Task(String),
}

/// Configuration-specific errors
///
/// Every variant is fatal at crawl start: no fetch is attempted once one of
/// these is returned.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Failed to read payer CSV: {0}")]
    Csv(#[from] csv::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),

    #[error("Invalid domain pattern: {0}")]
    InvalidPattern(String),

    #[error("No seed URLs supplied for {0}")]
    EmptySeeds(String),

    #[error("Allowed domain set for {0} is empty")]
    EmptyDomainSet(String),
}

/// Why a URL has no canonical form
#[derive(Debug, Error)]
pub enum UrlError {
    #[error("Failed to parse URL: {0}")]
    Parse(String),

    #[error("Invalid URL scheme: {0}")]
    InvalidScheme(String),

    #[error("Missing domain in URL")]
    MissingDomain,

    #[error("Malformed URL: {0}")]
    Malformed(String),
}

// Re-export commonly used types
pub use config::Config;
pub use crawler::{CrawlResult, CrawlSession, Fetcher};
pub use relevance::{score, RelevanceResult};
pub use state::CrawlState;
pub use url::{extract_domain, normalize_url, AllowedDomainSet};
