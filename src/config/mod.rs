//! Configuration module for Payer-Scout
//!
//! This module handles loading, parsing, and validating the TOML configuration,
//! which doubles as the payer registry.
//!
//! # Example
//!
//! ```no_run
//! use payer_scout::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("payers.toml")).unwrap();
//! println!("Crawler will use max depth: {}", config.crawler.max_depth);
//! ```

mod parser;
mod registry;
mod types;
mod validation;

// Re-export types
pub use types::{
    Config, CrawlerConfig, DiscoveryConfig, FetcherKind, OutputConfig, PayerEntry, Priority,
    UserAgentConfig,
};

// Re-export parser functions
pub use parser::{compute_config_hash, load_config, load_config_with_hash, parse_config};
pub use registry::{load_payer_csv, read_payer_csv};
pub use validation::validate;
