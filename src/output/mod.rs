//! Output module for crawl results and coverage summaries
//!
//! This module handles:
//! - Writing one JSON object per organization (JSON Lines)
//! - Aggregating coverage reports into a run summary
//! - Rendering the summary as markdown or to stdout

mod markdown;
mod records;
pub mod summary;

pub use markdown::{format_markdown_summary, generate_markdown_summary};
pub use records::{to_json_line, write_results_jsonl};
pub use summary::{print_summary, summarize, CoverageSummary};

use thiserror::Error;

/// Errors that can occur during output operations
#[derive(Debug, Error)]
pub enum OutputError {
    #[error("Failed to serialize result: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for output operations
pub type OutputResult<T> = Result<T, OutputError>;
