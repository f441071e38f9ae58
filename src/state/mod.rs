//! State module for tracking crawl progress
//!
//! # Components
//!
//! - `CrawlState`: lifecycle of one organization's crawl session
//! - `Termination`: why a session stopped

mod crawl_state;

pub use crawl_state::{CrawlState, Termination};
