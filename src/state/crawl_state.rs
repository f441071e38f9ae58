/// Session state definitions
///
/// A session moves `Idle -> Running -> {Completed, Aborted}` and never back.
use serde::Serialize;
use std::fmt;

/// Lifecycle state of a crawl session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CrawlState {
    /// Session built, nothing fetched yet
    Idle,

    /// Frontier loop is running
    Running,

    // ===== Terminal States =====
    /// Frontier exhausted or a budget reached
    Completed,

    /// Cancelled from outside; results are partial
    Aborted,
}

impl CrawlState {
    /// Returns true if `next` is a legal successor of this state
    pub fn can_transition_to(&self, next: CrawlState) -> bool {
        matches!(
            (self, next),
            (Self::Idle, Self::Running)
                | (Self::Idle, Self::Aborted)
                | (Self::Running, Self::Completed)
                | (Self::Running, Self::Aborted)
        )
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Running => "running",
            Self::Completed => "completed",
            Self::Aborted => "aborted",
        }
    }
}

impl fmt::Display for CrawlState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Reason a session left the `Running` state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Termination {
    /// No tasks left to fetch
    FrontierExhausted,

    /// `max_urls` pages were fetched
    UrlBudget,

    /// `max_duration` elapsed
    Deadline,

    /// Cancellation token fired
    Aborted,
}

impl Termination {
    /// Session state this termination ends in
    pub fn final_state(&self) -> CrawlState {
        match self {
            Self::Aborted => CrawlState::Aborted,
            _ => CrawlState::Completed,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::FrontierExhausted => "frontier_exhausted",
            Self::UrlBudget => "url_budget",
            Self::Deadline => "deadline",
            Self::Aborted => "aborted",
        }
    }
}

impl fmt::Display for Termination {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
