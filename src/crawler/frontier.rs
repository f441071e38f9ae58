//! BFS frontier: FIFO task queue, visited set and politeness pacing
//!
//! The frontier owns all traversal bookkeeping for one session:
//! - A strict FIFO queue of [`CrawlTask`]s, so pages are visited in BFS order
//! - The [`VisitedSet`] of normalized URL keys, which only ever grows
//! - The time of the last fetch, to space fetches by the politeness delay
//!
//! Times use `tokio::time::Instant` so paused-clock tests drive the pacing.

use super::types::CrawlTask;
use crate::url::url_key;
use std::collections::{HashSet, VecDeque};
use std::time::Duration;
use tokio::time::Instant;
use url::Url;

/// Normalized key of a URL, falling back to the raw string for URLs that
/// cannot be normalized
pub fn visit_key(url: &Url) -> String {
    url_key(url).unwrap_or_else(|_| url.as_str().to_string())
}

/// Keys of URLs that have been dequeued and fetched (or attempted)
#[derive(Debug, Default)]
pub struct VisitedSet {
    keys: HashSet<String>,
}

impl VisitedSet {
    /// Records the URL; returns false if it was already present
    pub fn insert(&mut self, url: &Url) -> bool {
        self.keys.insert(visit_key(url))
    }

    pub fn contains(&self, url: &Url) -> bool {
        self.keys.contains(&visit_key(url))
    }
}

/// Frontier manages the queue and pacing of one crawl session
#[derive(Debug)]
pub struct Frontier {
    queue: VecDeque<CrawlTask>,

    /// Keys currently waiting in `queue`
    pending: HashSet<String>,
    visited: VisitedSet,
    politeness_delay: Duration,
    last_fetch: Option<Instant>,
}

impl Frontier {
    pub fn new(politeness_delay: Duration) -> Self {
        Self {
            queue: VecDeque::new(),
            pending: HashSet::new(),
            visited: VisitedSet::default(),
            politeness_delay,
            last_fetch: None,
        }
    }

    /// Appends a task unless its URL was visited or is already waiting
    ///
    /// Returns true if the task was added.
    pub fn push(&mut self, task: CrawlTask) -> bool {
        let key = visit_key(&task.url);
        if self.visited.keys.contains(&key) || !self.pending.insert(key) {
            return false;
        }
        self.queue.push_back(task);
        true
    }

    /// Removes the oldest task
    pub fn pop(&mut self) -> Option<CrawlTask> {
        let task = self.queue.pop_front()?;
        self.pending.remove(&visit_key(&task.url));
        Some(task)
    }

    pub fn is_visited(&self, url: &Url) -> bool {
        self.visited.contains(url)
    }

    /// Marks a URL visited; returns false if it already was
    pub fn mark_visited(&mut self, url: &Url) -> bool {
        self.visited.insert(url)
    }

    pub fn len(&self) -> usize {
        self.queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    /// How long to wait before the next fetch may start
    pub fn politeness_wait(&self, now: Instant) -> Duration {
        match self.last_fetch {
            Some(last) => self
                .politeness_delay
                .saturating_sub(now.saturating_duration_since(last)),
            None => Duration::ZERO,
        }
    }

    /// Records that a fetch finished at `now`
    pub fn record_fetch(&mut self, now: Instant) {
        self.last_fetch = Some(now);
    }
}
