//! Crawl session - the BFS loop for one organization
//!
//! A session owns its frontier, visited set, budgets and results. It is
//! strictly sequential: one fetch at a time, spaced by the politeness delay.
//! Each iteration:
//! 1. Stops if the frontier is empty, the URL budget is spent or the
//!    deadline has passed
//! 2. Pops the oldest task and discards it if already visited or too deep
//!    (discards do not count against `max_urls`)
//! 3. Marks the URL visited and fetches it under the page timeout, clamped
//!    to the remaining crawl time
//! 4. Classifies every link: documents are recorded, topical links inside the
//!    allowed domains are enqueued one level deeper

use super::fetcher::Fetcher;
use super::frontier::{visit_key, Frontier};
use super::parser::{parse_page, Link};
use super::types::{
    CoverageReport, CrawlBudget, CrawlPlan, CrawlResult, CrawlTask, DiscoveredDocument,
    FailedFetch, FetchFailure, FetchedPage,
};
use crate::relevance::{self, classify_topics, is_state_tag, RelevanceResult};
use crate::state::{CrawlState, Termination};
use crate::url::AllowedDomainSet;
use crate::ConfigError;
use chrono::Utc;
use std::collections::{BTreeSet, HashSet};
use std::time::Duration;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use url::Url;

/// Extra time the session grants a fetch beyond the timeout it was given, so
/// the fetcher's own timeout fires first and it can release its resources
pub const FETCH_GRACE: Duration = Duration::from_millis(250);

/// One organization's crawl
pub struct CrawlSession<F: Fetcher> {
    organization: String,
    allowed: AllowedDomainSet,
    budget: CrawlBudget,
    fetcher: F,
    cancel: CancellationToken,
    state: CrawlState,

    frontier: Frontier,
    urls_visited: Vec<Url>,
    failed_fetches: Vec<FailedFetch>,
    documents: Vec<DiscoveredDocument>,
    document_keys: HashSet<String>,
    states_covered: BTreeSet<String>,
    pages_fetched: usize,
}

impl<F: Fetcher> CrawlSession<F> {
    /// Creates an idle session from a plan
    ///
    /// Seeds outside the allowed domains are dropped with a warning. Fails
    /// if the allowed set is empty or no usable seed remains; no fetch has
    /// happened at that point.
    pub fn new(plan: CrawlPlan, budget: CrawlBudget, fetcher: F) -> Result<Self, ConfigError> {
        plan.validate()?;
        let CrawlPlan {
            organization,
            seeds,
            allowed,
            extra_tasks,
        } = plan;

        if budget.max_urls == 0 {
            return Err(ConfigError::Validation(
                "max_urls must be greater than 0".to_string(),
            ));
        }

        let mut frontier = Frontier::new(budget.politeness_delay);
        for seed in seeds {
            if allowed.allows(&seed) {
                frontier.push(CrawlTask::seed(seed));
            } else {
                tracing::warn!("{}: dropping seed outside allowed domains: {}", organization, seed);
            }
        }

        if budget.max_depth >= 1 {
            for url in extra_tasks {
                if allowed.allows(&url) {
                    frontier.push(CrawlTask {
                        url,
                        depth: 1,
                        score: 0,
                    });
                }
            }
        }

        Ok(Self {
            organization,
            allowed,
            budget,
            fetcher,
            cancel: CancellationToken::new(),
            state: CrawlState::Idle,
            frontier,
            urls_visited: Vec::new(),
            failed_fetches: Vec::new(),
            documents: Vec::new(),
            document_keys: HashSet::new(),
            states_covered: BTreeSet::new(),
            pages_fetched: 0,
        })
    }

    /// Aborts the session when `token` is cancelled
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = token;
        self
    }

    pub fn state(&self) -> CrawlState {
        self.state
    }

    pub fn organization(&self) -> &str {
        &self.organization
    }

    /// Runs the crawl to completion and shuts the fetcher down
    ///
    /// Always returns the results gathered so far, whether the session
    /// completed or was aborted.
    pub async fn run(mut self) -> CrawlResult {
        self.transition(CrawlState::Running);
        let started = Instant::now();
        let deadline = started + self.budget.max_duration;

        tracing::info!(
            "{}: starting crawl with {} seed task(s)",
            self.organization,
            self.frontier.len()
        );

        let termination = self.crawl_loop(deadline).await;
        self.transition(termination.final_state());
        self.fetcher.shutdown().await;

        let elapsed = started.elapsed();
        tracing::info!(
            "{}: {} ({}) after {:.1}s: {} page(s) fetched, {} failed, {} document(s)",
            self.organization,
            self.state,
            termination,
            elapsed.as_secs_f64(),
            self.pages_fetched,
            self.failed_fetches.len(),
            self.documents.len()
        );

        self.into_result(termination, elapsed)
    }

    fn transition(&mut self, next: CrawlState) {
        let legal = self.state.can_transition_to(next);
        if !legal {
            tracing::warn!(
                "{}: illegal state transition {} -> {}",
                self.organization,
                self.state,
                next
            );
        }
        debug_assert!(legal, "illegal state transition {} -> {}", self.state, next);
        self.state = next;
    }

    async fn crawl_loop(&mut self, deadline: Instant) -> Termination {
        loop {
            if self.cancel.is_cancelled() {
                return Termination::Aborted;
            }
            if self.urls_visited.len() >= self.budget.max_urls {
                return Termination::UrlBudget;
            }
            if Instant::now() >= deadline {
                return Termination::Deadline;
            }

            let task = match self.frontier.pop() {
                Some(task) => task,
                None => return Termination::FrontierExhausted,
            };

            if self.frontier.is_visited(&task.url) {
                tracing::debug!("Discarding already visited {}", task.url);
                continue;
            }
            if task.depth > self.budget.max_depth {
                tracing::debug!("Discarding {} at depth {}", task.url, task.depth);
                continue;
            }

            let wait = self.frontier.politeness_wait(Instant::now());
            if !wait.is_zero() {
                let wait = wait.min(deadline.saturating_duration_since(Instant::now()));
                tokio::select! {
                    _ = self.cancel.cancelled() => return Termination::Aborted,
                    _ = tokio::time::sleep(wait) => {}
                }
                if Instant::now() >= deadline {
                    return Termination::Deadline;
                }
            }

            self.frontier.mark_visited(&task.url);
            self.urls_visited.push(task.url.clone());

            let timeout = self
                .budget
                .page_timeout
                .min(deadline.saturating_duration_since(Instant::now()));
            tracing::debug!("Fetching {} (depth {})", task.url, task.depth);

            let outcome = match self.fetch_bounded(&task.url, timeout).await {
                Some(outcome) => outcome,
                None => return Termination::Aborted,
            };
            self.frontier.record_fetch(Instant::now());

            match outcome {
                Ok(page) => self.process_page(&task, page),
                Err(failure) => {
                    tracing::warn!("Failed to fetch {}: {}", task.url, failure);
                    self.failed_fetches
                        .push(FailedFetch::new(task.url.clone(), &failure));
                }
            }
        }
    }

    /// Fetches under `timeout`; None if the session was cancelled meanwhile
    async fn fetch_bounded(
        &self,
        url: &Url,
        timeout: Duration,
    ) -> Option<Result<FetchedPage, FetchFailure>> {
        tokio::select! {
            biased;
            _ = self.cancel.cancelled() => None,
            result = tokio::time::timeout(timeout + FETCH_GRACE, self.fetcher.fetch(url, timeout)) => {
                Some(result.unwrap_or(Err(FetchFailure::Timeout)))
            }
        }
    }

    fn process_page(&mut self, task: &CrawlTask, page: FetchedPage) {
        self.pages_fetched += 1;

        // A redirect target counts as visited so it is not fetched again
        if visit_key(&page.final_url) != visit_key(&task.url) {
            self.frontier.mark_visited(&page.final_url);
        }

        let content = parse_page(&page.html, &page.final_url);

        let mut page_text = content.title.clone().unwrap_or_default();
        page_text.push(' ');
        page_text.push_str(&content.text);
        let page_tags = relevance::regional_tags(&content.final_url, "", Some(&page_text));
        self.add_states(&page_tags);

        let mut enqueued = 0;
        for link in content.links.iter() {
            let result = relevance::score(&link.url, &link.anchor_text, None);

            if result.is_document {
                self.record_document(task, &content.final_url, link, result);
                continue;
            }

            let depth = task.depth + 1;
            if result.topical_score == 0
                || depth > self.budget.max_depth
                || !self.allowed.allows(&link.url)
                || self.frontier.is_visited(&link.url)
            {
                continue;
            }

            if self.frontier.push(CrawlTask {
                url: link.url.clone(),
                depth,
                score: result.topical_score,
            }) {
                enqueued += 1;
            }
        }

        tracing::debug!(
            "{}: {} link(s), {} enqueued, frontier size {}",
            content.final_url,
            content.links.len(),
            enqueued,
            self.frontier.len()
        );
    }

    fn record_document(
        &mut self,
        task: &CrawlTask,
        source_page: &Url,
        link: &Link,
        result: RelevanceResult,
    ) {
        if !self.document_keys.insert(visit_key(&link.url)) {
            return;
        }

        tracing::debug!("Document found: {} ({})", link.url, link.anchor_text);
        self.add_states(&result.regional_tags);
        self.documents.push(DiscoveredDocument {
            url: link.url.clone(),
            source_page: source_page.clone(),
            anchor_text: link.anchor_text.clone(),
            topics: classify_topics(&link.anchor_text, link.url.as_str()),
            regional_tags: result.regional_tags,
            discovery_depth: task.depth,
        });
    }

    fn add_states(&mut self, tags: &BTreeSet<String>) {
        self.states_covered
            .extend(tags.iter().filter(|t| is_state_tag(t)).cloned());
    }

    fn into_result(self, termination: Termination, elapsed: Duration) -> CrawlResult {
        let coverage = CoverageReport {
            organization: self.organization.clone(),
            states_covered: self.states_covered,
            total_documents: self.documents.len(),
            total_pages_visited: self.pages_fetched,
            elapsed_seconds: elapsed.as_secs_f64(),
        };

        CrawlResult {
            organization: self.organization,
            status: self.state,
            termination,
            discovered_documents: self.documents,
            urls_visited: self.urls_visited,
            failed_fetches: self.failed_fetches,
            coverage,
            crawled_at: Utc::now(),
        }
    }
}
