//! Crawler module for page fetching and breadth-first discovery
//!
//! This module contains the core crawling logic, including:
//! - Fetching (headless browser or plain HTTP) behind the [`Fetcher`] trait
//! - HTML parsing and link extraction
//! - The BFS frontier and the per-organization [`CrawlSession`]
//! - Portal discovery of seed URLs
//! - Running a whole payer registry with bounded concurrency

mod browser;
mod fetcher;
mod frontier;
mod parser;
mod portal;
mod session;
mod types;

pub use browser::BrowserFetcher;
pub use fetcher::{build_http_client, Fetcher, HttpFetcher};
pub use frontier::{visit_key, Frontier, VisitedSet};
pub use parser::{extract_links, parse_page, ExtractedLinks, Link, PageContent};
pub use portal::{
    portal_candidates, provider_links, state_candidates, HttpProbe, PortalDiscoverer, SeedProbe,
    PORTAL_TEMPLATES,
};
pub use session::CrawlSession;
pub use types::{
    CoverageReport, CrawlBudget, CrawlPlan, CrawlResult, CrawlTask, DiscoveredDocument,
    FailedFetch, FetchFailure, FetchedPage,
};

use crate::config::{Config, DiscoveryConfig, FetcherKind, PayerEntry, UserAgentConfig};
use crate::url::AllowedDomainSet;
use crate::ScoutError;
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use url::Url;

/// Creates one fetcher per crawl session
///
/// Sessions never share a fetcher: each one shuts its fetcher down when it
/// finishes.
#[async_trait]
pub trait FetcherFactory: Send + Sync {
    type Fetcher: Fetcher + 'static;

    async fn create(&self) -> Result<Self::Fetcher, ScoutError>;
}

/// Builds the fetcher selected in the configuration
#[derive(Debug, Clone)]
pub struct ConfiguredFetchers {
    pub kind: FetcherKind,
    pub user_agent: UserAgentConfig,
    pub page_timeout: Duration,
    pub settle_delay: Duration,
}

impl From<&Config> for ConfiguredFetchers {
    fn from(config: &Config) -> Self {
        Self {
            kind: config.crawler.fetcher,
            user_agent: config.user_agent.clone(),
            page_timeout: config.crawler.page_timeout(),
            settle_delay: config.crawler.settle_delay(),
        }
    }
}

#[async_trait]
impl FetcherFactory for ConfiguredFetchers {
    type Fetcher = Box<dyn Fetcher>;

    async fn create(&self) -> Result<Box<dyn Fetcher>, ScoutError> {
        let fetcher: Box<dyn Fetcher> = match self.kind {
            FetcherKind::Browser => Box::new(
                BrowserFetcher::launch(&self.user_agent, self.page_timeout, self.settle_delay)
                    .await?,
            ),
            FetcherKind::Http => Box::new(HttpFetcher::new(&self.user_agent, self.page_timeout)?),
        };
        Ok(fetcher)
    }
}

/// Settings shared by every session of a registry run
#[derive(Debug, Clone)]
pub struct RunSettings {
    pub budget: CrawlBudget,
    pub discovery: DiscoveryConfig,
    pub max_concurrent_sessions: usize,
}

impl From<&Config> for RunSettings {
    fn from(config: &Config) -> Self {
        Self {
            budget: CrawlBudget::from(&config.crawler),
            discovery: config.discovery.clone(),
            max_concurrent_sessions: config.crawler.max_concurrent_sessions,
        }
    }
}

/// Outcome of one registry entry
#[derive(Debug)]
pub struct PayerOutcome {
    pub organization: String,
    pub result: Result<CrawlResult, ScoutError>,
}

/// Derives the allowed domains of a payer: its base domain, the usual portal
/// hosts and the host of its known portal
pub fn allowed_domains(payer: &PayerEntry) -> Result<AllowedDomainSet, ScoutError> {
    let mut allowed = AllowedDomainSet::for_base_domain(&payer.base_domain)?;
    if let Some(portal) = &payer.known_portal {
        if let Some(host) = Url::parse(portal)?.host_str() {
            allowed.insert(host)?;
        }
    }
    Ok(allowed)
}

/// Discovers seeds for one payer and crawls it
pub async fn crawl_payer<Fac, P>(
    payer: &PayerEntry,
    settings: &RunSettings,
    factory: &Fac,
    probe: Option<&P>,
    cancel: CancellationToken,
) -> Result<CrawlResult, ScoutError>
where
    Fac: FetcherFactory + ?Sized,
    P: SeedProbe + ?Sized,
{
    let allowed = allowed_domains(payer)?;
    let known_portal = payer.known_portal.as_deref().map(Url::parse).transpose()?;
    let configured_seeds = payer
        .seeds
        .iter()
        .map(|s| Url::parse(s))
        .collect::<Result<Vec<_>, _>>()?;

    let fetcher = factory.create().await?;

    let mut seeds = if settings.discovery.enabled {
        let mut discoverer = PortalDiscoverer::new(settings.discovery.max_seeds);
        if let Some(probe) = probe {
            discoverer = discoverer.with_probe(probe);
        }
        if settings.discovery.scan_homepage {
            discoverer = discoverer.with_homepage_scan(&fetcher, settings.budget.page_timeout);
        }
        let discovered = tokio::select! {
            _ = cancel.cancelled() => None,
            seeds = discoverer.discover_seeds(&payer.name, &payer.base_domain, known_portal.as_ref()) => Some(seeds),
        };
        match discovered {
            Some(seeds) => seeds,
            None => {
                fetcher.shutdown().await;
                return Err(ScoutError::Cancelled("during seed discovery".to_string()));
            }
        }
    } else {
        known_portal.into_iter().collect()
    };
    seeds.extend(configured_seeds);

    let plan = CrawlPlan::new(payer.name.clone(), seeds, allowed).with_extra_tasks(
        state_candidates(&payer.base_domain, settings.discovery.state_candidates),
    );

    if let Err(e) = plan.validate() {
        fetcher.shutdown().await;
        return Err(e.into());
    }

    let session = CrawlSession::new(plan, settings.budget.clone(), fetcher)?
        .with_cancellation(cancel);
    Ok(session.run().await)
}

/// Crawls every payer as an independent session
///
/// At most `max_concurrent_sessions` sessions run at once. Outcomes are
/// returned in registry order. Cancelling `cancel` aborts running sessions
/// (they still return partial results) and skips those not yet started.
pub async fn crawl_registry<Fac, P>(
    payers: Vec<PayerEntry>,
    settings: RunSettings,
    factory: Arc<Fac>,
    probe: Option<Arc<P>>,
    cancel: CancellationToken,
) -> Vec<PayerOutcome>
where
    Fac: FetcherFactory + ?Sized + 'static,
    P: SeedProbe + ?Sized + 'static,
{
    let semaphore = Arc::new(Semaphore::new(settings.max_concurrent_sessions.max(1)));
    let settings = Arc::new(settings);
    let mut tasks = JoinSet::new();

    for (index, payer) in payers.into_iter().enumerate() {
        let semaphore = Arc::clone(&semaphore);
        let settings = Arc::clone(&settings);
        let factory = Arc::clone(&factory);
        let probe = probe.clone();
        let cancel = cancel.clone();

        tasks.spawn(async move {
            let result = match semaphore.acquire_owned().await {
                Ok(_permit) if cancel.is_cancelled() => {
                    Err(ScoutError::Cancelled("before start".to_string()))
                }
                Ok(_permit) => {
                    crawl_payer(
                        &payer,
                        &settings,
                        factory.as_ref(),
                        probe.as_deref(),
                        cancel,
                    )
                    .await
                }
                Err(e) => Err(ScoutError::Task(e.to_string())),
            };
            (
                index,
                PayerOutcome {
                    organization: payer.name,
                    result,
                },
            )
        });
    }

    let mut outcomes = Vec::new();
    while let Some(joined) = tasks.join_next().await {
        match joined {
            Ok(outcome) => outcomes.push(outcome),
            Err(e) => tracing::error!("Crawl task failed: {}", e),
        }
    }

    outcomes.sort_by_key(|(index, _)| *index);
    outcomes.into_iter().map(|(_, outcome)| outcome).collect()
}
