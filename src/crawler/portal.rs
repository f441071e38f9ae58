//! Portal discovery - turns an organization into seed URLs
//!
//! Seeds are gathered in a fixed order, deduplicated and truncated:
//! 1. The known provider portal, if configured
//! 2. Portal URL templates that answer a HEAD probe with 2xx or 3xx
//! 3. Provider-related links on the organization's homepage

use super::fetcher::Fetcher;
use super::frontier::visit_key;
use super::parser::parse_page;
use crate::config::UserAgentConfig;
use crate::relevance::state_name;
use crate::url::strip_portal_prefix;
use async_trait::async_trait;
use reqwest::{redirect::Policy, Client};
use std::collections::HashSet;
use std::time::Duration;
use tracing::{debug, info};
use url::Url;

/// Portal URL templates, probed in this order; `{d}` is the base domain
pub const PORTAL_TEMPLATES: [&str; 10] = [
    "https://provider.{d}/",
    "https://providers.{d}/",
    "https://professional.{d}/",
    "https://portal.{d}/",
    "https://www.{d}/providers/",
    "https://www.{d}/provider/",
    "https://www.{d}/health-care-professionals/",
    "https://www.{d}/healthcare-professionals/",
    "https://www.{d}/provider-resources/",
    "https://www.{d}/en/providers/",
];

/// Homepage anchor text that marks a provider entry point
pub const PROVIDER_KEYWORDS: [&str; 7] = [
    "provider",
    "professional",
    "physician",
    "doctor",
    "practitioner",
    "health care professional",
    "medical professional",
];

/// Most populous states first
pub const PRIORITY_STATES: [&str; 10] = ["CA", "TX", "FL", "NY", "PA", "IL", "OH", "GA", "NC", "MI"];

/// State-specific URL patterns; `{d}` is the base domain, `{s}` the state
pub const STATE_TEMPLATES: [&str; 8] = [
    "https://www.{d}/providers/{s}/",
    "https://provider.{d}/{s}/",
    "https://providers.{d}/{s}/",
    "https://www.{d}/state/{s}/",
    "https://www.{d}/regional/{s}/",
    "https://www.{d}/{s}/providers/",
    "https://www.{d}/medicaid/{s}/",
    "https://www.{d}/medicare/{s}/",
];

/// Checks whether a candidate seed URL exists
#[async_trait]
pub trait SeedProbe: Send + Sync {
    async fn probe(&self, url: &Url) -> bool;
}

/// HEAD-request probe; redirects are followed and 2xx-3xx counts as valid
#[derive(Debug, Clone)]
pub struct HttpProbe {
    client: Client,
}

impl HttpProbe {
    pub fn new(user_agent: &UserAgentConfig, timeout: Duration) -> Result<Self, reqwest::Error> {
        let client = Client::builder()
            .user_agent(user_agent.header_value())
            .timeout(timeout)
            .redirect(Policy::limited(10))
            .build()?;
        Ok(Self { client })
    }
}

#[async_trait]
impl SeedProbe for HttpProbe {
    async fn probe(&self, url: &Url) -> bool {
        match self.client.head(url.clone()).send().await {
            Ok(response) => {
                let status = response.status();
                debug!("Probe {} -> {}", url, status);
                status.is_success() || status.is_redirection()
            }
            Err(e) => {
                debug!("Probe {} failed: {}", url, e);
                false
            }
        }
    }
}

/// Gathers seed URLs for one organization
pub struct PortalDiscoverer<'a, P: SeedProbe + ?Sized, F: Fetcher + ?Sized> {
    probe: Option<&'a P>,
    homepage_fetcher: Option<&'a F>,
    page_timeout: Duration,
    max_seeds: usize,
}

impl<'a, P: SeedProbe + ?Sized, F: Fetcher + ?Sized> PortalDiscoverer<'a, P, F> {
    pub fn new(max_seeds: usize) -> Self {
        Self {
            probe: None,
            homepage_fetcher: None,
            page_timeout: Duration::from_secs(30),
            max_seeds,
        }
    }

    /// Enables template probing
    pub fn with_probe(mut self, probe: &'a P) -> Self {
        self.probe = Some(probe);
        self
    }

    /// Enables the homepage scan, fetched through `fetcher`
    pub fn with_homepage_scan(mut self, fetcher: &'a F, page_timeout: Duration) -> Self {
        self.homepage_fetcher = Some(fetcher);
        self.page_timeout = page_timeout;
        self
    }

    /// Returns the ordered, deduplicated seeds, at most `max_seeds` of them
    pub async fn discover_seeds(
        &self,
        org_name: &str,
        base_domain: &str,
        known_portal: Option<&Url>,
    ) -> Vec<Url> {
        let domain = strip_portal_prefix(base_domain);
        let mut seeds = SeedList::new(self.max_seeds);

        if let Some(portal) = known_portal {
            seeds.push(portal.clone());
        }

        if let Some(probe) = self.probe {
            for candidate in portal_candidates(&domain) {
                if seeds.is_full() {
                    break;
                }
                if probe.probe(&candidate).await {
                    seeds.push(candidate);
                }
            }
        }

        if let Some(fetcher) = self.homepage_fetcher {
            if !seeds.is_full() {
                for link in self.homepage_links(fetcher, &domain).await {
                    seeds.push(link);
                }
            }
        }

        let seeds = seeds.into_vec();
        info!("{}: discovered {} seed(s)", org_name, seeds.len());
        seeds
    }

    async fn homepage_links(&self, fetcher: &F, domain: &str) -> Vec<Url> {
        let Ok(homepage) = Url::parse(&format!("https://www.{}/", domain)) else {
            return Vec::new();
        };

        match fetcher.fetch(&homepage, self.page_timeout).await {
            Ok(page) => provider_links(&page.html, &page.final_url),
            Err(e) => {
                debug!("Homepage {} unavailable: {}", homepage, e);
                Vec::new()
            }
        }
    }
}

/// Links whose anchor text mentions a provider keyword, in document order
pub fn provider_links(html: &str, page_url: &Url) -> Vec<Url> {
    parse_page(html, page_url)
        .links
        .iter()
        .filter(|link| {
            let text = link.anchor_text.to_lowercase();
            PROVIDER_KEYWORDS.iter().any(|kw| text.contains(kw))
        })
        .map(|link| link.url.clone())
        .collect()
}

/// The fixed portal templates expanded for a domain
pub fn portal_candidates(domain: &str) -> Vec<Url> {
    PORTAL_TEMPLATES
        .iter()
        .filter_map(|template| Url::parse(&template.replace("{d}", domain)).ok())
        .collect()
}

/// Up to `limit` state-specific URL guesses for a domain
///
/// Walks the priority states in order; each state yields its patterns with
/// the postal code first, then with the hyphenated state name.
pub fn state_candidates(base_domain: &str, limit: usize) -> Vec<Url> {
    let domain = strip_portal_prefix(base_domain);
    let mut urls = Vec::new();

    for code in PRIORITY_STATES {
        let name = state_name(code).unwrap_or(code).replace(' ', "-");
        let code = code.to_lowercase();
        for template in STATE_TEMPLATES {
            for state in [code.as_str(), name.as_str()] {
                if urls.len() >= limit {
                    return urls;
                }
                let candidate = template.replace("{d}", &domain).replace("{s}", state);
                if let Ok(url) = Url::parse(&candidate) {
                    urls.push(url);
                }
            }
        }
    }

    urls
}

/// Ordered seed accumulator with deduplication by normalized URL
struct SeedList {
    urls: Vec<Url>,
    keys: HashSet<String>,
    limit: usize,
}

impl SeedList {
    fn new(limit: usize) -> Self {
        Self {
            urls: Vec::new(),
            keys: HashSet::new(),
            limit,
        }
    }

    fn push(&mut self, url: Url) {
        if self.is_full() || !matches!(url.scheme(), "http" | "https") {
            return;
        }
        if self.keys.insert(visit_key(&url)) {
            self.urls.push(url);
        }
    }

    fn is_full(&self) -> bool {
        self.urls.len() >= self.limit
    }

    fn into_vec(self) -> Vec<Url> {
        self.urls
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crawler::types::{FetchFailure, FetchedPage};

    struct AllowList(Vec<&'static str>);

    #[async_trait]
    impl SeedProbe for AllowList {
        async fn probe(&self, url: &Url) -> bool {
            self.0.contains(&url.as_str())
        }
    }

    struct Homepage(&'static str);

    #[async_trait]
    impl Fetcher for Homepage {
        async fn fetch(&self, url: &Url, _timeout: Duration) -> Result<FetchedPage, FetchFailure> {
            Ok(FetchedPage {
                final_url: url.clone(),
                html: self.0.to_string(),
            })
        }
    }

    const HOMEPAGE: &str = r#"<html><body>
        <a href="/about">About us</a>
        <a href="/for-providers">For Providers</a>
        <a href="https://docs.anthem.com/physicians">Physician resources</a>
        <a href="/members">Members</a>
    </body></html>"#;

    #[test]
    fn test_portal_candidates_order() {
        let urls = portal_candidates("anthem.com");
        assert_eq!(urls.len(), 10);
        assert_eq!(urls[0].as_str(), "https://provider.anthem.com/");
        assert_eq!(urls[4].as_str(), "https://www.anthem.com/providers/");
        assert_eq!(urls[9].as_str(), "https://www.anthem.com/en/providers/");
    }

    #[test]
    fn test_provider_links() {
        let base = Url::parse("https://www.anthem.com/").unwrap();
        let links: Vec<_> = provider_links(HOMEPAGE, &base)
            .into_iter()
            .map(|u| u.to_string())
            .collect();
        assert_eq!(
            links,
            vec![
                "https://www.anthem.com/for-providers",
                "https://docs.anthem.com/physicians",
            ]
        );
    }

    #[test]
    fn test_state_candidates() {
        let urls = state_candidates("www.aetna.com", 4);
        let urls: Vec<_> = urls.iter().map(|u| u.as_str()).collect();
        assert_eq!(
            urls,
            vec![
                "https://www.aetna.com/providers/ca/",
                "https://www.aetna.com/providers/california/",
                "https://provider.aetna.com/ca/",
                "https://provider.aetna.com/california/",
            ]
        );
        assert!(state_candidates("aetna.com", 0).is_empty());
        assert_eq!(state_candidates("aetna.com", 1000).len(), 160);
    }

    #[test]
    fn test_state_candidates_hyphenate_names() {
        let urls = state_candidates("x.test", 160);
        assert!(urls
            .iter()
            .any(|u| u.as_str() == "https://www.x.test/medicaid/new-york/"));
        assert!(urls
            .iter()
            .any(|u| u.as_str() == "https://www.x.test/medicaid/oh/"));
    }

    #[tokio::test]
    async fn test_discover_known_portal_first() {
        let probe = AllowList(vec!["https://providers.anthem.com/", "https://www.anthem.com/provider/"]);
        let known = Url::parse("https://providers.anthem.com").unwrap();
        let discoverer: PortalDiscoverer<'_, _, Homepage> =
            PortalDiscoverer::new(5).with_probe(&probe);

        let seeds = discoverer
            .discover_seeds("Anthem", "anthem.com", Some(&known))
            .await;
        let seeds: Vec<_> = seeds.iter().map(|u| u.as_str()).collect();
        // The probed duplicate of the known portal is dropped
        assert_eq!(
            seeds,
            vec!["https://providers.anthem.com/", "https://www.anthem.com/provider/"]
        );
    }

    #[tokio::test]
    async fn test_discover_truncates_to_max_seeds() {
        let probe = AllowList(PORTAL_TEMPLATES.iter().map(|_| "").collect());
        let homepage = Homepage(HOMEPAGE);
        let discoverer = PortalDiscoverer::new(1)
            .with_probe(&probe)
            .with_homepage_scan(&homepage, Duration::from_secs(5));

        let seeds = discoverer.discover_seeds("Anthem", "anthem.com", None).await;
        assert_eq!(seeds.len(), 1);
        assert_eq!(seeds[0].as_str(), "https://www.anthem.com/for-providers");
    }

    #[tokio::test]
    async fn test_discover_with_nothing_found() {
        let discoverer: PortalDiscoverer<'_, AllowList, Homepage> = PortalDiscoverer::new(5);
        let seeds = discoverer.discover_seeds("Nobody", "nobody.test", None).await;
        assert!(seeds.is_empty());
    }
}
