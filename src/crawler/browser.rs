//! Headless Chromium fetcher
//!
//! Portals targeted by the crawler build their navigation client-side, so
//! the default fetcher renders every page in a real browser: it navigates,
//! waits for `document.readyState == "complete"`, lets asynchronous content
//! settle for a bounded delay, then reads back the DOM.

use super::fetcher::Fetcher;
use super::types::{FetchFailure, FetchedPage};
use crate::config::UserAgentConfig;
use crate::ScoutError;
use async_trait::async_trait;
use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::error::CdpError;
use chromiumoxide::Page;
use futures_util::stream::StreamExt;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tracing::{debug, warn};
use url::Url;

const READY_POLL_INTERVAL: Duration = Duration::from_millis(100);

const READY_STATE_JS: &str = "document.readyState";

// responseStatus is missing on older engines and 0 for some cached loads
const NAVIGATION_STATUS_JS: &str = "(() => { \
    const nav = performance.getEntriesByType('navigation')[0]; \
    return nav && nav.responseStatus ? nav.responseStatus : null; \
})()";

/// Renders pages in one headless Chromium instance
///
/// Pages are opened one at a time and closed after each fetch. The browser
/// and its CDP event loop live until [`Fetcher::shutdown`] is called.
pub struct BrowserFetcher {
    browser: Mutex<Option<Browser>>,
    handler: Mutex<Option<JoinHandle<()>>>,
    settle_delay: Duration,
}

impl BrowserFetcher {
    /// Launches Chromium and spawns its event handler
    pub async fn launch(
        user_agent: &UserAgentConfig,
        page_timeout: Duration,
        settle_delay: Duration,
    ) -> Result<Self, ScoutError> {
        let config = BrowserConfig::builder()
            .no_sandbox()
            .request_timeout(page_timeout)
            .arg(format!("--user-agent={}", user_agent.header_value()))
            .build()
            .map_err(ScoutError::Browser)?;

        let (browser, mut handler) = Browser::launch(config)
            .await
            .map_err(|e| ScoutError::Browser(e.to_string()))?;

        let handler = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if let Err(e) = event {
                    debug!("Browser handler event error: {}", e);
                }
            }
        });

        Ok(Self {
            browser: Mutex::new(Some(browser)),
            handler: Mutex::new(Some(handler)),
            settle_delay,
        })
    }

    async fn render(&self, page: &Page, url: &Url) -> Result<FetchedPage, FetchFailure> {
        page.goto(url.as_str()).await.map_err(cdp_failure)?;
        wait_until_ready(page).await?;
        tokio::time::sleep(self.settle_delay).await;

        if let Some(status) = navigation_status(page).await {
            if !(200..400).contains(&status) {
                return Err(FetchFailure::Blocked { status });
            }
        }

        let html = page.content().await.map_err(cdp_failure)?;
        let final_url = page
            .url()
            .await
            .ok()
            .flatten()
            .and_then(|u| Url::parse(&u).ok())
            .unwrap_or_else(|| url.clone());

        Ok(FetchedPage { final_url, html })
    }
}

/// An open browser tab
#[async_trait]
trait Tab: Send + 'static {
    async fn close_tab(self);
}

#[async_trait]
impl Tab for Page {
    async fn close_tab(self) {
        if let Err(e) = self.close().await {
            debug!("Failed to close page: {}", e);
        }
    }
}

/// Closes its tab exactly once: explicitly via [`TabGuard::close`], or from a
/// spawned task if the fetch future is dropped mid-render
struct TabGuard<T: Tab> {
    tab: Option<T>,
}

impl<T: Tab> TabGuard<T> {
    fn new(tab: T) -> Self {
        Self { tab: Some(tab) }
    }

    async fn close(mut self) {
        if let Some(tab) = self.tab.take() {
            tab.close_tab().await;
        }
    }
}

impl<T: Tab> Drop for TabGuard<T> {
    fn drop(&mut self) {
        if let Some(tab) = self.tab.take() {
            match tokio::runtime::Handle::try_current() {
                Ok(runtime) => {
                    runtime.spawn(tab.close_tab());
                }
                Err(_) => warn!("No runtime to close an abandoned page"),
            }
        }
    }
}

#[async_trait]
impl Fetcher for BrowserFetcher {
    async fn fetch(&self, url: &Url, timeout: Duration) -> Result<FetchedPage, FetchFailure> {
        let deadline = tokio::time::Instant::now() + timeout;

        let page = {
            let guard = self.browser.lock().await;
            let browser = guard
                .as_ref()
                .ok_or_else(|| FetchFailure::NetworkError("browser already shut down".to_string()))?;
            browser.new_page("about:blank").await.map_err(cdp_failure)?
        };
        let tab = TabGuard::new(page.clone());

        let result = tokio::time::timeout_at(deadline, self.render(&page, url)).await;
        tab.close().await;

        match result {
            Ok(rendered) => rendered,
            Err(_) => Err(FetchFailure::Timeout),
        }
    }

    async fn shutdown(&self) {
        if let Some(mut browser) = self.browser.lock().await.take() {
            if let Err(e) = browser.close().await {
                warn!("Failed to close browser: {}", e);
            }
            if let Err(e) = browser.wait().await {
                debug!("Browser process did not exit cleanly: {}", e);
            }
        }

        if let Some(handler) = self.handler.lock().await.take() {
            handler.abort();
            let _ = handler.await;
        }
    }
}

async fn wait_until_ready(page: &Page) -> Result<(), FetchFailure> {
    loop {
        let state: String = page
            .evaluate(READY_STATE_JS)
            .await
            .map_err(cdp_failure)?
            .into_value()
            .map_err(|e| FetchFailure::NetworkError(e.to_string()))?;

        if state == "complete" {
            return Ok(());
        }
        tokio::time::sleep(READY_POLL_INTERVAL).await;
    }
}

async fn navigation_status(page: &Page) -> Option<u16> {
    page.evaluate(NAVIGATION_STATUS_JS)
        .await
        .ok()?
        .into_value::<Option<u16>>()
        .ok()
        .flatten()
}

fn cdp_failure(e: CdpError) -> FetchFailure {
    match e {
        CdpError::Timeout => FetchFailure::Timeout,
        other => FetchFailure::NetworkError(other.to_string()),
    }
}
