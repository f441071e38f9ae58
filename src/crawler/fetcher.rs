//! Page fetching
//!
//! This module defines the [`Fetcher`] seam used by the crawl loop and the
//! plain HTTP implementation:
//! - Building HTTP clients with proper user agent strings
//! - GET requests that follow redirects and report the final URL
//! - Error classification into [`FetchFailure`]
//!
//! The headless-browser implementation lives in `crawler::browser`.

use super::types::{FetchFailure, FetchedPage};
use crate::config::UserAgentConfig;
use async_trait::async_trait;
use reqwest::{redirect::Policy, Client};
use std::time::Duration;
use url::Url;

/// Turns a URL into rendered HTML
///
/// Implementations must return within `timeout`. The session additionally
/// wraps every call in its own timeout, so an implementation that overruns is
/// cancelled rather than waited for.
#[async_trait]
pub trait Fetcher: Send + Sync {
    async fn fetch(&self, url: &Url, timeout: Duration) -> Result<FetchedPage, FetchFailure>;

    /// Releases whatever the fetcher holds open. Called once when a session ends.
    async fn shutdown(&self) {}
}

#[async_trait]
impl<T: Fetcher + ?Sized> Fetcher for Box<T> {
    async fn fetch(&self, url: &Url, timeout: Duration) -> Result<FetchedPage, FetchFailure> {
        (**self).fetch(url, timeout).await
    }

    async fn shutdown(&self) {
        (**self).shutdown().await
    }
}

/// Builds an HTTP client with proper configuration
///
/// # Example
///
/// ```no_run
/// use payer_scout::config::UserAgentConfig;
/// use payer_scout::crawler::build_http_client;
/// use std::time::Duration;
///
/// let client = build_http_client(&UserAgentConfig::default(), Duration::from_secs(30)).unwrap();
/// ```
pub fn build_http_client(config: &UserAgentConfig, timeout: Duration) -> Result<Client, reqwest::Error> {
    Client::builder()
        .user_agent(config.header_value())
        .timeout(timeout)
        .connect_timeout(Duration::from_secs(10))
        .redirect(Policy::limited(10))
        .gzip(true)
        .brotli(true)
        .build()
}

/// Fetches pages with a single GET, without executing scripts
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    pub fn new(config: &UserAgentConfig, timeout: Duration) -> Result<Self, reqwest::Error> {
        Ok(Self::with_client(build_http_client(config, timeout)?))
    }

    pub fn with_client(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Fetcher for HttpFetcher {
    async fn fetch(&self, url: &Url, timeout: Duration) -> Result<FetchedPage, FetchFailure> {
        let response = self
            .client
            .get(url.clone())
            .timeout(timeout)
            .send()
            .await
            .map_err(classify_error)?;

        let status = response.status();
        if !(status.is_success() || status.is_redirection()) {
            return Err(FetchFailure::Blocked {
                status: status.as_u16(),
            });
        }

        let final_url = response.url().clone();
        let html = response.text().await.map_err(classify_error)?;

        Ok(FetchedPage { final_url, html })
    }
}

fn classify_error(e: reqwest::Error) -> FetchFailure {
    if e.is_timeout() {
        FetchFailure::Timeout
    } else if e.is_connect() {
        FetchFailure::NetworkError(format!("connection failed: {}", e))
    } else {
        FetchFailure::NetworkError(e.to_string())
    }
}
