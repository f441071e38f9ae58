//! Integration tests for the HTTP fetcher and the seed probe
//!
//! These tests use wiremock to stand up a real HTTP server, so the whole
//! reqwest path (redirects, status handling, body decoding) is exercised.

use payer_scout::config::UserAgentConfig;
use payer_scout::crawler::{
    CrawlBudget, CrawlPlan, CrawlSession, FetchFailure, Fetcher, HttpFetcher, HttpProbe,
    SeedProbe,
};
use payer_scout::state::Termination;
use payer_scout::url::AllowedDomainSet;
use std::time::Duration;
use url::Url;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn test_user_agent() -> UserAgentConfig {
    UserAgentConfig {
        crawler_name: "TestBot".to_string(),
        crawler_version: "1.0.0".to_string(),
        contact_url: "https://example.com/contact".to_string(),
        contact_email: "test@example.com".to_string(),
    }
}

fn fetcher() -> HttpFetcher {
    HttpFetcher::new(&test_user_agent(), Duration::from_secs(5)).expect("Failed to build fetcher")
}

fn html_page(body: &str) -> ResponseTemplate {
    ResponseTemplate::new(200)
        .insert_header("content-type", "text/html; charset=utf-8")
        .set_body_string(format!("<html><body>{}</body></html>", body))
}

#[tokio::test]
async fn test_fetch_success_sends_user_agent() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/providers"))
        .and(header(
            "user-agent",
            "TestBot/1.0.0 (+https://example.com/contact; test@example.com)",
        ))
        .respond_with(html_page("<h1>Provider resources</h1>"))
        .expect(1)
        .mount(&mock_server)
        .await;

    let url = Url::parse(&format!("{}/providers", mock_server.uri())).unwrap();
    let page = fetcher()
        .fetch(&url, Duration::from_secs(5))
        .await
        .expect("Fetch failed");

    assert_eq!(page.final_url, url);
    assert!(page.html.contains("Provider resources"));
}

#[tokio::test]
async fn test_fetch_reports_redirect_target() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/old"))
        .respond_with(
            ResponseTemplate::new(301)
                .insert_header("location", format!("{}/new", mock_server.uri()).as_str()),
        )
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/new"))
        .respond_with(html_page("moved here"))
        .mount(&mock_server)
        .await;

    let url = Url::parse(&format!("{}/old", mock_server.uri())).unwrap();
    let page = fetcher()
        .fetch(&url, Duration::from_secs(5))
        .await
        .expect("Fetch failed");

    assert_eq!(page.final_url.path(), "/new");
    assert!(page.html.contains("moved here"));
}

#[tokio::test]
async fn test_fetch_forbidden_is_blocked() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/members"))
        .respond_with(ResponseTemplate::new(403))
        .mount(&mock_server)
        .await;

    let url = Url::parse(&format!("{}/members", mock_server.uri())).unwrap();
    let result = fetcher().fetch(&url, Duration::from_secs(5)).await;

    assert_eq!(result.unwrap_err(), FetchFailure::Blocked { status: 403 });
}

#[tokio::test]
async fn test_fetch_slow_response_times_out() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/slow"))
        .respond_with(html_page("late").set_delay(Duration::from_secs(3)))
        .mount(&mock_server)
        .await;

    let url = Url::parse(&format!("{}/slow", mock_server.uri())).unwrap();
    let result = fetcher().fetch(&url, Duration::from_millis(200)).await;

    assert_eq!(result.unwrap_err(), FetchFailure::Timeout);
}

#[tokio::test]
async fn test_probe_accepts_success_and_redirect() {
    let mock_server = MockServer::start().await;

    Mock::given(method("HEAD"))
        .and(path("/provider"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&mock_server)
        .await;
    Mock::given(method("HEAD"))
        .and(path("/providers"))
        .respond_with(
            ResponseTemplate::new(301)
                .insert_header("location", format!("{}/provider", mock_server.uri()).as_str()),
        )
        .mount(&mock_server)
        .await;
    Mock::given(method("HEAD"))
        .and(path("/missing"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&mock_server)
        .await;

    let probe = HttpProbe::new(&test_user_agent(), Duration::from_secs(5)).unwrap();
    let at = |p: &str| Url::parse(&format!("{}{}", mock_server.uri(), p)).unwrap();

    assert!(probe.probe(&at("/provider")).await);
    assert!(probe.probe(&at("/providers")).await);
    assert!(!probe.probe(&at("/missing")).await);
}

#[tokio::test]
async fn test_session_over_http() {
    let mock_server = MockServer::start().await;
    let base = mock_server.uri();

    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(html_page(
            r#"<a href="/providers">Provider resources</a>
               <a href="/careers">Careers</a>
               <a href="/docs/TX_Provider_Manual.pdf">Texas provider manual</a>"#,
        ))
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/providers"))
        .respond_with(html_page(
            r#"<a href="/claims">Claims</a>
               <a href="/docs/appeals.pdf">Appeals form</a>"#,
        ))
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/claims"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&mock_server)
        .await;

    let seed = Url::parse(&format!("{}/", base)).unwrap();
    let host = seed.host_str().unwrap().to_string();
    let plan = CrawlPlan::new(
        "Mock Health",
        vec![seed],
        AllowedDomainSet::new([host]).unwrap(),
    );
    let budget = CrawlBudget {
        max_depth: 2,
        max_urls: 20,
        max_duration: Duration::from_secs(30),
        politeness_delay: Duration::from_millis(10),
        page_timeout: Duration::from_secs(5),
    };

    let result = CrawlSession::new(plan, budget, fetcher())
        .unwrap()
        .run()
        .await;

    assert_eq!(result.termination, Termination::FrontierExhausted);
    let paths: Vec<_> = result.urls_visited.iter().map(|u| u.path()).collect();
    assert_eq!(paths, vec!["/", "/providers", "/claims"]);

    assert_eq!(result.coverage.total_pages_visited, 2);
    assert_eq!(result.failed_fetches.len(), 1);
    assert_eq!(result.failed_fetches[0].kind, "blocked");

    assert_eq!(result.discovered_documents.len(), 2);
    let texas = &result.discovered_documents[0];
    assert!(texas.regional_tags.contains("TX"));
    assert_eq!(result.discovered_documents[1].discovery_depth, 1);
    assert!(result.coverage.states_covered.contains("TX"));
}
