//! Async HTTP client wrapping reqwest.
//!
//! One shared client serves both page fetches and bundle item fetches:
//! desktop-browser user agent, bounded redirect following, response caching
//! disabled. Timeouts are per request and cover connect through body read.

use anyhow::Result;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, CACHE_CONTROL};
use std::time::Duration;
use url::Url;

/// Browser user agent sent on every outbound request.
const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) \
                          AppleWebKit/537.36 (KHTML, like Gecko) \
                          Chrome/120 Safari/537.36";

/// Accept header sent when fetching a page body.
const ACCEPT_HTML: &str = "text/html,application/xhtml+xml";

/// Response from a text GET request.
#[derive(Debug, Clone)]
pub struct FetchedText {
    /// HTTP status code.
    pub status: u16,
    /// Response body as text.
    pub body: String,
}

impl FetchedText {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Response from a binary GET request.
#[derive(Debug, Clone)]
pub struct FetchedBytes {
    /// HTTP status code.
    pub status: u16,
    /// Raw response body.
    pub body: Vec<u8>,
}

impl FetchedBytes {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// HTTP client shared by the discovery and bundling engines.
#[derive(Clone)]
pub struct Fetcher {
    client: reqwest::Client,
}

impl Fetcher {
    /// Create a new client with a standard Chrome user-agent and caching
    /// disabled.
    pub fn new() -> Self {
        let mut headers = HeaderMap::new();
        headers.insert(CACHE_CONTROL, HeaderValue::from_static("no-cache"));

        let client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .default_headers(headers)
            .redirect(reqwest::redirect::Policy::limited(5))
            .build()
            .unwrap_or_default();

        Self { client }
    }

    /// GET a page body as text.
    pub async fn get_text(&self, url: &Url, timeout: Duration) -> Result<FetchedText> {
        let resp = self
            .client
            .get(url.clone())
            .header(ACCEPT, ACCEPT_HTML)
            .timeout(timeout)
            .send()
            .await?;

        let status = resp.status().as_u16();
        let body = resp.text().await?;

        Ok(FetchedText { status, body })
    }

    /// GET a raw body.
    pub async fn get_bytes(&self, url: &Url, timeout: Duration) -> Result<FetchedBytes> {
        let resp = self.client.get(url.clone()).timeout(timeout).send().await?;

        let status = resp.status().as_u16();
        let body = resp.bytes().await?.to_vec();

        Ok(FetchedBytes { status, body })
    }
}

impl Default for Fetcher {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn url(server: &MockServer, p: &str) -> Url {
        Url::parse(&format!("{}{p}", server.uri())).unwrap()
    }

    #[tokio::test]
    async fn test_page_fetch_sends_browser_headers() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/page"))
            .and(header("user-agent", USER_AGENT))
            .and(header("cache-control", "no-cache"))
            .and(header("accept", ACCEPT_HTML))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html></html>"))
            .expect(1)
            .mount(&server)
            .await;

        let fetched = Fetcher::new()
            .get_text(&url(&server, "/page"), Duration::from_secs(5))
            .await
            .unwrap();
        assert!(fetched.is_success());
        assert_eq!(fetched.body, "<html></html>");
    }

    #[tokio::test]
    async fn test_non_success_status_is_reported_not_errored() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/missing"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let fetched = Fetcher::new()
            .get_text(&url(&server, "/missing"), Duration::from_secs(5))
            .await
            .unwrap();
        assert_eq!(fetched.status, 404);
        assert!(!fetched.is_success());
    }

    #[tokio::test]
    async fn test_timeout_fails_the_request() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/slow"))
            .respond_with(
                ResponseTemplate::new(200).set_delay(Duration::from_secs(5)),
            )
            .mount(&server)
            .await;

        let result = Fetcher::new()
            .get_text(&url(&server, "/slow"), Duration::from_millis(200))
            .await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_get_bytes_handles_binary_bodies() {
        let server = MockServer::start().await;
        let payload = vec![0u8, 159, 146, 150, 255];
        Mock::given(method("GET"))
            .and(path("/blob"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(payload.clone()))
            .mount(&server)
            .await;

        let fetched = Fetcher::new()
            .get_bytes(&url(&server, "/blob"), Duration::from_secs(5))
            .await
            .unwrap();
        assert_eq!(fetched.body, payload);
    }
}
