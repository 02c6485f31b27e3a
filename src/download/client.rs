//! HTTP client wrapper shared by discovery, extraction and image downloads.
//!
//! This module provides the `HttpClient` struct which owns the pooled
//! reqwest client, the fixed User-Agent and the retry policy applied to every
//! GET and HEAD request.

use std::time::Duration;

use reqwest::header::RETRY_AFTER;
use reqwest::{Client, Method, Response, StatusCode};
use tracing::{debug, info, instrument};

use super::constants::{CONNECT_TIMEOUT_SECS, POOL_MAX_IDLE_PER_HOST, READ_TIMEOUT_SECS};
use super::error::FetchError;
use super::retry::{RetryDecision, RetryPolicy, classify_error, parse_retry_after};
use crate::user_agent;

/// Construction settings for [`HttpClient`].
#[derive(Debug, Clone)]
pub struct ClientSettings {
    /// Time allowed to establish a connection.
    pub connect_timeout: Duration,
    /// Time allowed between received bytes.
    pub read_timeout: Duration,
    /// Idle connections kept per host.
    pub pool_max_idle_per_host: usize,
    /// User-Agent sent with every request.
    pub user_agent: String,
    /// Retry policy for transient failures.
    pub retry_policy: RetryPolicy,
}

impl Default for ClientSettings {
    fn default() -> Self {
        Self {
            connect_timeout: Duration::from_secs(CONNECT_TIMEOUT_SECS),
            read_timeout: Duration::from_secs(READ_TIMEOUT_SECS),
            pool_max_idle_per_host: POOL_MAX_IDLE_PER_HOST,
            user_agent: user_agent::default_user_agent(),
            retry_policy: RetryPolicy::default(),
        }
    }
}

/// Pooled HTTP client with transparent retry on transient failures.
///
/// Create it once per run and reuse it for every request so connections to
/// the catalog site are kept alive.
///
/// # Example
///
/// ```no_run
/// use kitchen_scraper::download::{ClientSettings, HttpClient};
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let client = HttpClient::with_settings(ClientSettings::default())?;
/// let html = client.fetch_page("https://www.creokitchens.it/it/cucine").await?;
/// println!("{} bytes of listing markup", html.len());
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct HttpClient {
    client: Client,
    retry_policy: RetryPolicy,
}

impl Default for HttpClient {
    fn default() -> Self {
        Self::new()
    }
}

impl HttpClient {
    /// Creates a new HTTP client with default settings.
    ///
    /// # Panics
    ///
    /// Panics if the HTTP client builder fails to build with the static
    /// configuration. This should never happen in practice.
    #[must_use]
    #[allow(clippy::expect_used)]
    pub fn new() -> Self {
        Self::with_settings(ClientSettings::default())
            .expect("failed to build HTTP client with static configuration")
    }

    /// Creates a new HTTP client from explicit settings.
    ///
    /// # Errors
    ///
    /// Returns the reqwest builder error when the TLS backend or resolver
    /// cannot be initialised.
    #[instrument(level = "debug", skip(settings), fields(user_agent = %settings.user_agent))]
    pub fn with_settings(settings: ClientSettings) -> Result<Self, reqwest::Error> {
        let client = Client::builder()
            .connect_timeout(settings.connect_timeout)
            .read_timeout(settings.read_timeout)
            .pool_max_idle_per_host(settings.pool_max_idle_per_host)
            .gzip(true)
            .user_agent(settings.user_agent)
            .build()?;
        Ok(Self {
            client,
            retry_policy: settings.retry_policy,
        })
    }

    /// Fetches an HTML page and returns its body as text.
    ///
    /// # Errors
    ///
    /// Returns [`FetchError::HttpStatus`] for any final status other than
    /// 200, and transport errors once retries are exhausted.
    #[instrument(skip(self), fields(url = %url))]
    pub async fn fetch_page(&self, url: &str) -> Result<String, FetchError> {
        let response = self.get(url).await?;
        let status = response.status();
        if status != StatusCode::OK {
            return Err(FetchError::http_status(url, status.as_u16()));
        }
        let body = response
            .text()
            .await
            .map_err(|e| FetchError::from_reqwest(url, e))?;
        debug!(bytes = body.len(), "page fetched");
        Ok(body)
    }

    /// Sends a GET request, retrying transient failures.
    ///
    /// # Errors
    ///
    /// Returns [`FetchError::HttpStatus`] for a final 4xx/5xx status and
    /// transport errors once retries are exhausted.
    pub async fn get(&self, url: &str) -> Result<Response, FetchError> {
        self.send_with_retry(Method::GET, url).await
    }

    /// Sends a HEAD request (redirects followed), retrying transient failures.
    ///
    /// # Errors
    ///
    /// Same as [`get`](Self::get).
    pub async fn head(&self, url: &str) -> Result<Response, FetchError> {
        self.send_with_retry(Method::HEAD, url).await
    }

    async fn send_with_retry(&self, method: Method, url: &str) -> Result<Response, FetchError> {
        let mut attempt = 0u32;

        loop {
            attempt += 1;

            let error = match self.send_once(method.clone(), url).await {
                Ok(response) => return Ok(response),
                Err(error) => error,
            };

            let failure_type = classify_error(&error);
            match self.retry_policy.should_retry(failure_type, attempt) {
                RetryDecision::Retry {
                    delay: backoff_delay,
                    attempt: next_attempt,
                } => {
                    let retry_after_delay = retry_after_of(&error);
                    let delay = retry_after_delay.unwrap_or(backoff_delay);
                    info!(
                        %method,
                        url,
                        attempt = next_attempt,
                        max_attempts = self.retry_policy.max_attempts(),
                        delay_ms = delay.as_millis(),
                        using_retry_after = retry_after_delay.is_some(),
                        error = %error,
                        "retrying request"
                    );
                    tokio::time::sleep(delay).await;
                }
                RetryDecision::DoNotRetry { reason } => {
                    debug!(%method, url, %reason, "not retrying request");
                    return Err(error);
                }
            }
        }
    }

    async fn send_once(&self, method: Method, url: &str) -> Result<Response, FetchError> {
        let parsed = url::Url::parse(url).map_err(|_| FetchError::invalid_url(url))?;

        let response = self
            .client
            .request(method, parsed)
            .send()
            .await
            .map_err(|e| FetchError::from_reqwest(url, e))?;

        let status = response.status();
        if status.is_client_error() || status.is_server_error() {
            let retry_after = response
                .headers()
                .get(RETRY_AFTER)
                .and_then(|v| v.to_str().ok())
                .map(std::string::ToString::to_string);
            return Err(FetchError::http_status_with_retry_after(
                url,
                status.as_u16(),
                retry_after,
            ));
        }

        Ok(response)
    }
}

fn retry_after_of(error: &FetchError) -> Option<Duration> {
    match error {
        FetchError::HttpStatus {
            retry_after: Some(value),
            ..
        } => parse_retry_after(value),
        _ => None,
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn fast_client(max_retries: u32) -> HttpClient {
        HttpClient::with_settings(ClientSettings {
            retry_policy: RetryPolicy::new(
                max_retries + 1,
                Duration::from_millis(1),
                Duration::from_millis(5),
                2.0,
            )
            .with_max_jitter(Duration::ZERO),
            ..ClientSettings::default()
        })
        .unwrap()
    }

    #[tokio::test]
    async fn test_fetch_page_returns_body() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/it/cucine"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>ok</html>"))
            .mount(&mock_server)
            .await;

        let client = fast_client(0);
        let body = client
            .fetch_page(&format!("{}/it/cucine", mock_server.uri()))
            .await
            .unwrap();
        assert_eq!(body, "<html>ok</html>");
    }

    #[tokio::test]
    async fn test_fetch_page_non_200_success_is_error() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(204))
            .mount(&mock_server)
            .await;

        let result = fast_client(0).fetch_page(&mock_server.uri()).await;
        assert!(matches!(result, Err(FetchError::HttpStatus { status: 204, .. })));
    }

    #[tokio::test]
    async fn test_fetch_page_404_not_retried() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(404))
            .expect(1)
            .mount(&mock_server)
            .await;

        let result = fast_client(3).fetch_page(&mock_server.uri()).await;
        assert!(matches!(result, Err(FetchError::HttpStatus { status: 404, .. })));
    }

    #[tokio::test]
    async fn test_transient_status_retried_until_success() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/page"))
            .respond_with(ResponseTemplate::new(503))
            .up_to_n_times(2)
            .mount(&mock_server)
            .await;
        Mock::given(method("GET"))
            .and(path("/page"))
            .respond_with(ResponseTemplate::new(200).set_body_string("recovered"))
            .mount(&mock_server)
            .await;

        let body = fast_client(4)
            .fetch_page(&format!("{}/page", mock_server.uri()))
            .await
            .unwrap();
        assert_eq!(body, "recovered");
    }

    #[tokio::test]
    async fn test_transient_status_gives_up_after_budget() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(502))
            .expect(3)
            .mount(&mock_server)
            .await;

        let result = fast_client(2).fetch_page(&mock_server.uri()).await;
        assert!(matches!(result, Err(FetchError::HttpStatus { status: 502, .. })));
    }

    #[tokio::test]
    async fn test_head_retries_rate_limited() {
        let mock_server = MockServer::start().await;
        Mock::given(method("HEAD"))
            .respond_with(ResponseTemplate::new(429).insert_header("Retry-After", "0"))
            .up_to_n_times(1)
            .mount(&mock_server)
            .await;
        Mock::given(method("HEAD"))
            .respond_with(ResponseTemplate::new(200))
            .mount(&mock_server)
            .await;

        let response = fast_client(1).head(&mock_server.uri()).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_requests_send_configured_user_agent() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(header("user-agent", user_agent::BROWSER_USER_AGENT))
            .respond_with(ResponseTemplate::new(200).set_body_string("ua ok"))
            .mount(&mock_server)
            .await;

        let body = fast_client(0).fetch_page(&mock_server.uri()).await.unwrap();
        assert_eq!(body, "ua ok");
    }

    #[tokio::test]
    async fn test_invalid_url_is_not_retried() {
        let result = fast_client(3).fetch_page("not a url").await;
        assert!(matches!(result, Err(FetchError::InvalidUrl { .. })));
    }

    #[test]
    fn test_retry_after_of_reads_header_value() {
        let error = FetchError::http_status_with_retry_after("http://x", 503, Some("3".into()));
        assert_eq!(retry_after_of(&error), Some(Duration::from_secs(3)));
        assert_eq!(retry_after_of(&FetchError::timeout("http://x")), None);
    }
}
