//! HTTP fetching with a timeout, a single redirect hop and linear retry.
//!
//! [`Fetcher`] drives an [`HttpTransport`] one request at a time. Transport failures are
//! retried up to [`RetryPolicy::max_retries`] attempts, sleeping `base_delay × attempt` in
//! between; timeouts, HTTP error statuses and redirect-limit violations end the fetch at once.

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info, warn};
use url::Url;

use crate::config::{DEFAULT_FETCH_TIMEOUT, DEFAULT_MAX_RETRIES, DEFAULT_RETRY_DELAY, FetchConfig};
use crate::transport::{HttpResponse, HttpTransport, ReqwestTransport, TransportError};
use crate::{FetchError, Result, SourceUrl};

/// Redirect hops followed within one attempt. A second redirect is an error.
pub const MAX_REDIRECT_HOPS: u32 = 1;

/// Bounded linear retry policy for transport failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Maximum attempts, including the first. Treated as at least 1.
    pub max_retries: u32,
    /// Backoff base.
    pub base_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: DEFAULT_MAX_RETRIES,
            base_delay: DEFAULT_RETRY_DELAY,
        }
    }
}

impl RetryPolicy {
    /// Sleep after failed attempt number `attempt` (1-based): `base_delay × attempt`.
    ///
    /// ```rust
    /// use std::time::Duration;
    /// use mdpull_core::RetryPolicy;
    ///
    /// let policy = RetryPolicy { max_retries: 3, base_delay: Duration::from_secs(1) };
    /// assert_eq!(policy.backoff_delay(1), Duration::from_secs(1));
    /// assert_eq!(policy.backoff_delay(2), Duration::from_secs(2));
    /// ```
    pub fn backoff_delay(&self, attempt: u32) -> Duration {
        self.base_delay.saturating_mul(attempt)
    }

    /// Delays slept between attempts when every attempt fails.
    pub fn schedule(&self) -> Vec<Duration> {
        (1..self.max_attempts()).map(|n| self.backoff_delay(n)).collect()
    }

    const fn max_attempts(&self) -> u32 {
        if self.max_retries == 0 { 1 } else { self.max_retries }
    }
}

/// Why a single attempt ended without content.
enum AttemptError {
    /// Worth another attempt.
    Transient(String),
    /// Retrying cannot change the outcome.
    Terminal(FetchError),
}

/// Fetches remote markdown with a timeout, one redirect hop and linear retry.
#[derive(Clone)]
pub struct Fetcher {
    transport: Arc<dyn HttpTransport>,
    retry: RetryPolicy,
    timeout: Duration,
}

impl Fetcher {
    /// Creates a fetcher with the default timeout, user agent and retry policy.
    pub fn new() -> Result<Self> {
        Self::from_config(&FetchConfig::default())
    }

    /// Creates a fetcher backed by `reqwest` using the given settings.
    pub fn from_config(config: &FetchConfig) -> Result<Self> {
        let transport = ReqwestTransport::new(config.timeout(), &config.user_agent)?;
        Ok(Self::with_transport(Arc::new(transport))
            .with_timeout_label(config.timeout())
            .with_retry(RetryPolicy {
                max_retries: config.max_retries,
                base_delay: config.retry_delay(),
            }))
    }

    /// Creates a fetcher over an arbitrary transport with default policies.
    pub fn with_transport(transport: Arc<dyn HttpTransport>) -> Self {
        Self {
            transport,
            retry: RetryPolicy::default(),
            timeout: DEFAULT_FETCH_TIMEOUT,
        }
    }

    /// Replace the retry policy.
    #[must_use]
    pub const fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// The timeout reported in [`FetchError::Timeout`]. Enforcement is the transport's job.
    #[must_use]
    pub const fn with_timeout_label(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Fetch `url`, returning the body of the final 2xx response.
    ///
    /// Transport failures other than timeouts are retried with linear backoff. HTTP status
    /// failures, timeouts and redirect-limit failures end the fetch immediately.
    pub async fn fetch(&self, url: &SourceUrl) -> std::result::Result<String, FetchError> {
        let max_attempts = self.retry.max_attempts();
        let mut attempt = 0;

        loop {
            attempt += 1;
            debug!(%url, attempt, "fetching");

            match self.attempt(url.as_url()).await {
                Ok(body) => {
                    if attempt > 1 {
                        info!(%url, attempts = attempt, "fetch succeeded after retry");
                    }
                    info!(%url, bytes = body.len(), "fetched document");
                    return Ok(body);
                },
                Err(AttemptError::Terminal(err)) => return Err(err),
                Err(AttemptError::Transient(last_error)) if attempt >= max_attempts => {
                    return Err(FetchError::ExhaustedRetries {
                        url: url.to_string(),
                        attempts: attempt,
                        last_error,
                    });
                },
                Err(AttemptError::Transient(error)) => {
                    let delay = self.retry.backoff_delay(attempt);
                    warn!(
                        %url,
                        %error,
                        attempt,
                        max_attempts,
                        delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
                        "transport failure, retrying"
                    );
                    tokio::time::sleep(delay).await;
                },
            }
        }
    }

    /// One attempt: the request plus at most [`MAX_REDIRECT_HOPS`] redirects.
    async fn attempt(&self, origin: &Url) -> std::result::Result<String, AttemptError> {
        let mut current = origin.clone();
        let mut hops = 0;

        loop {
            let response = self
                .transport
                .get(&current)
                .await
                .map_err(|e| self.classify_transport(&current, e))?;

            match response.status {
                200..=299 => return Ok(response.body),
                300..=399 => {
                    if hops >= MAX_REDIRECT_HOPS {
                        return Err(AttemptError::Terminal(FetchError::TooManyRedirects {
                            url: origin.to_string(),
                            max_hops: MAX_REDIRECT_HOPS,
                        }));
                    }
                    let next = redirect_target(&current, &response).map_err(AttemptError::Terminal)?;
                    debug!(from = %current, to = %next, "following redirect");
                    current = next;
                    hops += 1;
                },
                404 => {
                    return Err(AttemptError::Terminal(FetchError::NotFound {
                        url: current.to_string(),
                    }));
                },
                status => {
                    return Err(AttemptError::Terminal(FetchError::Http {
                        status,
                        message: response
                            .reason
                            .unwrap_or_else(|| "unexpected status".to_string()),
                    }));
                },
            }
        }
    }

    fn classify_transport(&self, url: &Url, err: TransportError) -> AttemptError {
        match err {
            TransportError::Timeout(_) => AttemptError::Terminal(FetchError::Timeout {
                url: url.to_string(),
                timeout_secs: self.timeout.as_secs(),
            }),
            TransportError::Failed(msg) => AttemptError::Transient(msg),
        }
    }
}

fn redirect_target(current: &Url, response: &HttpResponse) -> std::result::Result<Url, FetchError> {
    let Some(location) = response.location.as_deref().filter(|l| !l.trim().is_empty()) else {
        return Err(FetchError::Http {
            status: response.status,
            message: "redirect without a Location header".to_string(),
        });
    };

    let next = current.join(location.trim()).map_err(|e| FetchError::Http {
        status: response.status,
        message: format!("invalid redirect location '{location}': {e}"),
    })?;

    if !matches!(next.scheme(), "http" | "https") {
        return Err(FetchError::Http {
            status: response.status,
            message: format!("refusing to follow redirect to '{next}'"),
        });
    }
    Ok(next)
}

impl std::fmt::Debug for Fetcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Fetcher")
            .field("retry", &self.retry)
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::panic)]
mod tests {
    use super::*;
    use crate::validate;
    use async_trait::async_trait;
    use std::collections::VecDeque;
    use std::sync::Mutex;
    use tokio::time::Instant;
    use wiremock::{
        Mock, MockServer, ResponseTemplate,
        matchers::{method, path},
    };

    /// Replays canned results and records when each request arrived.
    struct ScriptedTransport {
        script: Mutex<VecDeque<std::result::Result<HttpResponse, TransportError>>>,
        calls: Mutex<Vec<(Url, Instant)>>,
    }

    impl ScriptedTransport {
        fn new(script: Vec<std::result::Result<HttpResponse, TransportError>>) -> Arc<Self> {
            Arc::new(Self {
                script: Mutex::new(script.into()),
                calls: Mutex::new(Vec::new()),
            })
        }

        fn calls(&self) -> Vec<(Url, Instant)> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl HttpTransport for ScriptedTransport {
        async fn get(&self, url: &Url) -> std::result::Result<HttpResponse, TransportError> {
            self.calls.lock().unwrap().push((url.clone(), Instant::now()));
            self.script
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| panic!("unexpected request to {url}"))
        }
    }

    fn ok(body: &str) -> std::result::Result<HttpResponse, TransportError> {
        Ok(HttpResponse {
            status: 200,
            reason: Some("OK".to_string()),
            location: None,
            body: body.to_string(),
        })
    }

    fn redirect(to: &str) -> std::result::Result<HttpResponse, TransportError> {
        Ok(HttpResponse {
            status: 302,
            reason: Some("Found".to_string()),
            location: Some(to.to_string()),
            body: String::new(),
        })
    }

    fn status(code: u16) -> std::result::Result<HttpResponse, TransportError> {
        Ok(HttpResponse {
            status: code,
            reason: None,
            location: None,
            body: String::new(),
        })
    }

    fn reset() -> std::result::Result<HttpResponse, TransportError> {
        Err(TransportError::Failed("connection reset by peer".to_string()))
    }

    fn url() -> SourceUrl {
        validate("https://example.com/docs/README.md").unwrap()
    }

    #[test]
    fn test_backoff_is_linear() {
        let policy = RetryPolicy {
            max_retries: 3,
            base_delay: Duration::from_millis(250),
        };
        assert_eq!(
            policy.schedule(),
            vec![Duration::from_millis(250), Duration::from_millis(500)]
        );
        assert_eq!(policy.backoff_delay(3), Duration::from_millis(750));

        let single = RetryPolicy {
            max_retries: 0,
            base_delay: Duration::from_secs(1),
        };
        assert!(single.schedule().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_two_transient_failures_then_success() {
        let transport = ScriptedTransport::new(vec![reset(), reset(), ok("# Third time\n")]);
        let fetcher = Fetcher::with_transport(transport.clone());

        let body = fetcher.fetch(&url()).await.unwrap();
        assert_eq!(body, "# Third time\n");

        let calls = transport.calls();
        assert_eq!(calls.len(), 3);
        let first_gap = calls[1].1 - calls[0].1;
        let second_gap = calls[2].1 - calls[1].1;
        assert_eq!(first_gap, Duration::from_secs(1));
        assert_eq!(second_gap, Duration::from_secs(2));
        assert!(second_gap > first_gap);
    }

    #[tokio::test(start_paused = true)]
    async fn test_exhausted_retries() {
        let transport = ScriptedTransport::new(vec![reset(), reset(), reset()]);
        let fetcher = Fetcher::with_transport(transport.clone());

        let err = fetcher.fetch(&url()).await.unwrap_err();
        match err {
            FetchError::ExhaustedRetries {
                url: failed,
                attempts,
                last_error,
            } => {
                assert_eq!(failed, "https://example.com/docs/README.md");
                assert_eq!(attempts, 3);
                assert!(last_error.contains("reset"));
            },
            other => panic!("expected ExhaustedRetries, got {other:?}"),
        }
        assert_eq!(transport.calls().len(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_status_failures_are_not_retried() {
        for (code, expect_not_found) in [(404, true), (500, false), (403, false)] {
            let transport = ScriptedTransport::new(vec![status(code)]);
            let fetcher = Fetcher::with_transport(transport.clone());

            let err = fetcher.fetch(&url()).await.unwrap_err();
            assert_eq!(matches!(err, FetchError::NotFound { .. }), expect_not_found);
            if !expect_not_found {
                assert!(matches!(err, FetchError::Http { status, .. } if status == code));
            }
            assert_eq!(transport.calls().len(), 1, "HTTP {code} must not be retried");
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_timeout_is_terminal() {
        let transport =
            ScriptedTransport::new(vec![Err(TransportError::Timeout("timed out".to_string()))]);
        let fetcher = Fetcher::with_transport(transport.clone());

        let err = fetcher.fetch(&url()).await.unwrap_err();
        assert!(matches!(err, FetchError::Timeout { timeout_secs: 10, .. }));
        assert_eq!(transport.calls().len(), 1);
    }

    #[tokio::test]
    async fn test_single_redirect_is_followed() {
        let transport = ScriptedTransport::new(vec![
            redirect("/docs/README-new.md"),
            ok("# Moved\n"),
        ]);
        let fetcher = Fetcher::with_transport(transport.clone());

        assert_eq!(fetcher.fetch(&url()).await.unwrap(), "# Moved\n");
        let calls = transport.calls();
        assert_eq!(
            calls[1].0.as_str(),
            "https://example.com/docs/README-new.md"
        );
    }

    #[tokio::test]
    async fn test_second_redirect_fails_without_retry() {
        let transport = ScriptedTransport::new(vec![
            redirect("https://mirror.example.com/README.md"),
            redirect("https://cdn.example.com/README.md"),
        ]);
        let fetcher = Fetcher::with_transport(transport.clone());

        let err = fetcher.fetch(&url()).await.unwrap_err();
        assert!(matches!(err, FetchError::TooManyRedirects { max_hops: 1, .. }));
        assert_eq!(transport.calls().len(), 2);
    }

    #[tokio::test]
    async fn test_redirect_without_location_or_to_other_scheme() {
        let transport = ScriptedTransport::new(vec![status(301)]);
        let err = Fetcher::with_transport(transport).fetch(&url()).await.unwrap_err();
        assert!(matches!(err, FetchError::Http { status: 301, .. }));

        let transport = ScriptedTransport::new(vec![redirect("ftp://example.com/README.md")]);
        let err = Fetcher::with_transport(transport).fetch(&url()).await.unwrap_err();
        assert!(matches!(err, FetchError::Http { status: 302, .. }));
    }

    #[tokio::test(start_paused = true)]
    async fn test_transient_failure_after_redirect_restarts_from_origin() {
        let transport = ScriptedTransport::new(vec![
            redirect("/docs/other.md"),
            reset(),
            ok("# Back\n"),
        ]);
        let fetcher = Fetcher::with_transport(transport.clone());

        assert_eq!(fetcher.fetch(&url()).await.unwrap(), "# Back\n");
        let calls = transport.calls();
        assert_eq!(calls.len(), 3);
        assert_eq!(calls[2].0.as_str(), "https://example.com/docs/README.md");
    }

    #[tokio::test]
    async fn test_reqwest_fetcher_against_mock_server() -> anyhow::Result<()> {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/start.md"))
            .respond_with(ResponseTemplate::new(301).insert_header("location", "/end.md"))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/end.md"))
            .respond_with(ResponseTemplate::new(200).set_body_string("# End\n"))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/loop-a.md"))
            .respond_with(ResponseTemplate::new(302).insert_header("location", "/loop-b.md"))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/loop-b.md"))
            .respond_with(ResponseTemplate::new(302).insert_header("location", "/end.md"))
            .mount(&server)
            .await;

        let fetcher = Fetcher::new()?;

        let start = validate(&format!("{}/start.md", server.uri()))?;
        assert_eq!(fetcher.fetch(&start).await?, "# End\n");

        let chained = validate(&format!("{}/loop-a.md", server.uri()))?;
        assert!(matches!(
            fetcher.fetch(&chained).await,
            Err(FetchError::TooManyRedirects { .. })
        ));

        let missing = validate(&format!("{}/missing.md", server.uri()))?;
        assert!(matches!(
            fetcher.fetch(&missing).await,
            Err(FetchError::NotFound { .. })
        ));
        Ok(())
    }
}
