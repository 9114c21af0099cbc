//! The single-request HTTP seam underneath [`Fetcher`](crate::Fetcher).
//!
//! A transport performs exactly one GET and reports what came back. It does not follow
//! redirects, retry, or judge status codes; those policies live in the fetcher so they can be
//! exercised against a scripted transport.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{ACCEPT, LOCATION};
use reqwest::{Client, redirect};
use url::Url;

use crate::config::ACCEPT_MARKDOWN;
use crate::{Error, Result};

/// What a single GET produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    /// Status code.
    pub status: u16,
    /// Canonical reason phrase, if the status has one.
    pub reason: Option<String>,
    /// Raw `Location` header value.
    pub location: Option<String>,
    /// Body decoded as UTF-8. Only read for 2xx responses; empty otherwise.
    pub body: String,
}

/// A request that never produced a response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportError {
    /// Connecting or reading took longer than the configured timeout.
    Timeout(String),
    /// DNS, refused or reset connections, TLS failures, truncated bodies and the like.
    Failed(String),
}

impl std::fmt::Display for TransportError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Timeout(msg) | Self::Failed(msg) => f.write_str(msg),
        }
    }
}

/// Performs one HTTP GET.
#[async_trait]
pub trait HttpTransport: Send + Sync {
    /// Issue a GET for `url` without following redirects.
    async fn get(&self, url: &Url) -> std::result::Result<HttpResponse, TransportError>;
}

/// [`HttpTransport`] backed by a `reqwest` client with redirects disabled.
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: Client,
}

impl ReqwestTransport {
    /// Build a client that applies `timeout` to connecting and to the whole request.
    pub fn new(timeout: Duration, user_agent: &str) -> Result<Self> {
        let client = Client::builder()
            .connect_timeout(timeout)
            .timeout(timeout)
            .user_agent(user_agent)
            .redirect(redirect::Policy::none())
            .gzip(true)
            .brotli(true)
            .build()
            .map_err(Error::Network)?;
        Ok(Self { client })
    }
}

fn classify(err: &reqwest::Error) -> TransportError {
    if err.is_timeout() {
        TransportError::Timeout(err.to_string())
    } else {
        TransportError::Failed(err.to_string())
    }
}

#[async_trait]
impl HttpTransport for ReqwestTransport {
    async fn get(&self, url: &Url) -> std::result::Result<HttpResponse, TransportError> {
        let response = self
            .client
            .get(url.clone())
            .header(ACCEPT, ACCEPT_MARKDOWN)
            .send()
            .await
            .map_err(|e| classify(&e))?;

        let status = response.status();
        let location = response
            .headers()
            .get(LOCATION)
            .and_then(|v| v.to_str().ok())
            .map(std::string::ToString::to_string);

        let body = if status.is_success() {
            let bytes = response.bytes().await.map_err(|e| classify(&e))?;
            String::from_utf8_lossy(&bytes).into_owned()
        } else {
            String::new()
        };

        Ok(HttpResponse {
            status: status.as_u16(),
            reason: status.canonical_reason().map(str::to_string),
            location,
            body,
        })
    }
}
