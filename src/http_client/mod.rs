//! HTTP transport used for every non-rendering request.
//!
//! The crawler only talks to the network through the [`Transport`] trait so the
//! pagination and session logic can be driven by scripted responses in tests.

mod response;
mod user_agent;

pub use response::{HttpRequest, HttpResponse};
pub use user_agent::{resolve_user_agent, IMPERSONATE_USER_AGENTS, USER_AGENT};

use std::time::{Duration, Instant};

use async_trait::async_trait;
use reqwest::Client;
use thiserror::Error;
use tracing::debug;
use url::Url;

/// Transport-level failure (connection, timeout, body read).
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("request to {url} failed: {message}")]
    Request { url: String, message: String },
    #[error("failed to build HTTP client: {0}")]
    Client(String),
}

/// Anything that can carry an [`HttpRequest`] and return the full response.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, TransportError>;
}

/// reqwest-backed transport with a persistent cookie store.
///
/// Cookies set by the session navigation are replayed on every later call,
/// which the search backend requires alongside the header tokens.
#[derive(Clone)]
pub struct HttpClient {
    client: Client,
}

impl HttpClient {
    /// Create a new HTTP client with the default user agent.
    pub fn new(timeout: Duration) -> Result<Self, TransportError> {
        Self::with_user_agent(timeout, None)
    }

    /// Create a new HTTP client with custom user agent configuration.
    /// - None: Use default crawler user agent
    /// - Some("impersonate"): Use random real browser user agent
    /// - Some(custom): Use custom user agent string
    pub fn with_user_agent(
        timeout: Duration,
        user_agent_config: Option<&str>,
    ) -> Result<Self, TransportError> {
        let user_agent = resolve_user_agent(user_agent_config);
        let client = Client::builder()
            .user_agent(&user_agent)
            .timeout(timeout)
            .cookie_store(true)
            .gzip(true)
            .brotli(true)
            .build()
            .map_err(|e| TransportError::Client(e.to_string()))?;

        Ok(Self { client })
    }
}

#[async_trait]
impl Transport for HttpClient {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, TransportError> {
        let url = request.url.clone();
        let request_error = |e: reqwest::Error| TransportError::Request {
            url: url.clone(),
            message: e.to_string(),
        };

        let mut builder = self.client.request(request.method.clone(), &request.url);
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        if let Some((user, password)) = &request.basic_auth {
            builder = builder.basic_auth(user, Some(password));
        }
        if let Some(body) = &request.body {
            builder = builder.json(body);
        }

        let start = Instant::now();
        let response = builder.send().await.map_err(request_error)?;
        let status = response.status();

        let body = response.bytes().await.map_err(request_error)?.to_vec();
        debug!(
            "{} {} -> {} ({} bytes, {:?})",
            request.method,
            request.url,
            status.as_u16(),
            body.len(),
            start.elapsed()
        );

        Ok(HttpResponse { status, body })
    }
}

/// Append `path` to `origin` as plain text.
///
/// The origin's own path prefix is kept, and `path` can never leave the
/// origin's host.
pub fn origin_url(origin: &Url, path: &str) -> String {
    format!("{}{}", origin.as_str().trim_end_matches('/'), path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_origin_url_keeps_path_prefix() {
        let origin = Url::parse("http://localhost:9000/mirror/").unwrap();
        assert_eq!(
            origin_url(&origin, "/en/condos/1"),
            "http://localhost:9000/mirror/en/condos/1"
        );
    }

    #[test]
    fn test_origin_url_stays_on_origin_host() {
        let origin = Url::parse("https://www.centris.ca").unwrap();
        assert_eq!(
            origin_url(&origin, "//elsewhere.example/x"),
            "https://www.centris.ca//elsewhere.example/x"
        );
    }
}
