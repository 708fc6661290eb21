//! HTTP fetch utilities for the AMP optimizer.
//!
//! Transformers never talk to the network directly. They receive a
//! [`RemoteGetRequest`] implementation, so callers decide the transport:
//! [`ReqwestTransport`] for real requests, [`StubTransport`] for tests and
//! offline runs.

use std::cell::RefCell;
use std::collections::HashMap;
use std::time::Duration;

use thiserror::Error;

/// User-Agent header sent with all requests.
const USER_AGENT: &str = concat!("ampopt/", env!("CARGO_PKG_VERSION"));

/// Default request timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Failure to obtain a response at all. HTTP error statuses are not errors;
/// they come back as a [`Response`] with the status set.
#[derive(Debug, Error)]
pub enum FetchError {
    /// The HTTP client could not be constructed.
    #[error("failed to create HTTP client: {0}")]
    Client(#[source] reqwest::Error),
    /// The request failed before a response arrived.
    #[error("request to {url} failed: {source}")]
    Request {
        /// Requested URL.
        url: String,
        /// Underlying transport error.
        #[source]
        source: reqwest::Error,
    },
    /// The response body could not be read as text.
    #[error("failed to read response body from {url}: {source}")]
    Body {
        /// Requested URL.
        url: String,
        /// Underlying transport error.
        #[source]
        source: reqwest::Error,
    },
    /// A stub transport had no canned response for the URL.
    #[error("no response registered for {0}")]
    Unavailable(String),
}

/// A received HTTP response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    /// HTTP status code.
    pub status: u16,
    /// Response body decoded as text.
    pub body: String,
}

impl Response {
    /// A `200 OK` response with the given body.
    #[must_use]
    pub fn ok(body: impl Into<String>) -> Self {
        Self {
            status: 200,
            body: body.into(),
        }
    }

    /// Whether the status is in the 2xx range.
    #[must_use]
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Capability to perform a blocking HTTP GET.
pub trait RemoteGetRequest {
    /// Fetch `url`.
    ///
    /// # Errors
    ///
    /// Returns [`FetchError`] when no response could be obtained.
    fn get(&self, url: &str) -> Result<Response, FetchError>;
}

/// [`RemoteGetRequest`] backed by a blocking `reqwest` client.
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: reqwest::blocking::Client,
}

impl ReqwestTransport {
    /// Create a transport with [`DEFAULT_TIMEOUT`].
    ///
    /// # Errors
    ///
    /// Returns [`FetchError::Client`] if the HTTP client cannot be created.
    pub fn new() -> Result<Self, FetchError> {
        Self::with_timeout(DEFAULT_TIMEOUT)
    }

    /// Create a transport whose requests give up after `timeout`.
    ///
    /// # Errors
    ///
    /// Returns [`FetchError::Client`] if the HTTP client cannot be created.
    pub fn with_timeout(timeout: Duration) -> Result<Self, FetchError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .user_agent(USER_AGENT)
            .build()
            .map_err(FetchError::Client)?;
        Ok(Self { client })
    }
}

impl RemoteGetRequest for ReqwestTransport {
    fn get(&self, url: &str) -> Result<Response, FetchError> {
        tracing::info!(url, "fetching remote resource");
        let response = self
            .client
            .get(url)
            .send()
            .map_err(|source| FetchError::Request {
                url: url.to_string(),
                source,
            })?;

        let status = response.status().as_u16();
        let body = response.text().map_err(|source| FetchError::Body {
            url: url.to_string(),
            source,
        })?;
        Ok(Response { status, body })
    }
}

/// [`RemoteGetRequest`] serving canned responses, keyed by exact URL.
///
/// Every requested URL is recorded, so callers can assert what was fetched.
#[derive(Debug, Default)]
pub struct StubTransport {
    responses: HashMap<String, Response>,
    requests: RefCell<Vec<String>>,
}

impl StubTransport {
    /// A transport that knows no URLs.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register the response returned for `url`.
    #[must_use]
    pub fn with_response(mut self, url: impl Into<String>, response: Response) -> Self {
        let _ = self.responses.insert(url.into(), response);
        self
    }

    /// URLs requested so far, in order.
    #[must_use]
    pub fn requests(&self) -> Vec<String> {
        self.requests.borrow().clone()
    }
}

impl RemoteGetRequest for StubTransport {
    fn get(&self, url: &str) -> Result<Response, FetchError> {
        self.requests.borrow_mut().push(url.to_string());
        self.responses
            .get(url)
            .cloned()
            .ok_or_else(|| FetchError::Unavailable(url.to_string()))
    }
}
