//! Resilient HTTP client
//!
//! Outbound GET requests go through a `reqwest` client wrapped with
//! `reqwest-retry`, so transient upstream failures are retried with
//! exponential backoff before they surface to a provider. Providers only see
//! a final response or an exhausted transport failure.

use std::time::Duration;

use reqwest::header::HeaderMap;
use reqwest::{Response, Url};
use reqwest_middleware::{ClientBuilder, ClientWithMiddleware};
use reqwest_retry::policies::ExponentialBackoff;
use reqwest_retry::{Jitter, Retryable, RetryableStrategy, RetryTransientMiddleware};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, instrument};

/// Number of retries after the first attempt
pub const MAX_RETRIES: u32 = 3;

/// Per-attempt timeout
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Response statuses that are retried
pub const RETRY_STATUS_CODES: [u16; 4] = [500, 502, 503, 504];

const USER_AGENT: &str = concat!("PlantGuard/", env!("CARGO_PKG_VERSION"));

#[derive(Debug, Error)]
pub enum HttpError {
    #[error("Invalid request URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("Request failed: {0}")]
    Transport(#[from] reqwest_middleware::Error),

    #[error("Failed to build HTTP client: {0}")]
    Client(#[from] reqwest::Error),
}

/// Backoff bounds between retries
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetryConfig {
    /// Wait before the first retry, in milliseconds
    #[serde(default = "default_min_backoff_ms")]
    pub min_backoff_ms: u64,
    /// Upper bound for any single wait, in milliseconds
    #[serde(default = "default_max_backoff_ms")]
    pub max_backoff_ms: u64,
}

fn default_min_backoff_ms() -> u64 {
    1_000
}

fn default_max_backoff_ms() -> u64 {
    4_000
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            min_backoff_ms: default_min_backoff_ms(),
            max_backoff_ms: default_max_backoff_ms(),
        }
    }
}

impl RetryConfig {
    /// Waits double from `min_backoff_ms` up to `max_backoff_ms`, without jitter
    fn policy(&self) -> ExponentialBackoff {
        ExponentialBackoff::builder()
            .jitter(Jitter::None)
            .retry_bounds(
                Duration::from_millis(self.min_backoff_ms),
                Duration::from_millis(self.max_backoff_ms),
            )
            .build_with_max_retries(MAX_RETRIES)
    }
}

/// Retries server errors from `RETRY_STATUS_CODES` and transient transport failures
struct ServerErrorStrategy;

impl RetryableStrategy for ServerErrorStrategy {
    fn handle(
        &self,
        res: &Result<Response, reqwest_middleware::Error>,
    ) -> Option<Retryable> {
        match res {
            Ok(response) if RETRY_STATUS_CODES.contains(&response.status().as_u16()) => {
                debug!(status = %response.status(), "Retrying server error");
                Some(Retryable::Transient)
            }
            Ok(_) => None,
            Err(error) => reqwest_retry::default_on_request_failure(error),
        }
    }
}

/// HTTP client with bounded retries, shared by all providers
#[derive(Debug, Clone)]
pub struct HttpClient {
    client: ClientWithMiddleware,
}

impl HttpClient {
    /// Create a client with the default backoff
    pub fn new() -> Result<Self, HttpError> {
        Self::with_retry(&RetryConfig::default())
    }

    /// Create a client with custom backoff bounds
    pub fn with_retry(retry: &RetryConfig) -> Result<Self, HttpError> {
        let inner = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .user_agent(USER_AGENT)
            .build()?;

        let client = ClientBuilder::new(inner)
            .with(RetryTransientMiddleware::new_with_policy_and_strategy(
                retry.policy(),
                ServerErrorStrategy,
            ))
            .build();

        Ok(Self { client })
    }

    /// Issue a GET request, retrying transient failures
    ///
    /// Query pairs are encoded into the URL in order; a key may repeat. The
    /// response is returned whatever its status once retries are settled.
    #[instrument(level = "debug", skip(self, headers, query))]
    pub async fn get(
        &self,
        url: &str,
        headers: HeaderMap,
        query: &[(&str, String)],
    ) -> Result<Response, HttpError> {
        let url = build_url(url, query)?;
        let response = self.client.get(url).headers(headers).send().await?;
        debug!(status = %response.status(), "GET completed");
        Ok(response)
    }
}

fn build_url(base: &str, query: &[(&str, String)]) -> Result<Url, url::ParseError> {
    if query.is_empty() {
        Url::parse(base)
    } else {
        Url::parse_with_params(base, query.iter().map(|(k, v)| (*k, v.as_str())))
    }
}
