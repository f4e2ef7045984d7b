//! HTTP transport for the Canvas REST API
//!
//! Every listing call goes through [`HttpClient::get_with_config`]:
//! resolve the path against the API root, wait for the client-side
//! throttle, attach the current credentials, send, classify the status.
//!
//! Failed requests are reported, never retried.

use super::rate_limit::{RateLimiter, RateLimiterConfig};
use crate::auth::{AuthConfig, Authenticator};
use crate::error::{ApiErrorBody, Error, Result};
use crate::types::QueryOptions;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use reqwest::{Client, Response, StatusCode};
use serde::de::DeserializeOwned;
use std::collections::HashMap;
use std::time::Duration;
use tracing::{debug, warn};
use url::Url;

/// Response header carrying the caller's remaining API quota
pub const RATE_LIMIT_REMAINING_HEADER: &str = "x-rate-limit-remaining";

/// Transport settings shared by every request of one client
#[derive(Debug, Clone)]
pub struct HttpClientConfig {
    /// API root, e.g. `https://school.instructure.com/api/v1`.
    /// Relative paths are appended to it.
    pub base_url: Option<String>,
    pub timeout: Duration,
    /// `None` sends requests unthrottled
    pub rate_limit: Option<RateLimiterConfig>,
    /// Sent on every request
    pub default_headers: HashMap<String, String>,
    pub user_agent: String,
}

impl Default for HttpClientConfig {
    fn default() -> Self {
        Self {
            base_url: None,
            timeout: Duration::from_secs(30),
            rate_limit: Some(RateLimiterConfig::default()),
            default_headers: HashMap::new(),
            user_agent: format!("canvas-sdk/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

impl HttpClientConfig {
    pub fn builder() -> HttpClientConfigBuilder {
        HttpClientConfigBuilder::default()
    }

    fn header_map(&self) -> Result<HeaderMap> {
        let mut headers = HeaderMap::with_capacity(self.default_headers.len());
        for (name, value) in &self.default_headers {
            let name = HeaderName::from_bytes(name.as_bytes())
                .map_err(|e| Error::config(format!("invalid header name '{name}': {e}")))?;
            let value = HeaderValue::from_str(value)
                .map_err(|e| Error::config(format!("invalid value for header '{name}': {e}")))?;
            headers.insert(name, value);
        }
        Ok(headers)
    }
}

/// Fluent construction of an [`HttpClientConfig`]
#[derive(Debug, Default)]
pub struct HttpClientConfigBuilder {
    config: HttpClientConfig,
}

impl HttpClientConfigBuilder {
    #[must_use]
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.config.base_url = Some(url.into());
        self
    }

    #[must_use]
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.config.timeout = timeout;
        self
    }

    /// Throttle requests client-side
    #[must_use]
    pub fn rate_limit(mut self, limit: RateLimiterConfig) -> Self {
        self.config.rate_limit = Some(limit);
        self
    }

    /// Send requests as fast as the caller issues them
    #[must_use]
    pub fn no_rate_limit(mut self) -> Self {
        self.config.rate_limit = None;
        self
    }

    /// Header attached to every request
    #[must_use]
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.config.default_headers.insert(name.into(), value.into());
        self
    }

    #[must_use]
    pub fn user_agent(mut self, agent: impl Into<String>) -> Self {
        self.config.user_agent = agent.into();
        self
    }

    pub fn build(self) -> HttpClientConfig {
        self.config
    }
}

/// Per-request additions on top of the client defaults
#[derive(Debug, Clone, Default)]
pub struct RequestConfig {
    /// Query parameters, in send order. Repeated keys are kept.
    pub query: QueryOptions,
    pub headers: HashMap<String, String>,
    /// Replaces the client timeout for this request only
    pub timeout: Option<Duration>,
}

impl RequestConfig {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn query(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.push((key.into(), value.into()));
        self
    }

    #[must_use]
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    #[must_use]
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }
}

/// Authenticated, throttled GET transport
pub struct HttpClient {
    client: Client,
    base_url: Option<String>,
    authenticator: Authenticator,
    rate_limiter: Option<RateLimiter>,
}

impl HttpClient {
    /// Client without credentials
    pub fn with_config(config: HttpClientConfig) -> Result<Self> {
        Self::with_auth(config, AuthConfig::None)
    }

    pub fn with_auth(config: HttpClientConfig, auth_config: AuthConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.timeout)
            .user_agent(config.user_agent.as_str())
            .default_headers(config.header_map()?)
            .build()?;

        Ok(Self {
            client,
            rate_limiter: config.rate_limit.as_ref().map(RateLimiter::new),
            base_url: config.base_url,
            authenticator: Authenticator::new(auth_config),
        })
    }

    /// Shared credentials; rotating them affects requests not yet sent
    pub fn authenticator(&self) -> &Authenticator {
        &self.authenticator
    }

    pub fn has_rate_limiter(&self) -> bool {
        self.rate_limiter.is_some()
    }

    pub async fn get(&self, path: &str) -> Result<Response> {
        self.get_with_config(path, RequestConfig::default()).await
    }

    /// Send one GET and classify the response status.
    ///
    /// Any non-2xx status is turned into an error; see [`classify_status`].
    pub async fn get_with_config(&self, path: &str, config: RequestConfig) -> Result<Response> {
        let url = self.resolve(path)?;

        if let Some(limiter) = &self.rate_limiter {
            limiter.wait().await;
        }

        let mut req = self.client.get(url.clone());
        for (name, value) in &config.headers {
            req = req.header(name.as_str(), value.as_str());
        }
        if !config.query.is_empty() {
            req = req.query(&config.query);
        }
        if let Some(timeout) = config.timeout {
            req = req.timeout(timeout);
        }
        // credentials last, so a token rotated mid-run is picked up
        req = self.authenticator.apply(req);

        let response = classify_status(req.send().await?).await?;
        debug!(%url, status = response.status().as_u16(), "GET ok");
        Ok(response)
    }

    /// GET `path` and deserialize the JSON body
    pub async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        let body = self.get(path).await?.bytes().await?;
        Ok(serde_json::from_slice(&body)?)
    }

    /// Absolute URLs pass through; anything else hangs off the API root
    fn resolve(&self, path: &str) -> Result<Url> {
        if let Ok(url) = Url::parse(path) {
            return Ok(url);
        }
        let joined = match &self.base_url {
            Some(base) => format!(
                "{}/{}",
                base.trim_end_matches('/'),
                path.trim_start_matches('/')
            ),
            None => path.to_string(),
        };
        Ok(Url::parse(&joined)?)
    }
}

impl std::fmt::Debug for HttpClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpClient")
            .field("base_url", &self.base_url)
            .field("authenticator", &self.authenticator)
            .field("rate_limiter", &self.rate_limiter)
            .finish_non_exhaustive()
    }
}

/// Map a response onto the Canvas error taxonomy.
///
/// - 2xx passes through untouched
/// - 401 and 404 are authentication failures (Canvas answers 404 for
///   collections the token may not see)
/// - 403 and 429 are rate-limit rejections, with the remaining quota
///   captured when the server reports it
/// - anything else is a generic API error carrying the decoded body
pub async fn classify_status(response: Response) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let remaining = remaining_quota(&response);
    let body = response.bytes().await.unwrap_or_default();
    let parsed = ApiErrorBody::parse(&body);

    Err(error_for_status(status, remaining, &parsed))
}

fn error_for_status(status: StatusCode, remaining: Option<f64>, body: &ApiErrorBody) -> Error {
    match status {
        StatusCode::UNAUTHORIZED | StatusCode::NOT_FOUND => {
            let label = body
                .status
                .clone()
                .unwrap_or_else(|| status.to_string());
            Error::authentication(label, body.messages())
        }
        StatusCode::FORBIDDEN | StatusCode::TOO_MANY_REQUESTS => {
            warn!(?remaining, "Canvas rejected request: rate limit exceeded");
            Error::RateLimitExceeded { remaining }
        }
        _ => {
            let errors = body.messages();
            let message = errors.first().cloned().unwrap_or_else(|| {
                status
                    .canonical_reason()
                    .unwrap_or("unexpected status")
                    .to_string()
            });
            Error::Api {
                status: status.as_u16(),
                message,
                errors,
            }
        }
    }
}

fn remaining_quota(response: &Response) -> Option<f64> {
    response
        .headers()
        .get(RATE_LIMIT_REMAINING_HEADER)
        .and_then(|v| v.to_str().ok())
        .and_then(|s| s.trim().parse().ok())
}
