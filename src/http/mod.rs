//! HTTP client module
//!
//! Provides the Canvas transport: base URL handling, client-side rate
//! limiting, credentials applied per request and status classification.
//!
//! # Features
//!
//! - **Rate Limiting**: Token bucket rate limiter using governor
//! - **Authentication**: Credentials read at send time, so a rotated or
//!   revoked token affects every request not yet sent
//! - **Status Mapping**: 401/404 → authentication, 403/429 → rate limit,
//!   other non-2xx → API error
//!
//! There is no retry logic: a failed request is reported once.

mod client;
mod rate_limit;

pub use client::{
    classify_status, HttpClient, HttpClientConfig, HttpClientConfigBuilder, RequestConfig,
    RATE_LIMIT_REMAINING_HEADER,
};
pub use rate_limit::{RateLimiter, RateLimiterConfig};
