//! Error types for the Canvas SDK
//!
//! This module defines the error hierarchy for the entire SDK.
//! All public APIs return `Result<T, Error>` where Error is defined here.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Message fragment Canvas uses for throttled requests.
///
/// Matching on it is the fallback for errors that lost their type
/// (wrapped in strings or decoded from a JSON body).
pub const RATE_LIMIT_MESSAGE: &str = "Rate Limit Exceeded";

/// The main error type for the Canvas SDK
#[derive(Error, Debug)]
pub enum Error {
    // ============================================================================
    // Pagination Metadata Errors
    // ============================================================================
    #[error("Malformed pagination metadata: {message}")]
    MalformedPaginationMetadata { message: String },

    #[error("Missing pagination relation: rel=\"{relation}\"")]
    MissingPaginationRelation { relation: String },

    // ============================================================================
    // HTTP Errors
    // ============================================================================
    #[error("HTTP request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Authentication failed ({status}): {}", join_messages(.messages))]
    Authentication {
        status: String,
        messages: Vec<String>,
    },

    #[error("403 Forbidden (Rate Limit Exceeded){}", remaining_suffix(.remaining))]
    RateLimitExceeded { remaining: Option<f64> },

    #[error("API error (HTTP {status}): {message}")]
    Api {
        status: u16,
        message: String,
        errors: Vec<String>,
    },

    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    // ============================================================================
    // Data Processing Errors
    // ============================================================================
    #[error("Failed to decode page {page}: {message}")]
    Decode { page: usize, message: String },

    #[error("Failed to parse JSON: {0}")]
    JsonParse(#[from] serde_json::Error),

    // ============================================================================
    // Configuration Errors
    // ============================================================================
    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("Missing required config field: {field}")]
    MissingConfigField { field: String },

    #[error("Failed to parse YAML: {0}")]
    YamlParse(#[from] serde_yaml::Error),

    // ============================================================================
    // Runtime Errors
    // ============================================================================
    #[error("Page worker for page {page} failed: {message}")]
    Worker { page: u32, message: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    Other(String),
}

fn join_messages(messages: &[String]) -> String {
    if messages.is_empty() {
        "no details".to_string()
    } else {
        messages.join("; ")
    }
}

fn remaining_suffix(remaining: &Option<f64>) -> String {
    remaining
        .map(|r| format!(", remaining quota {r}"))
        .unwrap_or_default()
}

impl Error {
    /// Create a malformed pagination metadata error
    pub fn malformed_links(message: impl Into<String>) -> Self {
        Self::MalformedPaginationMetadata {
            message: message.into(),
        }
    }

    /// Create a missing relation error
    pub fn missing_relation(relation: impl Into<String>) -> Self {
        Self::MissingPaginationRelation {
            relation: relation.into(),
        }
    }

    /// Create an authentication error
    pub fn authentication(status: impl Into<String>, messages: Vec<String>) -> Self {
        Self::Authentication {
            status: status.into(),
            messages,
        }
    }

    /// Create a generic API error
    pub fn api(status: u16, message: impl Into<String>) -> Self {
        Self::Api {
            status,
            message: message.into(),
            errors: Vec::new(),
        }
    }

    /// Create a decode error for a 0-indexed page
    pub fn decode(page: usize, message: impl Into<String>) -> Self {
        Self::Decode {
            page,
            message: message.into(),
        }
    }

    /// Create a config error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Create a missing field error
    pub fn missing_field(field: impl Into<String>) -> Self {
        Self::MissingConfigField {
            field: field.into(),
        }
    }

    /// Check if this error signals API throttling.
    ///
    /// Typed variants are matched first; anything else falls back to a
    /// case-insensitive search for [`RATE_LIMIT_MESSAGE`] in the rendered
    /// message.
    pub fn is_rate_limit(&self) -> bool {
        match self {
            Error::RateLimitExceeded { .. } => true,
            Error::Api { status: 429, .. } => true,
            other => contains_ignore_case(&other.to_string(), RATE_LIMIT_MESSAGE),
        }
    }

    /// Check if this error is an authentication failure
    pub fn is_auth_error(&self) -> bool {
        match self {
            Error::Authentication { .. } => true,
            Error::Api { status: 401, .. } => true,
            other => {
                let rendered = other.to_string();
                contains_ignore_case(&rendered, "Authentication failed")
                    || contains_ignore_case(&rendered, "user authorization required")
            }
        }
    }

    /// Check if this error came from the pagination metadata of page 1
    pub fn is_pagination_metadata(&self) -> bool {
        matches!(
            self,
            Error::MalformedPaginationMetadata { .. } | Error::MissingPaginationRelation { .. }
        )
    }
}

fn contains_ignore_case(haystack: &str, needle: &str) -> bool {
    haystack
        .to_ascii_lowercase()
        .contains(&needle.to_ascii_lowercase())
}

/// Free-function form of [`Error::is_rate_limit`]
pub fn is_rate_limit_error(err: &Error) -> bool {
    err.is_rate_limit()
}

/// Free-function form of [`Error::is_auth_error`]
pub fn is_auth_error(err: &Error) -> bool {
    err.is_auth_error()
}

/// Error body returned by Canvas for non-2xx responses.
///
/// Canvas is not consistent here: most endpoints send
/// `{"errors": [{"message": ".."}]}`, some send `{"message": ".."}`, and
/// auth failures add a `status` string.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ApiErrorBody {
    /// Status string, e.g. "unauthenticated"
    #[serde(default)]
    pub status: Option<String>,
    /// Top-level message
    #[serde(default)]
    pub message: Option<String>,
    /// Structured sub-messages
    #[serde(default)]
    pub errors: Vec<ApiErrorMessage>,
}

/// One entry of [`ApiErrorBody::errors`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiErrorMessage {
    pub message: String,
}

impl ApiErrorBody {
    /// Parse a response body, falling back to treating it as plain text
    pub fn parse(body: &[u8]) -> Self {
        match serde_json::from_slice::<Self>(body) {
            Ok(parsed) => parsed,
            Err(_) => {
                let text = String::from_utf8_lossy(body).trim().to_string();
                Self {
                    message: (!text.is_empty()).then_some(text),
                    ..Self::default()
                }
            }
        }
    }

    /// All messages, structured ones first
    pub fn messages(&self) -> Vec<String> {
        let mut out: Vec<String> = self.errors.iter().map(|e| e.message.clone()).collect();
        if let Some(message) = &self.message {
            out.push(message.clone());
        }
        out
    }
}

/// Result type alias for the Canvas SDK
pub type Result<T> = std::result::Result<T, Error>;

/// Extension trait for adding context to errors
pub trait ResultExt<T> {
    /// Add context to an error
    fn context(self, message: impl Into<String>) -> Result<T>;

    /// Add context with a closure (lazy evaluation)
    fn with_context<F: FnOnce() -> String>(self, f: F) -> Result<T>;
}

impl<T, E: Into<Error>> ResultExt<T> for std::result::Result<T, E> {
    fn context(self, message: impl Into<String>) -> Result<T> {
        self.map_err(|e| {
            let inner = e.into();
            Error::Other(format!("{}: {}", message.into(), inner))
        })
    }

    fn with_context<F: FnOnce() -> String>(self, f: F) -> Result<T> {
        self.map_err(|e| {
            let inner = e.into();
            Error::Other(format!("{}: {}", f(), inner))
        })
    }
}
