//! Client configuration
//!
//! A [`ClientConfig`] can be built in code, loaded from YAML, and then
//! overridden from the environment:
//!
//! ```yaml
//! base_url: https://school.instructure.com/api/v1
//! token: 7~abc...
//! page_size: 50
//! max_concurrency: 8
//! rate_limit:
//!   requests_per_second: 5
//!   burst_size: 10
//! ```

use crate::auth::{AuthConfig, Location};
use crate::error::{Error, Result, ResultExt};
use crate::http::{HttpClientConfig, RateLimiterConfig};
use crate::pagination::PaginatorConfig;
use crate::types::{LogLevel, OptionStringExt, DEFAULT_PAGE_SIZE};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::path::Path;
use std::time::Duration;
use url::Url;

/// Environment variable overriding [`ClientConfig::base_url`]
pub const BASE_URL_ENV: &str = "CANVAS_BASE_URL";

/// Environment variable overriding [`ClientConfig::token`]
pub const TOKEN_ENV: &str = "CANVAS_TOKEN";

/// Everything needed to talk to one Canvas instance
#[derive(Clone, PartialEq, Serialize, Deserialize)]
pub struct ClientConfig {
    /// API root, e.g. `https://school.instructure.com/api/v1`
    #[serde(default)]
    pub base_url: Option<String>,

    /// Access token
    #[serde(default, skip_serializing)]
    pub token: Option<String>,

    /// Where the token goes on each request
    #[serde(default)]
    pub token_location: Location,

    /// Items requested per page
    #[serde(default = "default_page_size")]
    pub page_size: u32,

    /// Per-request timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Bound on simultaneous page fetches per run
    #[serde(default)]
    pub max_concurrency: Option<usize>,

    /// Item channel capacity per run
    #[serde(default = "default_buffer_size")]
    pub buffer_size: usize,

    /// Client-side throttling; `null` disables it
    #[serde(default = "default_rate_limit")]
    pub rate_limit: Option<RateLimiterConfig>,

    /// Custom user agent
    #[serde(default)]
    pub user_agent: Option<String>,

    /// Log level for the CLI
    #[serde(default)]
    pub log_level: LogLevel,
}

fn default_page_size() -> u32 {
    DEFAULT_PAGE_SIZE
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_buffer_size() -> usize {
    64
}

fn default_rate_limit() -> Option<RateLimiterConfig> {
    Some(RateLimiterConfig::default())
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: None,
            token: None,
            token_location: Location::default(),
            page_size: default_page_size(),
            timeout_secs: default_timeout_secs(),
            max_concurrency: None,
            buffer_size: default_buffer_size(),
            rate_limit: default_rate_limit(),
            user_agent: None,
            log_level: LogLevel::default(),
        }
    }
}

impl fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientConfig")
            .field("base_url", &self.base_url)
            .field("token", &self.token.as_ref().map(|_| "<redacted>"))
            .field("token_location", &self.token_location)
            .field("page_size", &self.page_size)
            .field("timeout_secs", &self.timeout_secs)
            .field("max_concurrency", &self.max_concurrency)
            .field("buffer_size", &self.buffer_size)
            .field("rate_limit", &self.rate_limit)
            .field("user_agent", &self.user_agent)
            .field("log_level", &self.log_level)
            .finish()
    }
}

impl ClientConfig {
    /// Config for `base_url` with every other field defaulted
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: Some(base_url.into()),
            ..Self::default()
        }
    }

    /// Set the access token
    #[must_use]
    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    /// Load a config file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file '{}'", path.display()))?;
        Self::from_yaml_str(&content)
    }

    /// Parse a YAML document
    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        Ok(serde_yaml::from_str(yaml)?)
    }

    /// Override fields from `CANVAS_BASE_URL` and `CANVAS_TOKEN`
    #[must_use]
    pub fn apply_env(self) -> Self {
        self.apply_env_from(|key| std::env::var(key).ok())
    }

    /// Override fields from an arbitrary variable lookup. Empty values
    /// are treated as unset.
    #[must_use]
    pub fn apply_env_from<F>(mut self, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(url) = lookup(BASE_URL_ENV).none_if_empty() {
            self.base_url = Some(url);
        }
        if let Some(token) = lookup(TOKEN_ENV).none_if_empty() {
            self.token = Some(token);
        }
        self
    }

    /// Check the config is usable
    pub fn validate(&self) -> Result<()> {
        let base_url = self
            .base_url
            .as_deref()
            .filter(|url| !url.is_empty())
            .ok_or_else(|| Error::missing_field("base_url"))?;
        Url::parse(base_url)?;

        if self.page_size == 0 {
            return Err(Error::config("page_size must be greater than 0"));
        }
        if self.timeout_secs == 0 {
            return Err(Error::config("timeout_secs must be greater than 0"));
        }
        if self.buffer_size == 0 {
            return Err(Error::config("buffer_size must be greater than 0"));
        }
        if self.max_concurrency == Some(0) {
            return Err(Error::config("max_concurrency must be greater than 0"));
        }
        if matches!(self.rate_limit, Some(limit) if limit.requests_per_second == 0) {
            return Err(Error::config(
                "rate_limit.requests_per_second must be greater than 0",
            ));
        }
        Ok(())
    }

    /// Transport settings
    pub fn http_config(&self) -> HttpClientConfig {
        let mut builder = HttpClientConfig::builder().timeout(Duration::from_secs(self.timeout_secs));
        if let Some(url) = &self.base_url {
            builder = builder.base_url(url.as_str());
        }
        builder = match self.rate_limit {
            Some(limit) => builder.rate_limit(limit),
            None => builder.no_rate_limit(),
        };
        if let Some(agent) = &self.user_agent {
            builder = builder.user_agent(agent.as_str());
        }
        builder.build()
    }

    /// Credentials
    pub fn auth_config(&self) -> AuthConfig {
        match self.token.as_deref().filter(|token| !token.is_empty()) {
            Some(token) => AuthConfig::Token {
                token: token.to_string(),
                location: self.token_location,
            },
            None => AuthConfig::None,
        }
    }

    /// Run settings
    pub fn paginator_config(&self) -> PaginatorConfig {
        let config = PaginatorConfig::default().with_buffer_size(self.buffer_size);
        match self.max_concurrency {
            Some(limit) => config.with_max_concurrency(limit),
            None => config,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let config = ClientConfig::default();
        assert_eq!(config.page_size, 10);
        assert_eq!(config.timeout_secs, 30);
        assert_eq!(config.buffer_size, 64);
        assert!(config.rate_limit.is_some());
        assert!(config.max_concurrency.is_none());
    }

    #[test]
    fn test_parse_yaml() {
        let yaml = r#"
base_url: https://school.instructure.com/api/v1
token: secret
token_location: query
page_size: 50
max_concurrency: 4
rate_limit:
  requests_per_second: 5
log_level: debug
"#;
        let config = ClientConfig::from_yaml_str(yaml).unwrap();
        assert_eq!(
            config.base_url.as_deref(),
            Some("https://school.instructure.com/api/v1")
        );
        assert_eq!(config.page_size, 50);
        assert_eq!(config.max_concurrency, Some(4));
        assert_eq!(config.rate_limit, Some(RateLimiterConfig::new(5, 10)));
        assert_eq!(config.log_level, LogLevel::Debug);
        assert_eq!(config.auth_config(), AuthConfig::query_token("secret"));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_null_rate_limit_disables_throttling() {
        let config =
            ClientConfig::from_yaml_str("base_url: https://x.test\nrate_limit: null\n").unwrap();
        assert!(config.rate_limit.is_none());
        assert!(config.http_config().rate_limit.is_none());
    }

    #[test]
    fn test_invalid_yaml() {
        let err = ClientConfig::from_yaml_str("page_size: [not a number").unwrap_err();
        assert!(matches!(err, Error::YamlParse(_)));
    }

    #[test]
    fn test_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "base_url: https://school.instructure.com/api/v1").unwrap();
        writeln!(file, "page_size: 25").unwrap();

        let config = ClientConfig::from_file(file.path()).unwrap();
        assert_eq!(config.page_size, 25);
        assert_eq!(config.timeout_secs, 30);
    }

    #[test]
    fn test_from_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = ClientConfig::from_file(dir.path().join("absent.yaml")).unwrap_err();
        assert!(err.to_string().contains("Failed to read config file"));
    }

    #[test]
    fn test_env_overrides() {
        let config = ClientConfig::new("https://old.test").apply_env_from(|key| match key {
            BASE_URL_ENV => Some("https://new.test".to_string()),
            TOKEN_ENV => Some("env-token".to_string()),
            _ => None,
        });
        assert_eq!(config.base_url.as_deref(), Some("https://new.test"));
        assert_eq!(config.token.as_deref(), Some("env-token"));
    }

    #[test]
    fn test_empty_env_values_ignored() {
        let config = ClientConfig::new("https://keep.test")
            .with_token("keep")
            .apply_env_from(|_| Some(String::new()));
        assert_eq!(config.base_url.as_deref(), Some("https://keep.test"));
        assert_eq!(config.token.as_deref(), Some("keep"));
    }

    #[test]
    fn test_validate_errors() {
        assert!(matches!(
            ClientConfig::default().validate().unwrap_err(),
            Error::MissingConfigField { .. }
        ));
        assert!(matches!(
            ClientConfig::new("not a url").validate().unwrap_err(),
            Error::InvalidUrl(_)
        ));

        let mut config = ClientConfig::new("https://x.test");
        config.page_size = 0;
        assert!(config.validate().is_err());

        let mut config = ClientConfig::new("https://x.test");
        config.max_concurrency = Some(0);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_derived_configs() {
        let mut config = ClientConfig::new("https://x.test").with_token("t");
        config.max_concurrency = Some(3);
        config.buffer_size = 8;
        config.user_agent = Some("agent/1".into());

        let http = config.http_config();
        assert_eq!(http.base_url.as_deref(), Some("https://x.test"));
        assert_eq!(http.user_agent, "agent/1");

        let run = config.paginator_config();
        assert_eq!(run.buffer_size, 8);
        assert_eq!(run.max_concurrency, Some(3));

        assert_eq!(config.auth_config(), AuthConfig::bearer("t"));
    }

    #[test]
    fn test_debug_redacts_token() {
        let config = ClientConfig::new("https://x.test").with_token("s3cret");
        assert!(!format!("{config:?}").contains("s3cret"));
    }
}
