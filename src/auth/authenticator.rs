//! Authenticator implementation
//!
//! Applies the current credentials to each outgoing request. Credentials
//! live behind a shared lock so they can be rotated or revoked while a
//! pagination run is in flight; every request reads them at send time.

use super::types::{AuthConfig, Location, ACCESS_TOKEN_PARAM};
use reqwest::RequestBuilder;
use std::sync::{Arc, PoisonError, RwLock};
use tracing::debug;

/// Authenticator handles applying authentication to HTTP requests.
///
/// Cloning is cheap and clones share the same credentials.
#[derive(Clone, Default)]
pub struct Authenticator {
    config: Arc<RwLock<AuthConfig>>,
}

impl Authenticator {
    /// Create a new authenticator with the given config
    pub fn new(config: AuthConfig) -> Self {
        Self {
            config: Arc::new(RwLock::new(config)),
        }
    }

    /// Apply the credentials current at this instant to a request builder
    pub fn apply(&self, req: RequestBuilder) -> RequestBuilder {
        match self.snapshot() {
            AuthConfig::None => req,
            AuthConfig::Token {
                token,
                location: Location::Header,
            } => req.bearer_auth(token),
            AuthConfig::Token {
                token,
                location: Location::Query,
            } => req.query(&[(ACCESS_TOKEN_PARAM, token)]),
        }
    }

    /// Replace the token, keeping the current placement
    pub fn set_token(&self, token: impl Into<String>) {
        let token = token.into();
        let mut config = self.config.write().unwrap_or_else(PoisonError::into_inner);
        let location = match &*config {
            AuthConfig::Token { location, .. } => *location,
            AuthConfig::None => Location::Header,
        };
        *config = AuthConfig::Token { token, location };
        debug!("Access token rotated");
    }

    /// Drop the credentials; subsequent requests go out unauthenticated
    pub fn revoke(&self) {
        *self.config.write().unwrap_or_else(PoisonError::into_inner) = AuthConfig::None;
        debug!("Access token revoked");
    }

    /// Check if a token is configured
    pub fn has_token(&self) -> bool {
        self.snapshot().token().is_some()
    }

    /// Copy of the current configuration
    pub fn snapshot(&self) -> AuthConfig {
        self.config
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl std::fmt::Debug for Authenticator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Authenticator")
            .field("has_token", &self.has_token())
            .finish()
    }
}
