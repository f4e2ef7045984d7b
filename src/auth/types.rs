//! Auth configuration types

use serde::{Deserialize, Serialize};

/// Query parameter Canvas accepts in place of an Authorization header
pub const ACCESS_TOKEN_PARAM: &str = "access_token";

/// Where the access token is placed on outgoing requests
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Location {
    /// `Authorization: Bearer <token>`
    #[default]
    Header,
    /// `?access_token=<token>`
    Query,
}

/// Authentication configuration
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum AuthConfig {
    /// No authentication
    #[default]
    None,

    /// Canvas access token
    Token {
        /// The token value
        token: String,
        /// Header or query placement
        location: Location,
    },
}

impl AuthConfig {
    /// Bearer token sent in the Authorization header
    pub fn bearer(token: impl Into<String>) -> Self {
        Self::Token {
            token: token.into(),
            location: Location::Header,
        }
    }

    /// Token sent as the `access_token` query parameter
    pub fn query_token(token: impl Into<String>) -> Self {
        Self::Token {
            token: token.into(),
            location: Location::Query,
        }
    }

    /// Current token, if any
    pub fn token(&self) -> Option<&str> {
        match self {
            Self::None => None,
            Self::Token { token, .. } => Some(token),
        }
    }
}
