//! Authentication module
//!
//! Canvas authenticates with a single access token, sent either as a
//! bearer header or as the `access_token` query parameter. The
//! `Authenticator` shares that token across every request of a client so
//! it can be rotated mid-run.

mod authenticator;
mod types;

pub use authenticator::Authenticator;
pub use types::{AuthConfig, Location, ACCESS_TOKEN_PARAM};
