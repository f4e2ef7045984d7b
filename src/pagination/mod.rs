//! Pagination module
//!
//! # Overview
//!
//! Canvas paginates collections with RFC 5988 `Link` headers. A run
//! fetches page 1 to learn the page count from its `last` relation, then
//! fetches every remaining page concurrently. Items from each page are
//! decoded and forwarded to an [`ItemStream`]; errors go to a separate
//! channel where an [`ErrorPolicy`] decides whether the run continues.
//!
//! ```text
//! start ─► page 1 ─► LinkSet ─► pages 2..N (concurrent)
//!                                   │
//!                     items ◄───────┴──────► errors
//!                       │                      │
//!                       └──► policy adapter ◄──┘
//!                                   │
//!                               ItemStream
//! ```

mod cancel;
mod fetcher;
mod link;
mod paginator;
mod policy;
mod request;
mod run;
mod stream;

pub use cancel::CancelToken;
pub use fetcher::{Page, PageSource};
pub use link::{LinkSet, PageLink, Relation};
pub use paginator::{PaginationRun, Paginator, PaginatorConfig};
pub use policy::{default_policy, set_default_policy, ErrorPolicy, RunOutcome, RunSummary};
pub use request::PaginationRequest;
pub use run::{RunPhase, RunState};
pub use stream::ItemStream;

#[cfg(test)]
mod tests;
