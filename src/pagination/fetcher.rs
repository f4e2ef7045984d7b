//! Page fetching
//!
//! [`PageSource`] is the seam between the paginator and the transport.
//! [`HttpClient`] is the production implementation; tests plug in
//! in-memory sources.

use super::link::LinkSet;
use super::request::PaginationRequest;
use crate::error::{Error, Result};
use crate::http::{HttpClient, RequestConfig};
use async_trait::async_trait;
use bytes::Bytes;
use reqwest::header::LINK;
use tracing::debug;

/// One fetched page
#[derive(Debug, Clone)]
pub struct Page {
    /// 1-indexed page number as sent on the wire
    pub number: u32,
    /// Raw `Link` header, if the server sent one
    pub link_header: Option<String>,
    /// Full response body
    pub body: Bytes,
}

impl Page {
    /// Create a page
    pub fn new(number: u32, link_header: Option<String>, body: impl Into<Bytes>) -> Self {
        Self {
            number,
            link_header,
            body: body.into(),
        }
    }

    /// 0-indexed tag handed to decoders
    pub fn index(&self) -> usize {
        self.number.saturating_sub(1) as usize
    }

    /// Parse the pagination relations of this page
    pub fn links(&self) -> Result<LinkSet> {
        match &self.link_header {
            Some(header) => LinkSet::parse(header),
            None => Err(Error::missing_relation("current")),
        }
    }
}

/// Anything that can fetch one page of a collection
#[async_trait]
pub trait PageSource: Send + Sync {
    /// Fetch the 1-indexed `page` of `request`
    async fn fetch_page(&self, request: &PaginationRequest, page: u32) -> Result<Page>;
}

#[async_trait]
impl PageSource for HttpClient {
    async fn fetch_page(&self, request: &PaginationRequest, page: u32) -> Result<Page> {
        let config = RequestConfig {
            query: request.page_query(page),
            ..RequestConfig::default()
        };

        let response = self.get_with_config(request.base_path(), config).await?;
        let link_header = response
            .headers()
            .get(LINK)
            .and_then(|v| v.to_str().ok())
            .map(ToOwned::to_owned);
        let body = response.bytes().await?;

        debug!(
            path = request.base_path(),
            page,
            bytes = body.len(),
            "Fetched page"
        );
        Ok(Page::new(page, link_header, body))
    }
}
