//! Pagination request description

use crate::types::{QueryOptions, DEFAULT_PAGE_SIZE, PAGE_PARAM, PER_PAGE_PARAM};
use tracing::warn;

/// Immutable description of one pagination run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaginationRequest {
    base_path: String,
    query_options: QueryOptions,
    page_size: u32,
}

impl PaginationRequest {
    /// Request every page of `base_path` with the default page size
    pub fn new(base_path: impl Into<String>) -> Self {
        Self {
            base_path: base_path.into(),
            query_options: QueryOptions::new(),
            page_size: DEFAULT_PAGE_SIZE,
        }
    }

    /// Set the page size; zero falls back to the default
    #[must_use]
    pub fn with_page_size(mut self, page_size: u32) -> Self {
        self.page_size = if page_size == 0 {
            DEFAULT_PAGE_SIZE
        } else {
            page_size
        };
        self
    }

    /// Append caller-supplied query options
    #[must_use]
    pub fn with_options(mut self, options: QueryOptions) -> Self {
        for (key, value) in options {
            self = self.option(key, value);
        }
        self
    }

    /// Append one query option.
    ///
    /// `page` and `per_page` are owned by the paginator; caller values for
    /// them are dropped.
    #[must_use]
    pub fn option(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        let key = key.into();
        if is_reserved(&key) {
            warn!(key = %key, "Ignoring query option reserved for pagination");
            return self;
        }
        self.query_options.push((key, value.into()));
        self
    }

    /// Collection path, relative to the client base URL
    pub fn base_path(&self) -> &str {
        &self.base_path
    }

    /// Caller-supplied options in insertion order
    pub fn query_options(&self) -> &[(String, String)] {
        &self.query_options
    }

    /// Items requested per page
    pub fn page_size(&self) -> u32 {
        self.page_size
    }

    /// Full query for a 1-indexed page: `page` and `per_page` first, then
    /// the caller's options
    pub fn page_query(&self, page: u32) -> QueryOptions {
        let mut query = Vec::with_capacity(self.query_options.len() + 2);
        query.push((PAGE_PARAM.to_string(), page.to_string()));
        query.push((PER_PAGE_PARAM.to_string(), self.page_size.to_string()));
        query.extend(
            self.query_options
                .iter()
                .filter(|(key, _)| !is_reserved(key))
                .cloned(),
        );
        query
    }
}

fn is_reserved(key: &str) -> bool {
    key == PAGE_PARAM || key == PER_PAGE_PARAM
}
