//! Canvas API facade
//!
//! [`Canvas`] ties the transport, the paginator and the error policy
//! together. Resource listings (`courses`, `course_users`, ...) are
//! defined next to their models in [`crate::resources`].

use crate::auth::Authenticator;
use crate::config::ClientConfig;
use crate::decode::{JsonDecoder, RecordDecoder};
use crate::error::Result;
use crate::http::HttpClient;
use crate::pagination::{
    default_policy, ErrorPolicy, ItemStream, PaginationRequest, Paginator, PaginatorConfig,
};
use crate::types::{QueryOptions, DEFAULT_PAGE_SIZE};
use serde::de::DeserializeOwned;
use std::sync::Arc;
use tracing::debug;

/// Entry point for listing Canvas collections
#[derive(Debug, Clone)]
pub struct Canvas {
    http: Arc<HttpClient>,
    page_size: u32,
    run_config: PaginatorConfig,
    policy: Option<ErrorPolicy>,
}

impl Canvas {
    /// Build a client from validated configuration
    pub fn new(config: &ClientConfig) -> Result<Self> {
        config.validate()?;
        let http = HttpClient::with_auth(config.http_config(), config.auth_config())?;
        debug!(base_url = ?config.base_url, "Canvas client ready");
        Ok(Self::from_http(Arc::new(http))
            .with_page_size(config.page_size)
            .with_paginator_config(config.paginator_config()))
    }

    /// Wrap an existing transport
    pub fn from_http(http: Arc<HttpClient>) -> Self {
        Self {
            http,
            page_size: DEFAULT_PAGE_SIZE,
            run_config: PaginatorConfig::default(),
            policy: None,
        }
    }

    /// Error policy for every run started by this client.
    ///
    /// Without one, the process-wide default applies (see
    /// [`crate::pagination::set_default_policy`]).
    #[must_use]
    pub fn with_policy(mut self, policy: ErrorPolicy) -> Self {
        self.policy = Some(policy);
        self
    }

    /// Items requested per page
    #[must_use]
    pub fn with_page_size(mut self, page_size: u32) -> Self {
        self.page_size = page_size;
        self
    }

    /// Buffer and concurrency settings for each run
    #[must_use]
    pub fn with_paginator_config(mut self, config: PaginatorConfig) -> Self {
        self.run_config = config;
        self
    }

    /// Underlying transport
    pub fn http(&self) -> &HttpClient {
        &self.http
    }

    /// Shared credentials; rotate or revoke the token here
    pub fn authenticator(&self) -> &Authenticator {
        self.http.authenticator()
    }

    /// Policy applied to new runs
    pub fn policy(&self) -> ErrorPolicy {
        self.policy.clone().unwrap_or_else(default_policy)
    }

    /// Describe a run over `path` with this client's page size
    pub fn request(&self, path: impl Into<String>, options: QueryOptions) -> PaginationRequest {
        PaginationRequest::new(path)
            .with_page_size(self.page_size)
            .with_options(options)
    }

    /// Build a paginator without starting it
    pub fn paginator<T: Send + 'static>(
        &self,
        request: PaginationRequest,
        decoder: Arc<dyn RecordDecoder<T>>,
    ) -> Paginator<T> {
        Paginator::new(self.http.clone(), decoder, request).with_config(self.run_config)
    }

    /// List any collection with a custom decoder
    pub async fn paginate<T, D>(
        &self,
        path: impl Into<String>,
        options: QueryOptions,
        decoder: D,
    ) -> ItemStream<T>
    where
        T: Send + 'static,
        D: RecordDecoder<T> + 'static,
    {
        let request = self.request(path, options);
        self.paginator(request, Arc::new(decoder))
            .start(self.policy())
            .await
    }

    /// List any collection whose pages are bare JSON arrays of `T`
    pub async fn paginate_json<T>(&self, path: impl Into<String>, options: QueryOptions) -> ItemStream<T>
    where
        T: DeserializeOwned + Send + 'static,
    {
        self.paginate(path, options, JsonDecoder::<T>::new()).await
    }
}
