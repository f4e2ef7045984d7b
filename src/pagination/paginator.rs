//! Concurrent Link-header paginator
//!
//! A run has two phases. Page 1 is fetched while the caller waits, because
//! the page count only exists in its `Link` header. Pages 2..N are then
//! fetched concurrently, one task per page, while page 1 is decoded.
//!
//! Items keep server order within a page. Across pages there is no
//! ordering: pages finish in whatever order the network returns them.

use super::cancel::CancelToken;
use super::fetcher::{Page, PageSource};
use super::policy::{handle_errors, ErrorPolicy};
use super::request::PaginationRequest;
use super::run::{RunState, UnitGuard};
use super::stream::ItemStream;
use crate::decode::{dispatch, Dispatched, RecordDecoder};
use crate::error::{Error, Result};
use futures::FutureExt;
use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use tokio::sync::{mpsc, Semaphore};
use tokio::task::JoinSet;
use tracing::{debug, info, warn};

/// Tuning knobs for a run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PaginatorConfig {
    /// Capacity of the item channels
    pub buffer_size: usize,
    /// Upper bound on simultaneous page fetches (`None` = one per page)
    pub max_concurrency: Option<usize>,
}

impl Default for PaginatorConfig {
    fn default() -> Self {
        Self {
            buffer_size: 64,
            max_concurrency: None,
        }
    }
}

impl PaginatorConfig {
    /// Set the item channel capacity
    #[must_use]
    pub fn with_buffer_size(mut self, size: usize) -> Self {
        self.buffer_size = size.max(1);
        self
    }

    /// Bound the number of pages fetched at once
    #[must_use]
    pub fn with_max_concurrency(mut self, limit: usize) -> Self {
        self.max_concurrency = Some(limit.max(1));
        self
    }
}

/// One-shot paginator over a collection.
///
/// `start` and `launch` consume the paginator, so a finished run cannot be
/// restarted.
pub struct Paginator<T> {
    source: Arc<dyn PageSource>,
    decoder: Arc<dyn RecordDecoder<T>>,
    request: PaginationRequest,
    config: PaginatorConfig,
}

impl<T: Send + 'static> Paginator<T> {
    /// Create a paginator
    pub fn new(
        source: Arc<dyn PageSource>,
        decoder: Arc<dyn RecordDecoder<T>>,
        request: PaginationRequest,
    ) -> Self {
        Self {
            source,
            decoder,
            request,
            config: PaginatorConfig::default(),
        }
    }

    /// Set run configuration
    #[must_use]
    pub fn with_config(mut self, config: PaginatorConfig) -> Self {
        self.config = config;
        self
    }

    /// The request this paginator will run
    pub fn request(&self) -> &PaginationRequest {
        &self.request
    }

    /// Run the collection and apply `policy` to every error.
    ///
    /// Waits for page 1 only; everything else happens behind the returned
    /// stream.
    pub async fn start(self, policy: ErrorPolicy) -> ItemStream<T> {
        let buffer = self.config.buffer_size;
        self.launch().await.into_stream(policy, buffer)
    }

    /// Discover the page count and launch the page units.
    ///
    /// Returns the raw run: its item and error channels are not yet
    /// attached to a policy. Most callers want [`Paginator::start`].
    pub async fn launch(self) -> PaginationRun<T> {
        let Paginator {
            source,
            decoder,
            request,
            config,
        } = self;

        let (item_tx, item_rx) = mpsc::channel(config.buffer_size.max(1));
        let (error_tx, error_rx) = mpsc::unbounded_channel();
        let cancel = CancelToken::new();
        let state = Arc::new(RunState::new());

        let run = PaginationRun {
            items: item_rx,
            errors: error_rx,
            cancel: cancel.clone(),
            state: Arc::clone(&state),
        };

        debug!(path = request.base_path(), "Discovering page count");
        let (first, total_pages) = match discover(source.as_ref(), &request).await {
            Ok(found) => found,
            Err(e) => {
                warn!(path = request.base_path(), error = %e, "Page 1 failed; run closed");
                state.abort_discovery();
                let _ = error_tx.send(e);
                return run;
            }
        };

        state.begin_fetching(total_pages);
        if total_pages == 0 {
            info!(path = request.base_path(), "Collection is empty");
            return run;
        }
        info!(path = request.base_path(), total_pages, "Fetching pages");

        let unit = PageUnit {
            source,
            decoder,
            request: Arc::new(request),
            items: item_tx,
            errors: error_tx.clone(),
            cancel,
            state: Arc::clone(&state),
            permits: config
                .max_concurrency
                .map(|limit| Arc::new(Semaphore::new(limit))),
        };

        let mut units = JoinSet::new();
        units.spawn(unit.clone().decode_first(first));
        for number in 2..=total_pages {
            units.spawn(unit.clone().fetch_and_decode(number));
        }
        drop(unit);

        tokio::spawn(coordinate(units, error_tx));
        run
    }
}

/// Fetch page 1 and read the page count from its `last` relation
async fn discover(source: &dyn PageSource, request: &PaginationRequest) -> Result<(Page, u32)> {
    let first = source.fetch_page(request, 1).await?;
    let links = first.links()?;
    Ok((first, links.total_pages()))
}

/// Wait for every unit, then close the error channel by dropping the last
/// sender. The item channel is left alone; the adapter owns the output.
async fn coordinate(mut units: JoinSet<()>, errors: mpsc::UnboundedSender<Error>) {
    while let Some(joined) = units.join_next().await {
        if let Err(e) = joined {
            // Units catch their own panics, so only runtime shutdown lands here
            debug!(error = %e, "Page unit aborted");
        }
    }
    debug!("All page units finished; closing error channel");
    drop(errors);
}

/// Everything one unit of work needs; cloned per page
struct PageUnit<T> {
    source: Arc<dyn PageSource>,
    decoder: Arc<dyn RecordDecoder<T>>,
    request: Arc<PaginationRequest>,
    items: mpsc::Sender<T>,
    errors: mpsc::UnboundedSender<Error>,
    cancel: CancelToken,
    state: Arc<RunState>,
    permits: Option<Arc<Semaphore>>,
}

impl<T> Clone for PageUnit<T> {
    fn clone(&self) -> Self {
        Self {
            source: Arc::clone(&self.source),
            decoder: Arc::clone(&self.decoder),
            request: Arc::clone(&self.request),
            items: self.items.clone(),
            errors: self.errors.clone(),
            cancel: self.cancel.clone(),
            state: Arc::clone(&self.state),
            permits: self.permits.clone(),
        }
    }
}

impl<T: Send + 'static> PageUnit<T> {
    /// Decode the already-fetched page 1
    async fn decode_first(self, page: Page) {
        let _guard = UnitGuard::new(&self.state);
        let number = page.number;
        self.guarded(number, self.deliver(page)).await;
    }

    /// Fetch one page and decode it
    async fn fetch_and_decode(self, number: u32) {
        let _guard = UnitGuard::new(&self.state);
        self.guarded(number, self.fetch_then_deliver(number)).await;
    }

    async fn fetch_then_deliver(&self, number: u32) {
        let _permit = match &self.permits {
            Some(permits) => tokio::select! {
                biased;
                () = self.cancel.cancelled() => return,
                permit = Arc::clone(permits).acquire_owned() => permit.ok(),
            },
            None => None,
        };

        let fetched = tokio::select! {
            biased;
            () = self.cancel.cancelled() => {
                debug!(page = number, "Fetch abandoned; run stopped");
                return;
            }
            result = self.source.fetch_page(&self.request, number) => result,
        };

        match fetched {
            Ok(page) => self.deliver(page).await,
            Err(e) => {
                debug!(page = number, error = %e, "Page fetch failed");
                self.report(e);
            }
        }
    }

    async fn deliver(&self, page: Page) {
        let index = page.index();
        match dispatch(
            self.decoder.as_ref(),
            index,
            &page.body,
            &self.items,
            &self.cancel,
        )
        .await
        {
            Ok(Dispatched::Delivered(count)) => {
                debug!(page = page.number, items = count, "Page dispatched");
            }
            Ok(Dispatched::Cancelled(count)) => {
                debug!(page = page.number, items = count, "Page dispatch cut short");
            }
            Err(e) => self.report(e),
        }
    }

    /// Turn a panic inside a unit (usually a caller-supplied decoder) into
    /// an error on the channel
    async fn guarded<F>(&self, number: u32, work: F)
    where
        F: std::future::Future<Output = ()>,
    {
        if let Err(payload) = AssertUnwindSafe(work).catch_unwind().await {
            self.report(Error::Worker {
                page: number,
                message: panic_message(payload.as_ref()),
            });
        }
    }

    fn report(&self, error: Error) {
        // Fails only once the adapter has stopped listening
        if self.errors.send(error).is_err() {
            debug!("Error dropped; run already stopped");
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "worker panicked".to_string()
    }
}

/// A launched run whose channels are not yet attached to a policy
pub struct PaginationRun<T> {
    pub(crate) items: mpsc::Receiver<T>,
    pub(crate) errors: mpsc::UnboundedReceiver<Error>,
    pub(crate) cancel: CancelToken,
    pub(crate) state: Arc<RunState>,
}

impl<T: Send + 'static> PaginationRun<T> {
    /// Shared run state
    pub fn state(&self) -> &RunState {
        &self.state
    }

    /// Attach the error-policy adapter and hand the output to the caller
    pub fn into_stream(self, policy: ErrorPolicy, buffer_size: usize) -> ItemStream<T> {
        let (out_tx, out_rx) = mpsc::channel(buffer_size.max(1));
        let cancel = self.cancel.clone();
        let state = Arc::clone(&self.state);
        let adapter = tokio::spawn(handle_errors(self, out_tx, policy));
        ItemStream::new(out_rx, adapter, cancel, state)
    }
}
