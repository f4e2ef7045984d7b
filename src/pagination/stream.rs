//! Consumer side of a pagination run

use super::cancel::CancelToken;
use super::policy::{RunOutcome, RunSummary};
use super::run::RunState;
use crate::error::Result;
use futures::{Stream, StreamExt};
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

/// Items of one run, in per-page server order.
///
/// The stream ends when the run completes, when the error policy stops
/// it, or after [`ItemStream::cancel`]. Once the run is cancelled no
/// further item is yielded, even if one was already buffered.
///
/// If the error policy panicked, the panic is resumed in the task that
/// polls the stream to its end.
///
/// Dropping the stream cancels the run.
pub struct ItemStream<T> {
    items: mpsc::Receiver<T>,
    adapter: Option<JoinHandle<RunOutcome>>,
    outcome: Option<RunOutcome>,
    cancel: CancelToken,
    state: Arc<RunState>,
    items_done: bool,
}

impl<T> ItemStream<T> {
    pub(crate) fn new(
        items: mpsc::Receiver<T>,
        adapter: JoinHandle<RunOutcome>,
        cancel: CancelToken,
        state: Arc<RunState>,
    ) -> Self {
        Self {
            items,
            adapter: Some(adapter),
            outcome: None,
            cancel,
            state,
            items_done: false,
        }
    }

    /// Live run state
    pub fn state(&self) -> &RunState {
        &self.state
    }

    /// Stop the run; buffered items are discarded
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    /// How the run ended, once the stream has been drained
    pub fn outcome(&self) -> Option<&RunOutcome> {
        self.outcome.as_ref()
    }

    /// Wait for the run to end and report it.
    ///
    /// Items not yet consumed are discarded. A policy stop comes back as
    /// the stop reason.
    pub async fn finish(mut self) -> Result<RunSummary> {
        while self.next().await.is_some() {}
        match self.outcome.take() {
            Some(outcome) => outcome.into_result(),
            None => Ok(RunSummary {
                total_pages: self.state.total_pages(),
                ..RunSummary::default()
            }),
        }
    }

    /// Collect every item, failing with the stop reason if the policy
    /// stopped the run
    pub async fn try_collect(mut self) -> Result<Vec<T>> {
        let mut items = Vec::new();
        while let Some(item) = self.next().await {
            items.push(item);
        }
        self.finish().await?;
        Ok(items)
    }

    fn poll_adapter(&mut self, cx: &mut Context<'_>) -> Poll<()> {
        let Some(handle) = self.adapter.as_mut() else {
            return Poll::Ready(());
        };
        match Pin::new(handle).poll(cx) {
            Poll::Pending => Poll::Pending,
            Poll::Ready(joined) => {
                self.adapter = None;
                match joined {
                    Ok(outcome) => self.outcome = Some(outcome),
                    Err(e) if e.is_panic() => std::panic::resume_unwind(e.into_panic()),
                    Err(_) => {
                        self.outcome = Some(RunOutcome::Cancelled(RunSummary {
                            total_pages: self.state.total_pages(),
                            ..RunSummary::default()
                        }));
                    }
                }
                Poll::Ready(())
            }
        }
    }
}

impl<T> Unpin for ItemStream<T> {}

impl<T> Stream for ItemStream<T> {
    type Item = T;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<T>> {
        let this = self.get_mut();

        while !this.items_done {
            if this.cancel.is_cancelled() {
                this.items_done = true;
                break;
            }
            match this.items.poll_recv(cx) {
                Poll::Ready(Some(item)) if !this.cancel.is_cancelled() => {
                    return Poll::Ready(Some(item));
                }
                Poll::Ready(Some(_)) | Poll::Ready(None) => this.items_done = true,
                Poll::Pending => return Poll::Pending,
            }
        }

        match this.poll_adapter(cx) {
            Poll::Ready(()) => Poll::Ready(None),
            Poll::Pending => Poll::Pending,
        }
    }
}

impl<T> Drop for ItemStream<T> {
    fn drop(&mut self) {
        if !self.state.is_closed() {
            self.cancel.cancel();
        }
    }
}
