//! Error policies and the adapter that applies them to a run

use super::cancel::CancelToken;
use super::paginator::PaginationRun;
use super::run::RunState;
use crate::error::{Error, Result};
use serde::Serialize;
use std::fmt;
use std::sync::{Arc, OnceLock};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

type PolicyFn = dyn Fn(Error) -> Result<()> + Send + Sync;

/// Decides, per error, whether a run continues (`Ok`) or stops (`Err`).
///
/// The returned error becomes the stop reason. A policy may also panic;
/// the panic resurfaces in the task that drains the [`ItemStream`].
///
/// [`ItemStream`]: super::ItemStream
#[derive(Clone)]
pub struct ErrorPolicy {
    handler: Arc<PolicyFn>,
}

impl ErrorPolicy {
    /// Build a policy from any callback
    pub fn new<F>(handler: F) -> Self
    where
        F: Fn(Error) -> Result<()> + Send + Sync + 'static,
    {
        Self {
            handler: Arc::new(handler),
        }
    }

    /// Panic on the first error
    pub fn fail_fast() -> Self {
        Self::new(|err| panic!("canvas pagination failed: {err}"))
    }

    /// Stop the run on the first error and report it
    pub fn stop_on_error() -> Self {
        Self::new(Err)
    }

    /// Log and continue on every error
    pub fn ignore_all() -> Self {
        Self::new(|_| Ok(()))
    }

    /// Continue on errors matching `predicate`, stop on the rest
    pub fn tolerate<P>(predicate: P) -> Self
    where
        P: Fn(&Error) -> bool + Send + Sync + 'static,
    {
        Self::new(move |err| if predicate(&err) { Ok(()) } else { Err(err) })
    }

    /// Continue past rate-limited pages, stop on anything else
    pub fn skip_rate_limited() -> Self {
        Self::tolerate(Error::is_rate_limit)
    }

    /// Run the policy on one error
    pub fn apply(&self, error: Error) -> Result<()> {
        (self.handler)(error)
    }
}

impl Default for ErrorPolicy {
    fn default() -> Self {
        default_policy()
    }
}

impl fmt::Debug for ErrorPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ErrorPolicy").finish_non_exhaustive()
    }
}

static DEFAULT_POLICY: OnceLock<ErrorPolicy> = OnceLock::new();

/// Install the process-wide fallback policy.
///
/// Can be called once; later calls fail and leave the first policy in
/// place. Runs that were given an explicit policy never consult it.
pub fn set_default_policy(policy: ErrorPolicy) -> Result<()> {
    DEFAULT_POLICY
        .set(policy)
        .map_err(|_| Error::config("default error policy is already set"))
}

/// The installed fallback policy, or [`ErrorPolicy::fail_fast`]
pub fn default_policy() -> ErrorPolicy {
    DEFAULT_POLICY
        .get()
        .cloned()
        .unwrap_or_else(ErrorPolicy::fail_fast)
}

/// Counters reported when a run ends
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RunSummary {
    pub total_pages: Option<u32>,
    pub items_delivered: usize,
    pub errors_tolerated: usize,
}

/// How a run ended
#[derive(Debug)]
pub enum RunOutcome {
    /// Every unit finished and every item was forwarded
    Completed(RunSummary),
    /// The policy stopped the run
    Stopped { reason: Error, summary: RunSummary },
    /// The consumer cancelled or went away
    Cancelled(RunSummary),
}

impl RunOutcome {
    /// Counters, whatever the ending
    pub fn summary(&self) -> RunSummary {
        match self {
            Self::Completed(summary) | Self::Cancelled(summary) => *summary,
            Self::Stopped { summary, .. } => *summary,
        }
    }

    /// Turn the outcome into a result; only a policy stop is an error
    pub fn into_result(self) -> Result<RunSummary> {
        match self {
            Self::Completed(summary) | Self::Cancelled(summary) => Ok(summary),
            Self::Stopped { reason, .. } => Err(reason),
        }
    }
}

/// Cancels the run and closes its state if the adapter unwinds
struct CloseOnUnwind<'a> {
    cancel: &'a CancelToken,
    state: &'a RunState,
    armed: bool,
}

impl Drop for CloseOnUnwind<'_> {
    fn drop(&mut self) {
        if self.armed {
            self.cancel.cancel();
            self.state.close();
        }
    }
}

/// Send one item to the consumer unless the run has been cancelled
async fn forward<T>(output: &mpsc::Sender<T>, item: T, cancel: &CancelToken) -> bool {
    tokio::select! {
        biased;
        () = cancel.cancelled() => false,
        sent = output.send(item) => sent.is_ok(),
    }
}

/// Drive one run: forward items, apply the policy to errors, close the
/// output exactly once.
///
/// The output sender is owned here and dropped on return, which is what
/// closes the consumer's stream.
pub(crate) async fn handle_errors<T: Send + 'static>(
    run: PaginationRun<T>,
    output: mpsc::Sender<T>,
    policy: ErrorPolicy,
) -> RunOutcome {
    let PaginationRun {
        mut items,
        mut errors,
        cancel,
        state,
    } = run;
    let mut unwind = CloseOnUnwind {
        cancel: &cancel,
        state: &state,
        armed: true,
    };

    let mut summary = RunSummary::default();
    let mut items_open = true;

    let outcome = loop {
        tokio::select! {
            biased;
            received = errors.recv() => match received {
                Some(err) => {
                    let page_count = state.total_pages();
                    match policy.apply(err) {
                        Ok(()) => {
                            summary.errors_tolerated += 1;
                            debug!(total_pages = ?page_count, "Error tolerated by policy");
                        }
                        Err(reason) => {
                            warn!(error = %reason, "Policy stopped the run");
                            cancel.cancel();
                            break RunOutcome::Stopped { reason, summary };
                        }
                    }
                }
                None => {
                    // Every unit is done; flush whatever is still buffered
                    let mut drained = true;
                    while let Some(item) = items.recv().await {
                        if !forward(&output, item, &cancel).await {
                            drained = false;
                            break;
                        }
                        summary.items_delivered += 1;
                    }
                    if drained {
                        break RunOutcome::Completed(summary);
                    }
                    cancel.cancel();
                    break RunOutcome::Cancelled(summary);
                }
            },
            () = cancel.cancelled() => break RunOutcome::Cancelled(summary),
            received = items.recv(), if items_open => match received {
                Some(item) => {
                    if !forward(&output, item, &cancel).await {
                        cancel.cancel();
                        break RunOutcome::Cancelled(summary);
                    }
                    summary.items_delivered += 1;
                }
                None => items_open = false,
            },
        }
    };

    summary = outcome.summary();
    summary.total_pages = state.total_pages();
    let outcome = match outcome {
        RunOutcome::Completed(_) => RunOutcome::Completed(summary),
        RunOutcome::Cancelled(_) => RunOutcome::Cancelled(summary),
        RunOutcome::Stopped { reason, .. } => RunOutcome::Stopped { reason, summary },
    };

    unwind.armed = false;
    drop(output);
    state.close();
    info!(
        total_pages = ?summary.total_pages,
        items = summary.items_delivered,
        tolerated = summary.errors_tolerated,
        "Pagination run closed"
    );
    outcome
}
