//! Cooperative cancellation shared by every task of a run

use std::sync::Arc;
use tokio::sync::watch;

/// Cancellation signal for one pagination run.
///
/// Raised once, never lowered. Workers select on [`CancelToken::cancelled`]
/// around their fetches and sends; the consumer stream checks
/// [`CancelToken::is_cancelled`] before yielding.
#[derive(Debug, Clone)]
pub struct CancelToken {
    tx: Arc<watch::Sender<bool>>,
}

impl CancelToken {
    /// Create a token that is not cancelled
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(false);
        Self { tx: Arc::new(tx) }
    }

    /// Raise the signal
    pub fn cancel(&self) {
        self.tx.send_replace(true);
    }

    /// Check the signal without waiting
    pub fn is_cancelled(&self) -> bool {
        *self.tx.borrow()
    }

    /// Resolve once the signal is raised
    pub async fn cancelled(&self) {
        let mut rx = self.tx.subscribe();
        // The sender lives as long as `self`, so this only returns on cancel
        let _ = rx.wait_for(|cancelled| *cancelled).await;
    }
}

impl Default for CancelToken {
    fn default() -> Self {
        Self::new()
    }
}
