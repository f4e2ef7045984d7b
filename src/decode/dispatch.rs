//! Forwarding decoded items to a run's item channel

use super::types::RecordDecoder;
use crate::error::Result;
use crate::pagination::CancelToken;
use tokio::sync::mpsc;

/// How a page dispatch ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dispatched {
    /// Every item was handed over
    Delivered(usize),
    /// The run was cancelled (or its receiver dropped) after this many items
    Cancelled(usize),
}

impl Dispatched {
    /// Items handed over before the dispatch ended
    pub fn count(&self) -> usize {
        match self {
            Self::Delivered(n) | Self::Cancelled(n) => *n,
        }
    }
}

/// Decode one page and send its items in server order.
///
/// Each send races the cancellation signal, so a stopped run never blocks
/// a worker on a full channel and never sends after the stop decision.
pub async fn dispatch<T: Send>(
    decoder: &dyn RecordDecoder<T>,
    page: usize,
    body: &[u8],
    items: &mpsc::Sender<T>,
    cancel: &CancelToken,
) -> Result<Dispatched> {
    let decoded = decoder.decode(page, body)?;

    let mut sent = 0;
    for item in decoded {
        tokio::select! {
            biased;
            () = cancel.cancelled() => return Ok(Dispatched::Cancelled(sent)),
            result = items.send(item) => {
                if result.is_err() {
                    return Ok(Dispatched::Cancelled(sent));
                }
            }
        }
        sent += 1;
    }

    Ok(Dispatched::Delivered(sent))
}
