//! Live state of one pagination run

use serde::Serialize;
use std::sync::atomic::{AtomicU32, AtomicU8, AtomicUsize, Ordering};

/// Lifecycle of a run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
#[repr(u8)]
pub enum RunPhase {
    /// Page 1 in flight, page count unknown
    Discovering = 0,
    /// Page units outstanding
    Fetching = 1,
    /// Every unit finished; channels being flushed
    Draining = 2,
    /// Output and error channels closed
    Closed = 3,
}

impl RunPhase {
    fn from_u8(raw: u8) -> Self {
        match raw {
            0 => Self::Discovering,
            1 => Self::Fetching,
            2 => Self::Draining,
            _ => Self::Closed,
        }
    }
}

const UNKNOWN_TOTAL: u32 = u32::MAX;

/// Shared counters for one run.
///
/// Workers only decrement the in-flight counter; the paginator and the
/// error-policy adapter own the phase transitions.
#[derive(Debug)]
pub struct RunState {
    phase: AtomicU8,
    total_pages: AtomicU32,
    in_flight: AtomicUsize,
}

impl RunState {
    pub(crate) fn new() -> Self {
        Self {
            phase: AtomicU8::new(RunPhase::Discovering as u8),
            total_pages: AtomicU32::new(UNKNOWN_TOTAL),
            in_flight: AtomicUsize::new(0),
        }
    }

    /// Current phase
    pub fn phase(&self) -> RunPhase {
        RunPhase::from_u8(self.phase.load(Ordering::Acquire))
    }

    /// Page count, known once page 1 has been parsed
    pub fn total_pages(&self) -> Option<u32> {
        match self.total_pages.load(Ordering::Acquire) {
            UNKNOWN_TOTAL => None,
            total => Some(total),
        }
    }

    /// Units (page decodes or fetch+decodes) not yet finished
    pub fn pages_in_flight(&self) -> usize {
        self.in_flight.load(Ordering::Acquire)
    }

    /// True once the output has been closed
    pub fn is_closed(&self) -> bool {
        self.phase() == RunPhase::Closed
    }

    /// Record the page count and arm the work counter.
    ///
    /// A zero-page collection goes straight to draining.
    pub(crate) fn begin_fetching(&self, total_pages: u32) {
        self.total_pages.store(total_pages, Ordering::Release);
        self.in_flight.store(total_pages as usize, Ordering::Release);
        let next = if total_pages == 0 {
            RunPhase::Draining
        } else {
            RunPhase::Fetching
        };
        self.advance(RunPhase::Discovering, next);
    }

    /// Discovery failed; no units will run
    pub(crate) fn abort_discovery(&self) {
        self.advance(RunPhase::Discovering, RunPhase::Draining);
    }

    /// Mark one unit finished. Returns true for the last one.
    pub(crate) fn finish_unit(&self) -> bool {
        let previous = self
            .in_flight
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |n| n.checked_sub(1))
            .unwrap_or(0);
        let last = previous == 1;
        if last {
            self.advance(RunPhase::Fetching, RunPhase::Draining);
        }
        last
    }

    /// Move to Closed. Returns true only for the call that closed it.
    pub(crate) fn close(&self) -> bool {
        self.phase.swap(RunPhase::Closed as u8, Ordering::AcqRel) != RunPhase::Closed as u8
    }

    fn advance(&self, from: RunPhase, to: RunPhase) {
        let _ = self.phase.compare_exchange(
            from as u8,
            to as u8,
            Ordering::AcqRel,
            Ordering::Acquire,
        );
    }
}

/// Decrements the work counter when a unit ends, however it ends
pub(crate) struct UnitGuard<'a> {
    state: &'a RunState,
}

impl<'a> UnitGuard<'a> {
    pub(crate) fn new(state: &'a RunState) -> Self {
        Self { state }
    }
}

impl Drop for UnitGuard<'_> {
    fn drop(&mut self) {
        self.state.finish_unit();
    }
}
