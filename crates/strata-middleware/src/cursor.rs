//! Per-execution position cursor.
//!
//! Every [`Dispatcher::run`](crate::Dispatcher::run) owns exactly one cursor.
//! It records the highest chain position advanced to and refuses any attempt to
//! advance to a position at or below it. The first refusal is remembered so the
//! dispatcher can report it even if the offending handler discards the error.

use parking_lot::Mutex;
use strata_core::ChainFault;

/// Tracks how far one execution has advanced through the chain.
#[derive(Debug, Default)]
pub(crate) struct Cursor {
    state: Mutex<CursorState>,
}

#[derive(Debug, Default)]
struct CursorState {
    /// Highest position advanced to; `None` before the first advance.
    highest: Option<usize>,
    /// First fault observed. Once set, every advance fails.
    fault: Option<ChainFault>,
}

impl Cursor {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Claims `index` as the next position to run.
    pub(crate) fn advance(&self, index: usize) -> Result<(), ChainFault> {
        let mut state = self.state.lock();

        if let Some(fault) = state.fault {
            return Err(fault);
        }

        if state.highest.is_some_and(|highest| index <= highest) {
            let fault = ChainFault::ContinuationReused { index };
            state.fault = Some(fault);
            return Err(fault);
        }

        state.highest = Some(index);
        Ok(())
    }

    /// Highest position advanced to so far.
    pub(crate) fn highest(&self) -> Option<usize> {
        self.state.lock().highest
    }

    /// The first fault recorded by this cursor, if any.
    pub(crate) fn fault(&self) -> Option<ChainFault> {
        self.state.lock().fault
    }
}
