//! sync::poll
//!
//! Sequence-numbered refresh of the case document.
//!
//! Every fetch is tagged with a number from [`PollingSynchronizer::issue`].
//! Completions may arrive in any order; [`PollingSynchronizer::complete`]
//! only lets a response through if it is newer than everything applied so
//! far, so a slow reply from an old tick can never overwrite a newer
//! document.
//!
//! The synchronizer does no I/O itself. The viewer owns the timer and the
//! fetch tasks and feeds their results in here.

use std::time::Duration;

use tracing::{debug, trace};

use crate::core::case::AssuranceCase;
use crate::store::StoreError;

/// Sequence number of one fetch.
pub type Seq = u64;

/// What happened to a completed fetch.
#[derive(Debug, Clone, PartialEq)]
pub enum Refresh {
    /// The synchronizer was torn down before the fetch completed.
    Discarded,
    /// A newer response was already applied.
    Stale,
    /// The fetch failed; the previous document is kept.
    Failed(StoreError),
    /// The document is structurally equal to the accepted one.
    Unchanged,
    /// The document was accepted as the new current state.
    Changed,
}

/// Tracks issued fetches and the accepted document.
#[derive(Debug, Clone)]
pub struct PollingSynchronizer {
    interval: Duration,
    last_issued: Seq,
    applied: Seq,
    accepted: Option<AssuranceCase>,
    torn_down: bool,
}

impl PollingSynchronizer {
    /// Create a synchronizer polling at `interval`.
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            last_issued: 0,
            applied: 0,
            accepted: None,
            torn_down: false,
        }
    }

    /// Polling interval.
    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Allocate the sequence number for a new fetch. Starts at 1.
    pub fn issue(&mut self) -> Seq {
        self.last_issued += 1;
        trace!(seq = self.last_issued, "fetch issued");
        self.last_issued
    }

    /// Feed in the result of fetch `seq`.
    pub fn complete(&mut self, seq: Seq, result: Result<AssuranceCase, StoreError>) -> Refresh {
        if self.torn_down {
            trace!(seq, "fetch completed after teardown");
            return Refresh::Discarded;
        }
        if seq <= self.applied {
            trace!(seq, applied = self.applied, "stale fetch discarded");
            return Refresh::Stale;
        }

        let case = match result {
            Ok(case) => case,
            Err(e) => {
                debug!(seq, error = %e, "fetch failed");
                return Refresh::Failed(e);
            }
        };

        self.applied = seq;
        if self.accepted.as_ref() == Some(&case) {
            return Refresh::Unchanged;
        }

        debug!(seq, case = %case.id(), "document changed");
        self.accepted = Some(case);
        Refresh::Changed
    }

    /// Treat every fetch issued so far as stale.
    ///
    /// Used after a lock write: replies to fetches that started before the
    /// write may predate it.
    pub fn invalidate_outstanding(&mut self) {
        self.applied = self.applied.max(self.last_issued);
    }

    /// The accepted document, if any fetch has succeeded.
    pub fn accepted(&self) -> Option<&AssuranceCase> {
        self.accepted.as_ref()
    }

    /// Highest sequence number applied.
    pub fn applied(&self) -> Seq {
        self.applied
    }

    /// Stop accepting completions.
    pub fn teardown(&mut self) {
        self.torn_down = true;
    }

    /// Whether [`teardown`](Self::teardown) was called.
    pub fn is_torn_down(&self) -> bool {
        self.torn_down
    }
}
