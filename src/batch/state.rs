//! Run state and live progress counters.

use std::fmt;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Lifecycle of one batch run.
///
/// `Idle -> FetchingManifest -> RangeResolved -> FetchingPages -> Assembling -> Done | Failed`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BatchState {
    /// Nothing started yet.
    #[default]
    Idle,
    /// Retrieving and parsing the manifest.
    FetchingManifest,
    /// Page bounds have been clamped to the manifest.
    RangeResolved,
    /// Page images are being retrieved.
    FetchingPages,
    /// The artifact is being finalized.
    Assembling,
    /// An artifact was produced.
    Done,
    /// The run aborted.
    Failed,
}

impl BatchState {
    /// Stable lowercase name used in logs.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::FetchingManifest => "fetching_manifest",
            Self::RangeResolved => "range_resolved",
            Self::FetchingPages => "fetching_pages",
            Self::Assembling => "assembling",
            Self::Done => "done",
            Self::Failed => "failed",
        }
    }

    /// Whether the run has ended.
    #[must_use]
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Done | Self::Failed)
    }
}

impl fmt::Display for BatchState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Progress of the current run, shared with whoever wants to display it.
///
/// Counters use atomics so the front end can poll without coordinating with
/// the controller.
#[derive(Debug, Default)]
pub struct BatchProgress {
    state: Mutex<BatchState>,
    total: AtomicUsize,
    completed: AtomicUsize,
    failed: AtomicUsize,
}

impl BatchProgress {
    /// Creates idle progress with zero counts.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Current run state.
    #[must_use]
    pub fn state(&self) -> BatchState {
        *self
            .state
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }

    /// Pages in the resolved range.
    #[must_use]
    pub fn total(&self) -> usize {
        self.total.load(Ordering::SeqCst)
    }

    /// Pages fetched (and, for documents, decoded) successfully.
    #[must_use]
    pub fn completed(&self) -> usize {
        self.completed.load(Ordering::SeqCst)
    }

    /// Pages whose fetch or decode failed.
    #[must_use]
    pub fn failed(&self) -> usize {
        self.failed.load(Ordering::SeqCst)
    }

    /// Pages finished either way.
    #[must_use]
    pub fn processed(&self) -> usize {
        self.completed() + self.failed()
    }

    pub(crate) fn set_state(&self, state: BatchState) {
        *self
            .state
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner) = state;
    }

    /// Clears counters for a new run over `total` pages.
    pub(crate) fn reset(&self, total: usize) {
        self.total.store(total, Ordering::SeqCst);
        self.completed.store(0, Ordering::SeqCst);
        self.failed.store(0, Ordering::SeqCst);
    }

    pub(crate) fn increment_completed(&self) {
        self.completed.fetch_add(1, Ordering::SeqCst);
    }

    pub(crate) fn increment_failed(&self) {
        self.failed.fetch_add(1, Ordering::SeqCst);
    }
}
