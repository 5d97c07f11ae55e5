/// Run-level progress accounting
///
/// Counters are updated with atomic operations only, so readers never block writers.
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

/// Lock-free counters describing how far a crawl run has progressed
///
/// Every call to [`Progress::raise_created`] must be paired with exactly one eventual
/// call to [`Progress::raise_completed`], including on failure paths, so that
/// `outstanding` returns to zero once the run has no in-flight work.
#[derive(Debug, Default)]
pub struct Progress {
    /// URLs claimed for fetching
    created: AtomicU64,

    /// Fetch attempts finished, successful or not
    completed: AtomicU64,

    /// Claimed but not yet completed
    outstanding: AtomicU64,
}

impl Progress {
    /// Creates a new progress tracker with all counters at zero
    pub fn new() -> Self {
        Self::default()
    }

    /// Zeros all counters
    pub(crate) fn reset(&self) {
        self.created.store(0, Ordering::SeqCst);
        self.completed.store(0, Ordering::SeqCst);
        self.outstanding.store(0, Ordering::SeqCst);
    }

    /// Records that a URL has been claimed and a fetch scheduled for it
    pub(crate) fn raise_created(&self) {
        self.created.fetch_add(1, Ordering::SeqCst);
        self.outstanding.fetch_add(1, Ordering::SeqCst);
    }

    /// Records that a fetch attempt has finished
    pub(crate) fn raise_completed(&self) {
        self.completed.fetch_add(1, Ordering::SeqCst);
        let previous = self.outstanding.fetch_sub(1, Ordering::SeqCst);
        debug_assert!(previous > 0, "raise_completed without matching raise_created");
    }

    /// Number of URLs claimed for fetching in the current run
    pub fn created(&self) -> u64 {
        self.created.load(Ordering::SeqCst)
    }

    /// Number of fetch attempts that have finished in the current run
    pub fn completed(&self) -> u64 {
        self.completed.load(Ordering::SeqCst)
    }

    /// Number of fetches claimed but not yet completed
    pub fn outstanding(&self) -> u64 {
        self.outstanding.load(Ordering::SeqCst)
    }
}

impl fmt::Display for Progress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "created: {}  outstanding: {}  completed: {}",
            self.created(),
            self.outstanding(),
            self.completed()
        )
    }
}
