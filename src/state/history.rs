/// Visited-URL claim set
///
/// The claim operation is the single point of mutual exclusion that keeps concurrent
/// branches from fetching the same URL twice.
use dashmap::DashSet;

/// Set of URLs already claimed for fetching in the current run
///
/// Keys are compared case-insensitively on the canonical string form of the URL.
/// Membership is monotonic within a run and only cleared by a run reset.
#[derive(Debug, Default)]
pub struct History {
    claimed: DashSet<String>,
}

impl History {
    /// Creates an empty history
    pub fn new() -> Self {
        Self::default()
    }

    /// Atomically inserts `url` if absent
    ///
    /// Returns true only for the first caller to claim the key in this run; every later
    /// call with an equal key (ignoring case) returns false until [`History::reset`].
    ///
    /// # Examples
    ///
    /// ```
    /// use spider_engine::History;
    ///
    /// let history = History::new();
    /// assert!(history.claim("http://x/a"));
    /// assert!(!history.claim("HTTP://X/A"));
    /// ```
    pub fn claim(&self, url: &str) -> bool {
        self.claimed.insert(Self::key(url))
    }

    /// Returns true if `url` has been claimed in this run
    pub fn contains(&self, url: &str) -> bool {
        self.claimed.contains(&Self::key(url))
    }

    /// Empties the set
    pub(crate) fn reset(&self) {
        self.claimed.clear();
    }

    /// Number of claimed URLs
    pub fn len(&self) -> usize {
        self.claimed.len()
    }

    /// Returns true if nothing has been claimed
    pub fn is_empty(&self) -> bool {
        self.claimed.is_empty()
    }

    /// Returns a copy of the claimed keys in no particular order
    pub fn snapshot(&self) -> Vec<String> {
        self.claimed.iter().map(|key| key.key().clone()).collect()
    }

    fn key(url: &str) -> String {
        url.to_lowercase()
    }
}
