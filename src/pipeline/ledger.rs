//! Process-lifetime dedup ledger guarding both queues.
//!
//! Every URL, file or page, is admitted at most once per process. The
//! check-and-insert is a single critical section because three producers
//! (CLI seeding, the clipboard poller, and the extraction stage) may race on
//! the same URL.

use std::collections::HashSet;
use std::sync::Mutex;

/// Set of URLs already admitted into either queue. Entries are never removed.
#[derive(Debug, Default)]
pub struct Ledger {
    seen: Mutex<HashSet<String>>,
}

impl Ledger {
    /// Creates an empty ledger.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Atomically checks membership and inserts.
    ///
    /// Returns `true` when the URL is newly admitted and a job should be
    /// enqueued; `false` for a duplicate that must be dropped.
    ///
    /// With `force = true` the membership test is skipped (the clipboard
    /// override path), but the URL is still inserted, so later non-forced
    /// admissions of the same URL see it as a duplicate.
    pub fn admit(&self, url: &str, force: bool) -> bool {
        let mut seen = self
            .seen
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        if force {
            seen.insert(url.to_string());
            return true;
        }
        seen.insert(url.to_string())
    }

    /// Number of distinct URLs ever admitted.
    #[must_use]
    pub fn len(&self) -> usize {
        self.seen
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .len()
    }

    /// Returns `true` when no URL has been admitted yet.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
