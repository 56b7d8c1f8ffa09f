//! Shared pipeline status: the cancellation signal and the active-transfer
//! counter.
//!
//! Both are owned by the pipeline and handed to workers at construction;
//! nothing here is process-global.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

/// Cooperative cancellation signal, flipped false→true exactly once.
///
/// Every stage checks it at its suspension points: queue pulls time out and
/// re-check, download workers check before each chunk write.
#[derive(Debug, Clone, Default)]
pub struct ShutdownSignal {
    flag: Arc<AtomicBool>,
}

impl ShutdownSignal {
    /// Creates a signal in the not-set state.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Flips the signal. Idempotent; there is no way to un-set it.
    pub fn set(&self) {
        self.flag.store(true, Ordering::SeqCst);
    }

    /// Returns `true` once shutdown has been requested.
    #[must_use]
    pub fn is_set(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }
}

/// Count of transfers currently streaming, used only for idleness detection.
#[derive(Debug, Clone, Default)]
pub struct ActiveTransfers {
    count: Arc<AtomicUsize>,
}

impl ActiveTransfers {
    /// Creates a counter at zero.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Marks a transfer as started; the returned guard decrements on drop,
    /// whatever the outcome (saved, skipped, failed, or aborted).
    #[must_use]
    pub fn begin(&self) -> TransferGuard {
        self.count.fetch_add(1, Ordering::SeqCst);
        TransferGuard {
            count: Arc::clone(&self.count),
        }
    }

    /// Current number of in-flight transfers.
    #[must_use]
    pub fn count(&self) -> usize {
        self.count.load(Ordering::SeqCst)
    }
}

/// RAII guard for one in-flight transfer.
#[derive(Debug)]
pub struct TransferGuard {
    count: Arc<AtomicUsize>,
}

impl Drop for TransferGuard {
    fn drop(&mut self) {
        self.count.fetch_sub(1, Ordering::SeqCst);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shutdown_signal_starts_unset() {
        let signal = ShutdownSignal::new();
        assert!(!signal.is_set());
    }

    #[test]
    fn test_shutdown_signal_set_is_monotonic_and_shared() {
        let signal = ShutdownSignal::new();
        let clone = signal.clone();
        clone.set();
        assert!(signal.is_set());
        // Setting again is a no-op
        signal.set();
        assert!(signal.is_set());
    }

    #[test]
    fn test_active_transfers_guard_decrements_on_drop() {
        let active = ActiveTransfers::new();
        assert_eq!(active.count(), 0);
        {
            let _a = active.begin();
            let _b = active.begin();
            assert_eq!(active.count(), 2);
        }
        assert_eq!(active.count(), 0);
    }

    #[test]
    fn test_active_transfers_guard_decrements_on_panic_unwind() {
        let active = ActiveTransfers::new();
        let clone = active.clone();
        let result = std::panic::catch_unwind(move || {
            let _guard = clone.begin();
            panic!("transfer blew up");
        });
        assert!(result.is_err());
        assert_eq!(active.count(), 0);
    }
}
