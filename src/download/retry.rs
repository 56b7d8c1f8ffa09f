//! Retry policy for request issuance.
//!
//! Retries apply to sending a request (the metadata probe and the initial
//! transfer request), never to a stream that already started producing body
//! bytes. Transient transport failures and a fixed set of HTTP status codes
//! are retried with exponential backoff plus jitter; everything else fails
//! the job immediately.

use std::time::Duration;

use rand::Rng;
use tracing::debug;

use super::DownloadError;

/// Default maximum attempts per request (including the initial one).
pub const DEFAULT_MAX_ATTEMPTS: u32 = 5;

/// Base delay for the first retry.
const DEFAULT_BASE_DELAY: Duration = Duration::from_secs(1);

/// Cap on any single backoff delay.
const DEFAULT_MAX_DELAY: Duration = Duration::from_secs(32);

/// Maximum jitter added to each delay.
const MAX_JITTER: Duration = Duration::from_millis(500);

/// HTTP status codes worth retrying.
const RETRYABLE_STATUSES: [u16; 5] = [429, 500, 502, 503, 504];

/// Returns `true` for status codes in the retryable set.
#[must_use]
pub fn is_retryable_status(status: u16) -> bool {
    RETRYABLE_STATUSES.contains(&status)
}

/// Bounded exponential backoff configuration.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    max_attempts: u32,
    base_delay: Duration,
    max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            base_delay: DEFAULT_BASE_DELAY,
            max_delay: DEFAULT_MAX_DELAY,
        }
    }
}

impl RetryPolicy {
    /// Creates a policy with a custom attempt budget, clamped to at least 1.
    #[must_use]
    pub fn with_max_attempts(max_attempts: u32) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            ..Self::default()
        }
    }

    /// Maximum attempts including the initial one.
    #[must_use]
    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// Decides whether the failed `attempt` (1-indexed) should be retried.
    ///
    /// Returns the backoff delay to sleep before the next attempt, or `None`
    /// when the error is not retryable or the budget is exhausted.
    #[must_use]
    pub fn backoff(&self, error: &DownloadError, attempt: u32) -> Option<Duration> {
        if !is_retryable(error) {
            return None;
        }
        if attempt >= self.max_attempts {
            debug!(attempt, max = self.max_attempts, "retry budget exhausted");
            return None;
        }
        Some(self.delay_for(attempt))
    }

    /// Delay for a retry after the given failed attempt:
    /// `min(base * 2^(attempt-1), max) + jitter`.
    fn delay_for(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1).min(16);
        let scaled = self.base_delay.saturating_mul(1 << exponent);
        let capped = scaled.min(self.max_delay);

        let jitter_ms = rand::thread_rng().gen_range(0..=MAX_JITTER.as_millis() as u64);
        capped + Duration::from_millis(jitter_ms)
    }
}

/// Transient transport failures and retryable statuses qualify for retry.
fn is_retryable(error: &DownloadError) -> bool {
    match error {
        DownloadError::HttpStatus { status, .. } => is_retryable_status(*status),
        DownloadError::Timeout { .. } | DownloadError::Network { .. } => true,
        DownloadError::Io { .. } => false,
    }
}
