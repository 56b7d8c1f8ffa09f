//! Constants for the download pipeline (timeouts, polling, layout defaults).

use std::time::Duration;

/// Default HTTP connect timeout (30 seconds).
pub const CONNECT_TIMEOUT_SECS: u64 = 30;

/// Default HTTP read timeout (5 minutes for large files).
pub const READ_TIMEOUT_SECS: u64 = 300;

/// How long a worker blocks on a queue pull before re-checking the shutdown
/// signal.
pub const QUEUE_POLL_INTERVAL: Duration = Duration::from_secs(1);

/// Interval between clipboard / idleness polls in interactive mode.
pub const INPUT_POLL_INTERVAL: Duration = Duration::from_secs(1);

/// Cadence of the interactive-mode status log line.
pub const STATUS_INTERVAL: Duration = Duration::from_secs(10);

/// Bounded wait for workers to acknowledge shutdown during draining.
pub const DRAIN_JOIN_TIMEOUT: Duration = Duration::from_secs(2);

/// Write buffer capacity for the staging file (64 KiB).
pub const CHUNK_SIZE: usize = 64 * 1024;

/// Suffix appended to the final filename while a transfer is in flight.
pub const PART_SUFFIX: &str = ".part";

/// Subdirectory used when a job carries no creator label.
pub const DEFAULT_GROUP: &str = "Misc";

/// Filename used when no Content-Disposition filename can be derived.
pub const DEFAULT_FILENAME: &str = "download.bin";

/// Default root directory for downloads.
pub const DEFAULT_DOWNLOAD_DIR: &str = "downloads";

/// Default wait for page scripts to settle before harvesting links.
pub const DEFAULT_RENDER_WAIT: Duration = Duration::from_secs(8);

/// Browser-like User-Agent; Patreon serves different content to obvious bots.
pub const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) \
AppleWebKit/537.36 (KHTML, like Gecko) Chrome/119.0.0.0 Safari/537.36";

/// Referer sent with every request.
pub const REFERER: &str = "https://www.patreon.com/";
