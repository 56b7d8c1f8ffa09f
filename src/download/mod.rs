//! HTTP download engine for streaming files to disk.
//!
//! This module implements the resumable transfer stage: one [`HttpClient`]
//! shared by all download workers, streaming each job into a `.part` staging
//! file and promoting it by atomic rename once the body completes.
//!
//! # Features
//!
//! - Streaming downloads (memory-efficient for large files)
//! - Resume from a partial staging file via HTTP range requests
//! - Filename extraction from Content-Disposition headers
//! - Configurable timeouts (30s connect, 5min read by default)
//! - Retry with exponential backoff on transient failures
//!
//! # Example
//!
//! ```no_run
//! use patreon_dl::download::{DownloadJob, HttpClient, RetryPolicy};
//! use patreon_dl::pipeline::ShutdownSignal;
//! use patreon_dl::progress::NoopSink;
//! use std::path::Path;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let client = HttpClient::new(RetryPolicy::default());
//! let job = DownloadJob {
//!     url: "https://www.patreon.com/file?h=123&m=456".to_string(),
//!     label: Some("Some Creator".to_string()),
//! };
//! let outcome = client
//!     .download(&job, Path::new("./downloads"), &ShutdownSignal::new(), &NoopSink)
//!     .await?;
//! println!("{outcome:?}");
//! # Ok(())
//! # }
//! ```

use std::path::PathBuf;

mod client;
pub mod constants;
mod error;
mod filename;
mod retry;

pub use client::{HttpClient, staging_path};
pub use error::DownloadError;
pub use filename::{filename_from_headers, parse_content_disposition, sanitize};
pub use retry::{DEFAULT_MAX_ATTEMPTS, RetryPolicy, is_retryable_status};

/// A single file to download, with the creator label it was discovered under.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadJob {
    /// Direct file URL.
    pub url: String,
    /// Creator name used as the output subdirectory, if known.
    pub label: Option<String>,
}

/// Terminal outcome of a download job that did not fail.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// File fully transferred and promoted to its final name.
    Saved {
        /// Final file path.
        path: PathBuf,
        /// Total bytes the final file holds.
        bytes: u64,
    },
    /// File already existed at the final path; nothing was written.
    Skipped {
        /// The pre-existing file path.
        path: PathBuf,
    },
    /// Shutdown signal observed mid-stream; the staging file was kept.
    Aborted,
}
