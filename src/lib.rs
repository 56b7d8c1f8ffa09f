//! Patreon download pipeline library.
//!
//! This library turns Patreon file and post URLs into organized, resumable
//! downloads: direct file URLs stream straight to disk, post URLs are
//! scanned for their attached files first, and every transfer stages into a
//! `.part` file that survives interruption.
//!
//! # Architecture
//!
//! The library is organized into the following modules:
//! - [`classify`] - URL recognition (direct file vs post page)
//! - [`pipeline`] - Queues, dedup ledger, workers, and lifecycle
//! - [`extract`] - Post page scanning for file links and creator labels
//! - [`download`] - Resumable streaming HTTP transfers
//! - [`clipboard`] - Interactive input sources polled for new URLs
//! - [`progress`] - Progress reporting seam (rendering stays in the binary)

// Clippy lints - strict for library code
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod classify;
pub mod clipboard;
pub mod download;
pub mod extract;
pub mod pipeline;
pub mod progress;

// Re-export commonly used types
pub use classify::{UrlKind, classify};
pub use download::{
    DEFAULT_MAX_ATTEMPTS, DownloadError, DownloadJob, HttpClient, Outcome, RetryPolicy,
};
pub use extract::{ExtractError, Extraction, Extractor, PageScanExtractor};
pub use pipeline::{
    Admission, Completion, DrainReason, Intake, Ledger, Pipeline, PipelineConfig, PipelineStats,
    ShutdownSignal, spawn_clipboard_poller,
};
pub use progress::{NoopSink, ProgressSink, TransferObserver};
