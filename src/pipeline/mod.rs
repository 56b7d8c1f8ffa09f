//! Pipeline lifecycle: queues, workers, admission, and draining.
//!
//! A [`Pipeline`] owns two queues (direct file jobs and post pages), one
//! extraction worker, and a configurable number of download workers. URLs
//! enter through an [`Intake`] handle, which classifies them and checks the
//! dedup ledger before queueing. Shutdown is cooperative: a drain sets the
//! shared signal, wakes every worker with sentinels, and waits a bounded time
//! for each to exit.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::{info, warn};

pub mod ledger;
mod queue;
mod status;
mod workers;

pub use ledger::Ledger;
pub use queue::{Task, TaskQueue};
pub use status::{ActiveTransfers, ShutdownSignal, TransferGuard};
pub use workers::spawn_clipboard_poller;

use crate::classify::{UrlKind, classify};
use crate::download::constants::{
    DEFAULT_DOWNLOAD_DIR, DEFAULT_RENDER_WAIT, DRAIN_JOIN_TIMEOUT, INPUT_POLL_INTERVAL,
};
use crate::download::{DownloadJob, HttpClient};
use crate::extract::Extractor;
use crate::progress::ProgressSink;

/// Tunables for a pipeline run.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Number of concurrent download workers.
    pub concurrency: usize,
    /// Root directory downloads land under.
    pub output_dir: PathBuf,
    /// Settle time passed to the extractor for each page.
    pub render_wait: Duration,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            concurrency: 4,
            output_dir: PathBuf::from(DEFAULT_DOWNLOAD_DIR),
            render_wait: DEFAULT_RENDER_WAIT,
        }
    }
}

/// What admitting one input string resulted in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Admission {
    /// Recognized as a direct file URL and queued for download.
    QueuedFile,
    /// Recognized as a post page URL and queued for extraction.
    QueuedPage,
    /// Recognized, but the ledger had already seen it.
    Duplicate,
    /// Not a URL this tool handles.
    Unrecognized,
}

/// Why the pipeline is being drained.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DrainReason {
    /// All admitted work reached a terminal state.
    Idle,
    /// The user interrupted the run.
    Interrupt,
}

/// How a drained run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Completion {
    /// Every admitted URL reached a terminal state.
    Finished,
    /// The run was cut short with work still outstanding.
    Interrupted,
}

/// Entry point for URLs, shared by the CLI batch and the input poller.
#[derive(Debug, Clone)]
pub struct Intake {
    ledger: Arc<Ledger>,
    downloads: TaskQueue<DownloadJob>,
    pages: TaskQueue<String>,
}

impl Intake {
    /// Classifies `input` and queues it unless the ledger rejects it.
    ///
    /// With `force`, a previously seen URL is admitted again (and recorded),
    /// so `Duplicate` can only be returned when `force` is false.
    pub fn admit(&self, input: &str, force: bool) -> Admission {
        let Some(kind) = classify(input) else {
            return Admission::Unrecognized;
        };
        let url = input.trim();
        if !self.ledger.admit(url, force) {
            return Admission::Duplicate;
        }
        match kind {
            UrlKind::File => {
                self.downloads.push(DownloadJob {
                    url: url.to_string(),
                    label: None,
                });
                Admission::QueuedFile
            }
            UrlKind::Page => {
                self.pages.push(url.to_string());
                Admission::QueuedPage
            }
        }
    }

    /// Number of distinct URLs the ledger has admitted so far.
    #[must_use]
    pub fn seen(&self) -> usize {
        self.ledger.len()
    }
}

/// Point-in-time view of pipeline load, for status reporting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PipelineStats {
    /// File jobs queued or downloading.
    pub downloads_pending: usize,
    /// Pages queued or being extracted.
    pub pages_pending: usize,
    /// Transfers currently streaming body bytes.
    pub active_transfers: usize,
}

/// Running pipeline: workers are live from construction until [`drain`](Self::drain).
pub struct Pipeline {
    intake: Intake,
    downloads: TaskQueue<DownloadJob>,
    pages: TaskQueue<String>,
    shutdown: ShutdownSignal,
    active: ActiveTransfers,
    concurrency: usize,
    handles: Vec<JoinHandle<()>>,
}

impl Pipeline {
    /// Builds the queues and spawns one extraction worker plus
    /// `config.concurrency` download workers.
    #[must_use]
    pub fn start(
        config: &PipelineConfig,
        client: HttpClient,
        extractor: Arc<dyn Extractor>,
        sink: Arc<dyn ProgressSink>,
    ) -> Self {
        let ledger = Arc::new(Ledger::new());
        let downloads: TaskQueue<DownloadJob> = TaskQueue::new();
        let pages: TaskQueue<String> = TaskQueue::new();
        let shutdown = ShutdownSignal::new();
        let active = ActiveTransfers::new();
        let concurrency = config.concurrency.max(1);

        let mut handles = Vec::with_capacity(concurrency + 1);
        handles.push(workers::spawn_extraction_worker(
            pages.clone(),
            downloads.clone(),
            Arc::clone(&ledger),
            extractor,
            config.render_wait,
            shutdown.clone(),
        ));
        for id in 0..concurrency {
            handles.push(workers::spawn_download_worker(
                id,
                downloads.clone(),
                client.clone(),
                config.output_dir.clone(),
                shutdown.clone(),
                active.clone(),
                Arc::clone(&sink),
            ));
        }
        info!(workers = concurrency, "pipeline started");

        let intake = Intake {
            ledger,
            downloads: downloads.clone(),
            pages: pages.clone(),
        };
        Self {
            intake,
            downloads,
            pages,
            shutdown,
            active,
            concurrency,
            handles,
        }
    }

    /// Handle for admitting URLs.
    #[must_use]
    pub fn intake(&self) -> Intake {
        self.intake.clone()
    }

    /// The pipeline's cancellation signal.
    #[must_use]
    pub fn shutdown_signal(&self) -> ShutdownSignal {
        self.shutdown.clone()
    }

    /// Current queue and transfer load.
    #[must_use]
    pub fn stats(&self) -> PipelineStats {
        PipelineStats {
            downloads_pending: self.downloads.pending(),
            pages_pending: self.pages.pending(),
            active_transfers: self.active.count(),
        }
    }

    /// Returns `true` when no work is queued, being extracted, or streaming.
    #[must_use]
    pub fn is_idle(&self) -> bool {
        self.downloads.is_idle() && self.pages.is_idle() && self.active.count() == 0
    }

    /// Waits until the pipeline goes idle or shutdown is requested.
    pub async fn wait_until_idle(&self) {
        loop {
            if self.shutdown.is_set() || self.is_idle() {
                return;
            }
            tokio::time::sleep(INPUT_POLL_INTERVAL).await;
        }
    }

    /// Stops all workers and reports how the run ended.
    ///
    /// Sets the shutdown signal, wakes the extraction worker and every
    /// download worker with a sentinel, then waits a bounded time per worker.
    /// A worker that misses the deadline is left to die with the process.
    pub async fn drain(mut self, reason: DrainReason) -> Completion {
        info!(?reason, "draining pipeline");
        self.shutdown.set();

        self.pages.push_shutdown();
        for _ in 0..self.concurrency {
            self.downloads.push_shutdown();
        }

        for handle in self.handles.drain(..) {
            match tokio::time::timeout(DRAIN_JOIN_TIMEOUT, handle).await {
                Ok(Ok(())) => {}
                Ok(Err(e)) => warn!(error = %e, "worker task panicked"),
                Err(_) => warn!("worker did not stop within the join timeout"),
            }
        }

        if reason == DrainReason::Idle && self.is_idle() {
            Completion::Finished
        } else {
            Completion::Interrupted
        }
    }
}
