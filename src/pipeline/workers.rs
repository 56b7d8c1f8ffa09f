//! Worker loops for the pipeline stages.
//!
//! Every loop follows the same shape: check the shutdown signal, pull with a
//! bounded poll so the check repeats while idle, exit on a sentinel, and mark
//! the task done only after processing finishes.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::{debug, error, info};

use crate::clipboard::ClipboardSource;
use crate::download::constants::{INPUT_POLL_INTERVAL, QUEUE_POLL_INTERVAL};
use crate::download::{DownloadJob, HttpClient, Outcome};
use crate::extract::Extractor;
use crate::progress::ProgressSink;

use super::ledger::Ledger;
use super::queue::{Task, TaskQueue};
use super::status::{ActiveTransfers, ShutdownSignal};
use super::{Admission, Intake};

/// Spawns one download worker consuming from the shared download queue.
pub(super) fn spawn_download_worker(
    id: usize,
    queue: TaskQueue<DownloadJob>,
    client: HttpClient,
    root: PathBuf,
    shutdown: ShutdownSignal,
    active: ActiveTransfers,
    sink: Arc<dyn ProgressSink>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        debug!(worker = id, "download worker started");
        while !shutdown.is_set() {
            match queue.pull(QUEUE_POLL_INTERVAL).await {
                None => continue,
                Some(Task::Shutdown) => break,
                Some(Task::Item(job)) => {
                    let guard = active.begin();
                    let result = client
                        .download(&job, &root, &shutdown, sink.as_ref())
                        .await;
                    drop(guard);

                    match result {
                        // Saved and Skipped are logged where they happen
                        Ok(Outcome::Saved { .. } | Outcome::Skipped { .. }) => {}
                        Ok(Outcome::Aborted) => {
                            info!(worker = id, url = %job.url, "download cancelled");
                        }
                        Err(e) => {
                            // During shutdown a failure is expected noise
                            if !shutdown.is_set() {
                                error!(worker = id, url = %job.url, error = %e, "download failed");
                            }
                        }
                    }
                    queue.task_done();
                }
            }
        }
        debug!(worker = id, "download worker exiting");
    })
}

/// Spawns the extraction worker consuming from the page queue.
///
/// Discovered file URLs pass through the ledger before being queued, so a
/// file linked from several pages downloads once; the first page's creator
/// label wins.
pub(super) fn spawn_extraction_worker(
    pages: TaskQueue<String>,
    downloads: TaskQueue<DownloadJob>,
    ledger: Arc<Ledger>,
    extractor: Arc<dyn Extractor>,
    render_wait: Duration,
    shutdown: ShutdownSignal,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        debug!("extraction worker started");
        while !shutdown.is_set() {
            match pages.pull(QUEUE_POLL_INTERVAL).await {
                None => continue,
                Some(Task::Shutdown) => break,
                Some(Task::Item(page_url)) => {
                    match extractor.extract(&page_url, render_wait).await {
                        Ok(extraction) => {
                            let mut queued = 0usize;
                            for url in extraction.files {
                                if ledger.admit(&url, false) {
                                    downloads.push(DownloadJob {
                                        url,
                                        label: extraction.label.clone(),
                                    });
                                    queued += 1;
                                }
                            }
                            info!(page = %page_url, queued, "page extracted");
                        }
                        Err(e) => {
                            if !shutdown.is_set() {
                                error!(page = %page_url, error = %e, "extraction failed");
                            }
                        }
                    }
                    pages.task_done();
                }
            }
        }
        debug!("extraction worker exiting");
    })
}

/// Spawns the interactive input poller.
///
/// The sequence observed at spawn time is the baseline; whatever the source
/// already held is never admitted. On each change the content is split on
/// whitespace and every recognized URL is force-admitted, so re-copying a URL
/// deliberately re-downloads it.
pub fn spawn_clipboard_poller(
    mut source: impl ClipboardSource + 'static,
    intake: Intake,
    shutdown: ShutdownSignal,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut last = source.sequence();
        debug!(sequence = last, "input poller started");
        while !shutdown.is_set() {
            tokio::time::sleep(INPUT_POLL_INTERVAL).await;
            let sequence = source.sequence();
            if sequence == last {
                continue;
            }
            last = sequence;
            let Some(text) = source.contents() else {
                continue;
            };
            for token in text.split_whitespace() {
                match intake.admit(token, true) {
                    Admission::QueuedFile => info!(url = token, "queued file from input"),
                    Admission::QueuedPage => info!(url = token, "queued page from input"),
                    // force admission never reports duplicates
                    Admission::Duplicate | Admission::Unrecognized => {}
                }
            }
        }
        debug!("input poller exiting");
    })
}
