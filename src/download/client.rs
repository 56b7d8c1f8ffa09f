//! HTTP client and the resumable transfer state machine.
//!
//! One [`HttpClient`] is created at startup and cloned into every download
//! worker; the underlying reqwest connection pool is shared. Each job runs
//! the same strictly ordered sequence: resolve the output directory, probe
//! metadata, short-circuit on an existing file or a complete staging file,
//! stream the (possibly ranged) body into `<name>.part`, then atomically
//! rename. A crash or cancellation can only ever leave a `.part` file behind,
//! never a truncated file at the final name.

use std::path::{Path, PathBuf};
use std::time::Duration;

use futures_util::StreamExt;
use reqwest::header::{CONTENT_LENGTH, RANGE, REFERER, USER_AGENT};
use reqwest::{Client, StatusCode};
use tokio::fs::{self, File, OpenOptions};
use tokio::io::{AsyncWriteExt, BufWriter};
use tracing::{debug, info, instrument, warn};

use crate::pipeline::ShutdownSignal;
use crate::progress::{ProgressSink, TransferObserver};

use super::constants::{
    CHUNK_SIZE, CONNECT_TIMEOUT_SECS, DEFAULT_GROUP, PART_SUFFIX, READ_TIMEOUT_SECS,
    REFERER as REFERER_VALUE, USER_AGENT as USER_AGENT_VALUE,
};
use super::error::DownloadError;
use super::filename::{filename_from_headers, sanitize};
use super::retry::RetryPolicy;
use super::{DownloadJob, Outcome};

/// HTTP client for resumable streaming downloads.
#[derive(Debug, Clone)]
pub struct HttpClient {
    client: Client,
    retry: RetryPolicy,
}

/// How a body stream ended.
enum StreamEnd {
    /// All body bytes consumed; value is the final staging file length.
    Completed(u64),
    /// Shutdown signal observed; value is the staging file length so far.
    Cancelled(u64),
}

impl Default for HttpClient {
    fn default() -> Self {
        Self::new(RetryPolicy::default())
    }
}

impl HttpClient {
    /// Creates a client with default timeouts and the given retry policy.
    ///
    /// # Panics
    ///
    /// Panics if the reqwest builder fails with this static configuration,
    /// which should never happen in practice.
    #[must_use]
    #[allow(clippy::expect_used)]
    pub fn new(retry: RetryPolicy) -> Self {
        Self::with_timeouts(retry, CONNECT_TIMEOUT_SECS, READ_TIMEOUT_SECS)
    }

    /// Creates a client with explicit timeout values.
    ///
    /// # Panics
    ///
    /// Panics if the reqwest builder fails with the supplied configuration.
    #[must_use]
    #[allow(clippy::expect_used)]
    pub fn with_timeouts(retry: RetryPolicy, connect_timeout_secs: u64, read_timeout_secs: u64) -> Self {
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(connect_timeout_secs))
            .read_timeout(Duration::from_secs(read_timeout_secs))
            .gzip(true)
            .build()
            .expect("failed to build HTTP client with static configuration");
        Self { client, retry }
    }

    /// Returns a reference to the underlying reqwest client.
    #[must_use]
    pub fn inner(&self) -> &Client {
        &self.client
    }

    /// Runs one download job to a terminal outcome.
    ///
    /// `Failed` is represented by the `Err` branch; cancellation is the
    /// distinct `Ok(Outcome::Aborted)` and is never an error.
    ///
    /// # Errors
    ///
    /// Returns [`DownloadError`] when metadata resolution or streaming fails
    /// after the retry budget, or on a filesystem error. The staging file is
    /// left in place so a later re-submission can resume.
    #[instrument(skip_all, fields(url = %job.url))]
    pub async fn download(
        &self,
        job: &DownloadJob,
        root: &Path,
        shutdown: &ShutdownSignal,
        sink: &dyn ProgressSink,
    ) -> Result<Outcome, DownloadError> {
        // 1. Output directory from the sanitized label.
        let group = job
            .label
            .as_deref()
            .map(sanitize)
            .filter(|g| !g.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_GROUP.to_string());
        let dir = root.join(&group);
        fs::create_dir_all(&dir)
            .await
            .map_err(|e| DownloadError::io(dir.clone(), e))?;

        // 2. Metadata probe: a streaming GET whose body is dropped unread.
        let probe = self.send_get(&job.url, 0).await?;
        let filename = filename_from_headers(probe.headers());
        let total_size = content_length(&probe);
        drop(probe);

        let final_path = dir.join(&filename);
        let part_path = dir.join(format!("{filename}{PART_SUFFIX}"));

        // 3. Never touch an already-downloaded file.
        if fs::try_exists(&final_path).await.unwrap_or(false) {
            info!(file = %filename, "already exists, skipping");
            return Ok(Outcome::Skipped { path: final_path });
        }

        // 4. The staging file's length is the resume offset.
        let offset = match fs::metadata(&part_path).await {
            Ok(meta) => meta.len(),
            Err(_) => 0,
        };

        // 5. A staging file at or past the known size is already complete.
        //    The size > 0 guard matters: unknown-size resources must not
        //    short-circuit.
        if offset > 0 && total_size > 0 && offset >= total_size {
            fs::rename(&part_path, &final_path)
                .await
                .map_err(|e| DownloadError::io(part_path.clone(), e))?;
            info!(file = %filename, bytes = offset, "staging file complete, promoted");
            return Ok(Outcome::Saved {
                path: final_path,
                bytes: offset,
            });
        }

        // 6. The real transfer, ranged when resuming. A 206 means the server
        //    honored the range; anything else restarts from byte zero.
        let response = self.send_get(&job.url, offset).await?;
        let resumed = offset > 0 && response.status() == StatusCode::PARTIAL_CONTENT;
        let (file, start) = if resumed {
            info!(file = %filename, offset, "resuming transfer");
            let handle = OpenOptions::new()
                .append(true)
                .open(&part_path)
                .await
                .map_err(|e| DownloadError::io(part_path.clone(), e))?;
            (handle, offset)
        } else {
            if offset > 0 {
                debug!(file = %filename, "server ignored range request, restarting");
            }
            info!(file = %filename, total = total_size, "starting transfer");
            let handle = File::create(&part_path)
                .await
                .map_err(|e| DownloadError::io(part_path.clone(), e))?;
            (handle, 0)
        };

        // 7–8. Stream, then promote by atomic rename.
        let observer = sink.transfer(&filename, total_size, start);
        let end = stream_body(
            response,
            file,
            &job.url,
            &part_path,
            shutdown,
            observer.as_ref(),
            start,
        )
        .await;

        match end {
            Ok(StreamEnd::Completed(bytes)) => {
                fs::rename(&part_path, &final_path)
                    .await
                    .map_err(|e| DownloadError::io(part_path.clone(), e))?;
                observer.finish();
                info!(file = %filename, group = %group, bytes, "saved");
                Ok(Outcome::Saved {
                    path: final_path,
                    bytes,
                })
            }
            Ok(StreamEnd::Cancelled(bytes)) => {
                observer.abandon();
                info!(file = %filename, bytes, "transfer aborted, staging file kept");
                Ok(Outcome::Aborted)
            }
            Err(e) => {
                observer.abandon();
                Err(e)
            }
        }
    }

    /// Sends a GET, applying the retry policy to request issuance only.
    ///
    /// A `Range: bytes=<offset>-` header is attached when `offset > 0`.
    async fn send_get(&self, url: &str, offset: u64) -> Result<reqwest::Response, DownloadError> {
        let mut attempt = 0u32;
        loop {
            attempt += 1;
            match self.try_get(url, offset).await {
                Ok(response) => return Ok(response),
                Err(e) => match self.retry.backoff(&e, attempt) {
                    Some(delay) => {
                        warn!(
                            url,
                            attempt,
                            delay_ms = delay.as_millis() as u64,
                            error = %e,
                            "retrying request"
                        );
                        tokio::time::sleep(delay).await;
                    }
                    None => return Err(e),
                },
            }
        }
    }

    async fn try_get(&self, url: &str, offset: u64) -> Result<reqwest::Response, DownloadError> {
        let mut request = self
            .client
            .get(url)
            .header(USER_AGENT, USER_AGENT_VALUE)
            .header(REFERER, REFERER_VALUE);
        if offset > 0 {
            request = request.header(RANGE, format!("bytes={offset}-"));
        }

        let response = request.send().await.map_err(|e| {
            if e.is_timeout() {
                DownloadError::timeout(url)
            } else {
                DownloadError::network(url, e)
            }
        })?;

        let status = response.status();
        if status.is_success() {
            Ok(response)
        } else {
            Err(DownloadError::http_status(url, status.as_u16()))
        }
    }
}

/// Streams the response body into the staging file.
///
/// The shutdown signal is checked after each received chunk and before the
/// corresponding write, so a cancelled transfer ends on a chunk boundary:
/// whole chunks only, never a torn write.
async fn stream_body(
    response: reqwest::Response,
    file: File,
    url: &str,
    part_path: &Path,
    shutdown: &ShutdownSignal,
    observer: &dyn TransferObserver,
    start: u64,
) -> Result<StreamEnd, DownloadError> {
    let mut writer = BufWriter::with_capacity(CHUNK_SIZE, file);
    let mut stream = response.bytes_stream();
    let mut written = start;

    while let Some(chunk) = stream.next().await {
        let chunk = chunk.map_err(|e| DownloadError::network(url, e))?;

        if shutdown.is_set() {
            writer
                .flush()
                .await
                .map_err(|e| DownloadError::io(part_path.to_path_buf(), e))?;
            return Ok(StreamEnd::Cancelled(written));
        }

        writer
            .write_all(&chunk)
            .await
            .map_err(|e| DownloadError::io(part_path.to_path_buf(), e))?;
        written += chunk.len() as u64;
        observer.advance(chunk.len() as u64);
    }

    writer
        .flush()
        .await
        .map_err(|e| DownloadError::io(part_path.to_path_buf(), e))?;

    Ok(StreamEnd::Completed(written))
}

/// Total byte size reported by the server, 0 when unknown.
fn content_length(response: &reqwest::Response) -> u64 {
    response
        .headers()
        .get(CONTENT_LENGTH)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.parse::<u64>().ok())
        .unwrap_or(0)
}

/// Staging path corresponding to a final file path.
#[must_use]
pub fn staging_path(final_path: &Path) -> PathBuf {
    let mut name = final_path.as_os_str().to_os_string();
    name.push(PART_SUFFIX);
    PathBuf::from(name)
}
