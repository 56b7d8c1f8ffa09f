//! CLI entry point for the patreon-dl tool.

use std::io::IsTerminal;
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::Result;
use clap::Parser;
use tracing::{debug, info, warn};

use patreon_dl::clipboard::LineSource;
use patreon_dl::download::constants::{
    DRAIN_JOIN_TIMEOUT, INPUT_POLL_INTERVAL, STATUS_INTERVAL,
};
use patreon_dl::download::{HttpClient, RetryPolicy};
use patreon_dl::extract::PageScanExtractor;
use patreon_dl::pipeline::{
    Admission, Completion, DrainReason, Pipeline, PipelineConfig, spawn_clipboard_poller,
};
use patreon_dl::progress::{NoopSink, ProgressSink};

mod cli;
mod render;

use cli::Args;
use render::IndicatifSink;

#[tokio::main]
async fn main() -> Result<()> {
    // Parse CLI arguments first (before tracing, so --help works without logs)
    let args = Args::parse();

    // Determine log level based on verbose/quiet flags
    // Priority: RUST_LOG env var > quiet flag > verbose flag > default (info)
    let default_level = if args.quiet {
        "error"
    } else {
        match args.verbose {
            0 => "info",
            1 => "debug",
            _ => "trace",
        }
    };

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level));

    tracing_subscriber::fmt().with_env_filter(filter).init();

    debug!(?args, "CLI arguments parsed");

    if args.batch && args.urls.is_empty() {
        info!("Nothing to do: batch mode with no URLs");
        return Ok(());
    }

    let retry = RetryPolicy::with_max_attempts(u32::from(args.max_attempts));
    let client = HttpClient::new(retry);
    let extractor = Arc::new(PageScanExtractor::new(client.inner().clone()));

    // Progress bars only on a real terminal; logs carry the outcome anyway
    let sink: Arc<dyn ProgressSink> = if !args.quiet && std::io::stderr().is_terminal() {
        Arc::new(IndicatifSink::new())
    } else {
        Arc::new(NoopSink)
    };

    let config = PipelineConfig {
        concurrency: usize::from(args.concurrency),
        output_dir: args.output_dir.clone(),
        render_wait: Duration::from_secs(args.render_wait),
    };
    let pipeline = Pipeline::start(&config, client, extractor, sink);
    let intake = pipeline.intake();

    for url in &args.urls {
        match intake.admit(url, false) {
            Admission::QueuedFile => info!(url, "queued file"),
            Admission::QueuedPage => info!(url, "queued page"),
            Admission::Duplicate => debug!(url, "duplicate URL skipped"),
            Admission::Unrecognized => warn!(url, "unrecognized URL skipped"),
        }
    }

    // First Ctrl-C requests a cooperative stop; workers notice at their next
    // check and in-flight transfers end on a chunk boundary.
    let interrupt = pipeline.shutdown_signal();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("interrupt received, stopping");
            interrupt.set();
        }
    });

    let completion = if args.batch {
        pipeline.wait_until_idle().await;
        let reason = if pipeline.shutdown_signal().is_set() {
            DrainReason::Interrupt
        } else {
            DrainReason::Idle
        };
        pipeline.drain(reason).await
    } else {
        info!("watching standard input; paste URLs and press enter (Ctrl-C to stop)");
        let poller = spawn_clipboard_poller(
            LineSource::stdin(),
            intake.clone(),
            pipeline.shutdown_signal(),
        );

        run_interactive(&pipeline).await;

        let completion = pipeline.drain(DrainReason::Interrupt).await;
        let _ = tokio::time::timeout(DRAIN_JOIN_TIMEOUT, poller).await;
        completion
    };

    info!(urls = intake.seen(), "run summary");
    match completion {
        Completion::Finished => info!("all downloads finished"),
        Completion::Interrupted => warn!("stopped with work outstanding"),
    }

    Ok(())
}

/// Interactive loop: periodic status line plus a marker when a burst of
/// queued work drains. Returns when the shutdown signal is set.
async fn run_interactive(pipeline: &Pipeline) {
    let shutdown = pipeline.shutdown_signal();
    let mut last_status = Instant::now();
    let mut was_busy = !pipeline.is_idle();

    while !shutdown.is_set() {
        tokio::time::sleep(INPUT_POLL_INTERVAL).await;

        let busy = !pipeline.is_idle();
        if was_busy && !busy {
            info!("all queued work finished");
        }
        was_busy = busy;

        if last_status.elapsed() >= STATUS_INTERVAL {
            let stats = pipeline.stats();
            info!(
                downloads = stats.downloads_pending,
                pages = stats.pages_pending,
                active = stats.active_transfers,
                "status"
            );
            last_status = Instant::now();
        }
    }
}
