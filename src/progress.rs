//! Progress reporting seam.
//!
//! The core reports transfer progress through these traits and never depends
//! on a rendering backend; the binary wires up `indicatif` bars, tests and
//! library embedders get the no-op sink.

/// Creates one observer per transfer. Shared by all download workers.
pub trait ProgressSink: Send + Sync {
    /// Called when a transfer starts streaming. `total` is the
    /// server-reported size (0 when unknown) and `offset` the resume point.
    fn transfer(&self, filename: &str, total: u64, offset: u64) -> Box<dyn TransferObserver>;
}

/// Receives progress events for a single transfer.
///
/// `Sync` is required because a shared reference to the observer is held
/// across await points inside the transfer loop, which runs on a spawned
/// task.
pub trait TransferObserver: Send + Sync {
    /// `bytes` more body bytes were written to the staging file.
    fn advance(&self, bytes: u64);

    /// The transfer completed and the file was promoted to its final name.
    fn finish(&self);

    /// The transfer stopped early (cancelled or failed); staging data stays.
    fn abandon(&self);
}

/// Sink that discards all progress events.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopSink;

impl ProgressSink for NoopSink {
    fn transfer(&self, _filename: &str, _total: u64, _offset: u64) -> Box<dyn TransferObserver> {
        Box::new(NoopObserver)
    }
}

/// Observer that discards all progress events.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopObserver;

impl TransferObserver for NoopObserver {
    fn advance(&self, _bytes: u64) {}
    fn finish(&self) {}
    fn abandon(&self) {}
}
