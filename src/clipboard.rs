//! Interactive input boundary.
//!
//! The poller watches a [`ClipboardSource`] for changes using a sequence
//! number: a bumped sequence means new content worth scanning. The shipped
//! source reads lines from standard input on a background thread, so pasting
//! a URL (or a whole block of them) and pressing enter feeds the pipeline.
//! Tests use [`ScriptedClipboard`].

use std::io::{BufRead, BufReader};
use std::sync::mpsc::{Receiver, TryRecvError};
use std::thread;

use tracing::debug;

/// Source of user-supplied text, polled for changes.
pub trait ClipboardSource: Send {
    /// Monotonic counter that increases whenever the content changes.
    /// Observing the same value twice means nothing new arrived.
    fn sequence(&mut self) -> u64;

    /// The current content, if any.
    fn contents(&mut self) -> Option<String>;
}

/// Clipboard source backed by lines from a reader (standard input by
/// default). Each complete line is one content change.
pub struct LineSource {
    lines: Receiver<String>,
    sequence: u64,
    current: Option<String>,
}

impl LineSource {
    /// Spawns a reader thread over standard input.
    #[must_use]
    pub fn stdin() -> Self {
        Self::spawn(BufReader::new(std::io::stdin()))
    }

    /// Spawns a reader thread over an arbitrary line source.
    ///
    /// The thread exits when the reader hits end of input; the source then
    /// stops producing new sequence numbers.
    pub fn spawn(reader: impl BufRead + Send + 'static) -> Self {
        let (tx, rx) = std::sync::mpsc::channel();
        thread::spawn(move || {
            for line in reader.lines() {
                let Ok(line) = line else { break };
                if tx.send(line).is_err() {
                    break;
                }
            }
            debug!("input reader thread finished");
        });
        Self {
            lines: rx,
            sequence: 0,
            current: None,
        }
    }

    /// Drains lines that arrived since the last poll, keeping the newest.
    fn drain(&mut self) {
        loop {
            match self.lines.try_recv() {
                Ok(line) => {
                    self.sequence += 1;
                    self.current = Some(line);
                }
                Err(TryRecvError::Empty | TryRecvError::Disconnected) => break,
            }
        }
    }
}

impl ClipboardSource for LineSource {
    fn sequence(&mut self) -> u64 {
        self.drain();
        self.sequence
    }

    fn contents(&mut self) -> Option<String> {
        self.drain();
        self.current.clone()
    }
}

/// Scripted source for tests: each poll surfaces the next queued payload.
#[derive(Debug, Default)]
pub struct ScriptedClipboard {
    queued: std::collections::VecDeque<String>,
    sequence: u64,
    current: Option<String>,
}

impl ScriptedClipboard {
    /// Creates a source that will surface the given payloads in order.
    #[must_use]
    pub fn new(payloads: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self {
            queued: payloads.into_iter().map(Into::into).collect(),
            sequence: 0,
            current: None,
        }
    }
}

impl ClipboardSource for ScriptedClipboard {
    fn sequence(&mut self) -> u64 {
        if let Some(next) = self.queued.pop_front() {
            self.sequence += 1;
            self.current = Some(next);
        }
        self.sequence
    }

    fn contents(&mut self) -> Option<String> {
        self.current.clone()
    }
}
