//! Work queues shared between pipeline stages.
//!
//! Each queue is FIFO, unbounded, and multi-producer; multiple workers share
//! one receiver behind an async mutex. Pulls wait at most a poll interval so
//! a blocked worker periodically re-checks the shutdown signal instead of
//! parking forever.
//!
//! The pending counter has `task_done` semantics: it is incremented on push
//! and decremented only after a worker finishes processing the item. Idleness
//! therefore covers in-flight work, not just queued work: a page that has
//! been pulled but is still being extracted keeps the pipeline busy.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use tokio::sync::Mutex;
use tokio::sync::mpsc;
use tracing::warn;

/// A queued unit of work, or the sentinel that wakes a worker for exit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Task<T> {
    /// Real work.
    Item(T),
    /// No more work will come; the consuming worker should exit.
    Shutdown,
}

/// Unbounded FIFO queue with sentinel support and polled pulls.
#[derive(Debug)]
pub struct TaskQueue<T> {
    tx: mpsc::UnboundedSender<Task<T>>,
    rx: Arc<Mutex<mpsc::UnboundedReceiver<Task<T>>>>,
    pending: Arc<AtomicUsize>,
}

impl<T> Clone for TaskQueue<T> {
    fn clone(&self) -> Self {
        Self {
            tx: self.tx.clone(),
            rx: Arc::clone(&self.rx),
            pending: Arc::clone(&self.pending),
        }
    }
}

impl<T> Default for TaskQueue<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> TaskQueue<T> {
    /// Creates an empty queue.
    #[must_use]
    pub fn new() -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        Self {
            tx,
            rx: Arc::new(Mutex::new(rx)),
            pending: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Enqueues an item and counts it as pending until [`task_done`](Self::task_done).
    pub fn push(&self, item: T) {
        self.pending.fetch_add(1, Ordering::SeqCst);
        if self.tx.send(Task::Item(item)).is_err() {
            // Receiver gone: the pipeline is tearing down, drop the item.
            self.pending.fetch_sub(1, Ordering::SeqCst);
            warn!("queue receiver dropped, discarding item");
        }
    }

    /// Enqueues one shutdown sentinel. Sentinels are not pending work.
    pub fn push_shutdown(&self) {
        let _ = self.tx.send(Task::Shutdown);
    }

    /// Pulls the next task, waiting at most `poll` before giving up.
    ///
    /// Returns `None` on timeout (the caller should re-check the shutdown
    /// signal and try again) and `Some(Task::Shutdown)` when a sentinel is
    /// consumed.
    pub async fn pull(&self, poll: Duration) -> Option<Task<T>> {
        let mut rx = self.rx.lock().await;
        match tokio::time::timeout(poll, rx.recv()).await {
            Ok(Some(task)) => Some(task),
            // Channel closed: treat like a sentinel so the worker exits.
            Ok(None) => Some(Task::Shutdown),
            Err(_) => None,
        }
    }

    /// Marks one previously pulled item as fully processed.
    pub fn task_done(&self) {
        self.pending.fetch_sub(1, Ordering::SeqCst);
    }

    /// Number of items queued or currently being processed.
    #[must_use]
    pub fn pending(&self) -> usize {
        self.pending.load(Ordering::SeqCst)
    }

    /// Returns `true` when nothing is queued or in flight.
    #[must_use]
    pub fn is_idle(&self) -> bool {
        self.pending() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const POLL: Duration = Duration::from_millis(20);

    #[tokio::test]
    async fn test_push_pull_fifo_order() {
        let queue = TaskQueue::new();
        queue.push(1);
        queue.push(2);
        assert_eq!(queue.pull(POLL).await, Some(Task::Item(1)));
        assert_eq!(queue.pull(POLL).await, Some(Task::Item(2)));
    }

    #[tokio::test]
    async fn test_pull_times_out_on_empty_queue() {
        let queue: TaskQueue<u32> = TaskQueue::new();
        assert_eq!(queue.pull(POLL).await, None);
    }

    #[tokio::test]
    async fn test_pending_counts_in_flight_work() {
        let queue = TaskQueue::new();
        queue.push("job");
        assert_eq!(queue.pending(), 1);

        // Pulling does not mark the work done
        let task = queue.pull(POLL).await;
        assert_eq!(task, Some(Task::Item("job")));
        assert_eq!(queue.pending(), 1);
        assert!(!queue.is_idle());

        queue.task_done();
        assert!(queue.is_idle());
    }

    #[tokio::test]
    async fn test_shutdown_sentinel_is_not_pending() {
        let queue: TaskQueue<u32> = TaskQueue::new();
        queue.push_shutdown();
        assert!(queue.is_idle());
        assert_eq!(queue.pull(POLL).await, Some(Task::Shutdown));
    }

    #[tokio::test]
    async fn test_sentinel_preserves_fifo_with_items() {
        let queue = TaskQueue::new();
        queue.push(1);
        queue.push_shutdown();
        assert_eq!(queue.pull(POLL).await, Some(Task::Item(1)));
        assert_eq!(queue.pull(POLL).await, Some(Task::Shutdown));
    }

    #[tokio::test]
    async fn test_multiple_consumers_each_receive_once() {
        let queue = TaskQueue::new();
        for i in 0..4 {
            queue.push(i);
        }

        let mut seen = Vec::new();
        for _ in 0..4 {
            match queue.pull(POLL).await {
                Some(Task::Item(i)) => {
                    seen.push(i);
                    queue.task_done();
                }
                other => panic!("expected item, got {other:?}"),
            }
        }
        seen.sort_unstable();
        assert_eq!(seen, vec![0, 1, 2, 3]);
        assert!(queue.is_idle());
    }
}
