//! Per-key debounced task runner
//!
//! Scheduling a task under a key that already has a pending task cancels
//! the pending one and starts a fresh delay window. Only the last task of a
//! burst runs. A task whose delay has already elapsed runs to completion and
//! cannot be cancelled.
//!
//! Tasks run on the ambient tokio runtime; `schedule` must be called from
//! within one.

use std::collections::HashMap;
use std::future::Future;
use std::hash::Hash;
use std::sync::Mutex;
use std::time::Duration;

use tokio::sync::oneshot;
use tokio::task::JoinHandle;

use crate::observability::Logger;

struct PendingTask {
    cancel: oneshot::Sender<()>,
    handle: JoinHandle<()>,
}

/// Debouncer keyed by `K`
pub struct Debouncer<K> {
    delay: Duration,
    pending: Mutex<HashMap<K, PendingTask>>,
}

impl<K> std::fmt::Debug for Debouncer<K> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Debouncer")
            .field("delay", &self.delay)
            .finish_non_exhaustive()
    }
}

impl<K> Debouncer<K>
where
    K: Eq + Hash + Send + 'static,
{
    /// Create a debouncer with the given quiet window
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            pending: Mutex::new(HashMap::new()),
        }
    }

    /// Run `task` after the quiet window unless another task is scheduled
    /// under the same key first.
    pub fn schedule<F>(&self, key: K, task: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let (cancel_tx, cancel_rx) = oneshot::channel::<()>();
        let delay = self.delay;

        let handle = tokio::spawn(async move {
            tokio::select! {
                _ = tokio::time::sleep(delay) => task.await,
                // A dropped sender is not a cancellation.
                Ok(()) = cancel_rx => {}
            }
        });

        let previous = match self.pending.lock() {
            Ok(mut pending) => pending.insert(
                key,
                PendingTask {
                    cancel: cancel_tx,
                    handle,
                },
            ),
            Err(_) => {
                Logger::error("DEBOUNCE_LOCK_POISONED", &[]);
                None
            }
        };

        if let Some(previous) = previous {
            let _ = previous.cancel.send(());
        }
    }

    /// Cancel the pending task for `key`. Returns true if a task was still
    /// waiting and will not run.
    pub fn cancel(&self, key: &K) -> bool {
        let entry = self.pending.lock().ok().and_then(|mut p| p.remove(key));
        match entry {
            Some(task) => task.cancel.send(()).is_ok(),
            None => false,
        }
    }

    /// Number of tasks not yet finished
    pub fn pending(&self) -> usize {
        self.pending
            .lock()
            .map(|p| p.values().filter(|t| !t.handle.is_finished()).count())
            .unwrap_or(0)
    }

    /// Wait for every scheduled task to run to completion. Pending tasks
    /// still honor their delay.
    pub async fn drain(&self) {
        let tasks: Vec<PendingTask> = match self.pending.lock() {
            Ok(mut pending) => pending.drain().map(|(_, task)| task).collect(),
            Err(_) => Vec::new(),
        };

        for task in tasks {
            // Keep the sender alive so the task is not treated as cancelled.
            let PendingTask { cancel, handle } = task;
            if let Err(e) = handle.await {
                if !e.is_cancelled() {
                    let reason = e.to_string();
                    Logger::error("DEBOUNCED_TASK_FAILED", &[("reason", reason.as_str())]);
                }
            }
            drop(cancel);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    #[tokio::test(start_paused = true)]
    async fn test_last_task_in_burst_wins() {
        let debouncer = Debouncer::new(Duration::from_millis(300));
        let last = Arc::new(AtomicUsize::new(0));
        let runs = Arc::new(AtomicUsize::new(0));

        for i in 1..=5 {
            let last = Arc::clone(&last);
            let runs = Arc::clone(&runs);
            debouncer.schedule("field", async move {
                last.store(i, Ordering::SeqCst);
                runs.fetch_add(1, Ordering::SeqCst);
            });
            tokio::time::sleep(Duration::from_millis(100)).await;
        }

        debouncer.drain().await;
        assert_eq!(runs.load(Ordering::SeqCst), 1);
        assert_eq!(last.load(Ordering::SeqCst), 5);
    }

    #[tokio::test(start_paused = true)]
    async fn test_keys_are_independent() {
        let debouncer = Debouncer::new(Duration::from_millis(300));
        let runs = Arc::new(AtomicUsize::new(0));

        for key in [1u32, 2, 3] {
            let runs = Arc::clone(&runs);
            debouncer.schedule(key, async move {
                runs.fetch_add(1, Ordering::SeqCst);
            });
        }

        debouncer.drain().await;
        assert_eq!(runs.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_task_waits_for_quiet_window() {
        let debouncer = Debouncer::new(Duration::from_millis(300));
        let runs = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&runs);
        debouncer.schedule(1u32, async move {
            counter.fetch_add(1, Ordering::SeqCst);
        });

        tokio::time::sleep(Duration::from_millis(200)).await;
        assert_eq!(runs.load(Ordering::SeqCst), 0);
        assert_eq!(debouncer.pending(), 1);

        tokio::time::sleep(Duration::from_millis(200)).await;
        assert_eq!(runs.load(Ordering::SeqCst), 1);
        assert_eq!(debouncer.pending(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_prevents_run() {
        let debouncer = Debouncer::new(Duration::from_millis(300));
        let runs = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&runs);
        debouncer.schedule(1u32, async move {
            counter.fetch_add(1, Ordering::SeqCst);
        });

        assert!(debouncer.cancel(&1));
        assert!(!debouncer.cancel(&1));
        tokio::time::sleep(Duration::from_secs(1)).await;
        assert_eq!(runs.load(Ordering::SeqCst), 0);
    }
}
