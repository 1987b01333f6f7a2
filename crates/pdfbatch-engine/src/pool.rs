//! Bounded-parallelism executor of arbitrary submitted tasks.
//!
//! Mirrors the persistent-worker-task shape used elsewhere in this
//! workspace for async worker loops: a fixed number of long-lived `tokio`
//! tasks, collected in a [`JoinSet`], each pulling work from a shared queue
//! until the queue is closed. Dispatch through one shared channel (rather
//! than a per-worker command channel plus idle tracking) gives the pool its
//! FIFO, no-priority submission order for free: the next queued task always
//! goes to whichever worker becomes free first.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{mpsc, Mutex as AsyncMutex};
use tokio::task::JoinSet;

/// A unit of work submitted to the pool: a boxed, owned future.
pub type Task = Pin<Box<dyn Future<Output = ()> + Send>>;

/// The default number of worker threads/tasks if the embedder does not
/// specify one, matching the engine's documented default.
pub const DEFAULT_WORKER_COUNT: usize = 4;

/// A bounded-parallelism pool of worker tasks.
pub struct WorkerPool {
    sender: Option<mpsc::Sender<Task>>,
    join: JoinSet<()>,
}

impl WorkerPool {
    /// Spawns `worker_count` (at least 1) persistent worker tasks sharing a
    /// bounded task queue.
    pub fn new(worker_count: usize) -> Self {
        let worker_count = worker_count.max(1);
        let (tx, rx) = mpsc::channel::<Task>(worker_count * 4);
        let rx = Arc::new(AsyncMutex::new(rx));

        let mut join = JoinSet::new();
        for _ in 0..worker_count {
            let rx = Arc::clone(&rx);
            join.spawn(async move {
                loop {
                    let next = {
                        let mut guard = rx.lock().await;
                        guard.recv().await
                    };
                    match next {
                        Some(task) => task.await,
                        None => return,
                    }
                }
            });
        }

        WorkerPool {
            sender: Some(tx),
            join,
        }
    }

    /// Enqueues `task`, awaiting if every worker's queue slot is currently
    /// occupied. Returns an error if the pool has already begun shutting
    /// down.
    pub async fn submit(&self, task: Task) -> Result<(), PoolShutdown> {
        match &self.sender {
            Some(tx) => tx.send(task).await.map_err(|_| PoolShutdown),
            None => Err(PoolShutdown),
        }
    }

    /// Stops accepting new submissions, then waits up to `grace` for
    /// in-flight tasks to finish before returning. Tasks still running past
    /// the grace period are detached, not forcibly killed: cooperative
    /// cancellation (setting each job's `cancel_signal` before calling this)
    /// is what bounds their remaining lifetime.
    pub async fn shutdown(mut self, grace: Duration) {
        self.sender.take();
        let _ = tokio::time::timeout(grace, async {
            while self.join.join_next().await.is_some() {}
        })
        .await;
    }
}

/// Returned by [`WorkerPool::submit`] once the pool has stopped accepting
/// work.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PoolShutdown;

impl std::fmt::Display for PoolShutdown {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "worker pool is shutting down")
    }
}

impl std::error::Error for PoolShutdown {}
