//! Bounded worker pool for connection tasks.
//!
//! The accept loop hands each connection over with [`WorkerPool::submit`],
//! which waits for a free slot before spawning. When every slot is busy the
//! accept loop stops accepting, so new clients queue in the listen backlog
//! instead of being refused.

use std::future::Future;
use std::sync::Arc;

use tokio::sync::{AcquireError, Semaphore};
use tokio::task::JoinHandle;

#[derive(Debug, Clone)]
pub struct WorkerPool {
    permits: Arc<Semaphore>,
    size: usize,
}

impl WorkerPool {
    /// Creates a pool running at most `size` tasks at once.
    pub fn new(size: usize) -> Self {
        Self {
            permits: Arc::new(Semaphore::new(size)),
            size,
        }
    }

    /// Spawns `task` once a slot is free, waiting as long as it takes.
    ///
    /// The slot is released when the task finishes, including by panic.
    /// Fails only after [`close`](Self::close).
    pub async fn submit<F>(&self, task: F) -> Result<JoinHandle<()>, AcquireError>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let permit = Arc::clone(&self.permits).acquire_owned().await?;
        Ok(tokio::spawn(async move {
            task.await;
            drop(permit);
        }))
    }

    /// Maximum number of concurrent tasks.
    pub fn size(&self) -> usize {
        self.size
    }

    /// Number of tasks currently running.
    pub fn busy(&self) -> usize {
        self.size - self.permits.available_permits()
    }

    pub fn is_saturated(&self) -> bool {
        self.permits.available_permits() == 0
    }

    /// Makes every pending and future [`submit`](Self::submit) fail.
    pub fn close(&self) {
        self.permits.close();
    }
}
