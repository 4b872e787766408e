//! Bounded worker pool for CPU-bound bucket work.

use std::sync::Arc;
use tokio::sync::Semaphore;

use crate::{EngineError, Result};

/// Runs closures on the blocking thread pool, at most `size` at a time.
///
/// Dispatching suspends the calling task until the job completes without
/// blocking other tasks on the runtime. A job keeps running to completion
/// even if the awaiting task is cancelled, so anything it owns (such as a
/// store guard) is released only when the job is done.
#[derive(Debug, Clone)]
pub struct WorkerPool {
    permits: Arc<Semaphore>,
    size: usize,
}

impl WorkerPool {
    /// Creates a pool allowing `size` concurrent jobs. Zero is treated as one.
    #[must_use]
    pub fn new(size: usize) -> Self {
        let size = size.max(1);
        Self {
            permits: Arc::new(Semaphore::new(size)),
            size,
        }
    }

    /// Returns the maximum number of concurrent jobs.
    #[must_use]
    pub const fn size(&self) -> usize {
        self.size
    }

    /// Runs `job` on a worker and waits for its result.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::PoolClosed`] after [`shutdown`](Self::shutdown),
    /// or [`EngineError::Worker`] if the job panicked.
    pub async fn run<F, T>(&self, job: F) -> Result<T>
    where
        F: FnOnce() -> T + Send + 'static,
        T: Send + 'static,
    {
        let permit = Arc::clone(&self.permits)
            .acquire_owned()
            .await
            .map_err(|_| EngineError::PoolClosed)?;

        tokio::task::spawn_blocking(move || {
            let _permit = permit;
            job()
        })
        .await
        .map_err(EngineError::Worker)
    }

    /// Waits for in-flight jobs to finish, then refuses new ones.
    pub async fn shutdown(&self) {
        let all = u32::try_from(self.size).unwrap_or(u32::MAX);
        if let Ok(permits) = self.permits.acquire_many(all).await {
            permits.forget();
        }
        self.permits.close();
    }

    /// Returns true once the pool has been shut down.
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.permits.is_closed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    #[tokio::test]
    async fn test_run_returns_result() {
        let pool = WorkerPool::new(2);
        assert_eq!(pool.run(|| 40 + 2).await.unwrap(), 42);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_concurrency_is_bounded() {
        let pool = WorkerPool::new(2);
        let running = Arc::new(AtomicUsize::new(0));
        let peak = Arc::new(AtomicUsize::new(0));

        let mut handles = Vec::new();
        for _ in 0..8 {
            let pool = pool.clone();
            let running = Arc::clone(&running);
            let peak = Arc::clone(&peak);
            handles.push(tokio::spawn(async move {
                pool.run(move || {
                    let now = running.fetch_add(1, Ordering::SeqCst) + 1;
                    peak.fetch_max(now, Ordering::SeqCst);
                    std::thread::sleep(Duration::from_millis(20));
                    running.fetch_sub(1, Ordering::SeqCst);
                })
                .await
            }));
        }
        for handle in handles {
            handle.await.unwrap().unwrap();
        }

        assert!(peak.load(Ordering::SeqCst) <= 2);
    }

    #[tokio::test]
    async fn test_shutdown_rejects_new_jobs() {
        let pool = WorkerPool::new(1);
        pool.shutdown().await;

        assert!(pool.is_closed());
        assert!(matches!(pool.run(|| ()).await, Err(EngineError::PoolClosed)));
    }

    #[tokio::test]
    async fn test_panicking_job_is_reported() {
        let pool = WorkerPool::new(1);
        let result = pool.run(|| -> i32 { panic!("boom") }).await;
        assert!(matches!(result, Err(EngineError::Worker(_))));
        // The permit is released even though the job panicked.
        assert_eq!(pool.run(|| 1).await.unwrap(), 1);
    }
}
