use crate::harvest::pipeline::HarvestError;
use std::future::Future;
use std::sync::Arc;
use tokio::sync::Semaphore;
use tracing::trace;

/// Bounds how many repository jobs run at once, to stay within the API's
/// rate limits. A limit of one gives strictly sequential processing in
/// submission order.
pub struct HarvesterExecutor {
    semaphore: Arc<Semaphore>,
    limit: usize,
}

impl HarvesterExecutor {
    pub fn new(concurrency_limit: usize) -> Self {
        let limit = concurrency_limit.max(1);
        Self {
            semaphore: Arc::new(Semaphore::new(limit)),
            limit,
        }
    }

    pub fn limit(&self) -> usize {
        self.limit
    }

    /// Runs `job` once a slot is free. The job is not polled before then.
    pub async fn execute<F>(&self, job: F) -> Result<F::Output, HarvestError>
    where
        F: Future,
    {
        let _permit = self
            .semaphore
            .acquire()
            .await
            .map_err(|e| HarvestError::Executor(format!("Semaphore error: {}", e)))?;

        trace!(
            available = self.semaphore.available_permits(),
            "Acquired harvest slot"
        );
        Ok(job.await)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::future::join_all;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    #[tokio::test]
    async fn test_never_exceeds_limit() {
        let executor = HarvesterExecutor::new(2);
        let running = &AtomicUsize::new(0);
        let peak = &AtomicUsize::new(0);

        let jobs = (0..6).map(|_| {
            executor.execute(async move {
                let now = running.fetch_add(1, Ordering::SeqCst) + 1;
                peak.fetch_max(now, Ordering::SeqCst);
                tokio::time::sleep(Duration::from_millis(5)).await;
                running.fetch_sub(1, Ordering::SeqCst);
            })
        });
        for result in join_all(jobs).await {
            assert!(result.is_ok());
        }

        assert_eq!(peak.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_single_slot_runs_in_submission_order() {
        let executor = HarvesterExecutor::new(1);
        let order = &std::sync::Mutex::new(Vec::new());

        let jobs = (0..4).map(|i| {
            executor.execute(async move {
                tokio::time::sleep(Duration::from_millis(4 - i)).await;
                order.lock().unwrap().push(i);
            })
        });
        join_all(jobs).await;

        assert_eq!(*order.lock().unwrap(), vec![0, 1, 2, 3]);
    }

    #[test]
    fn test_zero_limit_is_raised_to_one() {
        assert_eq!(HarvesterExecutor::new(0).limit(), 1);
    }
}
