//! Retry-aware consume loop.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use kyc_types::KycResult;
use tracing::{error, warn};

use crate::job::{Job, JobPayload};
use crate::queue::JobQueue;

/// Implemented by the pipeline; one handler dispatches all payload kinds.
#[async_trait]
pub trait JobHandler: Send + Sync {
    async fn handle(&self, payload: &JobPayload) -> KycResult<()>;
}

/// Exponential backoff schedule for failed jobs.
#[derive(Clone, Copy, Debug)]
pub struct RetryPolicy {
    /// Total delivery attempts before a job is dropped.
    pub max_attempts: u32,
    pub base_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_secs(1),
        }
    }
}

impl RetryPolicy {
    /// `base * 2^(attempt - 1)`: 1s, 2s, 4s with the default base.
    pub fn delay_for(&self, attempt: u32) -> Duration {
        self.base_delay * 2u32.saturating_pow(attempt.saturating_sub(1))
    }
}

/// Drains a queue through a handler, retrying failures per the policy.
pub struct Worker {
    queue: Arc<dyn JobQueue>,
    handler: Arc<dyn JobHandler>,
    retry: RetryPolicy,
}

impl Worker {
    pub fn new(queue: Arc<dyn JobQueue>, handler: Arc<dyn JobHandler>, retry: RetryPolicy) -> Self {
        Self {
            queue,
            handler,
            retry,
        }
    }

    /// Processes jobs until the queue is empty, including any retries
    /// re-enqueued along the way. Returns the number of handler invocations.
    ///
    /// Intended for tests and batch contexts; a deployed worker calls
    /// [`run`](Self::run) instead.
    pub async fn run_until_idle(&self) -> KycResult<usize> {
        let mut invocations = 0;
        while let Some(job) = self.queue.dequeue().await? {
            invocations += 1;
            self.process(job).await?;
        }
        Ok(invocations)
    }

    /// Long-running consume loop. Sleeps briefly when the queue is empty.
    pub async fn run(&self) -> KycResult<()> {
        loop {
            match self.queue.dequeue().await? {
                Some(job) => self.process(job).await?,
                None => tokio::time::sleep(Duration::from_millis(250)).await,
            }
        }
    }

    async fn process(&self, mut job: Job) -> KycResult<()> {
        job.attempts += 1;
        match self.handler.handle(&job.payload).await {
            Ok(()) => Ok(()),
            Err(err) if job.attempts < self.retry.max_attempts => {
                let delay = self.retry.delay_for(job.attempts);
                warn!(
                    job_id = %job.id,
                    kind = job.payload.kind(),
                    attempts = job.attempts,
                    error = %err,
                    delay_ms = delay.as_millis() as u64,
                    "Job failed, re-enqueueing"
                );
                tokio::time::sleep(delay).await;
                self.queue.enqueue(job).await
            }
            Err(err) => {
                // Dropped, not re-raised: the failure is already recorded on
                // the affected record by the handler's fail path.
                error!(
                    job_id = %job.id,
                    kind = job.payload.kind(),
                    attempts = job.attempts,
                    error = %err,
                    "Job dropped after exhausting retries"
                );
                Ok(())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::queue::InMemoryQueue;
    use kyc_types::KycError;
    use std::sync::atomic::{AtomicU32, Ordering};

    struct FlakyHandler {
        calls: AtomicU32,
        failures_before_success: u32,
    }

    #[async_trait]
    impl JobHandler for FlakyHandler {
        async fn handle(&self, _payload: &JobPayload) -> KycResult<()> {
            let call = self.calls.fetch_add(1, Ordering::SeqCst);
            if call < self.failures_before_success {
                Err(KycError::System("transient".into()))
            } else {
                Ok(())
            }
        }
    }

    fn fast_retry() -> RetryPolicy {
        RetryPolicy {
            max_attempts: 3,
            base_delay: Duration::from_millis(1),
        }
    }

    #[tokio::test]
    async fn transient_failures_are_retried_to_success() {
        let queue = Arc::new(InMemoryQueue::new());
        let handler = Arc::new(FlakyHandler {
            calls: AtomicU32::new(0),
            failures_before_success: 2,
        });
        queue.push(JobPayload::CheckDocumentExpiry).await.unwrap();

        let worker = Worker::new(queue.clone(), handler.clone(), fast_retry());
        let invocations = worker.run_until_idle().await.unwrap();

        assert_eq!(invocations, 3);
        assert_eq!(handler.calls.load(Ordering::SeqCst), 3);
        assert_eq!(queue.pending().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn jobs_are_dropped_after_max_attempts() {
        let queue = Arc::new(InMemoryQueue::new());
        let handler = Arc::new(FlakyHandler {
            calls: AtomicU32::new(0),
            failures_before_success: u32::MAX,
        });
        queue.push(JobPayload::CheckDocumentExpiry).await.unwrap();

        let worker = Worker::new(queue.clone(), handler.clone(), fast_retry());
        let invocations = worker.run_until_idle().await.unwrap();

        assert_eq!(invocations, 3);
        assert_eq!(queue.pending().await.unwrap(), 0);
    }

    #[test]
    fn backoff_doubles_per_attempt() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.delay_for(1), Duration::from_secs(1));
        assert_eq!(policy.delay_for(2), Duration::from_secs(2));
        assert_eq!(policy.delay_for(3), Duration::from_secs(4));
    }
}
