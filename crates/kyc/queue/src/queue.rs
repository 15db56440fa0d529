//! Queue transport seam.

use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;
use kyc_types::{KycError, KycResult};
use tracing::debug;

use crate::job::{Job, JobPayload};

/// FIFO transport for jobs. A broker-backed implementation satisfies the
/// same contract as the in-memory one below.
#[async_trait]
pub trait JobQueue: Send + Sync {
    async fn enqueue(&self, job: Job) -> KycResult<()>;
    /// Returns the next job, or `None` when the queue is empty.
    async fn dequeue(&self) -> KycResult<Option<Job>>;
    async fn pending(&self) -> KycResult<usize>;
}

/// In-memory FIFO used for tests, local demos, and single-process deployments.
#[derive(Default)]
pub struct InMemoryQueue {
    inner: Mutex<VecDeque<Job>>,
}

impl InMemoryQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Convenience for producers that only have a payload.
    pub async fn push(&self, payload: JobPayload) -> KycResult<()> {
        self.enqueue(Job::new(payload)).await
    }

    fn lock(&self) -> KycResult<std::sync::MutexGuard<'_, VecDeque<Job>>> {
        self.inner
            .lock()
            .map_err(|_| KycError::System("job queue lock poisoned".into()))
    }
}

#[async_trait]
impl JobQueue for InMemoryQueue {
    async fn enqueue(&self, job: Job) -> KycResult<()> {
        debug!(job_id = %job.id, kind = job.payload.kind(), attempts = job.attempts, "Job enqueued");
        self.lock()?.push_back(job);
        Ok(())
    }

    async fn dequeue(&self) -> KycResult<Option<Job>> {
        Ok(self.lock()?.pop_front())
    }

    async fn pending(&self) -> KycResult<usize> {
        Ok(self.lock()?.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kyc_types::DocumentId;

    #[tokio::test]
    async fn fifo_order_is_preserved() {
        let queue = InMemoryQueue::new();
        let first = DocumentId::new();
        let second = DocumentId::new();
        queue
            .push(JobPayload::ProcessDocument { document_id: first })
            .await
            .unwrap();
        queue
            .push(JobPayload::ProcessDocument { document_id: second })
            .await
            .unwrap();
        assert_eq!(queue.pending().await.unwrap(), 2);

        let job = queue.dequeue().await.unwrap().unwrap();
        assert_eq!(
            job.payload,
            JobPayload::ProcessDocument { document_id: first }
        );
        let job = queue.dequeue().await.unwrap().unwrap();
        assert_eq!(
            job.payload,
            JobPayload::ProcessDocument { document_id: second }
        );
        assert!(queue.dequeue().await.unwrap().is_none());
    }
}
