//! Periodic expiry sweeps.
//!
//! Enqueues the document- and verification-expiry jobs on an interval; the
//! workers do the actual sweeping so a missed tick only delays, never skips.

use std::sync::Arc;
use std::time::Duration;

use kyc_queue::{Job, JobPayload, JobQueue};
use kyc_types::KycResult;
use tracing::info;

pub const DEFAULT_SWEEP_INTERVAL: Duration = Duration::from_secs(24 * 60 * 60);

pub struct ExpiryScheduler {
    queue: Arc<dyn JobQueue>,
    interval: Duration,
}

impl ExpiryScheduler {
    pub fn new(queue: Arc<dyn JobQueue>, interval: Duration) -> Self {
        Self { queue, interval }
    }

    /// Enqueues one round of sweep jobs.
    pub async fn tick(&self) -> KycResult<()> {
        self.queue
            .enqueue(Job::new(JobPayload::CheckDocumentExpiry))
            .await?;
        self.queue
            .enqueue(Job::new(JobPayload::CheckVerificationExpiry))
            .await?;
        info!("Expiry sweep jobs enqueued");
        Ok(())
    }

    /// Ticks forever on the configured interval.
    pub async fn run(&self) -> KycResult<()> {
        let mut timer = tokio::time::interval(self.interval);
        loop {
            timer.tick().await;
            self.tick().await?;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kyc_queue::InMemoryQueue;

    #[tokio::test]
    async fn one_tick_enqueues_both_sweeps() {
        let queue = Arc::new(InMemoryQueue::new());
        let scheduler = ExpiryScheduler::new(queue.clone(), DEFAULT_SWEEP_INTERVAL);
        scheduler.tick().await.unwrap();

        assert_eq!(queue.pending().await.unwrap(), 2);
        let kinds: Vec<_> = [
            queue.dequeue().await.unwrap().unwrap().payload,
            queue.dequeue().await.unwrap().unwrap().payload,
        ]
        .into_iter()
        .collect();
        assert!(kinds.contains(&JobPayload::CheckDocumentExpiry));
        assert!(kinds.contains(&JobPayload::CheckVerificationExpiry));
    }
}
