//! Background job plumbing.
//!
//! Long-running pipeline stages run off a job queue rather than inline in
//! the request path. [`JobPayload`] is the serialized contract between
//! producers and workers, [`JobQueue`] the transport seam, and [`Worker`]
//! the retry-aware consume loop. The in-memory queue stands in for a broker
//! in tests and single-process deployments.

mod job;
mod queue;
mod worker;

pub use job::{Job, JobId, JobPayload};
pub use queue::{InMemoryQueue, JobQueue};
pub use worker::{JobHandler, RetryPolicy, Worker};
