//! Job envelope and payload contract.

use chrono::{DateTime, Utc};
use kyc_types::{DocumentId, VerificationId};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// What a worker should do. Serialized onto the queue, so variants and
/// field names are a wire contract.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum JobPayload {
    /// Quality assessment and data extraction for one uploaded document.
    ProcessDocument { document_id: DocumentId },
    /// Authenticity verification for one processed document.
    VerifyDocument { document_id: DocumentId },
    /// Full pipeline run for one submitted verification.
    ProcessVerification { verification_id: VerificationId },
    /// Sweep for verified documents whose expiry date has passed.
    CheckDocumentExpiry,
    /// Sweep for approved verifications past their expiry timestamp.
    CheckVerificationExpiry,
}

impl JobPayload {
    /// Stable name used in logs and metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            JobPayload::ProcessDocument { .. } => "process_document",
            JobPayload::VerifyDocument { .. } => "verify_document",
            JobPayload::ProcessVerification { .. } => "process_verification",
            JobPayload::CheckDocumentExpiry => "check_document_expiry",
            JobPayload::CheckVerificationExpiry => "check_verification_expiry",
        }
    }
}

/// Identifies one queued job across enqueues and retries.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct JobId(pub Uuid);

impl JobId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for JobId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for JobId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

/// One queued unit of work.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Job {
    pub id: JobId,
    pub payload: JobPayload,
    /// Completed delivery attempts so far.
    pub attempts: u32,
    pub enqueued_at: DateTime<Utc>,
}

impl Job {
    pub fn new(payload: JobPayload) -> Self {
        Self {
            id: JobId::new(),
            payload,
            attempts: 0,
            enqueued_at: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn payload_round_trips_through_json() {
        let payload = JobPayload::ProcessDocument {
            document_id: DocumentId::new(),
        };
        let json = serde_json::to_string(&payload).unwrap();
        assert!(json.contains("\"kind\":\"process_document\""));
        let back: JobPayload = serde_json::from_str(&json).unwrap();
        assert_eq!(back, payload);
    }

    #[test]
    fn new_jobs_start_with_zero_attempts() {
        let job = Job::new(JobPayload::CheckDocumentExpiry);
        assert_eq!(job.attempts, 0);
        assert_eq!(job.payload.kind(), "check_document_expiry");
    }
}
