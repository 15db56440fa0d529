//! Verification lifecycle orchestration.
//!
//! Two synchronous managers ([`VerificationManager`], [`DocumentManager`])
//! handle merchant-facing operations and validation; two background workers
//! ([`DocumentWorker`], [`VerificationWorker`]) run the slow stages off the
//! job queue. All components share a [`PipelineContext`] holding the stores,
//! the provider gateway, the risk engine, the audit trail, and the queue.
//!
//! Decision policy lives in the verification worker: a non-clear sanctions
//! outcome rejects, a manual-review flag from the risk assessment routes to
//! manual review, low risk auto-approves, and everything else waits for a
//! reviewer.

mod analyzer;
mod collaborators;
mod config;
mod document_worker;
mod documents;
mod handler;
mod scheduler;
mod verification_worker;
mod verifications;

use std::sync::Arc;

use kyc_audit::AuditTrail;
use kyc_providers::ProviderGateway;
use kyc_queue::JobQueue;
use kyc_risk::RiskEngine;
use kyc_store::{DocumentStore, VerificationStore};

pub use analyzer::{DocumentAnalysis, DocumentAnalyzer, FixedAnalyzer, HeuristicAnalyzer};
pub use collaborators::{
    BlobStorage, InMemoryBlobStorage, Notification, Notifier, RecordingNotifier,
};
pub use config::{ApprovalPolicy, DocumentPolicy};
pub use document_worker::DocumentWorker;
pub use documents::DocumentManager;
pub use handler::PipelineHandler;
pub use scheduler::{ExpiryScheduler, DEFAULT_SWEEP_INTERVAL};
pub use verification_worker::VerificationWorker;
pub use verifications::{ProfileUpdate, ReviewDecision, VerificationManager};

/// Shared wiring for every manager and worker.
#[derive(Clone)]
pub struct PipelineContext {
    pub verifications: Arc<dyn VerificationStore>,
    pub documents: Arc<dyn DocumentStore>,
    pub storage: Arc<dyn collaborators::BlobStorage>,
    pub notifier: Arc<dyn collaborators::Notifier>,
    pub analyzer: Arc<dyn analyzer::DocumentAnalyzer>,
    pub gateway: Arc<ProviderGateway>,
    pub risk: Arc<RiskEngine>,
    pub audit: AuditTrail,
    pub queue: Arc<dyn JobQueue>,
    pub document_policy: DocumentPolicy,
    pub approval_policy: ApprovalPolicy,
}
